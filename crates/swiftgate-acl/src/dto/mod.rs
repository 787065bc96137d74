//! Data types for ACL metadata

mod acl;
pub use self::acl::{Acl, RequiredAccess};

mod grant;
pub use self::grant::{Grant, Grantee, Group, Owner, Permission};
