//! Header names used by the ACL protocol surface

/// Canned ACL shorthand
pub const X_AMZ_ACL: &str = "x-amz-acl";

/// Explicit `FULL_CONTROL` grant
pub const X_AMZ_GRANT_FULL_CONTROL: &str = "x-amz-grant-full-control";

/// Explicit `READ` grant
pub const X_AMZ_GRANT_READ: &str = "x-amz-grant-read";

/// Explicit `READ_ACP` grant
pub const X_AMZ_GRANT_READ_ACP: &str = "x-amz-grant-read-acp";

/// Explicit `WRITE` grant
pub const X_AMZ_GRANT_WRITE: &str = "x-amz-grant-write";

/// Explicit `WRITE_ACP` grant
pub const X_AMZ_GRANT_WRITE_ACP: &str = "x-amz-grant-write-acp";
