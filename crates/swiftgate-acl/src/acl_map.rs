//! The authorization checkpoint table
//!
//! Maps `(incoming verb, backend verb, resource)` to the permission an
//! operation demands. The table is fixed at compile time and never grows at
//! runtime; every dispatch path that has no entry here must pass an explicit
//! permission instead.

use crate::dto::{Permission, RequiredAccess};

use http::Method;

/// The two kinds of backend resource a checkpoint can inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Container,
    Object,
}

/// One checkpoint entry: the demanded permission plus an optional resource
/// redirect (e.g. object deletion is gated by the *container* ACL).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AclRule {
    pub resource: Option<Resource>,
    pub permission: RequiredAccess,
}

/// Looks up the checkpoint for `(method, backend_method, resource)`.
///
/// Pure and deterministic; returns `None` for every triple that is not one
/// of the documented checkpoints.
#[allow(clippy::match_same_arms)] // one arm per documented checkpoint
#[must_use]
pub fn resolve(method: &Method, backend_method: &Method, resource: Resource) -> Option<AclRule> {
    use Resource::{Container, Object};

    let rule = |resource, permission| Some(AclRule { resource, permission });
    let grant = RequiredAccess::Grant;

    match (method.as_str(), backend_method.as_str(), resource) {
        // HEAD Bucket
        ("HEAD", "HEAD", Container) => rule(None, grant(Permission::Read)),
        // GET Service
        ("GET", "HEAD", Container) => rule(None, RequiredAccess::Owner),
        // GET Bucket, List Parts, List Multipart Uploads
        ("GET", "GET", Container) => rule(None, grant(Permission::Read)),
        // PUT Object, PUT Object Copy
        ("PUT", "HEAD", Container) => rule(None, grant(Permission::Write)),
        // DELETE Bucket
        ("DELETE", "DELETE", Container) => rule(None, RequiredAccess::Owner),
        // HEAD Object
        ("HEAD", "HEAD", Object) => rule(None, grant(Permission::Read)),
        // GET Object
        ("GET", "GET", Object) => rule(None, grant(Permission::Read)),
        // PUT Object Copy, Upload Part Copy (copy source)
        ("PUT", "HEAD", Object) => rule(None, grant(Permission::Read)),
        // Initiate Multipart Upload
        ("POST", "PUT", Container) => rule(None, grant(Permission::Write)),
        // Abort Multipart Upload
        ("DELETE", "HEAD", Container) => rule(None, grant(Permission::Write)),
        // DELETE Object: gated by the container ACL, not the object ACL
        ("DELETE", "DELETE", Object) => rule(Some(Container), grant(Permission::Write)),
        // Complete Multipart Upload, DELETE Multiple Objects
        ("POST", "HEAD", Container) => rule(None, grant(Permission::Write)),
        _ => None,
    }
}
