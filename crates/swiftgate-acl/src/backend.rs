//! Backend store collaborator

use crate::dto::Acl;
use crate::error::S3Result;

use http::{HeaderMap, Method};

/// Result of a backend metadata request: the ACL metadata currently attached
/// to the targeted container and, when an object was targeted, to the object.
#[derive(Debug, Default)]
#[non_exhaustive]
pub struct AclResponse {
    pub bucket_acl: Option<Acl>,
    pub object_acl: Option<Acl>,
}

impl AclResponse {
    #[must_use]
    pub fn new(bucket_acl: Option<Acl>, object_acl: Option<Acl>) -> Self {
        Self {
            bucket_acl,
            object_acl,
        }
    }
}

/// Access to the backend store's ACL metadata.
///
/// The core issues at most one call per checkpoint (a lightweight `HEAD`
/// probe in almost every case) and blocks on the result before deciding.
/// Retry, timeout and concurrency policy all live behind this trait.
///
/// Implementations must surface a missing resource as `NoSuchBucket` /
/// `NoSuchKey`; such errors pass through the core unchanged. For mutating
/// verbs, `acl` carries new ACL metadata to attach to the target resource;
/// its physical encoding is the implementation's concern.
#[async_trait::async_trait]
pub trait AclBackend: Send + Sync + 'static {
    /// Executes `method` against `container` (and `object`, when non-empty)
    /// and reports the ACL metadata of the touched resources.
    ///
    /// # Errors
    /// Returns `NoSuchBucket` / `NoSuchKey` when the target does not exist,
    /// or whatever error the backend request itself produced.
    async fn get_acl_response(
        &self,
        method: &Method,
        container: &str,
        object: &str,
        headers: &HeaderMap,
        acl: Option<&Acl>,
    ) -> S3Result<AclResponse>;
}
