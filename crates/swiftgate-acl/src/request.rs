//! Per-request authorization context

use crate::dto::Acl;

use bytes::Bytes;
use http::{HeaderMap, Method};

/// Everything the authorization core knows about one in-flight request.
///
/// One value exists per request, owned by the unit handling that request;
/// nothing here is shared across requests. `object` is the empty string when
/// the request targets the container itself.
///
/// `bucket_acl` / `object_acl` start out empty. A handler fills them in when
/// the request establishes new ACL metadata; the gateway attaches the filled
/// value to the backend request it forwards.
#[derive(Debug)]
pub struct AclRequest {
    pub method: Method,
    pub user_id: String,
    pub container: String,
    pub object: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub bucket_acl: Option<Acl>,
    pub object_acl: Option<Acl>,
}

impl AclRequest {
    #[must_use]
    pub fn new(
        method: Method,
        user_id: impl Into<String>,
        container: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            method,
            user_id: user_id.into(),
            container: container.into(),
            object: object.into(),
            headers: HeaderMap::new(),
            body: None,
            bucket_acl: None,
            object_acl: None,
        }
    }

    /// Whether the request targets an object rather than its container.
    #[must_use]
    pub fn is_object_request(&self) -> bool {
        !self.object.is_empty()
    }
}
