//! ACL authorization core for S3-compatible gateways
//!
//! `swiftgate-acl` decides, per request, whether an authenticated caller may
//! perform an S3-style operation against a backend store that keeps its
//! access control as container/object ACL metadata. It owns exactly the
//! decision logic of that translation:
//!
//! - the checkpoint table mapping `(incoming verb, backend verb, resource)`
//!   to a required permission ([`acl_map`])
//! - per-controller handlers specializing the check where needed
//!   ([`handlers`])
//! - the ACL value objects and their evaluation rules ([`dto`])
//! - ACL extraction from grant headers or an `AccessControlPolicy` body
//!   ([`handlers::get_acl`], [`xml`])
//!
//! HTTP parsing, signature verification and the backend store itself live
//! elsewhere; the backend is reached through the [`AclBackend`] trait.
//!
//! # Example
//!
//! ```no_run
//! use swiftgate_acl::dto::{Acl, Owner};
//! use swiftgate_acl::{AclBackend, AclHandler, AclRequest, AclResponse, S3Result};
//!
//! use http::{HeaderMap, Method};
//!
//! struct Store;
//!
//! #[async_trait::async_trait]
//! impl AclBackend for Store {
//!     async fn get_acl_response(
//!         &self,
//!         _method: &Method,
//!         _container: &str,
//!         _object: &str,
//!         _headers: &HeaderMap,
//!         _acl: Option<&Acl>,
//!     ) -> S3Result<AclResponse> {
//!         let owner = Owner::new("alice", "alice");
//!         Ok(AclResponse::new(
//!             Some(Acl::private(&owner)),
//!             Some(Acl::private(&owner)),
//!         ))
//!     }
//! }
//!
//! # async fn authorize() -> S3Result<()> {
//! let mut req = AclRequest::new(Method::GET, "alice", "reports", "q1.csv");
//! let handler = AclHandler::new("Object", &req);
//! handler.handle(&mut req, &Store, None).await?;
//! # Ok(())
//! # }
//! ```

#![allow(
    clippy::module_name_repetitions,
    clippy::single_match_else,
    clippy::wildcard_imports,
)]

#[macro_use]
mod error;

mod request;

pub mod acl_map;
pub mod backend;
pub mod dto;
pub mod handlers;
pub mod header;
pub mod xml;

pub use self::error::{S3Error, S3ErrorCode, S3Result};

pub use self::backend::{AclBackend, AclResponse};
pub use self::handlers::{AclHandler, HandlerKind, MULTIUPLOAD_SUFFIX, get_acl, strip_upload_suffix};
pub use self::request::AclRequest;
