//! ACL handlers
//!
//! Every gateway controller gets a handler that decides, per backend request,
//! which ACL check to run. [`HandlerKind::Base`] covers all operations in the
//! checkpoint table ([`crate::acl_map`]); the specialized kinds override
//! individual verbs where a check needs more than the table lookup (ACL
//! construction, owner inheritance, upload-session containers).
//!
//! A handler method that already obtained the backend response a controller
//! needs returns it, so the controller can reuse it instead of issuing a
//! second probe.


use crate::acl_map::{self, Resource};
use crate::backend::{AclBackend, AclResponse};
use crate::dto::{Acl, Owner, Permission, RequiredAccess};
use crate::error::*;
use crate::header;
use crate::request::AclRequest;
use crate::xml::{self, AclXmlError};

use http::{HeaderMap, Method};
use tracing::debug;

/// Marker appended to a container name to form its multipart-upload staging
/// container.
pub const MULTIUPLOAD_SUFFIX: &str = "+segments";

/// Strips the upload-session suffix from a container name, yielding the base
/// container. A name without the suffix is returned unchanged.
#[must_use]
pub fn strip_upload_suffix(container: &str) -> &str {
    container.strip_suffix(MULTIUPLOAD_SUFFIX).unwrap_or(container)
}

/// Builds an ACL from grant headers or from an `AccessControlPolicy` body.
///
/// The two input forms are mutually exclusive: grants already supplied via
/// headers rule out a body, and a request with neither is rejected outright.
///
/// # Errors
/// - `MissingSecurityHeader` when neither form is present
/// - `UnexpectedContent` when both forms are present
/// - `MalformedACLError` when the body does not parse as an ACL document
/// - `InvalidArgument` when the body names an unknown grantee group
pub fn get_acl(
    headers: &HeaderMap,
    body: Option<&[u8]>,
    bucket_owner: &Owner,
    object_owner: Option<&Owner>,
) -> S3Result<Acl> {
    let header_acl = Acl::from_headers(headers, bucket_owner, object_owner)?;
    let body = body.filter(|b| !b.is_empty());

    match header_acl {
        Some(acl) => {
            if body.is_some() {
                return Err(s3_error!(
                    UnexpectedContent,
                    "an ACL was supplied in both headers and body"
                ));
            }
            Ok(acl)
        }
        None => {
            let Some(body) = body else {
                return Err(s3_error!(
                    MissingSecurityHeader,
                    "Your request was missing a required header: {}",
                    header::X_AMZ_ACL
                ));
            };
            if body.len() > Acl::MAX_XML_SIZE {
                return Err(s3_error!(MalformedACLError, "ACL body is too large"));
            }
            match xml::parse(body) {
                Ok(acl) => Ok(acl),
                Err(err @ AclXmlError::UnknownGroup(_)) => {
                    Err(s3_error!(err, InvalidArgument, "unknown grantee group in ACL body"))
                }
                Err(err) => Err(s3_error!(err, MalformedACLError)),
            }
        }
    }
}

/// The specialization a controller's handler runs with.
///
/// The multipart kinds share two behaviors: their checks run against the base
/// container (upload-session suffix stripped at construction, exactly once)
/// and they check only at explicit checkpoints, skipping every other verb.
/// Their checkpoints, all on the base container:
///
/// | Kind      | Verb  | Permission            |
/// |-----------|-------|-----------------------|
/// | `Part`    | `PUT` | `WRITE`               |
/// | `Uploads` | `GET` | `READ`                |
/// | `Uploads` | `POST`| `WRITE`               |
/// | `Upload`  | `GET` | `READ`                |
/// | `Upload`  | `DELETE` | `WRITE`            |
/// | `Upload`  | `POST`| `WRITE`               |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Table-driven check only
    Base,
    /// Container lifecycle; creation builds the container ACL
    Bucket,
    /// Object lifecycle; creation builds the object ACL
    Object,
    /// The ACL subresource endpoint (read/replace a resource's own ACL)
    S3Acl,
    /// Bulk object deletion; per-object checks are skipped here
    MultiObjectDelete,
    /// Multipart upload family base behavior
    MultiUpload,
    /// Upload part; distinguishes copy-source checks
    Part,
    /// Upload collection (initiate, list)
    Uploads,
    /// A single upload session (list parts, complete, abort)
    Upload,
}

/// Controller registrations. Unregistered controllers fall back to
/// [`HandlerKind::Base`].
const REGISTRY: &[(&str, HandlerKind)] = &[
    ("Bucket", HandlerKind::Bucket),
    ("Object", HandlerKind::Object),
    ("S3Acl", HandlerKind::S3Acl),
    ("MultiObjectDelete", HandlerKind::MultiObjectDelete),
    ("MultiUpload", HandlerKind::MultiUpload),
    ("Part", HandlerKind::Part),
    ("Uploads", HandlerKind::Uploads),
    ("Upload", HandlerKind::Upload),
];

impl HandlerKind {
    /// Selects the handler kind registered for `controller`.
    #[must_use]
    pub fn for_controller(controller: &str) -> Self {
        REGISTRY
            .iter()
            .find(|(name, _)| *name == controller)
            .map_or(Self::Base, |(_, kind)| *kind)
    }
}

/// A per-request authorizer bound to one controller.
///
/// Construction captures the request target; [`AclHandler::with_target`]
/// overrides it for checks against another resource (e.g. a copy source).
/// The multipart kinds rewrite the captured container to the base container
/// by stripping [`MULTIUPLOAD_SUFFIX`] once.
#[derive(Debug)]
pub struct AclHandler {
    kind: HandlerKind,
    method: Method,
    user_id: String,
    container: String,
    object: String,
    headers: HeaderMap,
    check_copy_source: bool,
}

impl AclHandler {
    #[must_use]
    pub fn new(controller: &str, req: &AclRequest) -> Self {
        Self::with_target(controller, req, None, None, None)
    }

    #[must_use]
    pub fn with_target(
        controller: &str,
        req: &AclRequest,
        container: Option<&str>,
        object: Option<&str>,
        headers: Option<&HeaderMap>,
    ) -> Self {
        let kind = HandlerKind::for_controller(controller);
        let mut container = container.unwrap_or(&req.container).to_owned();
        let object = object.unwrap_or(&req.object).to_owned();
        let headers = headers.unwrap_or(&req.headers).clone();

        let mut check_copy_source = false;
        match kind {
            HandlerKind::MultiUpload | HandlerKind::Uploads | HandlerKind::Upload => {
                container = strip_upload_suffix(&container).to_owned();
            }
            HandlerKind::Part => match container.strip_suffix(MULTIUPLOAD_SUFFIX) {
                // Suffix-bearing target: an upload-session check on the base
                // container. Anything else is a copy-source check against the
                // named object.
                Some(base) => container = base.to_owned(),
                None => check_copy_source = true,
            },
            _ => {}
        }

        Self {
            kind,
            method: req.method.clone(),
            user_id: req.user_id.clone(),
            container,
            object,
            headers,
            check_copy_source,
        }
    }

    /// The container this handler checks against.
    #[must_use]
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Runs the ACL check for the backend request the gateway is about to
    /// issue with `method` (the handler's own verb when `None`).
    ///
    /// Returns the probe response when the handler already holds the response
    /// the backend request would produce, so the caller can reuse it.
    ///
    /// # Errors
    /// `AccessDenied`, `OwnerMismatch` and the extraction errors of
    /// [`get_acl`], plus any backend error, which passes through unchanged.
    ///
    /// # Panics
    /// Panics when a dispatch path reaches the checkpoint table with a triple
    /// that has no entry and no explicit permission was supplied; that is a
    /// dispatch bug in the gateway, not a request error.
    pub async fn handle(
        &self,
        ctx: &mut AclRequest,
        backend: &dyn AclBackend,
        method: Option<&Method>,
    ) -> S3Result<Option<AclResponse>> {
        let method = method.unwrap_or(&self.method);
        debug!(kind = ?self.kind, %method, container = %self.container, object = %self.object, "handling acl");

        match self.kind {
            HandlerKind::Base => self.default_check(backend, method).await,
            HandlerKind::Bucket => {
                if *method == Method::PUT {
                    self.bucket_put(ctx, backend).await
                } else {
                    self.default_check(backend, method).await
                }
            }
            HandlerKind::Object => {
                if *method == Method::PUT {
                    self.object_put(ctx, backend).await
                } else {
                    self.default_check(backend, method).await
                }
            }
            HandlerKind::S3Acl => {
                if *method == Method::GET {
                    self.acl_get(backend).await
                } else if *method == Method::PUT {
                    self.acl_put(ctx, backend).await
                } else if *method == Method::POST {
                    self.acl_post(ctx, backend).await
                } else {
                    self.default_check(backend, method).await
                }
            }
            HandlerKind::MultiObjectDelete => {
                if *method == Method::DELETE {
                    // Only the container WRITE check applies, and it already
                    // ran once for the whole batch.
                    Ok(None)
                } else {
                    self.default_check(backend, method).await
                }
            }
            HandlerKind::MultiUpload => {
                if *method == Method::HEAD {
                    self.upload_info_check(backend).await
                } else {
                    Ok(None)
                }
            }
            HandlerKind::Part => {
                if *method == Method::HEAD {
                    self.part_head(backend).await
                } else {
                    Ok(None)
                }
            }
            HandlerKind::Uploads => {
                if *method == Method::GET {
                    self.uploads_get(backend).await
                } else if *method == Method::PUT {
                    self.uploads_put(backend).await
                } else {
                    Ok(None)
                }
            }
            HandlerKind::Upload => {
                if *method == Method::HEAD {
                    self.upload_head(backend).await
                } else {
                    Ok(None)
                }
            }
        }
    }

    fn is_object_request(&self) -> bool {
        !self.object.is_empty()
    }

    async fn default_check(
        &self,
        backend: &dyn AclBackend,
        backend_method: &Method,
    ) -> S3Result<Option<AclResponse>> {
        self.check(backend, backend_method, None, None, None, None).await
    }

    /// The generic check shared by most operations.
    ///
    /// `backend_method` is the verb the gateway issues next, not necessarily
    /// the verb of the metadata probe: the probe itself is always a `HEAD`.
    /// When `backend_method` is `HEAD` the probe response doubles as that
    /// request's response and is returned for reuse.
    ///
    /// A request that resolves no container (a service-level listing) has
    /// nothing to authorize against and passes without a probe.
    async fn check(
        &self,
        backend: &dyn AclBackend,
        backend_method: &Method,
        container: Option<&str>,
        object: Option<&str>,
        permission: Option<RequiredAccess>,
        headers: Option<&HeaderMap>,
    ) -> S3Result<Option<AclResponse>> {
        let container = container.unwrap_or(&self.container);
        let object = object.unwrap_or(&self.object);
        let headers = headers.unwrap_or(&self.headers);

        if container.is_empty() {
            return Ok(None);
        }

        let resp = self
            .check_resource(backend, backend_method, container, object, permission, headers)
            .await?;

        if *backend_method == Method::HEAD {
            Ok(Some(resp))
        } else {
            Ok(None)
        }
    }

    /// Resolves the required permission, probes the backend and evaluates the
    /// caller against the resource's ACL. Returns the probe response.
    async fn check_resource(
        &self,
        backend: &dyn AclBackend,
        backend_method: &Method,
        container: &str,
        object: &str,
        permission: Option<RequiredAccess>,
        headers: &HeaderMap,
    ) -> S3Result<AclResponse> {
        let mut resource = if object.is_empty() {
            Resource::Container
        } else {
            Resource::Object
        };

        let permission = match permission {
            Some(permission) => permission,
            None => {
                let Some(rule) = acl_map::resolve(&self.method, backend_method, resource) else {
                    panic!(
                        "no permission to be checked exists: ({}, {backend_method}, {resource:?})",
                        self.method
                    );
                };
                if let Some(redirect) = rule.resource {
                    resource = redirect;
                }
                rule.permission
            }
        };

        match resource {
            Resource::Object => {
                let resp = backend
                    .get_acl_response(&Method::HEAD, container, object, headers, None)
                    .await?;
                let acl = object_acl(&resp)?;
                acl.check_permission(&self.user_id, permission)?;
                Ok(resp)
            }
            Resource::Container => {
                let resp = backend
                    .get_acl_response(&Method::HEAD, container, "", headers, None)
                    .await?;
                let acl = bucket_acl(&resp)?;
                acl.check_permission(&self.user_id, permission)?;
                Ok(resp)
            }
        }
    }

    /// Container creation.
    ///
    /// The create request goes out before the ACL is attached: if the
    /// container already exists the create fails and the existing ACL is
    /// never overwritten. If attaching the ACL fails after a successful
    /// create, a container without ACL metadata is left behind.
    async fn bucket_put(
        &self,
        ctx: &mut AclRequest,
        backend: &dyn AclBackend,
    ) -> S3Result<Option<AclResponse>> {
        let owner = Owner::new(self.user_id.clone(), self.user_id.clone());
        let req_acl = Acl::from_headers_or_private(&self.headers, &owner, None)?;

        backend
            .get_acl_response(&Method::PUT, &self.container, "", &self.headers, None)
            .await?;

        ctx.bucket_acl = Some(req_acl.clone());
        let resp = backend
            .get_acl_response(&Method::POST, &self.container, "", &self.headers, Some(&req_acl))
            .await?;
        Ok(Some(resp))
    }

    /// Object creation: gated by the container's `WRITE` permission; the new
    /// object's ACL is owned by the caller, with the container owner as the
    /// fallback for owner-relative shorthand.
    async fn object_put(
        &self,
        ctx: &mut AclRequest,
        backend: &dyn AclBackend,
    ) -> S3Result<Option<AclResponse>> {
        let b_resp = self
            .check_resource(backend, &Method::HEAD, &self.container, "", None, &self.headers)
            .await?;
        let container_owner = bucket_acl(&b_resp)?.owner.clone();

        let owner = Owner::new(self.user_id.clone(), self.user_id.clone());
        let req_acl = Acl::from_headers_or_private(&self.headers, &container_owner, Some(&owner))?;
        ctx.object_acl = Some(req_acl);
        Ok(None)
    }

    /// Reading a resource's ACL requires `READ_ACP` on that resource.
    async fn acl_get(&self, backend: &dyn AclBackend) -> S3Result<Option<AclResponse>> {
        self.check(
            backend,
            &Method::HEAD,
            None,
            None,
            Some(RequiredAccess::Grant(Permission::ReadAcp)),
            None,
        )
        .await?;
        Ok(None)
    }

    /// Replacing an object's ACL requires `WRITE_ACP` on the object, and the
    /// supplied ACL must keep the current owner.
    async fn acl_put(
        &self,
        ctx: &mut AclRequest,
        backend: &dyn AclBackend,
    ) -> S3Result<Option<AclResponse>> {
        if !self.is_object_request() {
            return self.check(backend, &self.method, None, None, None, None).await;
        }

        let b_resp = backend
            .get_acl_response(&Method::HEAD, &self.container, "", &self.headers, None)
            .await?;
        let o_resp = self
            .check_resource(
                backend,
                &Method::HEAD,
                &self.container,
                &self.object,
                Some(RequiredAccess::Grant(Permission::WriteAcp)),
                &self.headers,
            )
            .await?;

        let req_acl = get_acl(
            &self.headers,
            ctx.body.as_deref(),
            &bucket_acl(&b_resp)?.owner,
            Some(&object_acl(&o_resp)?.owner),
        )?;

        object_acl(&o_resp)?.check_owner(&req_acl.owner.id)?;

        for grant in &req_acl.grants {
            debug!(
                grantee = %grant.grantee,
                permission = %grant.permission,
                container = %self.container,
                object = %self.object,
                "granting permission on the object"
            );
        }
        ctx.object_acl = Some(req_acl);
        Ok(None)
    }

    /// Replacing a container's ACL requires `WRITE_ACP` on the container; the
    /// gateway forwards the replacement as a metadata update (`POST`).
    async fn acl_post(
        &self,
        ctx: &mut AclRequest,
        backend: &dyn AclBackend,
    ) -> S3Result<Option<AclResponse>> {
        if self.is_object_request() {
            return self.check(backend, &self.method, None, None, None, None).await;
        }

        let resp = self
            .check_resource(
                backend,
                &Method::HEAD,
                &self.container,
                &self.object,
                Some(RequiredAccess::Grant(Permission::WriteAcp)),
                &self.headers,
            )
            .await?;

        let req_acl = get_acl(&self.headers, ctx.body.as_deref(), &bucket_acl(&resp)?.owner, None)?;

        bucket_acl(&resp)?.check_owner(&req_acl.owner.id)?;

        for grant in &req_acl.grants {
            debug!(
                grantee = %grant.grantee,
                permission = %grant.permission,
                container = %self.container,
                "granting permission on the container"
            );
        }
        ctx.bucket_acl = Some(req_acl);
        Ok(None)
    }

    /// Upload-session probe: the checkpoint runs against the base container.
    async fn upload_info_check(&self, backend: &dyn AclBackend) -> S3Result<Option<AclResponse>> {
        self.check(backend, &Method::HEAD, None, Some(""), None, None).await?;
        Ok(None)
    }

    async fn part_head(&self, backend: &dyn AclBackend) -> S3Result<Option<AclResponse>> {
        if self.check_copy_source {
            // The copy source itself must be readable; the response is
            // reusable as the copy-source metadata.
            self.check(backend, &Method::HEAD, None, None, None, None).await
        } else {
            self.upload_info_check(backend).await
        }
    }

    /// List Multipart Uploads
    async fn uploads_get(&self, backend: &dyn AclBackend) -> S3Result<Option<AclResponse>> {
        self.check(backend, &Method::GET, None, Some(""), None, None).await?;
        Ok(None)
    }

    /// Initiate Multipart Upload creates the staging container; the upload-id
    /// object it also writes needs no further check.
    async fn uploads_put(&self, backend: &dyn AclBackend) -> S3Result<Option<AclResponse>> {
        if !self.is_object_request() {
            self.check(backend, &Method::PUT, None, None, None, None).await?;
        }
        Ok(None)
    }

    /// List Parts arrives as a `GET` and must resolve the `GET` checkpoint;
    /// every other operation on an upload session probes with `HEAD`. The
    /// service-level `GET` mapping shares the `(GET, HEAD)` key, so the verbs
    /// cannot be collapsed here.
    async fn upload_head(&self, backend: &dyn AclBackend) -> S3Result<Option<AclResponse>> {
        let backend_method = if self.method == Method::GET {
            Method::GET
        } else {
            Method::HEAD
        };
        self.check(backend, &backend_method, None, Some(""), None, None).await?;
        Ok(None)
    }
}

/// The container ACL of a probe response; its absence is a backend contract
/// violation.
fn bucket_acl(resp: &AclResponse) -> S3Result<&Acl> {
    resp.bucket_acl
        .as_ref()
        .ok_or_else(|| s3_error!(InternalError, "container ACL missing from backend response"))
}

/// The object ACL of a probe response; its absence is a backend contract
/// violation.
fn object_acl(resp: &AclResponse) -> S3Result<&Acl> {
    resp.object_acl
        .as_ref()
        .ok_or_else(|| s3_error!(InternalError, "object ACL missing from backend response"))
}
