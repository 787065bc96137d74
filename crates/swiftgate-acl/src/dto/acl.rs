//! The access control entity and its evaluation rules

use super::{Grant, Grantee, Group, Owner, Permission};
use crate::error::*;
use crate::header;

use http::HeaderMap;

/// Permission level demanded by an authorization checkpoint.
///
/// `Owner` is not grantable; it is satisfied only by the resource owner
/// itself. Grantable permissions are satisfied by the owner as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredAccess {
    Owner,
    Grant(Permission),
}

/// ACL metadata attached to a single container or object: the owner plus an
/// ordered list of grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acl {
    pub owner: Owner,
    pub grants: Vec<Grant>,
}

/// Grant headers recognized on incoming requests, in evaluation order.
const GRANT_HEADERS: &[(&str, Permission)] = &[
    (header::X_AMZ_GRANT_FULL_CONTROL, Permission::FullControl),
    (header::X_AMZ_GRANT_READ, Permission::Read),
    (header::X_AMZ_GRANT_WRITE, Permission::Write),
    (header::X_AMZ_GRANT_READ_ACP, Permission::ReadAcp),
    (header::X_AMZ_GRANT_WRITE_ACP, Permission::WriteAcp),
];

impl Acl {
    /// Upper bound for an ACL document supplied in a request body.
    pub const MAX_XML_SIZE: usize = 200 * 1024;

    #[must_use]
    pub fn new(owner: Owner, grants: Vec<Grant>) -> Self {
        Self { owner, grants }
    }

    /// The default ACL of a newly created resource: the owner alone holds
    /// `FULL_CONTROL`.
    #[must_use]
    pub fn private(owner: &Owner) -> Self {
        let grant = Grant::new(Grantee::User(owner.id.clone()), Permission::FullControl);
        Self::new(owner.clone(), vec![grant])
    }

    /// Builds an ACL from request header shorthand.
    ///
    /// Both forms of shorthand are recognized: a canned ACL named by
    /// `x-amz-acl` and explicit `x-amz-grant-*` headers. Returns `None` when
    /// the request carries neither.
    ///
    /// # Errors
    /// Returns `InvalidRequest` when a canned ACL and grant headers are
    /// combined, and `InvalidArgument` for unknown canned names, malformed
    /// grant items or undecodable header values.
    pub fn from_headers(
        headers: &HeaderMap,
        bucket_owner: &Owner,
        object_owner: Option<&Owner>,
    ) -> S3Result<Option<Self>> {
        let mut grants = Vec::new();

        for &(name, permission) in GRANT_HEADERS {
            for value in headers.get_all(name) {
                let value = value
                    .to_str()
                    .map_err(|source| s3_error!(source, InvalidArgument, "invalid header: {name}"))?;
                for item in value.split(',').filter(|s| !s.trim().is_empty()) {
                    grants.push(Grant::new(Grantee::from_header(item)?, permission));
                }
            }
        }

        if let Some(value) = headers.get(header::X_AMZ_ACL) {
            let name = value.to_str().map_err(|source| {
                s3_error!(source, InvalidArgument, "invalid header: {}", header::X_AMZ_ACL)
            })?;
            if !grants.is_empty() {
                return Err(s3_error!(
                    InvalidRequest,
                    "Specifying both Canned ACLs and Header Grants is not allowed"
                ));
            }
            grants = canned_grants(name, bucket_owner, object_owner)
                .ok_or_else(|| s3_error!(InvalidArgument, "invalid x-amz-acl value: {name:?}"))?;
        }

        if grants.is_empty() {
            return Ok(None);
        }
        let owner = object_owner.unwrap_or(bucket_owner).clone();
        Ok(Some(Self::new(owner, grants)))
    }

    /// Like [`Acl::from_headers`], but falls back to the private ACL when the
    /// request carries no shorthand at all. Used on creation paths, where a
    /// resource always ends up with an ACL.
    ///
    /// # Errors
    /// Same conditions as [`Acl::from_headers`].
    pub fn from_headers_or_private(
        headers: &HeaderMap,
        bucket_owner: &Owner,
        object_owner: Option<&Owner>,
    ) -> S3Result<Self> {
        match Self::from_headers(headers, bucket_owner, object_owner)? {
            Some(acl) => Ok(acl),
            None => {
                let owner = object_owner.unwrap_or(bucket_owner);
                Ok(Self::private(owner))
            }
        }
    }

    /// Evaluates whether `user_id` holds `required` on this resource.
    ///
    /// The owner passes every check. Other callers pass a grantable check
    /// when any grant names them (directly or via a group) with the required
    /// permission or with `FULL_CONTROL`.
    ///
    /// # Errors
    /// Returns `AccessDenied` when the evaluation fails.
    pub fn check_permission(&self, user_id: &str, required: RequiredAccess) -> S3Result<()> {
        if !user_id.is_empty() && user_id == self.owner.id {
            return Ok(());
        }
        if let RequiredAccess::Grant(permission) = required {
            let allowed = self
                .grants
                .iter()
                .any(|g| g.allow(user_id, Permission::FullControl) || g.allow(user_id, permission));
            if allowed {
                return Ok(());
            }
        }
        Err(s3_error!(AccessDenied))
    }

    /// Rejects an ACL update that would change the resource owner.
    ///
    /// # Errors
    /// Returns `OwnerMismatch` when `owner_id` differs from the current
    /// owner.
    pub fn check_owner(&self, owner_id: &str) -> S3Result<()> {
        if self.owner.id == owner_id {
            Ok(())
        } else {
            Err(s3_error!(OwnerMismatch, "the new ACL must keep the current resource owner"))
        }
    }
}

/// Expands a canned ACL name into its grant list.
fn canned_grants(name: &str, bucket_owner: &Owner, object_owner: Option<&Owner>) -> Option<Vec<Grant>> {
    let owner = object_owner.unwrap_or(bucket_owner);
    let user = |o: &Owner| Grantee::User(o.id.clone());
    let group = Grantee::Group;

    let grants = match name {
        "private" => vec![Grant::new(user(owner), Permission::FullControl)],
        "public-read" => vec![
            Grant::new(group(Group::AllUsers), Permission::Read),
            Grant::new(user(owner), Permission::FullControl),
        ],
        "public-read-write" => vec![
            Grant::new(group(Group::AllUsers), Permission::Read),
            Grant::new(group(Group::AllUsers), Permission::Write),
            Grant::new(user(owner), Permission::FullControl),
        ],
        "authenticated-read" => vec![
            Grant::new(group(Group::AuthenticatedUsers), Permission::Read),
            Grant::new(user(owner), Permission::FullControl),
        ],
        "bucket-owner-read" => vec![
            Grant::new(user(bucket_owner), Permission::Read),
            Grant::new(user(owner), Permission::FullControl),
        ],
        "bucket-owner-full-control" => vec![
            Grant::new(user(owner), Permission::FullControl),
            Grant::new(user(bucket_owner), Permission::FullControl),
        ],
        "log-delivery-write" => vec![
            Grant::new(group(Group::LogDelivery), Permission::Write),
            Grant::new(group(Group::LogDelivery), Permission::ReadAcp),
            Grant::new(user(owner), Permission::FullControl),
        ],
        _ => return None,
    };
    Some(grants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::S3ErrorCode;

    use http::HeaderValue;

    fn owner(id: &str) -> Owner {
        Owner::new(id, id)
    }

    #[test]
    fn owner_passes_every_check() {
        let acl = Acl::private(&owner("alice"));
        acl.check_permission("alice", RequiredAccess::Owner).unwrap();
        acl.check_permission("alice", RequiredAccess::Grant(Permission::WriteAcp)).unwrap();
    }

    #[test]
    fn owner_check_rejects_grantees() {
        let mut acl = Acl::private(&owner("alice"));
        acl.grants.push(Grant::new(
            Grantee::User("bob".to_owned()),
            Permission::FullControl,
        ));
        let err = acl.check_permission("bob", RequiredAccess::Owner).unwrap_err();
        assert_eq!(*err.code(), S3ErrorCode::AccessDenied);
    }

    #[test]
    fn full_control_subsumes_grantable_permissions() {
        let mut acl = Acl::private(&owner("alice"));
        acl.grants.push(Grant::new(
            Grantee::User("bob".to_owned()),
            Permission::FullControl,
        ));
        for p in [Permission::Read, Permission::Write, Permission::ReadAcp, Permission::WriteAcp] {
            acl.check_permission("bob", RequiredAccess::Grant(p)).unwrap();
        }
    }

    #[test]
    fn ungranted_caller_is_denied() {
        let acl = Acl::private(&owner("alice"));
        let err = acl
            .check_permission("mallory", RequiredAccess::Grant(Permission::Read))
            .unwrap_err();
        assert_eq!(*err.code(), S3ErrorCode::AccessDenied);
    }

    #[test]
    fn group_grant_covers_any_caller() {
        let mut acl = Acl::private(&owner("alice"));
        acl.grants.push(Grant::new(Grantee::Group(Group::AllUsers), Permission::Read));
        acl.check_permission("anyone", RequiredAccess::Grant(Permission::Read)).unwrap();
        let err = acl
            .check_permission("anyone", RequiredAccess::Grant(Permission::Write))
            .unwrap_err();
        assert_eq!(*err.code(), S3ErrorCode::AccessDenied);
    }

    #[test]
    fn check_owner_enforces_immutability() {
        let acl = Acl::private(&owner("alice"));
        acl.check_owner("alice").unwrap();
        let err = acl.check_owner("bob").unwrap_err();
        assert_eq!(*err.code(), S3ErrorCode::OwnerMismatch);
    }

    #[test]
    fn from_headers_without_shorthand() {
        let headers = HeaderMap::new();
        let acl = Acl::from_headers(&headers, &owner("alice"), None).unwrap();
        assert!(acl.is_none());

        let acl = Acl::from_headers_or_private(&headers, &owner("alice"), None).unwrap();
        assert_eq!(acl, Acl::private(&owner("alice")));
    }

    #[test]
    fn from_headers_canned_public_read() {
        let mut headers = HeaderMap::new();
        headers.insert(crate::header::X_AMZ_ACL, HeaderValue::from_static("public-read"));
        let acl = Acl::from_headers(&headers, &owner("alice"), None).unwrap().unwrap();
        assert_eq!(acl.owner, owner("alice"));
        assert_eq!(
            acl.grants,
            vec![
                Grant::new(Grantee::Group(Group::AllUsers), Permission::Read),
                Grant::new(Grantee::User("alice".to_owned()), Permission::FullControl),
            ]
        );
    }

    #[test]
    fn from_headers_object_owner_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(crate::header::X_AMZ_ACL, HeaderValue::from_static("bucket-owner-read"));
        let acl = Acl::from_headers(&headers, &owner("alice"), Some(&owner("bob")))
            .unwrap()
            .unwrap();
        assert_eq!(acl.owner, owner("bob"));
        assert_eq!(
            acl.grants,
            vec![
                Grant::new(Grantee::User("alice".to_owned()), Permission::Read),
                Grant::new(Grantee::User("bob".to_owned()), Permission::FullControl),
            ]
        );
    }

    #[test]
    fn from_headers_unknown_canned_name() {
        let mut headers = HeaderMap::new();
        headers.insert(crate::header::X_AMZ_ACL, HeaderValue::from_static("shared"));
        let err = Acl::from_headers(&headers, &owner("alice"), None).unwrap_err();
        assert_eq!(*err.code(), S3ErrorCode::InvalidArgument);
    }

    #[test]
    fn from_headers_grant_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            crate::header::X_AMZ_GRANT_READ,
            HeaderValue::from_static("id=\"bob\", id=\"carol\""),
        );
        let acl = Acl::from_headers(&headers, &owner("alice"), None).unwrap().unwrap();
        assert_eq!(
            acl.grants,
            vec![
                Grant::new(Grantee::User("bob".to_owned()), Permission::Read),
                Grant::new(Grantee::User("carol".to_owned()), Permission::Read),
            ]
        );
    }

    #[test]
    fn from_headers_rejects_canned_and_grant_mix() {
        let mut headers = HeaderMap::new();
        headers.insert(crate::header::X_AMZ_ACL, HeaderValue::from_static("private"));
        headers.insert(crate::header::X_AMZ_GRANT_READ, HeaderValue::from_static("id=\"bob\""));
        let err = Acl::from_headers(&headers, &owner("alice"), None).unwrap_err();
        assert_eq!(*err.code(), S3ErrorCode::InvalidRequest);
    }
}
