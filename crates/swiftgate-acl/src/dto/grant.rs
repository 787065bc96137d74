//! Grant value objects

use crate::error::*;

use std::fmt;

/// Identifies the creator of a resource.
///
/// The owner holds implicit full permission over the resource and is the only
/// identity allowed to pass an `OWNER`-level checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub id: String,
    pub display_name: Option<String>,
}

impl Owner {
    #[must_use]
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: Some(display_name.into()),
        }
    }
}

/// A grantable permission.
///
/// `FULL_CONTROL` subsumes every other permission during evaluation. The ACP
/// variants govern access to the ACL itself, not to the resource content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    FullControl,
    Read,
    Write,
    ReadAcp,
    WriteAcp,
}

impl Permission {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FullControl => "FULL_CONTROL",
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::ReadAcp => "READ_ACP",
            Self::WriteAcp => "WRITE_ACP",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "FULL_CONTROL" => Some(Self::FullControl),
            "READ" => Some(Self::Read),
            "WRITE" => Some(Self::Write),
            "READ_ACP" => Some(Self::ReadAcp),
            "WRITE_ACP" => Some(Self::WriteAcp),
            _ => None,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A well-known grantee group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    /// Every caller, authenticated or not
    AllUsers,
    /// Every authenticated caller
    AuthenticatedUsers,
    /// The log delivery agent
    LogDelivery,
}

impl Group {
    #[must_use]
    pub const fn uri(self) -> &'static str {
        match self {
            Self::AllUsers => "http://acs.amazonaws.com/groups/global/AllUsers",
            Self::AuthenticatedUsers => "http://acs.amazonaws.com/groups/global/AuthenticatedUsers",
            Self::LogDelivery => "http://acs.amazonaws.com/groups/s3/LogDelivery",
        }
    }

    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        [Self::AllUsers, Self::AuthenticatedUsers, Self::LogDelivery]
            .into_iter()
            .find(|g| g.uri() == uri)
    }

    #[must_use]
    fn matches(self, _user_id: &str) -> bool {
        match self {
            // Identities reaching this core are already authenticated, so
            // both global groups cover every caller.
            Self::AllUsers | Self::AuthenticatedUsers => true,
            // Log delivery agents are not modeled as callers.
            Self::LogDelivery => false,
        }
    }
}

/// The receiving side of a grant: a single identity or a well-known group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grantee {
    User(String),
    Group(Group),
}

impl Grantee {
    #[must_use]
    pub fn matches(&self, user_id: &str) -> bool {
        match self {
            Self::User(id) => id == user_id,
            Self::Group(group) => group.matches(user_id),
        }
    }

    /// Parses a single item of an `x-amz-grant-*` header value, e.g.
    /// `id="account"` or `uri="http://acs.amazonaws.com/groups/global/AllUsers"`.
    ///
    /// # Errors
    /// Returns `NotImplemented` for `emailAddress=` grants and
    /// `InvalidArgument` for anything else that is not a known grant form.
    pub fn from_header(item: &str) -> S3Result<Self> {
        let item = item.trim();
        let Some((kind, value)) = item.split_once('=') else {
            return Err(s3_error!(InvalidArgument, "invalid grant item: {item:?}"));
        };
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        match kind.trim() {
            "id" => Ok(Self::User(value.to_owned())),
            "uri" => match Group::from_uri(value) {
                Some(group) => Ok(Self::Group(group)),
                None => Err(s3_error!(InvalidArgument, "invalid group uri: {value:?}")),
            },
            "emailAddress" => Err(s3_error!(NotImplemented, "Grant by email address is not supported")),
            other => Err(s3_error!(InvalidArgument, "invalid grant key: {other:?}")),
        }
    }
}

impl fmt::Display for Grantee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => f.write_str(id),
            Self::Group(group) => f.write_str(group.uri()),
        }
    }
}

/// A single (grantee, permission) pair within an ACL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub grantee: Grantee,
    pub permission: Permission,
}

impl Grant {
    #[must_use]
    pub fn new(grantee: Grantee, permission: Permission) -> Self {
        Self { grantee, permission }
    }

    /// Whether this grant gives `user_id` exactly `permission`.
    #[must_use]
    pub fn allow(&self, user_id: &str, permission: Permission) -> bool {
        self.permission == permission && self.grantee.matches(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_strings() {
        for p in [
            Permission::FullControl,
            Permission::Read,
            Permission::Write,
            Permission::ReadAcp,
            Permission::WriteAcp,
        ] {
            assert_eq!(Permission::parse(p.as_str()), Some(p));
        }
        assert_eq!(Permission::parse("OWNER"), None);
        assert_eq!(Permission::parse("read"), None);
    }

    #[test]
    fn grantee_from_header() {
        let g = Grantee::from_header(" id=\"alice\" ").unwrap();
        assert_eq!(g, Grantee::User("alice".to_owned()));

        let g = Grantee::from_header("uri=\"http://acs.amazonaws.com/groups/global/AllUsers\"").unwrap();
        assert_eq!(g, Grantee::Group(Group::AllUsers));

        let err = Grantee::from_header("emailAddress=\"a@example.com\"").unwrap_err();
        assert_eq!(*err.code(), crate::S3ErrorCode::NotImplemented);

        let err = Grantee::from_header("uri=\"http://example.com/not-a-group\"").unwrap_err();
        assert_eq!(*err.code(), crate::S3ErrorCode::InvalidArgument);

        let err = Grantee::from_header("alice").unwrap_err();
        assert_eq!(*err.code(), crate::S3ErrorCode::InvalidArgument);
    }

    #[test]
    fn group_matching() {
        assert!(Grantee::Group(Group::AllUsers).matches("anyone"));
        assert!(Grantee::Group(Group::AuthenticatedUsers).matches("anyone"));
        assert!(!Grantee::Group(Group::LogDelivery).matches("anyone"));
        assert!(Grantee::User("alice".to_owned()).matches("alice"));
        assert!(!Grantee::User("alice".to_owned()).matches("bob"));
    }
}
