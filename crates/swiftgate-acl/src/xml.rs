//! `AccessControlPolicy` XML codec
//!
//! Only the logical shape of the document matters here; well-formedness and
//! schema checks beyond it belong to the boundary layer.

use crate::dto::{Acl, Grant, Grantee, Group, Owner, Permission};

use quick_xml::events::Event;
use serde::{Deserialize, Serialize};

/// Root element of an ACL document.
pub const ROOT_TAG: &str = "AccessControlPolicy";

const XMLNS: &str = "http://s3.amazonaws.com/doc/2006-03-01/";
const XMLNS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

const GRANTEE_TYPE_USER: &str = "CanonicalUser";
const GRANTEE_TYPE_GROUP: &str = "Group";

/// [`parse`] / [`to_xml`] failure.
#[derive(Debug, thiserror::Error)]
pub enum AclXmlError {
    #[error("AclXmlError: InvalidEncoding")]
    InvalidEncoding,

    #[error("AclXmlError: UnexpectedRoot")]
    UnexpectedRoot,

    #[error("AclXmlError: EmptyOwner")]
    EmptyOwner,

    #[error("AclXmlError: InvalidPermission: {0:?}")]
    InvalidPermission(String),

    #[error("AclXmlError: InvalidGrantee: {0:?}")]
    InvalidGrantee(String),

    #[error("AclXmlError: MissingGranteeId")]
    MissingGranteeId,

    #[error("AclXmlError: UnknownGroup: {0:?}")]
    UnknownGroup(String),

    #[error("AclXmlError: {0}")]
    Read(#[from] quick_xml::Error),

    #[error("AclXmlError: {0}")]
    De(#[from] quick_xml::DeError),

    #[error("AclXmlError: {0}")]
    Se(#[from] quick_xml::SeError),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "AccessControlPolicy")]
struct AccessControlPolicyXml {
    #[serde(rename = "@xmlns", default, skip_serializing_if = "Option::is_none")]
    xmlns: Option<String>,

    #[serde(rename = "Owner")]
    owner: OwnerXml,

    #[serde(rename = "AccessControlList")]
    access_control_list: AccessControlListXml,
}

#[derive(Debug, Serialize, Deserialize)]
struct OwnerXml {
    #[serde(rename = "ID")]
    id: String,

    #[serde(rename = "DisplayName", default, skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AccessControlListXml {
    #[serde(rename = "Grant", default)]
    grants: Vec<GrantXml>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GrantXml {
    #[serde(rename = "Grantee")]
    grantee: GranteeXml,

    #[serde(rename = "Permission")]
    permission: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct GranteeXml {
    #[serde(rename = "@xmlns:xsi", default, skip_serializing_if = "Option::is_none")]
    xmlns_xsi: Option<String>,

    #[serde(rename = "@xsi:type", alias = "@type")]
    type_: String,

    #[serde(rename = "ID", default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,

    #[serde(rename = "DisplayName", default, skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,

    #[serde(rename = "URI", default, skip_serializing_if = "Option::is_none")]
    uri: Option<String>,
}

/// Parses an `AccessControlPolicy` document.
///
/// # Errors
/// Returns an error if the body is not such a document or any of its grants
/// fails validation.
pub fn parse(body: &[u8]) -> Result<Acl, AclXmlError> {
    let text = std::str::from_utf8(body).map_err(|_| AclXmlError::InvalidEncoding)?;
    check_root(text)?;
    let doc: AccessControlPolicyXml = quick_xml::de::from_str(text)?;
    convert(doc)
}

/// Renders an ACL back into its `AccessControlPolicy` document.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn to_xml(acl: &Acl) -> Result<String, AclXmlError> {
    let doc = build_document(acl);
    Ok(quick_xml::se::to_string(&doc)?)
}

/// The serde layer accepts any root element name, so the root tag is checked
/// upfront.
fn check_root(text: &str) -> Result<(), AclXmlError> {
    let mut reader = quick_xml::Reader::from_str(text);
    loop {
        match reader.read_event()? {
            Event::Decl(_) | Event::Comment(_) | Event::DocType(_) | Event::PI(_) => {}
            Event::Text(t) if t.iter().all(u8::is_ascii_whitespace) => {}
            Event::Start(e) | Event::Empty(e) => {
                if e.local_name().as_ref() == ROOT_TAG.as_bytes() {
                    return Ok(());
                }
                return Err(AclXmlError::UnexpectedRoot);
            }
            _ => return Err(AclXmlError::UnexpectedRoot),
        }
    }
}

fn convert(doc: AccessControlPolicyXml) -> Result<Acl, AclXmlError> {
    if doc.owner.id.is_empty() {
        return Err(AclXmlError::EmptyOwner);
    }
    let owner = Owner {
        id: doc.owner.id,
        display_name: doc.owner.display_name,
    };
    let grants = doc
        .access_control_list
        .grants
        .into_iter()
        .map(convert_grant)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Acl::new(owner, grants))
}

fn convert_grant(grant: GrantXml) -> Result<Grant, AclXmlError> {
    let Some(permission) = Permission::parse(&grant.permission) else {
        return Err(AclXmlError::InvalidPermission(grant.permission));
    };
    let grantee = match grant.grantee.type_.as_str() {
        GRANTEE_TYPE_USER => {
            let id = grant.grantee.id.ok_or(AclXmlError::MissingGranteeId)?;
            Grantee::User(id)
        }
        GRANTEE_TYPE_GROUP => {
            let uri = grant.grantee.uri.ok_or(AclXmlError::MissingGranteeId)?;
            match Group::from_uri(&uri) {
                Some(group) => Grantee::Group(group),
                None => return Err(AclXmlError::UnknownGroup(uri)),
            }
        }
        _ => return Err(AclXmlError::InvalidGrantee(grant.grantee.type_)),
    };
    Ok(Grant::new(grantee, permission))
}

fn build_document(acl: &Acl) -> AccessControlPolicyXml {
    let grants = acl.grants.iter().map(build_grant).collect();
    AccessControlPolicyXml {
        xmlns: Some(XMLNS.to_owned()),
        owner: OwnerXml {
            id: acl.owner.id.clone(),
            display_name: acl.owner.display_name.clone(),
        },
        access_control_list: AccessControlListXml { grants },
    }
}

fn build_grant(grant: &Grant) -> GrantXml {
    let grantee = match &grant.grantee {
        Grantee::User(id) => GranteeXml {
            xmlns_xsi: Some(XMLNS_XSI.to_owned()),
            type_: GRANTEE_TYPE_USER.to_owned(),
            id: Some(id.clone()),
            display_name: None,
            uri: None,
        },
        Grantee::Group(group) => GranteeXml {
            xmlns_xsi: Some(XMLNS_XSI.to_owned()),
            type_: GRANTEE_TYPE_GROUP.to_owned(),
            id: None,
            display_name: None,
            uri: Some(group.uri().to_owned()),
        },
    };
    GrantXml {
        grantee,
        permission: grant.permission.as_str().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_canonical_user_and_group() {
        let body = concat!(
            "<AccessControlPolicy xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">",
            "<Owner><ID>alice</ID><DisplayName>alice</DisplayName></Owner>",
            "<AccessControlList>",
            "<Grant>",
            "<Grantee xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" xsi:type=\"CanonicalUser\">",
            "<ID>bob</ID>",
            "</Grantee>",
            "<Permission>READ</Permission>",
            "</Grant>",
            "<Grant>",
            "<Grantee xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" xsi:type=\"Group\">",
            "<URI>http://acs.amazonaws.com/groups/global/AllUsers</URI>",
            "</Grantee>",
            "<Permission>READ_ACP</Permission>",
            "</Grant>",
            "</AccessControlList>",
            "</AccessControlPolicy>",
        );

        let acl = parse(body.as_bytes()).unwrap();
        assert_eq!(acl.owner.id, "alice");
        assert_eq!(acl.grants.len(), 2);
        assert_eq!(
            acl.grants[0],
            Grant::new(Grantee::User("bob".to_owned()), Permission::Read)
        );
        assert_eq!(
            acl.grants[1],
            Grant::new(Grantee::Group(Group::AllUsers), Permission::ReadAcp)
        );
    }

    #[test]
    fn parse_empty_grant_list() {
        let body = concat!(
            "<AccessControlPolicy>",
            "<Owner><ID>alice</ID></Owner>",
            "<AccessControlList></AccessControlList>",
            "</AccessControlPolicy>",
        );
        let acl = parse(body.as_bytes()).unwrap();
        assert_eq!(acl.owner.id, "alice");
        assert!(acl.grants.is_empty());
        assert!(acl.owner.display_name.is_none());
    }

    #[test]
    fn parse_rejects_unexpected_root() {
        let body = "<LifecycleConfiguration></LifecycleConfiguration>";
        assert!(matches!(
            parse(body.as_bytes()),
            Err(AclXmlError::UnexpectedRoot)
        ));
    }

    #[test]
    fn parse_rejects_truncated_document() {
        let body = "<AccessControlPolicy><Owner><ID>alice";
        assert!(parse(body.as_bytes()).is_err());
    }

    #[test]
    fn parse_rejects_invalid_permission() {
        let body = concat!(
            "<AccessControlPolicy>",
            "<Owner><ID>alice</ID></Owner>",
            "<AccessControlList>",
            "<Grant>",
            "<Grantee xsi:type=\"CanonicalUser\"><ID>bob</ID></Grantee>",
            "<Permission>OWNER</Permission>",
            "</Grant>",
            "</AccessControlList>",
            "</AccessControlPolicy>",
        );
        assert!(matches!(
            parse(body.as_bytes()),
            Err(AclXmlError::InvalidPermission(p)) if p == "OWNER"
        ));
    }

    #[test]
    fn parse_rejects_unknown_group_uri() {
        let body = concat!(
            "<AccessControlPolicy>",
            "<Owner><ID>alice</ID></Owner>",
            "<AccessControlList>",
            "<Grant>",
            "<Grantee xsi:type=\"Group\"><URI>http://example.com/everyone</URI></Grantee>",
            "<Permission>READ</Permission>",
            "</Grant>",
            "</AccessControlList>",
            "</AccessControlPolicy>",
        );
        assert!(matches!(
            parse(body.as_bytes()),
            Err(AclXmlError::UnknownGroup(_))
        ));
    }

    #[test]
    fn serialized_document_parses_back() {
        let owner = Owner::new("alice", "alice");
        let mut acl = Acl::private(&owner);
        acl.grants.push(Grant::new(Grantee::Group(Group::AllUsers), Permission::Read));

        let body = to_xml(&acl).unwrap();
        assert!(body.starts_with("<AccessControlPolicy"));

        let parsed = parse(body.as_bytes()).unwrap();
        assert_eq!(parsed, acl);
    }
}
