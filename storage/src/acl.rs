//! Canned ACLs that can be applied to uploaded objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Object canned ACL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectAcl {
    Private,
    PublicRead,
    PublicReadWrite,
    AuthenticatedRead,
    AwsExecRead,
    BucketOwnerRead,
    BucketOwnerFullControl,
}

impl ObjectAcl {
    pub const ALL: [ObjectAcl; 7] = [
        ObjectAcl::Private,
        ObjectAcl::PublicRead,
        ObjectAcl::PublicReadWrite,
        ObjectAcl::AuthenticatedRead,
        ObjectAcl::AwsExecRead,
        ObjectAcl::BucketOwnerRead,
        ObjectAcl::BucketOwnerFullControl,
    ];

    /// Wire value of the ACL header
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectAcl::Private => "private",
            ObjectAcl::PublicRead => "public-read",
            ObjectAcl::PublicReadWrite => "public-read-write",
            ObjectAcl::AuthenticatedRead => "authenticated-read",
            ObjectAcl::AwsExecRead => "aws-exec-read",
            ObjectAcl::BucketOwnerRead => "bucket-owner-read",
            ObjectAcl::BucketOwnerFullControl => "bucket-owner-full-control",
        }
    }

    /// Parse an optional user value. Blank input means no ACL.
    pub fn parse_optional(value: Option<&str>) -> Result<Option<ObjectAcl>, String> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(v) => v.parse().map(Some),
        }
    }
}

impl fmt::Display for ObjectAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectAcl {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ObjectAcl::ALL
            .iter()
            .copied()
            .find(|acl| acl.as_str() == wanted)
            .ok_or_else(|| {
                let valid: Vec<&str> = ObjectAcl::ALL.iter().map(|a| a.as_str()).collect();
                format!("Unknown ACL '{}', expected one of: {}", s, valid.join(", "))
            })
    }
}

impl From<ObjectAcl> for aws_sdk_s3::types::ObjectCannedAcl {
    fn from(acl: ObjectAcl) -> Self {
        aws_sdk_s3::types::ObjectCannedAcl::from(acl.as_str())
    }
}
