//! Credentials used by connectors to reach external systems

use serde_json::{Value, json};

use crate::error::{Error, ErrorCode, Result};
use crate::secret::{Secret, build_secret};
use crate::wire::{self, KeyError, Object, TagError, type_name};

/// Identifiers of the tagged wire form
pub const CREDENTIALS_IDENTIFIERS: [&str; 3] = [
    S3AccessKeyCredentials::IDENTIFIER,
    AzureAccountKeyCredentials::IDENTIFIER,
    UserPasswordCredentials::IDENTIFIER,
];

/// AWS access key pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3AccessKeyCredentials {
    /// Access key id
    pub aws_access_key_id: Secret,
    /// Secret access key
    pub aws_secret_access_key: Secret,
}

impl S3AccessKeyCredentials {
    /// Tag of the wire form
    pub const IDENTIFIER: &'static str = "s3-access-key-credentials";
    const KEYS: [&'static str; 2] = ["aws_access_key_id", "aws_secret_access_key"];

    /// Build from anything that resolves to secrets
    pub fn new(
        aws_access_key_id: impl crate::secret::IntoSecret,
        aws_secret_access_key: impl crate::secret::IntoSecret,
    ) -> Result<Self> {
        Ok(Self {
            aws_access_key_id: build_secret(aws_access_key_id)?,
            aws_secret_access_key: build_secret(aws_secret_access_key)?,
        })
    }
}

/// Azure storage account name and key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureAccountKeyCredentials {
    /// Storage account name
    pub azure_account_name: Secret,
    /// Storage account key
    pub azure_account_key: Secret,
}

impl AzureAccountKeyCredentials {
    /// Tag of the wire form
    pub const IDENTIFIER: &'static str = "azure-account-key-credentials";
    const KEYS: [&'static str; 2] = ["azure_account_name", "azure_account_key"];

    /// Build from anything that resolves to secrets
    pub fn new(
        azure_account_name: impl crate::secret::IntoSecret,
        azure_account_key: impl crate::secret::IntoSecret,
    ) -> Result<Self> {
        Ok(Self {
            azure_account_name: build_secret(azure_account_name)?,
            azure_account_key: build_secret(azure_account_key)?,
        })
    }
}

/// Database user and password
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPasswordCredentials {
    /// User name
    pub user: Secret,
    /// Password
    pub password: Secret,
}

impl UserPasswordCredentials {
    /// Tag of the wire form
    pub const IDENTIFIER: &'static str = "user-password-credentials";
    const KEYS: [&'static str; 2] = ["user", "password"];

    /// Build from anything that resolves to secrets
    pub fn new(
        user: impl crate::secret::IntoSecret,
        password: impl crate::secret::IntoSecret,
    ) -> Result<Self> {
        Ok(Self {
            user: build_secret(user)?,
            password: build_secret(password)?,
        })
    }
}

/// Any kind of credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// AWS access key pair
    S3AccessKey(S3AccessKeyCredentials),
    /// Azure account key
    AzureAccountKey(AzureAccountKeyCredentials),
    /// User and password
    UserPassword(UserPasswordCredentials),
}

impl Credentials {
    /// Tag of the wire form
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::S3AccessKey(_) => S3AccessKeyCredentials::IDENTIFIER,
            Self::AzureAccountKey(_) => AzureAccountKeyCredentials::IDENTIFIER,
            Self::UserPassword(_) => UserPasswordCredentials::IDENTIFIER,
        }
    }

    /// Canonical tagged dictionary
    pub fn to_dict(&self) -> Value {
        let fields = match self {
            Self::S3AccessKey(c) => json!({
                "aws_access_key_id": c.aws_access_key_id.to_dict(),
                "aws_secret_access_key": c.aws_secret_access_key.to_dict(),
            }),
            Self::AzureAccountKey(c) => json!({
                "azure_account_name": c.azure_account_name.to_dict(),
                "azure_account_key": c.azure_account_key.to_dict(),
            }),
            Self::UserPassword(c) => json!({
                "user": c.user.to_dict(),
                "password": c.password.to_dict(),
            }),
        };
        json!({ self.identifier(): fields })
    }

    fn from_dict(object: &Object) -> Result<Self> {
        let (identifier, inner) =
            wire::split_tagged(object, &CREDENTIALS_IDENTIFIERS).map_err(|e| match e {
                TagError::Keys(keys) => Error::credentials(
                    ErrorCode::CCE1,
                    &[
                        &wire::quoted_list(&CREDENTIALS_IDENTIFIERS),
                        &wire::quoted_list(&keys),
                    ],
                ),
                TagError::NotObject { identifier, found } => {
                    Error::credentials(ErrorCode::CCE2, &[&identifier, &found])
                }
            })?;

        let [first, second] = match identifier {
            S3AccessKeyCredentials::IDENTIFIER => S3AccessKeyCredentials::KEYS,
            AzureAccountKeyCredentials::IDENTIFIER => AzureAccountKeyCredentials::KEYS,
            _ => UserPasswordCredentials::KEYS,
        };
        match wire::check_keys(inner, &[first, second], &[first, second]) {
            Err(KeyError::Unexpected(key)) => {
                return Err(Error::credentials(
                    ErrorCode::CCE5,
                    &[&identifier, &key, &wire::quoted_list(&[first, second])],
                ));
            }
            Err(KeyError::Missing(key)) => {
                return Err(Error::credentials(ErrorCode::CCE4, &[&identifier, &key]));
            }
            Ok(()) => {}
        }
        let first = build_secret(&inner[first])?;
        let second = build_secret(&inner[second])?;

        Ok(match identifier {
            S3AccessKeyCredentials::IDENTIFIER => Self::S3AccessKey(S3AccessKeyCredentials {
                aws_access_key_id: first,
                aws_secret_access_key: second,
            }),
            AzureAccountKeyCredentials::IDENTIFIER => {
                Self::AzureAccountKey(AzureAccountKeyCredentials {
                    azure_account_name: first,
                    azure_account_key: second,
                })
            }
            _ => Self::UserPassword(UserPasswordCredentials {
                user: first,
                password: second,
            }),
        })
    }
}

impl From<S3AccessKeyCredentials> for Credentials {
    fn from(c: S3AccessKeyCredentials) -> Self {
        Self::S3AccessKey(c)
    }
}

impl From<AzureAccountKeyCredentials> for Credentials {
    fn from(c: AzureAccountKeyCredentials) -> Self {
        Self::AzureAccountKey(c)
    }
}

impl From<UserPasswordCredentials> for Credentials {
    fn from(c: UserPasswordCredentials) -> Self {
        Self::UserPassword(c)
    }
}

/// Anything that can be turned into [`Credentials`]
pub trait IntoCredentials {
    /// Resolve into credentials
    fn into_credentials(self) -> Result<Credentials>;
}

impl IntoCredentials for Credentials {
    fn into_credentials(self) -> Result<Credentials> {
        Ok(self)
    }
}

impl IntoCredentials for S3AccessKeyCredentials {
    fn into_credentials(self) -> Result<Credentials> {
        Ok(self.into())
    }
}

impl IntoCredentials for AzureAccountKeyCredentials {
    fn into_credentials(self) -> Result<Credentials> {
        Ok(self.into())
    }
}

impl IntoCredentials for UserPasswordCredentials {
    fn into_credentials(self) -> Result<Credentials> {
        Ok(self.into())
    }
}

impl IntoCredentials for &Value {
    fn into_credentials(self) -> Result<Credentials> {
        match self {
            Value::Object(object) => Credentials::from_dict(object),
            other => Err(Error::credentials(
                ErrorCode::CCE3,
                &[&"dict, Credentials", &type_name(other)],
            )),
        }
    }
}

impl IntoCredentials for Value {
    fn into_credentials(self) -> Result<Credentials> {
        (&self).into_credentials()
    }
}

/// Build credentials from a tagged dictionary or a credentials object
pub fn build_credentials(credentials: impl IntoCredentials) -> Result<Credentials> {
    credentials.into_credentials()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_s3_from_dict() {
        let creds = build_credentials(json!({
            "s3-access-key-credentials": {
                "aws_access_key_id": "AKIA",
                "aws_secret_access_key": {"env-secret": {"environment_variable_name": "AWS_SECRET"}},
            }
        }))
        .unwrap();
        let Credentials::S3AccessKey(s3) = &creds else {
            panic!("Expected S3 credentials");
        };
        assert_eq!(s3.aws_access_key_id, Secret::direct("AKIA"));
        assert_eq!(s3.aws_secret_access_key, Secret::env("AWS_SECRET"));
    }

    #[test]
    fn test_round_trip() {
        let all: [Credentials; 3] = [
            S3AccessKeyCredentials::new("id", "key").unwrap().into(),
            AzureAccountKeyCredentials::new("account", Secret::env("AZ_KEY"))
                .unwrap()
                .into(),
            UserPasswordCredentials::new("admin", Secret::hashicorp("kv/db", "pw"))
                .unwrap()
                .into(),
        ];
        for creds in all {
            assert_eq!(build_credentials(creds.to_dict()).unwrap(), creds);
        }
    }

    #[test]
    fn test_to_dict_nests_secrets() {
        let creds: Credentials = UserPasswordCredentials::new("admin", "pw").unwrap().into();
        assert_eq!(
            creds.to_dict(),
            json!({"user-password-credentials": {
                "user": {"direct-secret": {"secret_direct_value": "admin"}},
                "password": {"direct-secret": {"secret_direct_value": "pw"}},
            }})
        );
    }

    #[test]
    fn test_bad_shapes() {
        let err = build_credentials(json!({"gcs-credentials": {}})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::CCE1));

        let err = build_credentials(json!({"user-password-credentials": []})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::CCE2));

        let err = build_credentials(json!("admin:pw")).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::CCE3));

        let err = build_credentials(json!({"user-password-credentials": {"user": "a"}})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::CCE4));

        let err = build_credentials(json!({"user-password-credentials": {
            "user": "a", "password": "b", "host": "c"
        }}))
        .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::CCE5));
    }

    #[test]
    fn test_bad_secret_inside_credentials() {
        let err = build_credentials(json!({"user-password-credentials": {
            "user": "a", "password": 42
        }}))
        .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::SCE3));
    }
}
