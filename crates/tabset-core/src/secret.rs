//! Secrets referenced by credentials
//!
//! A secret is either carried inline, read from an environment variable, or
//! looked up in a HashiCorp Vault by the server.

use std::fmt;

use serde_json::{Value, json};

use crate::error::{Error, ErrorCode, Result};
use crate::wire::{self, KeyError, Object, TagError, type_name};

/// Identifiers of the tagged wire form
pub const SECRET_IDENTIFIERS: [&str; 3] = ["direct-secret", "env-secret", "hashicorp-secret"];

/// A secret value or a reference to one
#[derive(Clone, PartialEq, Eq)]
pub enum Secret {
    /// Value given inline
    Direct {
        /// The secret itself
        secret_direct_value: String,
    },
    /// Value read from an environment variable
    Environment {
        /// Variable holding the secret
        environment_variable_name: String,
    },
    /// Value stored in a HashiCorp Vault
    HashiCorp {
        /// Vault path of the secret
        path: String,
        /// Key within the path
        name: String,
    },
}

impl Secret {
    /// Inline secret
    pub fn direct(value: impl Into<String>) -> Self {
        Self::Direct {
            secret_direct_value: value.into(),
        }
    }

    /// Secret read from an environment variable
    pub fn env(name: impl Into<String>) -> Self {
        Self::Environment {
            environment_variable_name: name.into(),
        }
    }

    /// Secret stored in HashiCorp Vault
    pub fn hashicorp(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self::HashiCorp {
            path: path.into(),
            name: name.into(),
        }
    }

    /// Tag of the wire form
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::Direct { .. } => "direct-secret",
            Self::Environment { .. } => "env-secret",
            Self::HashiCorp { .. } => "hashicorp-secret",
        }
    }

    /// The secret value when it can be resolved locally
    ///
    /// Vault secrets are only resolved by the server, so they yield `None`.
    pub fn secret_value(&self) -> Option<String> {
        match self {
            Self::Direct {
                secret_direct_value,
            } => Some(secret_direct_value.clone()),
            Self::Environment {
                environment_variable_name,
            } => std::env::var(environment_variable_name).ok(),
            Self::HashiCorp { .. } => None,
        }
    }

    /// Canonical tagged dictionary
    pub fn to_dict(&self) -> Value {
        let fields = match self {
            Self::Direct {
                secret_direct_value,
            } => json!({ "secret_direct_value": secret_direct_value }),
            Self::Environment {
                environment_variable_name,
            } => json!({ "environment_variable_name": environment_variable_name }),
            Self::HashiCorp { path, name } => json!({ "path": path, "name": name }),
        };
        json!({ self.identifier(): fields })
    }

    fn from_dict(object: &Object) -> Result<Self> {
        let (identifier, inner) =
            wire::split_tagged(object, &SECRET_IDENTIFIERS).map_err(|e| match e {
                TagError::Keys(keys) => Error::secret(
                    ErrorCode::SCE1,
                    &[&wire::quoted_list(&SECRET_IDENTIFIERS), &wire::quoted_list(&keys)],
                ),
                TagError::NotObject { identifier, found } => {
                    Error::secret(ErrorCode::SCE2, &[&identifier, &found])
                }
            })?;

        let keys: &[&'static str] = match identifier {
            "direct-secret" => &["secret_direct_value"],
            "env-secret" => &["environment_variable_name"],
            _ => &["path", "name"],
        };
        let text = |key: &'static str| {
            inner
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| Error::secret(ErrorCode::SCE4, &[&identifier, &key]))
        };
        match wire::check_keys(inner, keys, keys) {
            Err(KeyError::Unexpected(key)) => {
                return Err(Error::secret(
                    ErrorCode::SCE5,
                    &[&identifier, &key, &wire::quoted_list(keys)],
                ));
            }
            Err(KeyError::Missing(key)) => {
                return Err(Error::secret(ErrorCode::SCE4, &[&identifier, &key]));
            }
            Ok(()) => {}
        }

        Ok(match identifier {
            "direct-secret" => Self::direct(text("secret_direct_value")?),
            "env-secret" => Self::env(text("environment_variable_name")?),
            _ => Self::hashicorp(text("path")?, text("name")?),
        })
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct { .. } => f
                .debug_struct("Direct")
                .field("secret_direct_value", &"<redacted>")
                .finish(),
            Self::Environment {
                environment_variable_name,
            } => f
                .debug_struct("Environment")
                .field("environment_variable_name", environment_variable_name)
                .finish(),
            Self::HashiCorp { path, name } => f
                .debug_struct("HashiCorp")
                .field("path", path)
                .field("name", name)
                .finish(),
        }
    }
}

/// Anything that can be turned into a [`Secret`]
pub trait IntoSecret {
    /// Resolve into a secret
    fn into_secret(self) -> Result<Secret>;
}

impl IntoSecret for Secret {
    fn into_secret(self) -> Result<Secret> {
        Ok(self)
    }
}

impl IntoSecret for &str {
    fn into_secret(self) -> Result<Secret> {
        Ok(Secret::direct(self))
    }
}

impl IntoSecret for String {
    fn into_secret(self) -> Result<Secret> {
        Ok(Secret::direct(self))
    }
}

impl IntoSecret for &Value {
    fn into_secret(self) -> Result<Secret> {
        match self {
            Value::String(s) => Ok(Secret::direct(s.as_str())),
            Value::Object(object) => Secret::from_dict(object),
            other => Err(Error::secret(
                ErrorCode::SCE3,
                &[&"str, dict, Secret", &type_name(other)],
            )),
        }
    }
}

impl IntoSecret for Value {
    fn into_secret(self) -> Result<Secret> {
        (&self).into_secret()
    }
}

/// Build a secret from a plain string, a tagged dictionary or a secret
pub fn build_secret(secret: impl IntoSecret) -> Result<Secret> {
    secret.into_secret()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_string_is_direct() {
        let secret = build_secret("hunter2").unwrap();
        assert_eq!(secret, Secret::direct("hunter2"));
        assert_eq!(secret.secret_value().as_deref(), Some("hunter2"));
    }

    #[test]
    fn test_from_dict() {
        let secret = build_secret(json!({"env-secret": {"environment_variable_name": "TOKEN"}})).unwrap();
        assert_eq!(secret, Secret::env("TOKEN"));

        let secret =
            build_secret(json!({"hashicorp-secret": {"path": "kv/db", "name": "password"}})).unwrap();
        assert_eq!(secret, Secret::hashicorp("kv/db", "password"));
        assert_eq!(secret.secret_value(), None);
    }

    #[test]
    fn test_round_trip() {
        for secret in [
            Secret::direct("x"),
            Secret::env("HOME_TOKEN"),
            Secret::hashicorp("a/b", "c"),
        ] {
            assert_eq!(build_secret(secret.to_dict()).unwrap(), secret);
        }
    }

    #[test]
    fn test_bad_shapes() {
        let err = build_secret(json!({"vault-secret": {}})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::SCE1));

        let err = build_secret(json!({"env-secret": "TOKEN"})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::SCE2));

        let err = build_secret(json!(12)).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::SCE3));

        let err = build_secret(json!({"hashicorp-secret": {"path": "a"}})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::SCE4));

        let err = build_secret(json!({"direct-secret": {"secret_direct_value": 5}})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::SCE4));

        let err = build_secret(json!({"direct-secret": {"secret_direct_value": "x", "extra": 1}}))
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::SCE5));
    }

    #[test]
    fn test_debug_redacts_direct_values() {
        let rendered = format!("{:?}", Secret::direct("hunter2"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("redacted"));
    }
}
