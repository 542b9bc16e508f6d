//! Output connectors

use serde_json::{Value, json};

use super::{DatabaseLocation, MYSQL_SCHEME, OneOrMany, parse_mysql_uri};
use crate::credentials::{Credentials, IntoCredentials, UserPasswordCredentials};
use crate::error::{Error, ErrorCode, Result};
use crate::wire::{self, KeyError, Object, TagError, type_name};

/// Identifiers of the tagged wire form
pub const OUTPUT_IDENTIFIERS: [&str; 2] = [MySqlOutput::IDENTIFIER, TableOutput::IDENTIFIER];

/// Rows written into tables of a MySQL database
#[derive(Debug, Clone, PartialEq)]
pub struct MySqlOutput {
    uri: String,
    location: DatabaseLocation,
    destination_table: OneOrMany,
    credentials: Option<UserPasswordCredentials>,
}

impl MySqlOutput {
    /// Tag of the wire form
    pub const IDENTIFIER: &'static str = "mysql-output";
    const KEYS: [&'static str; 3] = ["uri", "destination_table", "credentials"];

    /// MySQL output writing into the given table or tables
    pub fn new(uri: &str, destination_table: impl Into<OneOrMany>) -> Result<Self> {
        let location = parse_mysql_uri(uri)
            .map_err(|scheme| Error::output(ErrorCode::OCE2, &[&scheme, &MYSQL_SCHEME, &uri]))?;
        Ok(Self {
            uri: uri.to_string(),
            location,
            destination_table: destination_table.into(),
            credentials: None,
        })
    }

    /// Attach user/password credentials
    pub fn with_credentials(mut self, credentials: impl IntoCredentials) -> Result<Self> {
        self.credentials = match credentials.into_credentials()? {
            Credentials::UserPassword(credentials) => Some(credentials),
            other => return Err(Error::output(ErrorCode::OCE9, &[&other.identifier()])),
        };
        Ok(self)
    }

    /// Database URI as given
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Database host
    pub fn host(&self) -> &str {
        &self.location.host
    }

    /// Database port, if given
    pub fn port(&self) -> Option<u16> {
        self.location.port
    }

    /// Database name
    pub fn database(&self) -> &str {
        &self.location.database
    }

    /// Destination table or tables, in the shape they were given
    pub fn destination_table(&self) -> &OneOrMany {
        &self.destination_table
    }

    /// Credentials, if any
    pub fn credentials(&self) -> Option<&UserPasswordCredentials> {
        self.credentials.as_ref()
    }

    /// Canonical tagged dictionary
    pub fn to_dict(&self) -> Value {
        json!({ Self::IDENTIFIER: {
            "uri": self.uri,
            "destination_table": self.destination_table,
            "credentials": self
                .credentials
                .clone()
                .map(|c| Credentials::from(c).to_dict()),
        }})
    }

    fn from_object(object: &Object) -> Result<Self> {
        check_keys(Self::IDENTIFIER, object, &Self::KEYS, &["uri", "destination_table"])?;
        let uri = object["uri"]
            .as_str()
            .ok_or_else(|| Error::output(ErrorCode::OCE11, &[&type_name(&object["uri"])]))?;
        let destination_table = &object["destination_table"];
        let destination_table = OneOrMany::from_value(destination_table).ok_or_else(|| {
            Error::output(ErrorCode::OCE8, &[&type_name(destination_table)])
        })?;
        let output = Self::new(uri, destination_table)?;
        match wire::field(object, "credentials") {
            Some(credentials) if !credentials.as_object().is_some_and(|c| c.is_empty()) => {
                output.with_credentials(credentials)
            }
            _ => Ok(output),
        }
    }
}

/// Tables stored in the system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOutput {
    table: OneOrMany,
}

impl TableOutput {
    /// Tag of the wire form
    pub const IDENTIFIER: &'static str = "table-output";

    /// Write into the given table or tables
    pub fn new(table: impl Into<OneOrMany>) -> Self {
        Self {
            table: table.into(),
        }
    }

    /// Table names
    pub fn tables(&self) -> &[String] {
        self.table.as_slice()
    }

    /// Canonical tagged dictionary
    pub fn to_dict(&self) -> Value {
        json!({ Self::IDENTIFIER: { "table": self.table.to_list() } })
    }

    fn from_object(object: &Object) -> Result<Self> {
        check_keys(Self::IDENTIFIER, object, &["table"], &["table"])?;
        let table = &object["table"];
        OneOrMany::from_value(table)
            .map(Self::new)
            .ok_or_else(|| Error::output(ErrorCode::OCE10, &[table, &type_name(table)]))
    }
}

/// Where a dataset writes its data to
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// MySQL tables
    MySql(MySqlOutput),
    /// Tables in the system
    Table(TableOutput),
}

impl Output {
    /// Tag of the wire form
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::MySql(_) => MySqlOutput::IDENTIFIER,
            Self::Table(_) => TableOutput::IDENTIFIER,
        }
    }

    /// Canonical tagged dictionary
    pub fn to_dict(&self) -> Value {
        match self {
            Self::MySql(output) => output.to_dict(),
            Self::Table(output) => output.to_dict(),
        }
    }

    fn from_dict(object: &Object) -> Result<Self> {
        let (identifier, inner) =
            wire::split_tagged(object, &OUTPUT_IDENTIFIERS).map_err(|e| match e {
                TagError::Keys(keys) => Error::output(
                    ErrorCode::OCE3,
                    &[&wire::quoted_list(&OUTPUT_IDENTIFIERS), &wire::quoted_list(&keys)],
                ),
                TagError::NotObject { identifier, found } => {
                    Error::output(ErrorCode::OCE4, &[&identifier, &found])
                }
            })?;
        let output = match identifier {
            MySqlOutput::IDENTIFIER => Self::MySql(MySqlOutput::from_object(inner)?),
            _ => Self::Table(TableOutput::from_object(inner)?),
        };
        tracing::debug!(identifier, "Built output from dictionary");
        Ok(output)
    }
}

impl From<MySqlOutput> for Output {
    fn from(output: MySqlOutput) -> Self {
        Self::MySql(output)
    }
}

impl From<TableOutput> for Output {
    fn from(output: TableOutput) -> Self {
        Self::Table(output)
    }
}

/// Anything that can be turned into an optional [`Output`]
pub trait IntoOutput {
    /// Resolve into an output; `None` when nothing was configured
    fn into_output(self) -> Result<Option<Output>>;
}

impl IntoOutput for Output {
    fn into_output(self) -> Result<Option<Output>> {
        Ok(Some(self))
    }
}

impl IntoOutput for MySqlOutput {
    fn into_output(self) -> Result<Option<Output>> {
        Ok(Some(self.into()))
    }
}

impl IntoOutput for TableOutput {
    fn into_output(self) -> Result<Option<Output>> {
        Ok(Some(self.into()))
    }
}

impl IntoOutput for &Value {
    fn into_output(self) -> Result<Option<Output>> {
        match self {
            Value::Null => Ok(None),
            Value::Object(object) if object.is_empty() => Ok(None),
            Value::Object(object) => Output::from_dict(object).map(Some),
            other => Err(Error::output(ErrorCode::OCE7, &[&type_name(other)])),
        }
    }
}

impl IntoOutput for Value {
    fn into_output(self) -> Result<Option<Output>> {
        (&self).into_output()
    }
}

impl<T: IntoOutput> IntoOutput for Option<T> {
    fn into_output(self) -> Result<Option<Output>> {
        match self {
            Some(output) => output.into_output(),
            None => Ok(None),
        }
    }
}

/// Build an output from a tagged dictionary or an output object
pub fn build_output(output: impl IntoOutput) -> Result<Option<Output>> {
    output.into_output()
}

fn check_keys(
    identifier: &str,
    object: &Object,
    accepted: &[&'static str],
    required: &[&'static str],
) -> Result<()> {
    wire::check_keys(object, accepted, required).map_err(|e| match e {
        KeyError::Missing(key) => Error::output(ErrorCode::OCE5, &[&identifier, &key]),
        KeyError::Unexpected(key) => Error::output(
            ErrorCode::OCE6,
            &[&identifier, &key, &wire::quoted_list(accepted)],
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_output() {
        let output = MySqlOutput::new("mysql://db:3306/warehouse", ["orders", "customers"])
            .unwrap()
            .with_credentials(UserPasswordCredentials::new("u", "p").unwrap())
            .unwrap();
        assert_eq!(output.database(), "warehouse");
        assert_eq!(output.destination_table().to_list(), vec!["orders", "customers"]);

        let dict = output.to_dict();
        assert_eq!(
            dict["mysql-output"]["destination_table"],
            json!(["orders", "customers"])
        );
        assert_eq!(build_output(&dict).unwrap(), Some(Output::MySql(output)));
    }

    #[test]
    fn test_mysql_output_keeps_single_table_shape() {
        let output = MySqlOutput::new("mysql://db/warehouse", "orders").unwrap();
        assert_eq!(output.port(), None);
        assert_eq!(
            output.to_dict(),
            json!({"mysql-output": {
                "uri": "mysql://db/warehouse",
                "destination_table": "orders",
                "credentials": null,
            }})
        );
    }

    #[test]
    fn test_mysql_output_errors() {
        let err = MySqlOutput::new("s3://bucket/x", "orders").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::OCE2));

        let err = build_output(json!({"mysql-output": {"uri": "mysql://db/w", "destination_table": 3}}))
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::OCE8));

        let err = build_output(json!({"mysql-output": {"uri": ["mysql://db/w"], "destination_table": "t"}}))
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::OCE11));

        let err = build_output(json!({"mysql-output": {
            "uri": "mysql://db/w",
            "destination_table": "t",
            "credentials": {"s3-access-key-credentials": {
                "aws_access_key_id": "a", "aws_secret_access_key": "b"
            }},
        }}))
        .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::OCE9));
    }

    #[test]
    fn test_table_output() {
        let output = build_output(json!({"table-output": {"table": "summary"}}))
            .unwrap()
            .unwrap();
        assert_eq!(output.to_dict(), json!({"table-output": {"table": ["summary"]}}));

        let err = build_output(json!({"table-output": {"table": {"name": "x"}}})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::OCE10));
        assert!(err.to_string().contains("dict"));
    }

    #[test]
    fn test_build_output_dispatch_errors() {
        assert_eq!(build_output(Value::Null).unwrap(), None);
        assert_eq!(build_output(json!({})).unwrap(), None);

        let err = build_output(json!({"s3-output": {}})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::OCE3));

        let err = build_output(json!({"table-output": "t"})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::OCE4));

        let err = build_output(json!({"table-output": {}})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::OCE5));

        let err = build_output(json!({"table-output": {"table": "t", "mode": "append"}})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::OCE6));

        let err = build_output(json!(["t"])).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::OCE7));
    }
}
