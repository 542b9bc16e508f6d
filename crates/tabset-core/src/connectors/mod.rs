//! Input and output connector configurations
//!
//! Connectors describe where a dataset reads its data from and where it
//! writes it to. Each variant validates its fields when it is built and
//! serializes to a single-key dictionary `{"<identifier>": {...}}`.
//!
//! | Identifier        | Type              |
//! |-------------------|-------------------|
//! | `azure-input`     | [`AzureInput`]    |
//! | `localfile-input` | [`LocalFileInput`]|
//! | `mysql-input`     | [`MySqlInput`]    |
//! | `s3-input`        | [`S3Input`]       |
//! | `table-input`     | [`TableInput`]    |
//! | `mysql-output`    | [`MySqlOutput`]   |
//! | `table-output`    | [`TableOutput`]   |

mod input;
mod output;

pub use input::{
    AzureInput, AzureInputBuilder, INPUT_IDENTIFIERS, Input, IntoInput, LocalFileInput,
    LocalFileInputBuilder, MySqlInput, S3_REGIONS, S3Input, S3InputBuilder, TableInput,
    build_input,
};
pub use output::{
    IntoOutput, MySqlOutput, OUTPUT_IDENTIFIERS, Output, TableOutput, build_output,
};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::{Error, ErrorCode, Result};
use crate::wire::type_name;

/// Scheme of Azure blob locations
pub const AZURE_SCHEME: &str = "az";
/// Scheme of local file locations
pub const FILE_SCHEME: &str = "file";
/// Scheme of MySQL database URIs
pub const MYSQL_SCHEME: &str = "mysql";
/// Scheme of S3 object locations
pub const S3_SCHEME: &str = "s3";

/// One string or a list of them, kept in the shape it was given
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum OneOrMany {
    /// A single value
    One(String),
    /// Several values
    Many(Vec<String>),
}

impl OneOrMany {
    /// All values as a slice
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::One(value) => std::slice::from_ref(value),
            Self::Many(values) => values,
        }
    }

    /// All values as a list, regardless of the shape they were given in
    pub fn to_list(&self) -> Vec<String> {
        self.as_slice().to_vec()
    }

    pub(crate) fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::One(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .map(Self::Many),
            _ => None,
        }
    }
}

impl From<&str> for OneOrMany {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<String> for OneOrMany {
    fn from(value: String) -> Self {
        Self::One(value)
    }
}

impl From<Vec<String>> for OneOrMany {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

impl From<Vec<&str>> for OneOrMany {
    fn from(values: Vec<&str>) -> Self {
        Self::Many(values.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for OneOrMany {
    fn from(values: [&str; N]) -> Self {
        Self::Many(values.into_iter().map(str::to_string).collect())
    }
}

/// Anything accepted as a modified-after timestamp
pub trait IntoTimestamp {
    /// Resolve into a timestamp with an offset
    fn into_timestamp(self) -> Result<DateTime<FixedOffset>>;
}

impl IntoTimestamp for DateTime<FixedOffset> {
    fn into_timestamp(self) -> Result<DateTime<FixedOffset>> {
        Ok(self)
    }
}

impl IntoTimestamp for DateTime<Utc> {
    fn into_timestamp(self) -> Result<DateTime<FixedOffset>> {
        Ok(self.fixed_offset())
    }
}

impl IntoTimestamp for NaiveDateTime {
    fn into_timestamp(self) -> Result<DateTime<FixedOffset>> {
        Ok(self.and_utc().fixed_offset())
    }
}

impl IntoTimestamp for &str {
    fn into_timestamp(self) -> Result<DateTime<FixedOffset>> {
        parse_timestamp(self)
    }
}

impl IntoTimestamp for String {
    fn into_timestamp(self) -> Result<DateTime<FixedOffset>> {
        parse_timestamp(&self)
    }
}

impl IntoTimestamp for &Value {
    fn into_timestamp(self) -> Result<DateTime<FixedOffset>> {
        match self {
            Value::String(s) => parse_timestamp(s),
            other => Err(Error::input(ErrorCode::ICE6, &[&type_name(other)])),
        }
    }
}

/// Parse an ISO 8601 timestamp; values without an offset are taken as UTC
pub fn parse_timestamp(s: &str) -> Result<DateTime<FixedOffset>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(s) {
        return Ok(timestamp);
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc().fixed_offset());
    }
    Err(Error::input(ErrorCode::ICE5, &[&s]))
}

/// Render a timestamp as `YYYY-MM-DDTHH:MM:SS.ffffff+HH:MM`
pub fn format_timestamp(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%S%.6f%:z").to_string()
}

/// Scheme of a location, or an empty string when it has none
pub(crate) fn scheme_of(location: &str) -> String {
    Url::parse(location)
        .map(|url| url.scheme().to_string())
        .unwrap_or_default()
}

/// Host, port and database of a MySQL URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DatabaseLocation {
    pub host: String,
    pub port: Option<u16>,
    pub database: String,
}

/// Parse a `mysql://host[:port]/database` URI; the error carries the scheme found instead
pub(crate) fn parse_mysql_uri(uri: &str) -> std::result::Result<DatabaseLocation, String> {
    let url = Url::parse(uri).map_err(|_| String::new())?;
    if url.scheme() != MYSQL_SCHEME {
        return Err(url.scheme().to_string());
    }
    Ok(DatabaseLocation {
        host: url.host_str().unwrap_or_default().to_string(),
        port: url.port(),
        database: url.path().trim_start_matches('/').to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("2024-03-01T10:20:30+02:00", "2024-03-01T10:20:30.000000+02:00")]
    #[case("2024-03-01T10:20:30.5Z", "2024-03-01T10:20:30.500000+00:00")]
    #[case("2024-03-01T10:20:30", "2024-03-01T10:20:30.000000+00:00")]
    #[case("2024-03-01 10:20:30.123456", "2024-03-01T10:20:30.123456+00:00")]
    #[case("2024-03-01T10:20", "2024-03-01T10:20:00.000000+00:00")]
    #[case("2024-03-01", "2024-03-01T00:00:00.000000+00:00")]
    fn test_parse_timestamp(#[case] input: &str, #[case] rendered: &str) {
        let timestamp = parse_timestamp(input).unwrap();
        assert_eq!(format_timestamp(&timestamp), rendered);
    }

    #[rstest]
    #[case("yesterday")]
    #[case("2024-13-01")]
    #[case("01/03/2024")]
    fn test_invalid_timestamp(#[case] input: &str) {
        let err = parse_timestamp(input).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ICE5));
    }

    #[test]
    fn test_timestamp_from_json() {
        let err = (&json!(1700000000)).into_timestamp().unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ICE6));
    }

    #[test]
    fn test_scheme_of() {
        assert_eq!(scheme_of("s3://bucket/key.csv"), "s3");
        assert_eq!(scheme_of("az://container/blob"), "az");
        assert_eq!(scheme_of("/tmp/data.csv"), "");
    }

    #[test]
    fn test_parse_mysql_uri() {
        let location = parse_mysql_uri("mysql://db.local:3306/sales").unwrap();
        assert_eq!(location.host, "db.local");
        assert_eq!(location.port, Some(3306));
        assert_eq!(location.database, "sales");

        let location = parse_mysql_uri("mysql://db.local/sales").unwrap();
        assert_eq!(location.port, None);

        assert_eq!(
            parse_mysql_uri("postgres://db/sales"),
            Err("postgres".to_string())
        );
        assert_eq!(parse_mysql_uri("not a uri"), Err(String::new()));
    }

    #[test]
    fn test_one_or_many_keeps_shape() {
        assert_eq!(serde_json::to_value(OneOrMany::from("a")).unwrap(), json!("a"));
        assert_eq!(
            serde_json::to_value(OneOrMany::from(["a", "b"])).unwrap(),
            json!(["a", "b"])
        );
        assert_eq!(OneOrMany::from_value(&json!(["a", 1])), None);
        assert_eq!(OneOrMany::from("a").to_list(), vec!["a".to_string()]);
    }
}
