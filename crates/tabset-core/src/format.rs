//! File formats for file-based inputs
//!
//! A format is either given explicitly (a name such as `"csv"`, a tagged
//! dictionary, or a [`FileFormat`]) or inferred from the extension of the
//! input files.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{Error, ErrorCode, Result};
use crate::wire::{self, KeyError, Object, TagError, type_name};

/// Identifiers of the tagged wire form
pub const FORMAT_IDENTIFIERS: [&str; 4] = [
    CsvFormat::IDENTIFIER,
    "log-format",
    "ndjson-format",
    "parquet-format",
];

/// Names accepted by [`build_file_format`] when given a string
pub const FORMAT_NAMES: [&str; 5] = ["csv", "jsonl", "log", "ndjson", "parquet"];

const ACCEPTED_TYPES: &str = "dict, str, FileFormat";

/// Format of the files read by a file input
#[derive(Debug, Clone, PartialEq)]
pub enum FileFormat {
    /// Delimited text
    Csv(CsvFormat),
    /// Newline-delimited JSON
    NdJson,
    /// Plain log lines
    Log,
    /// Apache Parquet
    Parquet,
}

impl FileFormat {
    /// Tag of the wire form
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::Csv(_) => CsvFormat::IDENTIFIER,
            Self::NdJson => "ndjson-format",
            Self::Log => "log-format",
            Self::Parquet => "parquet-format",
        }
    }

    /// Short name, as listed in supported-format messages
    pub fn name(&self) -> &'static str {
        match self {
            Self::Csv(_) => "csv",
            Self::NdJson => "ndjson",
            Self::Log => "log",
            Self::Parquet => "parquet",
        }
    }

    /// Canonical tagged dictionary
    pub fn to_dict(&self) -> Value {
        match self {
            Self::Csv(csv) => json!({ CsvFormat::IDENTIFIER: csv.fields() }),
            other => json!({ other.identifier(): {} }),
        }
    }

    fn from_name(name: &str) -> Result<Self> {
        match name {
            "csv" => Ok(Self::Csv(CsvFormat::default())),
            "jsonl" | "ndjson" => Ok(Self::NdJson),
            "log" => Ok(Self::Log),
            "parquet" => Ok(Self::Parquet),
            other => Err(Error::format(
                ErrorCode::FOCE4,
                &[&other, &FORMAT_NAMES.join("', '")],
            )),
        }
    }

    fn from_dict(object: &Object) -> Result<Self> {
        let (identifier, inner) =
            wire::split_tagged(object, &FORMAT_IDENTIFIERS).map_err(|e| match e {
                TagError::Keys(keys) => Error::format(
                    ErrorCode::FOCE1,
                    &[&wire::quoted_list(&FORMAT_IDENTIFIERS), &wire::quoted_list(&keys)],
                ),
                TagError::NotObject { identifier, found } => {
                    Error::format(ErrorCode::FOCE2, &[&identifier, &found])
                }
            })?;
        match identifier {
            CsvFormat::IDENTIFIER => CsvFormat::from_object(inner).map(Self::Csv),
            other => {
                if let Some(key) = inner.keys().next() {
                    return Err(Error::format(ErrorCode::FOCE7, &[&other, key, &"[]"]));
                }
                match other {
                    "ndjson-format" => Ok(Self::NdJson),
                    "log-format" => Ok(Self::Log),
                    _ => Ok(Self::Parquet),
                }
            }
        }
    }
}

impl From<CsvFormat> for FileFormat {
    fn from(csv: CsvFormat) -> Self {
        Self::Csv(csv)
    }
}

/// A CSV character option, given as text or as a byte code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CsvChar {
    /// Literal text, e.g. `","`
    Text(String),
    /// Character code, e.g. `44`
    Code(i64),
}

impl From<&str> for CsvChar {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i64> for CsvChar {
    fn from(code: i64) -> Self {
        Self::Code(code)
    }
}

/// CSV reading options
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CsvFormat {
    /// Field separator
    pub separator: CsvChar,
    /// Quote character
    pub quote_char: CsvChar,
    /// End-of-line character
    pub eol_char: CsvChar,
    /// Text encoding
    pub encoding: String,
    /// Values read as null
    pub null_values: Option<Vec<String>>,
    /// Treat missing fields as null
    pub missing_is_null: bool,
    /// Drop fields beyond the header width
    pub truncate_ragged_lines: bool,
    /// Lines starting with this prefix are skipped
    pub comment_prefix: Option<CsvChar>,
    /// Attempt to parse date columns
    pub try_parse_dates: bool,
    /// Use `,` as the decimal separator
    pub decimal_comma: bool,
    /// First row is a header
    pub has_header: bool,
    /// Rows skipped before the header
    pub skip_rows: u64,
    /// Rows skipped after the header
    pub skip_rows_after_header: u64,
    /// Fail when the file is empty
    pub raise_if_empty: bool,
    /// Keep going past malformed rows
    pub ignore_errors: bool,
}

impl Default for CsvFormat {
    fn default() -> Self {
        Self {
            separator: CsvChar::from(","),
            quote_char: CsvChar::from("\""),
            eol_char: CsvChar::from("\n"),
            encoding: "Utf8".to_string(),
            null_values: None,
            missing_is_null: true,
            truncate_ragged_lines: false,
            comment_prefix: None,
            try_parse_dates: false,
            decimal_comma: false,
            has_header: true,
            skip_rows: 0,
            skip_rows_after_header: 0,
            raise_if_empty: true,
            ignore_errors: false,
        }
    }
}

impl CsvFormat {
    /// Tag of the wire form
    pub const IDENTIFIER: &'static str = "csv-format";

    const FIELDS: [&'static str; 15] = [
        "separator",
        "quote_char",
        "eol_char",
        "encoding",
        "null_values",
        "missing_is_null",
        "truncate_ragged_lines",
        "comment_prefix",
        "try_parse_dates",
        "decimal_comma",
        "has_header",
        "skip_rows",
        "skip_rows_after_header",
        "raise_if_empty",
        "ignore_errors",
    ];

    fn fields(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Build from the inner dictionary of the wire form; absent keys keep their defaults
    pub fn from_object(object: &Object) -> Result<Self> {
        if let Err(KeyError::Unexpected(key)) = wire::check_keys(object, &Self::FIELDS, &[]) {
            return Err(Error::format(
                ErrorCode::FOCE7,
                &[&Self::IDENTIFIER, &key, &wire::quoted_list(&Self::FIELDS)],
            ));
        }

        let mut csv = Self::default();
        for (key, value) in object {
            match key.as_str() {
                "separator" => csv.separator = char_field(key, value)?,
                "quote_char" => csv.quote_char = char_field(key, value)?,
                "eol_char" => csv.eol_char = char_field(key, value)?,
                "encoding" => {
                    csv.encoding = value
                        .as_str()
                        .map(str::to_string)
                        .ok_or_else(|| mismatch(key, "str", value))?;
                }
                "null_values" => {
                    csv.null_values = match value {
                        Value::Null => None,
                        other => Some(
                            wire::string_or_list(other)
                                .filter(|_| other.is_array())
                                .ok_or_else(|| mismatch(key, "list, None", other))?,
                        ),
                    };
                }
                "comment_prefix" => {
                    csv.comment_prefix = match value {
                        Value::Null => None,
                        other => Some(char_field(key, other).map_err(|_| {
                            mismatch(key, "str, int, None", other)
                        })?),
                    };
                }
                "skip_rows" => csv.skip_rows = int_field(key, value)?,
                "skip_rows_after_header" => csv.skip_rows_after_header = int_field(key, value)?,
                "missing_is_null" => csv.missing_is_null = bool_field(key, value)?,
                "truncate_ragged_lines" => csv.truncate_ragged_lines = bool_field(key, value)?,
                "try_parse_dates" => csv.try_parse_dates = bool_field(key, value)?,
                "decimal_comma" => csv.decimal_comma = bool_field(key, value)?,
                "has_header" => csv.has_header = bool_field(key, value)?,
                "raise_if_empty" => csv.raise_if_empty = bool_field(key, value)?,
                _ => csv.ignore_errors = bool_field(key, value)?,
            }
        }
        Ok(csv)
    }
}

fn mismatch(field: &str, expected: &str, found: &Value) -> Error {
    Error::format(
        ErrorCode::FOCE3,
        &[&field, &"CsvFormat", &expected, &type_name(found)],
    )
}

fn char_field(field: &str, value: &Value) -> Result<CsvChar> {
    match value {
        Value::String(s) => Ok(CsvChar::Text(s.clone())),
        Value::Number(n) => n
            .as_i64()
            .map(CsvChar::Code)
            .ok_or_else(|| mismatch(field, "str, int", value)),
        other => Err(mismatch(field, "str, int", other)),
    }
}

fn int_field(field: &str, value: &Value) -> Result<u64> {
    // bools are never integers here
    value.as_u64().ok_or_else(|| mismatch(field, "int", value))
}

fn bool_field(field: &str, value: &Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| mismatch(field, "bool", value))
}

/// Anything that can be turned into a [`FileFormat`]
pub trait IntoFileFormat {
    /// Resolve into a format
    fn into_file_format(self) -> Result<FileFormat>;
}

impl IntoFileFormat for FileFormat {
    fn into_file_format(self) -> Result<FileFormat> {
        Ok(self)
    }
}

impl IntoFileFormat for CsvFormat {
    fn into_file_format(self) -> Result<FileFormat> {
        Ok(FileFormat::Csv(self))
    }
}

impl IntoFileFormat for &str {
    fn into_file_format(self) -> Result<FileFormat> {
        FileFormat::from_name(self)
    }
}

impl IntoFileFormat for String {
    fn into_file_format(self) -> Result<FileFormat> {
        FileFormat::from_name(&self)
    }
}

impl IntoFileFormat for &String {
    fn into_file_format(self) -> Result<FileFormat> {
        FileFormat::from_name(self)
    }
}

impl IntoFileFormat for &Value {
    fn into_file_format(self) -> Result<FileFormat> {
        match self {
            Value::String(s) => FileFormat::from_name(s),
            Value::Object(object) => FileFormat::from_dict(object),
            Value::Null => Err(Error::format(ErrorCode::FOCE6, &[&ACCEPTED_TYPES])),
            other => Err(Error::format(
                ErrorCode::FOCE5,
                &[&ACCEPTED_TYPES, &type_name(other)],
            )),
        }
    }
}

impl IntoFileFormat for Value {
    fn into_file_format(self) -> Result<FileFormat> {
        (&self).into_file_format()
    }
}

impl<T: IntoFileFormat> IntoFileFormat for Option<T> {
    fn into_file_format(self) -> Result<FileFormat> {
        match self {
            Some(format) => format.into_file_format(),
            None => Err(Error::format(ErrorCode::FOCE6, &[&ACCEPTED_TYPES])),
        }
    }
}

/// Build a file format from a name, a tagged dictionary or a format object
pub fn build_file_format(configuration: impl IntoFileFormat) -> Result<FileFormat> {
    configuration.into_file_format()
}

/// Extension of the first path that has one
pub fn implicit_format_from_paths<S: AsRef<str>>(paths: &[S]) -> Option<String> {
    paths.iter().find_map(|path| {
        Path::new(path.as_ref())
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_csv_from_string_and_empty_dict_match() {
        let from_name = build_file_format("csv").unwrap();
        let from_dict = build_file_format(json!({"csv-format": {}})).unwrap();
        assert_eq!(from_name, from_dict);
        assert_eq!(from_name, FileFormat::Csv(CsvFormat::default()));
    }

    #[rstest]
    #[case("jsonl", FileFormat::NdJson)]
    #[case("ndjson", FileFormat::NdJson)]
    #[case("log", FileFormat::Log)]
    #[case("parquet", FileFormat::Parquet)]
    fn test_format_names(#[case] name: &str, #[case] expected: FileFormat) {
        assert_eq!(build_file_format(name).unwrap(), expected);
    }

    #[test]
    fn test_unknown_name() {
        let err = build_file_format("xlsx").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::FOCE4));
        assert!(err.to_string().contains("'xlsx'"));
        assert!(err.to_string().contains("parquet"));
    }

    #[test]
    fn test_missing_format() {
        let err = build_file_format(None::<&str>).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::FOCE6));
        let err = build_file_format(Value::Null).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::FOCE6));
    }

    #[test]
    fn test_wrong_type() {
        let err = build_file_format(json!(42)).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::FOCE5));
    }

    #[test]
    fn test_bad_dictionary_shapes() {
        let err = build_file_format(json!({"xml-format": {}})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::FOCE1));

        let err = build_file_format(json!({"csv-format": {}, "log-format": {}})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::FOCE1));

        let err = build_file_format(json!({"csv-format": "comma"})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::FOCE2));

        let err = build_file_format(json!({"parquet-format": {"compression": "zstd"}})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::FOCE7));
    }

    #[test]
    fn test_csv_fields_from_dict() {
        let format = build_file_format(json!({"csv-format": {
            "separator": ";",
            "quote_char": 39,
            "null_values": ["NA", ""],
            "has_header": false,
            "skip_rows": 2,
            "comment_prefix": "#",
        }}))
        .unwrap();
        let FileFormat::Csv(csv) = format else {
            panic!("Expected CSV format");
        };
        assert_eq!(csv.separator, CsvChar::from(";"));
        assert_eq!(csv.quote_char, CsvChar::Code(39));
        assert_eq!(csv.null_values, Some(vec!["NA".to_string(), String::new()]));
        assert!(!csv.has_header);
        assert_eq!(csv.skip_rows, 2);
        assert_eq!(csv.comment_prefix, Some(CsvChar::from("#")));
        assert_eq!(csv.encoding, "Utf8");
    }

    #[rstest]
    #[case(json!({"skip_rows": true}), "skip_rows")]
    #[case(json!({"skip_rows": "1"}), "skip_rows")]
    #[case(json!({"has_header": 1}), "has_header")]
    #[case(json!({"separator": [","]}), "separator")]
    #[case(json!({"encoding": 8}), "encoding")]
    #[case(json!({"null_values": "NA"}), "null_values")]
    #[case(json!({"comment_prefix": false}), "comment_prefix")]
    fn test_csv_field_types(#[case] fields: Value, #[case] field: &str) {
        let err = build_file_format(json!({ "csv-format": fields })).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::FOCE3));
        assert!(err.to_string().contains(&format!("'{field}'")));
    }

    #[test]
    fn test_csv_unknown_field() {
        let err = build_file_format(json!({"csv-format": {"delimiter": ","}})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::FOCE7));
    }

    #[test]
    fn test_to_dict() {
        let dict = FileFormat::Csv(CsvFormat::default()).to_dict();
        let fields = dict["csv-format"].as_object().unwrap();
        assert_eq!(fields.len(), 15);
        assert_eq!(fields["separator"], json!(","));
        assert_eq!(fields["null_values"], Value::Null);
        assert_eq!(fields["raise_if_empty"], json!(true));

        assert_eq!(FileFormat::Parquet.to_dict(), json!({"parquet-format": {}}));
        assert_eq!(
            build_file_format(&FileFormat::Log.to_dict()).unwrap(),
            FileFormat::Log
        );
    }

    #[test]
    fn test_implicit_format() {
        assert_eq!(
            implicit_format_from_paths(&["s3://bucket/dir", "s3://bucket/data.csv"]),
            Some("csv".to_string())
        );
        assert_eq!(
            implicit_format_from_paths(&["/data/file.tar.parquet"]),
            Some("parquet".to_string())
        );
        assert_eq!(implicit_format_from_paths(&["/data/file"]), None);
        assert_eq!(implicit_format_from_paths::<&str>(&[]), None);
    }
}
