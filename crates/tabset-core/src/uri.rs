//! Resource URIs
//!
//! A URI addresses a datastore, a dataset or a table, optionally pinned to a
//! version qualifier:
//!
//! ```text
//! td:///datastore[/dataset[/table]][@version]    explicit datastore root
//! td://dataset[/table][@version]                 dataset-relative
//! ```

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, ErrorCode, Result};
use crate::version::{IntoVersions, Versions};
use crate::wire::type_name;

/// Scheme prefix shared by every URI
pub const URI_SCHEME: &str = "td";

static TRIPLE_SLASH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<datastore>[^/@]+)(?:/(?P<dataset>[^/@]+)(?:/(?P<table>[^/@]+)(?:@(?P<version>[^/@]+))?)?|@(?P<version2>[^/@]+)|/(?P<dataset2>[^/@]+)@(?P<version3>[^/@]+))?$",
    )
    .expect("Invalid regex pattern")
});

static DOUBLE_SLASH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<dataset>[^/@]+)(?:/(?P<table>[^/@]+)(?:@(?P<version>[^/@]+))?|@(?P<version2>[^/@]+))?$",
    )
    .expect("Invalid regex pattern")
});

/// A validated resource identifier
///
/// Build one with [`Uri::builder`] or by parsing a string; change one with the
/// `with_*` methods, which return a re-validated copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uri {
    datastore: Option<String>,
    dataset: Option<String>,
    table: Option<String>,
    version: Option<Versions>,
}

impl Uri {
    /// Start building a URI
    pub fn builder() -> UriBuilder {
        UriBuilder::default()
    }

    /// Datastore segment, if any
    pub fn datastore(&self) -> Option<&str> {
        self.datastore.as_deref()
    }

    /// Dataset segment, if any
    pub fn dataset(&self) -> Option<&str> {
        self.dataset.as_deref()
    }

    /// Table segment, if any
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Version qualifier, if any
    pub fn version(&self) -> Option<&Versions> {
        self.version.as_ref()
    }

    /// Copy with a different datastore
    pub fn with_datastore(&self, datastore: Option<&str>) -> Result<Self> {
        Self {
            datastore: segment(datastore),
            ..self.clone()
        }
        .validated()
    }

    /// Copy with a different dataset
    pub fn with_dataset(&self, dataset: Option<&str>) -> Result<Self> {
        Self {
            dataset: segment(dataset),
            ..self.clone()
        }
        .validated()
    }

    /// Copy with a different table
    pub fn with_table(&self, table: Option<&str>) -> Result<Self> {
        Self {
            table: segment(table),
            ..self.clone()
        }
        .validated()
    }

    /// Copy pinned to a version qualifier
    pub fn with_version(&self, version: impl IntoVersions) -> Result<Self> {
        Ok(Self {
            version: Some(version.into_versions()?),
            ..self.clone()
        })
    }

    /// Copy without a version qualifier
    pub fn without_version(&self) -> Self {
        Self {
            version: None,
            ..self.clone()
        }
    }

    fn validated(self) -> Result<Self> {
        for (name, value) in [
            ("datastore", &self.datastore),
            ("dataset", &self.dataset),
            ("table", &self.table),
        ] {
            if let Some(value) = value
                && value.contains(['/', '@'])
            {
                return Err(Error::uri(ErrorCode::UCE17, &[&name, value]));
            }
        }
        if self.datastore.is_none() && self.dataset.is_none() {
            return Err(Error::uri(ErrorCode::UCE15, &[]));
        }
        if self.table.is_some() && self.dataset.is_none() {
            return Err(Error::uri(ErrorCode::UCE16, &[]));
        }
        Ok(self)
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{URI_SCHEME}://")?;
        match (&self.datastore, &self.dataset) {
            (Some(datastore), Some(dataset)) => write!(f, "/{datastore}/{dataset}")?,
            (Some(datastore), None) => write!(f, "/{datastore}")?,
            (None, Some(dataset)) => f.write_str(dataset)?,
            (None, None) => {}
        }
        if let Some(table) = &self.table {
            write!(f, "/{table}")?;
        }
        if let Some(version) = &self.version {
            write!(f, "@{version}")?;
        }
        Ok(())
    }
}

impl FromStr for Uri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_uri(s)
    }
}

impl Serialize for Uri {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Uri {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_uri(&s).map_err(serde::de::Error::custom)
    }
}

/// Accumulates URI segments and validates them all at once in [`build`](Self::build)
#[derive(Debug, Default)]
pub struct UriBuilder {
    datastore: Option<String>,
    dataset: Option<String>,
    table: Option<String>,
    version: Option<Result<Versions>>,
}

impl UriBuilder {
    /// Set the datastore segment
    pub fn datastore(mut self, datastore: impl Into<String>) -> Self {
        self.datastore = Some(datastore.into());
        self
    }

    /// Set the dataset segment
    pub fn dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    /// Set the table segment
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Set the version qualifier; a malformed one is reported by `build`
    pub fn version(mut self, version: impl IntoVersions) -> Self {
        self.version = Some(version.into_versions());
        self
    }

    /// Validate every segment and produce the URI
    pub fn build(self) -> Result<Uri> {
        let version = self.version.transpose()?;
        Uri {
            datastore: segment(self.datastore.as_deref()),
            dataset: segment(self.dataset.as_deref()),
            table: segment(self.table.as_deref()),
            version,
        }
        .validated()
    }
}

/// Anything that can be turned into a [`Uri`]
pub trait IntoUri {
    /// Resolve into a URI, parsing strings on the way
    fn into_uri(self) -> Result<Uri>;
}

impl IntoUri for Uri {
    fn into_uri(self) -> Result<Uri> {
        Ok(self)
    }
}

impl IntoUri for &Uri {
    fn into_uri(self) -> Result<Uri> {
        Ok(self.clone())
    }
}

impl IntoUri for &str {
    fn into_uri(self) -> Result<Uri> {
        parse_uri(self)
    }
}

impl IntoUri for String {
    fn into_uri(self) -> Result<Uri> {
        parse_uri(&self)
    }
}

impl IntoUri for &String {
    fn into_uri(self) -> Result<Uri> {
        parse_uri(self)
    }
}

impl IntoUri for &Value {
    fn into_uri(self) -> Result<Uri> {
        match self {
            Value::String(s) => parse_uri(s),
            other => Err(Error::uri(ErrorCode::UCE14, &[&type_name(other)])),
        }
    }
}

impl IntoUri for Value {
    fn into_uri(self) -> Result<Uri> {
        (&self).into_uri()
    }
}

/// Build a URI from a string or an existing URI
pub fn build_uri_object(uri: impl IntoUri) -> Result<Uri> {
    uri.into_uri()
}

fn segment(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_string)
}

fn parse_uri(s: &str) -> Result<Uri> {
    let malformed = || Error::uri(ErrorCode::UCE13, &[&s]);
    let mut builder = Uri::builder();

    if let Some(rest) = s.strip_prefix("td:///") {
        let caps = TRIPLE_SLASH.captures(rest).ok_or_else(malformed)?;
        builder = builder.datastore(&caps["datastore"]);
        if let Some(dataset) = first(&caps, &["dataset", "dataset2"]) {
            builder = builder.dataset(dataset);
        }
        if let Some(table) = caps.name("table") {
            builder = builder.table(table.as_str());
        }
        if let Some(version) = first(&caps, &["version", "version2", "version3"]) {
            builder = builder.version(version);
        }
    } else if let Some(rest) = s.strip_prefix("td://") {
        let caps = DOUBLE_SLASH.captures(rest).ok_or_else(malformed)?;
        builder = builder.dataset(&caps["dataset"]);
        if let Some(table) = caps.name("table") {
            builder = builder.table(table.as_str());
        }
        if let Some(version) = first(&caps, &["version", "version2"]) {
            builder = builder.version(version);
        }
    } else {
        return Err(malformed());
    }

    let uri = builder.build()?;
    tracing::debug!(uri = %uri, "Parsed URI");
    Ok(uri)
}

/// First alternate capture group that matched
fn first<'h>(caps: &Captures<'h>, names: &[&str]) -> Option<&'h str> {
    names
        .iter()
        .find_map(|name| caps.name(name))
        .map(|m| m.as_str())
}
