//! Version qualifiers for URIs
//!
//! A URI can pin a single version (`HEAD`, `HEAD^^`, `HEAD~3` or a 26
//! character hash), a comma-separated list of versions, or a range written
//! `initial..final`.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{Error, ErrorCode, Result};
use crate::wire::type_name;

/// Grammar every single version token must match
pub const VERSION_PATTERN: &str = r"^(HEAD\^*|HEAD~[0-9]+|[A-Z0-9]{26})$";

static VERSION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(VERSION_PATTERN).expect("Invalid regex pattern"));

/// A single validated version token
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version(String);

impl Version {
    /// Validate a version token
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if !VERSION_REGEX.is_match(&token) {
            return Err(Error::uri(ErrorCode::UCE9, &[&VERSION_PATTERN, &token]));
        }
        Ok(Self(token))
    }

    /// The token as written
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Two or more versions
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionList(Vec<Version>);

impl VersionList {
    /// Build a list; every element must resolve to a bare [`Version`]
    pub fn new<I>(versions: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: IntoVersions,
    {
        let mut list = Vec::new();
        for item in versions {
            match item.into_versions()? {
                Versions::Single(version) => list.push(version),
                other => {
                    return Err(Error::uri(
                        ErrorCode::UCE7,
                        &[&"Version", &other, &other.kind()],
                    ));
                }
            }
        }
        if list.len() < 2 {
            let rendered: Vec<&str> = list.iter().map(Version::as_str).collect();
            return Err(Error::uri(
                ErrorCode::UCE8,
                &[&format!("{:?}", rendered), &list.len()],
            ));
        }
        Ok(Self(list))
    }

    /// The versions in order
    pub fn versions(&self) -> &[Version] {
        &self.0
    }
}

impl fmt::Display for VersionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<&str> = self.0.iter().map(Version::as_str).collect();
        f.write_str(&tokens.join(","))
    }
}

/// An inclusive interval between two versions
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionRange {
    initial: Version,
    last: Version,
}

impl VersionRange {
    /// Build a range; both endpoints must resolve to a bare [`Version`]
    pub fn new(initial: impl IntoVersions, last: impl IntoVersions) -> Result<Self> {
        let initial = match initial.into_versions()? {
            Versions::Single(version) => version,
            other => {
                return Err(Error::uri(
                    ErrorCode::UCE2,
                    &[&"Version", &other, &other.kind()],
                ));
            }
        };
        let last = match last.into_versions()? {
            Versions::Single(version) => version,
            other => {
                return Err(Error::uri(
                    ErrorCode::UCE3,
                    &[&"Version", &other, &other.kind()],
                ));
            }
        };
        Ok(Self { initial, last })
    }

    /// Start of the range
    pub fn initial(&self) -> &Version {
        &self.initial
    }

    /// End of the range
    pub fn last(&self) -> &Version {
        &self.last
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.initial, self.last)
    }
}

/// Any version qualifier a URI can carry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Versions {
    /// One version
    Single(Version),
    /// Several versions
    List(VersionList),
    /// A range of versions
    Range(VersionRange),
}

impl Versions {
    /// Name of the qualifier kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Single(_) => "Version",
            Self::List(_) => "VersionList",
            Self::Range(_) => "VersionRange",
        }
    }
}

impl fmt::Display for Versions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(v) => v.fmt(f),
            Self::List(v) => v.fmt(f),
            Self::Range(v) => v.fmt(f),
        }
    }
}

impl FromStr for Versions {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_versions(s)
    }
}

impl From<Version> for Versions {
    fn from(v: Version) -> Self {
        Self::Single(v)
    }
}

impl From<VersionList> for Versions {
    fn from(v: VersionList) -> Self {
        Self::List(v)
    }
}

impl From<VersionRange> for Versions {
    fn from(v: VersionRange) -> Self {
        Self::Range(v)
    }
}

/// Anything that can be turned into a version qualifier
pub trait IntoVersions {
    /// Resolve into a qualifier, validating strings on the way
    fn into_versions(self) -> Result<Versions>;
}

impl IntoVersions for Versions {
    fn into_versions(self) -> Result<Versions> {
        Ok(self)
    }
}

impl IntoVersions for Version {
    fn into_versions(self) -> Result<Versions> {
        Ok(Versions::Single(self))
    }
}

impl IntoVersions for VersionList {
    fn into_versions(self) -> Result<Versions> {
        Ok(Versions::List(self))
    }
}

impl IntoVersions for VersionRange {
    fn into_versions(self) -> Result<Versions> {
        Ok(Versions::Range(self))
    }
}

impl IntoVersions for &str {
    fn into_versions(self) -> Result<Versions> {
        parse_versions(self)
    }
}

impl IntoVersions for String {
    fn into_versions(self) -> Result<Versions> {
        parse_versions(&self)
    }
}

impl IntoVersions for &String {
    fn into_versions(self) -> Result<Versions> {
        parse_versions(self)
    }
}

impl IntoVersions for &Value {
    fn into_versions(self) -> Result<Versions> {
        match self {
            Value::String(s) => parse_versions(s),
            Value::Array(items) => VersionList::new(items).map(Versions::List),
            other => Err(Error::uri(
                ErrorCode::UCE4,
                &[&"str, list, Version, VersionList, VersionRange", &type_name(other)],
            )),
        }
    }
}

impl IntoVersions for Value {
    fn into_versions(self) -> Result<Versions> {
        (&self).into_versions()
    }
}

/// Build a version qualifier from a token or an already-built qualifier
///
/// Ranges (`..`) take priority over lists (`,`); anything else must be a
/// single version token.
pub fn build_version_object(token: impl IntoVersions) -> Result<Versions> {
    token.into_versions()
}

fn parse_versions(token: &str) -> Result<Versions> {
    if token.contains("..") {
        let parts: Vec<&str> = token.split("..").collect();
        let [initial, last] = parts.as_slice() else {
            return Err(Error::uri(ErrorCode::UCE5, &[&token]));
        };
        return VersionRange::new(*initial, *last).map(Versions::Range);
    }
    if token.contains(',') {
        return VersionList::new(token.split(',')).map(Versions::List);
    }
    Version::new(token).map(Versions::Single)
}
