//! Input connectors

use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value, json};

use super::{
    AZURE_SCHEME, DatabaseLocation, FILE_SCHEME, IntoTimestamp, OneOrMany, S3_SCHEME,
    format_timestamp, parse_mysql_uri, scheme_of,
};
use crate::credentials::{
    AzureAccountKeyCredentials, Credentials, IntoCredentials, S3AccessKeyCredentials,
    UserPasswordCredentials,
};
use crate::error::{Error, ErrorCode, Result};
use crate::format::{FileFormat, IntoFileFormat, build_file_format, implicit_format_from_paths};
use crate::uri::{IntoUri, Uri};
use crate::wire::{self, KeyError, Object, TagError, type_name};

/// Identifiers of the tagged wire form
pub const INPUT_IDENTIFIERS: [&str; 5] = [
    AzureInput::IDENTIFIER,
    LocalFileInput::IDENTIFIER,
    MySqlInput::IDENTIFIER,
    S3Input::IDENTIFIER,
    TableInput::IDENTIFIER,
];

/// Formats every file input can read
const FILE_INPUT_FORMATS: [&str; 4] = ["csv", "ndjson", "log", "parquet"];

/// AWS regions known at release time; others are accepted with a warning
pub const S3_REGIONS: [&str; 32] = [
    "us-east-2",
    "us-east-1",
    "us-west-1",
    "us-west-2",
    "af-south-1",
    "ap-east-1",
    "ap-south-2",
    "ap-southeast-3",
    "ap-southeast-5",
    "ap-southeast-4",
    "ap-south-1",
    "ap-northeast-3",
    "ap-northeast-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-northeast-1",
    "ca-central-1",
    "ca-west-1",
    "eu-central-1",
    "eu-west-1",
    "eu-west-2",
    "eu-south-1",
    "eu-west-3",
    "eu-south-2",
    "eu-north-1",
    "eu-central-2",
    "il-central-1",
    "me-south-1",
    "me-central-1",
    "sa-east-1",
    "us-gov-east-1",
    "us-gov-west-1",
];

// ============================================================================
// File-based inputs
// ============================================================================

/// Per-variant rules for file-based inputs
struct FileRules {
    identifier: &'static str,
    location_key: &'static str,
    scheme: &'static str,
    /// Local paths may omit the scheme entirely
    scheme_required: bool,
    location_type: ErrorCode,
    bad_scheme: ErrorCode,
    no_format: ErrorCode,
}

const AZURE: FileRules = FileRules {
    identifier: "azure-input",
    location_key: "uri",
    scheme: AZURE_SCHEME,
    scheme_required: true,
    location_type: ErrorCode::ICE28,
    bad_scheme: ErrorCode::ICE29,
    no_format: ErrorCode::ICE27,
};

const LOCAL: FileRules = FileRules {
    identifier: "localfile-input",
    location_key: "path",
    scheme: FILE_SCHEME,
    scheme_required: false,
    location_type: ErrorCode::ICE13,
    bad_scheme: ErrorCode::ICE14,
    no_format: ErrorCode::ICE15,
};

const S3: FileRules = FileRules {
    identifier: "s3-input",
    location_key: "uri",
    scheme: S3_SCHEME,
    scheme_required: true,
    location_type: ErrorCode::ICE16,
    bad_scheme: ErrorCode::ICE17,
    no_format: ErrorCode::ICE18,
};

impl FileRules {
    fn check_locations(&self, locations: &OneOrMany) -> Result<()> {
        for location in locations.as_slice() {
            if !self.scheme_required && !location.contains("://") {
                continue;
            }
            let scheme = scheme_of(location);
            if scheme != self.scheme {
                return Err(Error::input(
                    self.bad_scheme,
                    &[&scheme, &self.scheme, location],
                ));
            }
        }
        Ok(())
    }

    fn locations_from_value(&self, value: &Value) -> Result<OneOrMany> {
        OneOrMany::from_value(value)
            .ok_or_else(|| Error::input(self.location_type, &[&type_name(value)]))
    }

    fn verify_supported(&self, format: &FileFormat) -> Result<()> {
        if FILE_INPUT_FORMATS.contains(&format.name()) {
            return Ok(());
        }
        Err(Error::input(
            ErrorCode::ICE4,
            &[&format.name(), &wire::quoted_list(&FILE_INPUT_FORMATS)],
        ))
    }

    fn implicit_format(&self, locations: &OneOrMany, implicit: Option<&str>) -> Result<FileFormat> {
        let Some(extension) = implicit else {
            return Err(Error::input(
                self.no_format,
                &[
                    &FILE_INPUT_FORMATS.join("', '"),
                    &wire::quoted_list(locations.as_slice()),
                ],
            ));
        };
        let format = build_file_format(extension)?;
        self.verify_supported(&format)?;
        Ok(format)
    }
}

/// Locations, format and modified-after filter shared by file-based inputs
#[derive(Debug, Clone, PartialEq)]
struct FileSource {
    locations: OneOrMany,
    format: Option<FileFormat>,
    implicit_format: Option<String>,
    initial_last_modified: Option<DateTime<FixedOffset>>,
}

impl FileSource {
    /// Validate in order: locations, format (explicit, else inferred), timestamp
    fn new(
        rules: &FileRules,
        locations: OneOrMany,
        format: Option<Result<FileFormat>>,
        initial_last_modified: Option<Result<DateTime<FixedOffset>>>,
    ) -> Result<Self> {
        rules.check_locations(&locations)?;
        let implicit_format = implicit_format_from_paths(locations.as_slice());
        let format = match format.transpose()? {
            Some(format) => {
                rules.verify_supported(&format)?;
                Some(format)
            }
            None => {
                rules.implicit_format(&locations, implicit_format.as_deref())?;
                None
            }
        };
        Ok(Self {
            locations,
            format,
            implicit_format,
            initial_last_modified: initial_last_modified.transpose()?,
        })
    }

    fn rebuild(
        &self,
        rules: &FileRules,
        locations: Option<OneOrMany>,
        format: Option<Option<Result<FileFormat>>>,
    ) -> Result<Self> {
        Self::new(
            rules,
            locations.unwrap_or_else(|| self.locations.clone()),
            format.unwrap_or_else(|| self.format.clone().map(Ok)),
            self.initial_last_modified.map(Ok),
        )
    }

    fn format(&self, rules: &FileRules) -> Result<FileFormat> {
        match &self.format {
            Some(format) => Ok(format.clone()),
            None => rules.implicit_format(&self.locations, self.implicit_format.as_deref()),
        }
    }

    fn fields(&self, rules: &FileRules) -> Result<Map<String, Value>> {
        let mut fields = Map::new();
        fields.insert("format".into(), self.format(rules)?.to_dict());
        fields.insert(
            "initial_last_modified".into(),
            self.initial_last_modified
                .as_ref()
                .map(format_timestamp)
                .into(),
        );
        fields.insert(rules.location_key.into(), json!(self.locations.to_list()));
        Ok(fields)
    }
}

/// Optional fields pulled out of a file input dictionary
fn file_options<'a>(
    object: &'a Object,
) -> (Option<&'a Value>, Option<&'a Value>) {
    let format = wire::field(object, "format");
    let initial_last_modified =
        wire::field(object, "initial_last_modified").filter(|v| v.as_str() != Some(""));
    (format, initial_last_modified)
}

macro_rules! file_input_accessors {
    ($input:ident, $rules:expr) => {
        impl $input {
            /// Locations as given
            pub fn locations(&self) -> &OneOrMany {
                &self.source.locations
            }

            /// Format given explicitly, if any
            pub fn explicit_format(&self) -> Option<&FileFormat> {
                self.source.format.as_ref()
            }

            /// Extension inferred from the locations, if any
            pub fn implicit_format(&self) -> Option<&str> {
                self.source.implicit_format.as_deref()
            }

            /// Effective format: the explicit one, else the one inferred from the locations
            pub fn format(&self) -> Result<FileFormat> {
                self.source.format(&$rules)
            }

            /// Only files modified after this instant are read
            pub fn initial_last_modified(&self) -> Option<&DateTime<FixedOffset>> {
                self.source.initial_last_modified.as_ref()
            }

            /// Copy reading from other locations
            ///
            /// The inferred format is re-checked unless an explicit format is set.
            pub fn with_locations(&self, locations: impl Into<OneOrMany>) -> Result<Self> {
                let mut copy = self.clone();
                copy.source = self.source.rebuild(&$rules, Some(locations.into()), None)?;
                Ok(copy)
            }

            /// Copy with an explicit format
            pub fn with_format(&self, format: impl IntoFileFormat) -> Result<Self> {
                let format = build_file_format(format);
                let mut copy = self.clone();
                copy.source = self.source.rebuild(&$rules, None, Some(Some(format)))?;
                Ok(copy)
            }

            /// Copy that infers its format from the locations
            pub fn without_format(&self) -> Result<Self> {
                let mut copy = self.clone();
                copy.source = self.source.rebuild(&$rules, None, Some(None))?;
                Ok(copy)
            }

            /// Copy with a modified-after filter
            pub fn with_initial_last_modified(&self, timestamp: impl IntoTimestamp) -> Result<Self> {
                let mut copy = self.clone();
                copy.source.initial_last_modified = Some(timestamp.into_timestamp()?);
                Ok(copy)
            }

            /// Copy without a modified-after filter
            pub fn without_initial_last_modified(&self) -> Self {
                let mut copy = self.clone();
                copy.source.initial_last_modified = None;
                copy
            }
        }
    };
}

/// Files in Azure blob storage (`az://...`)
#[derive(Debug, Clone, PartialEq)]
pub struct AzureInput {
    source: FileSource,
    credentials: AzureAccountKeyCredentials,
}

/// Builder for [`AzureInput`]
#[derive(Debug)]
pub struct AzureInputBuilder {
    uri: OneOrMany,
    credentials: Result<Credentials>,
    format: Option<Result<FileFormat>>,
    initial_last_modified: Option<Result<DateTime<FixedOffset>>>,
}

impl AzureInputBuilder {
    /// Explicit format; without one it is inferred from the URIs
    pub fn format(mut self, format: impl IntoFileFormat) -> Self {
        self.format = Some(build_file_format(format));
        self
    }

    /// Only read files modified after this instant
    pub fn initial_last_modified(mut self, timestamp: impl IntoTimestamp) -> Self {
        self.initial_last_modified = Some(timestamp.into_timestamp());
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<AzureInput> {
        let source = FileSource::new(&AZURE, self.uri, self.format, self.initial_last_modified)?;
        let credentials = match self.credentials? {
            Credentials::AzureAccountKey(credentials) => credentials,
            other => return Err(Error::input(ErrorCode::ICE30, &[&other.identifier()])),
        };
        Ok(AzureInput {
            source,
            credentials,
        })
    }
}

impl AzureInput {
    /// Tag of the wire form
    pub const IDENTIFIER: &'static str = "azure-input";
    const KEYS: [&'static str; 4] = ["uri", "credentials", "format", "initial_last_modified"];

    /// Start building an Azure input
    pub fn builder(uri: impl Into<OneOrMany>, credentials: impl IntoCredentials) -> AzureInputBuilder {
        AzureInputBuilder {
            uri: uri.into(),
            credentials: credentials.into_credentials(),
            format: None,
            initial_last_modified: None,
        }
    }

    /// Azure input with an inferred format
    pub fn new(uri: impl Into<OneOrMany>, credentials: impl IntoCredentials) -> Result<Self> {
        Self::builder(uri, credentials).build()
    }

    /// Credentials for the storage account
    pub fn credentials(&self) -> &AzureAccountKeyCredentials {
        &self.credentials
    }

    /// Canonical tagged dictionary
    pub fn to_dict(&self) -> Result<Value> {
        let mut fields = self.source.fields(&AZURE)?;
        fields.insert(
            "credentials".into(),
            Credentials::from(self.credentials.clone()).to_dict(),
        );
        Ok(json!({ Self::IDENTIFIER: fields }))
    }

    fn from_object(object: &Object) -> Result<Self> {
        check_keys(Self::IDENTIFIER, object, &Self::KEYS, &["uri", "credentials"])?;
        let uri = AZURE.locations_from_value(&object["uri"])?;
        let mut builder = Self::builder(uri, &object["credentials"]);
        let (format, initial_last_modified) = file_options(object);
        if let Some(format) = format {
            builder = builder.format(format);
        }
        if let Some(timestamp) = initial_last_modified {
            builder = builder.initial_last_modified(timestamp);
        }
        builder.build()
    }
}

file_input_accessors!(AzureInput, AZURE);

/// Files on the local filesystem of the server
#[derive(Debug, Clone, PartialEq)]
pub struct LocalFileInput {
    source: FileSource,
}

/// Builder for [`LocalFileInput`]
#[derive(Debug)]
pub struct LocalFileInputBuilder {
    path: OneOrMany,
    format: Option<Result<FileFormat>>,
    initial_last_modified: Option<Result<DateTime<FixedOffset>>>,
}

impl LocalFileInputBuilder {
    /// Explicit format; without one it is inferred from the paths
    pub fn format(mut self, format: impl IntoFileFormat) -> Self {
        self.format = Some(build_file_format(format));
        self
    }

    /// Only read files modified after this instant
    pub fn initial_last_modified(mut self, timestamp: impl IntoTimestamp) -> Self {
        self.initial_last_modified = Some(timestamp.into_timestamp());
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<LocalFileInput> {
        Ok(LocalFileInput {
            source: FileSource::new(&LOCAL, self.path, self.format, self.initial_last_modified)?,
        })
    }
}

impl LocalFileInput {
    /// Tag of the wire form
    pub const IDENTIFIER: &'static str = "localfile-input";
    const KEYS: [&'static str; 3] = ["path", "format", "initial_last_modified"];

    /// Start building a local file input
    pub fn builder(path: impl Into<OneOrMany>) -> LocalFileInputBuilder {
        LocalFileInputBuilder {
            path: path.into(),
            format: None,
            initial_last_modified: None,
        }
    }

    /// Local file input with an inferred format
    pub fn new(path: impl Into<OneOrMany>) -> Result<Self> {
        Self::builder(path).build()
    }

    /// Canonical tagged dictionary
    pub fn to_dict(&self) -> Result<Value> {
        Ok(json!({ Self::IDENTIFIER: self.source.fields(&LOCAL)? }))
    }

    fn from_object(object: &Object) -> Result<Self> {
        check_keys(Self::IDENTIFIER, object, &Self::KEYS, &["path"])?;
        let path = LOCAL.locations_from_value(&object["path"])?;
        let mut builder = Self::builder(path);
        let (format, initial_last_modified) = file_options(object);
        if let Some(format) = format {
            builder = builder.format(format);
        }
        if let Some(timestamp) = initial_last_modified {
            builder = builder.initial_last_modified(timestamp);
        }
        builder.build()
    }
}

file_input_accessors!(LocalFileInput, LOCAL);

/// Objects in an S3 bucket (`s3://...`)
#[derive(Debug, Clone, PartialEq)]
pub struct S3Input {
    source: FileSource,
    credentials: S3AccessKeyCredentials,
    region: Option<String>,
}

/// Builder for [`S3Input`]
#[derive(Debug)]
pub struct S3InputBuilder {
    uri: OneOrMany,
    credentials: Result<Credentials>,
    format: Option<Result<FileFormat>>,
    initial_last_modified: Option<Result<DateTime<FixedOffset>>>,
    region: Option<String>,
}

impl S3InputBuilder {
    /// Explicit format; without one it is inferred from the URIs
    pub fn format(mut self, format: impl IntoFileFormat) -> Self {
        self.format = Some(build_file_format(format));
        self
    }

    /// Only read objects modified after this instant
    pub fn initial_last_modified(mut self, timestamp: impl IntoTimestamp) -> Self {
        self.initial_last_modified = Some(timestamp.into_timestamp());
        self
    }

    /// Bucket region
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Validate and build
    pub fn build(self) -> Result<S3Input> {
        let source = FileSource::new(&S3, self.uri, self.format, self.initial_last_modified)?;
        let credentials = match self.credentials? {
            Credentials::S3AccessKey(credentials) => credentials,
            other => return Err(Error::input(ErrorCode::ICE20, &[&other.identifier()])),
        };
        Ok(S3Input {
            source,
            credentials,
            region: check_region(self.region),
        })
    }
}

fn check_region(region: Option<String>) -> Option<String> {
    let region = region.filter(|r| !r.is_empty())?;
    if !S3_REGIONS.contains(&region.as_str()) {
        tracing::warn!(
            region = %region,
            "S3 region is not a known AWS region; this may be a typo, a recently \
             created region or a private one, and will fail at runtime if it is \
             not available for the account"
        );
    }
    Some(region)
}

impl S3Input {
    /// Tag of the wire form
    pub const IDENTIFIER: &'static str = "s3-input";
    const KEYS: [&'static str; 5] = [
        "uri",
        "credentials",
        "format",
        "initial_last_modified",
        "region",
    ];

    /// Start building an S3 input
    pub fn builder(uri: impl Into<OneOrMany>, credentials: impl IntoCredentials) -> S3InputBuilder {
        S3InputBuilder {
            uri: uri.into(),
            credentials: credentials.into_credentials(),
            format: None,
            initial_last_modified: None,
            region: None,
        }
    }

    /// S3 input with an inferred format
    pub fn new(uri: impl Into<OneOrMany>, credentials: impl IntoCredentials) -> Result<Self> {
        Self::builder(uri, credentials).build()
    }

    /// Credentials for the bucket
    pub fn credentials(&self) -> &S3AccessKeyCredentials {
        &self.credentials
    }

    /// Bucket region, if set
    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Copy with a different region
    pub fn with_region(&self, region: Option<&str>) -> Self {
        Self {
            region: check_region(region.map(str::to_string)),
            ..self.clone()
        }
    }

    /// Canonical tagged dictionary
    pub fn to_dict(&self) -> Result<Value> {
        let mut fields = self.source.fields(&S3)?;
        fields.insert(
            "credentials".into(),
            Credentials::from(self.credentials.clone()).to_dict(),
        );
        fields.insert("region".into(), self.region.clone().into());
        Ok(json!({ Self::IDENTIFIER: fields }))
    }

    fn from_object(object: &Object) -> Result<Self> {
        check_keys(Self::IDENTIFIER, object, &Self::KEYS, &["uri", "credentials"])?;
        let uri = S3.locations_from_value(&object["uri"])?;
        let mut builder = Self::builder(uri, &object["credentials"]);
        let (format, initial_last_modified) = file_options(object);
        if let Some(format) = format {
            builder = builder.format(format);
        }
        if let Some(timestamp) = initial_last_modified {
            builder = builder.initial_last_modified(timestamp);
        }
        if let Some(region) = wire::field(object, "region") {
            let region = region
                .as_str()
                .ok_or_else(|| Error::input(ErrorCode::ICE26, &[&type_name(region)]))?;
            builder = builder.region(region);
        }
        builder.build()
    }
}

file_input_accessors!(S3Input, S3);

// ============================================================================
// Database and table inputs
// ============================================================================

/// Rows returned by SQL queries against a MySQL database
#[derive(Debug, Clone, PartialEq)]
pub struct MySqlInput {
    uri: String,
    location: DatabaseLocation,
    query: OneOrMany,
    credentials: Option<UserPasswordCredentials>,
    initial_values: Map<String, Value>,
}

impl MySqlInput {
    /// Tag of the wire form
    pub const IDENTIFIER: &'static str = "mysql-input";
    const KEYS: [&'static str; 4] = ["uri", "query", "credentials", "initial_values"];

    /// MySQL input reading the given query or queries
    pub fn new(uri: &str, query: impl Into<OneOrMany>) -> Result<Self> {
        let location = parse_mysql_uri(uri).map_err(|scheme| {
            Error::input(ErrorCode::ICE2, &[&scheme, &super::MYSQL_SCHEME, &uri])
        })?;
        Ok(Self {
            uri: uri.to_string(),
            location,
            query: query.into(),
            credentials: None,
            initial_values: Map::new(),
        })
    }

    /// Attach user/password credentials
    pub fn with_credentials(mut self, credentials: impl IntoCredentials) -> Result<Self> {
        self.credentials = match credentials.into_credentials()? {
            Credentials::UserPassword(credentials) => Some(credentials),
            other => return Err(Error::input(ErrorCode::ICE22, &[&other.identifier()])),
        };
        Ok(self)
    }

    /// Initial values for the query parameters
    pub fn with_initial_values(mut self, initial_values: Map<String, Value>) -> Self {
        self.initial_values = initial_values;
        self
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

    /// Query or queries, in the shape they were given
    pub fn query(&self) -> &OneOrMany {
        &self.query
    }

    /// Credentials, if any
    pub fn credentials(&self) -> Option<&UserPasswordCredentials> {
        self.credentials.as_ref()
    }

    /// Initial parameter values
    pub fn initial_values(&self) -> &Map<String, Value> {
        &self.initial_values
    }

    /// Canonical tagged dictionary
    pub fn to_dict(&self) -> Value {
        json!({ Self::IDENTIFIER: {
            "initial_values": self.initial_values,
            "query": self.query,
            "uri": self.uri,
            "credentials": self
                .credentials
                .clone()
                .map(|c| Credentials::from(c).to_dict()),
        }})
    }

    fn from_object(object: &Object) -> Result<Self> {
        check_keys(Self::IDENTIFIER, object, &Self::KEYS, &["uri", "query"])?;
        let uri = object["uri"]
            .as_str()
            .ok_or_else(|| Error::input(ErrorCode::ICE32, &[&type_name(&object["uri"])]))?;
        let query = OneOrMany::from_value(&object["query"])
            .ok_or_else(|| Error::input(ErrorCode::ICE19, &[&type_name(&object["query"])]))?;
        let mut input = Self::new(uri, query)?;

        if let Some(credentials) = wire::field(object, "credentials").filter(|v| !is_empty_object(v)) {
            input = input.with_credentials(credentials)?;
        }
        match wire::field(object, "initial_values") {
            None => {}
            Some(Value::Object(values)) => input = input.with_initial_values(values.clone()),
            Some(other) => return Err(Error::input(ErrorCode::ICE12, &[&type_name(other)])),
        }
        Ok(input)
    }
}

/// Tables produced by other datasets in the system
#[derive(Debug, Clone, PartialEq)]
pub struct TableInput {
    uri: Vec<Uri>,
}

impl TableInput {
    /// Tag of the wire form
    pub const IDENTIFIER: &'static str = "table-input";

    /// Read a single table
    pub fn new(uri: impl IntoUri) -> Result<Self> {
        Self::from_uris([uri])
    }

    /// Read several tables; each URI must name a table
    pub fn from_uris<I>(uris: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: IntoUri,
    {
        let uri = uris
            .into_iter()
            .map(IntoUri::into_uri)
            .collect::<Result<Vec<_>>>()?;
        if let Some(missing) = uri.iter().find(|u| u.table().is_none()) {
            return Err(Error::input(ErrorCode::ICE25, &[missing]));
        }
        Ok(Self { uri })
    }

    /// Table URIs, in order
    pub fn uris(&self) -> &[Uri] {
        &self.uri
    }

    /// Canonical tagged dictionary
    pub fn to_dict(&self) -> Value {
        let uris: Vec<String> = self.uri.iter().map(ToString::to_string).collect();
        json!({ Self::IDENTIFIER: { "uri": uris } })
    }

    fn from_object(object: &Object) -> Result<Self> {
        check_keys(Self::IDENTIFIER, object, &["uri"], &["uri"])?;
        match &object["uri"] {
            uri @ Value::String(_) => Self::new(uri),
            Value::Array(uris) => Self::from_uris(uris),
            other => Err(Error::input(ErrorCode::ICE31, &[&type_name(other)])),
        }
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Where a dataset reads its data from
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Azure blob storage
    Azure(AzureInput),
    /// Local files
    LocalFile(LocalFileInput),
    /// MySQL queries
    MySql(MySqlInput),
    /// S3 objects
    S3(S3Input),
    /// Tables in the system
    Table(TableInput),
}

impl Input {
    /// Tag of the wire form
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::Azure(_) => AzureInput::IDENTIFIER,
            Self::LocalFile(_) => LocalFileInput::IDENTIFIER,
            Self::MySql(_) => MySqlInput::IDENTIFIER,
            Self::S3(_) => S3Input::IDENTIFIER,
            Self::Table(_) => TableInput::IDENTIFIER,
        }
    }

    /// Canonical tagged dictionary
    pub fn to_dict(&self) -> Result<Value> {
        match self {
            Self::Azure(input) => input.to_dict(),
            Self::LocalFile(input) => input.to_dict(),
            Self::MySql(input) => Ok(input.to_dict()),
            Self::S3(input) => input.to_dict(),
            Self::Table(input) => Ok(input.to_dict()),
        }
    }

    fn from_dict(object: &Object) -> Result<Self> {
        let (identifier, inner) =
            wire::split_tagged(object, &INPUT_IDENTIFIERS).map_err(|e| match e {
                TagError::Keys(keys) => Error::input(
                    ErrorCode::ICE7,
                    &[&wire::quoted_list(&INPUT_IDENTIFIERS), &wire::quoted_list(&keys)],
                ),
                TagError::NotObject { identifier, found } => {
                    Error::input(ErrorCode::ICE8, &[&identifier, &found])
                }
            })?;
        let input = match identifier {
            AzureInput::IDENTIFIER => Self::Azure(AzureInput::from_object(inner)?),
            LocalFileInput::IDENTIFIER => Self::LocalFile(LocalFileInput::from_object(inner)?),
            MySqlInput::IDENTIFIER => Self::MySql(MySqlInput::from_object(inner)?),
            S3Input::IDENTIFIER => Self::S3(S3Input::from_object(inner)?),
            _ => Self::Table(TableInput::from_object(inner)?),
        };
        tracing::debug!(identifier, "Built input from dictionary");
        Ok(input)
    }
}

macro_rules! input_variant {
    ($variant:ident, $input:ident) => {
        impl From<$input> for Input {
            fn from(input: $input) -> Self {
                Self::$variant(input)
            }
        }

        impl IntoInput for $input {
            fn into_input(self) -> Result<Option<Input>> {
                Ok(Some(Input::$variant(self)))
            }
        }
    };
}

input_variant!(Azure, AzureInput);
input_variant!(LocalFile, LocalFileInput);
input_variant!(MySql, MySqlInput);
input_variant!(S3, S3Input);
input_variant!(Table, TableInput);

/// Anything that can be turned into an optional [`Input`]
pub trait IntoInput {
    /// Resolve into an input; `None` when nothing was configured
    fn into_input(self) -> Result<Option<Input>>;
}

impl IntoInput for Input {
    fn into_input(self) -> Result<Option<Input>> {
        Ok(Some(self))
    }
}

impl IntoInput for &Value {
    fn into_input(self) -> Result<Option<Input>> {
        match self {
            Value::Null => Ok(None),
            Value::Object(object) if object.is_empty() => Ok(None),
            Value::Object(object) => Input::from_dict(object).map(Some),
            other => Err(Error::input(ErrorCode::ICE11, &[&type_name(other)])),
        }
    }
}

impl IntoInput for Value {
    fn into_input(self) -> Result<Option<Input>> {
        (&self).into_input()
    }
}

impl<T: IntoInput> IntoInput for Option<T> {
    fn into_input(self) -> Result<Option<Input>> {
        match self {
            Some(input) => input.into_input(),
            None => Ok(None),
        }
    }
}

/// Build an input from a tagged dictionary or an input object
pub fn build_input(input: impl IntoInput) -> Result<Option<Input>> {
    input.into_input()
}

fn check_keys(
    identifier: &str,
    object: &Object,
    accepted: &[&'static str],
    required: &[&'static str],
) -> Result<()> {
    wire::check_keys(object, accepted, required).map_err(|e| match e {
        KeyError::Missing(key) => Error::input(ErrorCode::ICE9, &[&identifier, &key]),
        KeyError::Unexpected(key) => Error::input(
            ErrorCode::ICE10,
            &[&identifier, &key, &wire::quoted_list(accepted)],
        ),
    })
}

fn is_empty_object(value: &Value) -> bool {
    value.as_object().is_some_and(Map::is_empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::CsvFormat;
    use crate::secret::Secret;

    fn s3_credentials() -> Value {
        json!({"s3-access-key-credentials": {
            "aws_access_key_id": "AKIA",
            "aws_secret_access_key": "secret",
        }})
    }

    fn azure_credentials() -> Value {
        json!({"azure-account-key-credentials": {
            "azure_account_name": "account",
            "azure_account_key": "key",
        }})
    }

    #[test]
    fn test_s3_infers_csv() {
        let input = S3Input::new("s3://bucket/path/data.csv", s3_credentials()).unwrap();
        assert_eq!(input.explicit_format(), None);
        assert_eq!(input.implicit_format(), Some("csv"));
        assert_eq!(input.format().unwrap(), FileFormat::Csv(CsvFormat::default()));
    }

    #[test]
    fn test_s3_without_extension_needs_format() {
        let err = S3Input::new("s3://bucket/path/data", s3_credentials()).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ICE18));
        assert!(err.to_string().contains("parquet"));
    }

    #[test]
    fn test_explicit_format_skips_inference() {
        let input = S3Input::builder("s3://bucket/path/data", s3_credentials())
            .format("parquet")
            .build()
            .unwrap();
        assert_eq!(input.format().unwrap(), FileFormat::Parquet);

        // Dropping the explicit format brings inference back
        let err = input.without_format().unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ICE18));
    }

    #[test]
    fn test_unknown_extension_fails_to_build_format() {
        let err = S3Input::new("s3://bucket/data.xlsx", s3_credentials()).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::FOCE4));
    }

    #[test]
    fn test_s3_scheme_and_credentials() {
        let err = S3Input::new("az://bucket/data.csv", s3_credentials()).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ICE17));

        let err = S3Input::new("s3://bucket/data.csv", azure_credentials()).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ICE20));
    }

    #[test]
    fn test_s3_region() {
        let input = S3Input::builder("s3://bucket/data.csv", s3_credentials())
            .region("eu-west-1")
            .build()
            .unwrap();
        assert_eq!(input.region(), Some("eu-west-1"));

        // Unknown regions are kept
        let input = input.with_region(Some("mars-north-1"));
        assert_eq!(input.region(), Some("mars-north-1"));
        assert_eq!(input.with_region(Some("")).region(), None);

        let err = build_input(json!({"s3-input": {
            "uri": "s3://bucket/data.csv",
            "credentials": s3_credentials(),
            "region": 7,
        }}))
        .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ICE26));
    }

    #[test]
    fn test_with_locations_revalidates_implicit_format() {
        let input = S3Input::new("s3://bucket/a.csv", s3_credentials()).unwrap();
        let moved = input.with_locations(["s3://bucket/b.parquet"]).unwrap();
        assert_eq!(moved.format().unwrap(), FileFormat::Parquet);

        let err = input.with_locations("s3://bucket/b").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ICE18));

        let explicit = input.with_format("log").unwrap();
        let moved = explicit.with_locations("s3://bucket/b").unwrap();
        assert_eq!(moved.format().unwrap(), FileFormat::Log);
    }

    #[test]
    fn test_azure_input() {
        let input = AzureInput::new(["az://container/a.jsonl", "az://container/b"], azure_credentials())
            .unwrap();
        assert_eq!(input.format().unwrap(), FileFormat::NdJson);

        let err = AzureInput::new("s3://container/a.csv", azure_credentials()).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ICE29));

        let err = AzureInput::new("az://container/a", azure_credentials()).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ICE27));

        let err = AzureInput::new("az://container/a.csv", s3_credentials()).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ICE30));
    }

    #[test]
    fn test_local_file_input() {
        let input = LocalFileInput::new("/data/in.csv").unwrap();
        assert_eq!(input.locations(), &OneOrMany::from("/data/in.csv"));

        assert!(LocalFileInput::new("file:///data/in.csv").is_ok());

        let err = LocalFileInput::new("s3://bucket/in.csv").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ICE14));

        let err = LocalFileInput::new("/data/in").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ICE15));

        let err = build_input(json!({"localfile-input": {"path": 3}})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ICE13));
    }

    #[test]
    fn test_initial_last_modified() {
        let input = LocalFileInput::builder("/data/in.csv")
            .initial_last_modified("2024-05-01T12:00:00")
            .build()
            .unwrap();
        let dict = input.to_dict().unwrap();
        assert_eq!(
            dict["localfile-input"]["initial_last_modified"],
            json!("2024-05-01T12:00:00.000000+00:00")
        );

        let err = LocalFileInput::builder("/data/in.csv")
            .initial_last_modified("last tuesday")
            .build()
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ICE5));

        assert_eq!(input.without_initial_last_modified().initial_last_modified(), None);
    }

    #[test]
    fn test_s3_to_dict() {
        let input = S3Input::builder("s3://bucket/data.csv", s3_credentials())
            .region("us-east-1")
            .build()
            .unwrap();
        let dict = input.to_dict().unwrap();
        let fields = &dict["s3-input"];
        assert_eq!(fields["uri"], json!(["s3://bucket/data.csv"]));
        assert_eq!(fields["region"], json!("us-east-1"));
        assert_eq!(fields["initial_last_modified"], Value::Null);
        assert!(fields["format"]["csv-format"].is_object());
        assert_eq!(
            fields["credentials"]["s3-access-key-credentials"]["aws_access_key_id"],
            Secret::direct("AKIA").to_dict()
        );

        // The inferred format is written out explicitly
        let rebuilt = build_input(&dict).unwrap().unwrap();
        assert_eq!(rebuilt.to_dict().unwrap(), dict);
        let Input::S3(rebuilt) = rebuilt else {
            panic!("Expected S3 input");
        };
        assert_eq!(rebuilt.explicit_format(), Some(&FileFormat::Csv(CsvFormat::default())));
    }

    #[test]
    fn test_mysql_input() {
        let input = MySqlInput::new("mysql://db:3306/shop", "select * from orders")
            .unwrap()
            .with_credentials(json!({"user-password-credentials": {"user": "u", "password": "p"}}))
            .unwrap();
        assert_eq!(input.host(), "db");
        assert_eq!(input.port(), Some(3306));
        assert_eq!(input.database(), "shop");

        let dict = input.to_dict();
        assert_eq!(dict["mysql-input"]["query"], json!("select * from orders"));
        assert_eq!(dict["mysql-input"]["initial_values"], json!({}));
        assert_eq!(build_input(&dict).unwrap(), Some(Input::MySql(input)));
    }

    #[test]
    fn test_mysql_input_errors() {
        let err = MySqlInput::new("postgres://db:5432/shop", "select 1").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ICE2));

        let err = MySqlInput::new("mysql://db/shop", "select 1")
            .unwrap()
            .with_credentials(s3_credentials())
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ICE22));

        let err = build_input(json!({"mysql-input": {"uri": "mysql://db/shop", "query": 1}})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ICE19));

        let err = build_input(json!({"mysql-input": {"uri": 1, "query": "select 1"}})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ICE32));

        let err = build_input(json!({"mysql-input": {
            "uri": "mysql://db/shop", "query": "select 1", "initial_values": [1]
        }}))
        .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ICE12));
    }

    #[test]
    fn test_table_input() {
        let dict = json!({"table-input": {"uri": "td://ds/x"}});
        let input = build_input(&dict).unwrap().unwrap();
        assert_eq!(input.to_dict().unwrap(), json!({"table-input": {"uri": ["td://ds/x"]}}));
        assert_eq!(build_input(input.to_dict().unwrap()).unwrap(), Some(input));

        let err = build_input(json!({"table-input": {"uri": "td://ds"}})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ICE25));

        let many = TableInput::from_uris(["td://a/t1", "td:///store/b/t2@HEAD"]).unwrap();
        assert_eq!(many.uris().len(), 2);

        let err = build_input(json!({"table-input": {"uri": 5}})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ICE31));
    }

    #[test]
    fn test_build_input_dispatch_errors() {
        assert_eq!(build_input(Value::Null).unwrap(), None);
        assert_eq!(build_input(json!({})).unwrap(), None);
        assert_eq!(build_input(None::<Input>).unwrap(), None);

        let err = build_input(json!({"ftp-input": {}})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ICE7));

        let err = build_input(json!({"table-input": []})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ICE8));

        let err = build_input(json!("td://ds/t")).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ICE11));

        let err = build_input(json!({"table-input": {}})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ICE9));

        let err = build_input(json!({"table-input": {"uri": "td://ds/t", "format": "csv"}})).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ICE10));
    }

    #[test]
    fn test_typed_input_is_returned_unchanged() {
        let input = TableInput::new("td://ds/t").unwrap();
        assert_eq!(build_input(input.clone()).unwrap(), Some(Input::Table(input)));
    }
}
