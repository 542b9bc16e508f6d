//! Error catalog and error types for tabset-core
//!
//! Every configuration failure carries a stable code from [`ErrorCode`] and a
//! fully interpolated message. Codes are grouped by [`ErrorCategory`]; the
//! category of a code is the prefix in front of its dash (`UCE-009` belongs to
//! [`ErrorCategory::Uri`]).

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for tabset-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// The concern an error code belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Building a credentials object
    Credentials,
    /// Building a file format
    Format,
    /// Assembling a dataset definition
    Function,
    /// Building an input connector
    Input,
    /// Building an output connector
    Output,
    /// Registering a dataset function
    Registration,
    /// Internal consistency violations (a bug in this crate)
    Sdk,
    /// Building a secret
    Secret,
    /// Handling a restricted dataframe
    DataFrame,
    /// Updating a dataset on the server
    Server,
    /// Building a URI or a version qualifier
    Uri,
}

impl ErrorCategory {
    /// Every category, in catalog order
    pub const ALL: [ErrorCategory; 11] = [
        Self::Credentials,
        Self::Format,
        Self::Function,
        Self::Input,
        Self::Output,
        Self::Registration,
        Self::Sdk,
        Self::Secret,
        Self::DataFrame,
        Self::Server,
        Self::Uri,
    ];

    /// Code prefix every code of this category starts with
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Credentials => "CCE",
            Self::Format => "FOCE",
            Self::Function => "FCE",
            Self::Input => "ICE",
            Self::Output => "OCE",
            Self::Registration => "RE",
            Self::Sdk => "SDKE",
            Self::Secret => "SCE",
            Self::DataFrame => "TDF",
            Self::Server => "TSE",
            Self::Uri => "UCE",
        }
    }

    /// Human-readable name of the error kind, used in internal diagnostics
    pub const fn error_name(self) -> &'static str {
        match self {
            Self::Credentials => "CredentialsConfigurationError",
            Self::Format => "FormatConfigurationError",
            Self::Function => "FunctionConfigurationError",
            Self::Input => "InputConfigurationError",
            Self::Output => "OutputConfigurationError",
            Self::Registration => "RegistrationError",
            Self::Sdk => "SdkError",
            Self::Secret => "SecretConfigurationError",
            Self::DataFrame => "DataFrameError",
            Self::Server => "ServerError",
            Self::Uri => "UriConfigurationError",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.error_name())
    }
}

macro_rules! error_catalog {
    ($($variant:ident => ($code:literal, $template:expr)),+ $(,)?) => {
        /// Catalog of every error the SDK can raise
        ///
        /// Each entry pairs a stable code with a message template whose `{}`
        /// placeholders are filled positionally.
        #[allow(clippy::upper_case_acronyms)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ErrorCode {
            $(
                #[doc = $code]
                $variant,
            )+
        }

        impl ErrorCode {
            /// Every entry of the catalog
            pub const ALL: &'static [ErrorCode] = &[$(Self::$variant),+];

            /// Stable code string, e.g. `UCE-009`
            pub const fn code(self) -> &'static str {
                match self {
                    $(Self::$variant => $code,)+
                }
            }

            /// Message template with positional `{}` placeholders
            pub const fn template(self) -> &'static str {
                match self {
                    $(Self::$variant => $template,)+
                }
            }
        }
    };
}

error_catalog! {
    CCE1 => ("CCE-001", "The dictionary to build a Credentials object must contain exactly one key, which must be one of the following: {}. Instead, got the following key(s) in the dictionary: {}."),
    CCE2 => ("CCE-002", "The '{}' key in the dictionary to build a Credentials must have an object of type 'dict' as its value. Instead, got an object of type '{}'."),
    CCE3 => ("CCE-003", "The 'credentials' parameter must be one of {}, got '{}' instead."),
    CCE4 => ("CCE-004", "The '{}' dictionary to build a Credentials must contain the key '{}', but it is not present."),
    CCE5 => ("CCE-005", "The '{}' dictionary to build a Credentials does not accept the key '{}'. The accepted keys are {}."),
    FCE1 => ("FCE-001", "The 'function' parameter of a DatasetDefinition must name the entry point of the dataset function, got an object of type '{}' instead."),
    FCE2 => ("FCE-002", "The 'trigger_by' parameter of a DatasetDefinition must be a str or a URI object, got an object of type '{}' instead."),
    FCE3 => ("FCE-003", "The 'trigger_by' parameter of a DatasetDefinition must point to a dataset in the system. Instead got '{}', which does not contain a dataset."),
    FCE4 => ("FCE-004", "The 'trigger_by' parameter of a DatasetDefinition must point to a dataset in the system. Instead got '{}', which points to a table."),
    FCE5 => ("FCE-005", "A DatasetDefinition must have either a TableInput as the input or a TableOutput as the output. Instead got {} as the input and {} as the output."),
    FCE6 => ("FCE-006", "The 'name' parameter in DatasetDefinition must be of type 'str'; got '{}' instead."),
    FCE7 => ("FCE-007", "The dataset definition must contain the key '{}', but it is not present."),
    FCE8 => ("FCE-008", "The dataset definition does not accept the key '{}'. The accepted keys are {}."),
    FOCE1 => ("FOCE-001", "The dictionary to build a FileFormat object must contain exactly one key, which must be one of the following: {}. Instead, got the following key(s) in the dictionary: {}."),
    FOCE2 => ("FOCE-002", "The '{}' key in the dictionary to build a FileFormat must have an object of type 'dict' as its value. Instead, got an object of type '{}'."),
    FOCE3 => ("FOCE-003", "The '{}' parameter for a {} must be one of the following types: '{}'. Instead, got an object of type '{}'."),
    FOCE4 => ("FOCE-004", "The format string received was '{}', which is not one of the supported formats. The supported formats are: '{}'. If the format was not provided, it was inferred from the file extension. Please provide an explicit format that is supported, or use a FileFormat object."),
    FOCE5 => ("FOCE-005", "The 'format' parameter must be one of {}, got '{}' instead."),
    FOCE6 => ("FOCE-006", "The 'format' parameter must be one of {}, got 'None' instead. The most likely reason is that the format was not provided, and it could not be inferred from the file extension. Please provide it explicitly."),
    FOCE7 => ("FOCE-007", "The '{}' dictionary to build a FileFormat does not accept the key '{}'. The accepted keys are {}."),
    ICE1 => ("ICE-001", "Scheme '{}' not currently supported. The supported schemes are {}. Try using class {} instead."),
    ICE2 => ("ICE-002", "Scheme '{}' not supported. The supported schemes are {}. The scheme is inferred from the URI, which should be of the form 'scheme://path'. The URI provided was '{}'."),
    ICE3 => ("ICE-003", "The 'format' parameter in a FileInput must be a 'str' or a 'dict', got '{}' instead"),
    ICE4 => ("ICE-004", "File format '{}' not supported. The supported formats are {}. If the format was not provided, it was inferred from the file(s) extension."),
    ICE5 => ("ICE-005", "The 'initial_last_modified' parameter in a FileInput must be a string in ISO 8601 format. Got the string '{}', but it was not in ISO 8601 format."),
    ICE6 => ("ICE-006", "The 'initial_last_modified' parameter in a FileInput must be a string in ISO 8601 format. Instead, got an object of type '{}'."),
    ICE7 => ("ICE-007", "The 'input' dictionary to build a Input must contain exactly one key, which must be one of the following: {}. Instead, got the following key(s) in the dictionary: {}."),
    ICE8 => ("ICE-008", "The '{}' key in the dictionary to build a Input must have an object of type 'dict' as its value. Instead, got an object of type '{}'."),
    ICE9 => ("ICE-009", "The '{}' dictionary to build a Input must contain the key '{}', but it is not present."),
    ICE10 => ("ICE-010", "The '{}' dictionary to build a Input does not accept the key '{}'. The accepted keys are {}."),
    ICE11 => ("ICE-011", "The 'input' parameter to build a Input must be a 'dict', a Input object or 'None', got '{}' instead."),
    ICE12 => ("ICE-012", "The 'initial_values' parameter in a MySQLInput must be a 'dict' or 'None', got '{}' instead"),
    ICE13 => ("ICE-013", "The 'path' parameter in a LocalFileInput must be a 'str' or a 'list[str]', got '{}' instead"),
    ICE14 => ("ICE-014", "Scheme '{}' not supported. The supported scheme is '{}'. The scheme is inferred from the path, which should be of the form 'scheme://path' or '/path'. The provided path was '{}'."),
    ICE15 => ("ICE-015", "The 'format' parameter for the LocalFileInput was not provided, and we were unable to infer it from the extension of the files in the path parameter. The supported formats are '{}' and the obtained path was '{}'."),
    ICE16 => ("ICE-016", "The 'uri' parameter in a S3Input must be a 'str' or a 'list[str]', got '{}' instead"),
    ICE17 => ("ICE-017", "Scheme '{}' not supported. The supported scheme is '{}'. The scheme is inferred from the URI, which should be of the form 'scheme://path'. The URI provided was '{}'."),
    ICE18 => ("ICE-018", "The 'format' parameter for the S3Input was not provided, and we were unable to infer it from the extension of the files in the URI parameter. The supported formats are '{}' and the obtained URI was '{}'."),
    ICE19 => ("ICE-019", "The 'query' parameter in a MySQLInput must be a 'str' or a 'list[str]', got '{}' instead"),
    ICE20 => ("ICE-020", "The 'credentials' parameter in a S3Input must be a 'dict' or a 'S3Credentials' object, got '{}' instead"),
    ICE21 => ("ICE-021", "The 'configs' parameter in a MySQLInput must be a 'dict' or None, got '{}' instead"),
    ICE22 => ("ICE-022", "The 'credentials' parameter in a MySQLInput must be a 'dict', a 'UserPasswordCredentials' object or None, got '{}' instead"),
    ICE25 => ("ICE-025", "URIs for a TableInput must be a valid uri and represent a table in the system, got '{}' instead."),
    ICE26 => ("ICE-026", "The 'region' parameter in a S3FileInput must be a 'str', got '{}' instead"),
    ICE27 => ("ICE-027", "The 'format' parameter for the AzureInput was not provided, and we were unable to infer it from the extension of the files in the URI parameter. The supported formats are '{}' and the obtained URI was '{}'."),
    ICE28 => ("ICE-028", "The 'uri' parameter in a AzureInput must be a 'str' or a 'list[str]', got '{}' instead"),
    ICE29 => ("ICE-029", "Scheme '{}' not supported for AzureInput. The supported scheme is '{}'. The scheme is inferred from the URI, which should be of the form 'scheme://path'. The URI provided was '{}'."),
    ICE30 => ("ICE-030", "The 'credentials' parameter in a AzureInput must be a 'dict' or a 'AzureCredentials' object, got '{}' instead"),
    ICE31 => ("ICE-031", "The 'uri' parameter in a TableInput must be a 'str' or a 'list[str]', got '{}' instead"),
    ICE32 => ("ICE-032", "The 'uri' parameter in a MySQLInput must be a 'str', got '{}' instead"),
    OCE1 => ("OCE-001", "Scheme '{}' not currently supported. The supported schemes are {}. Try using class {} instead."),
    OCE2 => ("OCE-002", "Scheme '{}' not currently supported. The supported schemes are {}. The scheme is inferred from the URI, which should be of the form 'scheme://path'. The URI provided was '{}'."),
    OCE3 => ("OCE-003", "The 'output' dictionary to build a Output must contain exactly one key, which must be one of the following: {}. Instead, got the following key(s) in the dictionary: {}."),
    OCE4 => ("OCE-004", "The '{}' key in the dictionary to build a Output must have an object of type 'dict' as its value. Instead, got an object of type '{}'."),
    OCE5 => ("OCE-005", "The '{}' dictionary to build a Output must contain the key '{}', but it is not present."),
    OCE6 => ("OCE-006", "The '{}' dictionary to build a Output does not accept the key '{}'. The accepted keys are {}."),
    OCE7 => ("OCE-007", "The 'output' parameter to build a Output must be a 'dict', a Output object or 'None', got '{}' instead."),
    OCE8 => ("OCE-008", "The 'destination_table' parameter in a MySQLOutput must be a 'list' or a 'str', got '{}' instead."),
    OCE9 => ("OCE-009", "The 'credentials' parameter in a MySQLOutput must be a 'dict', a 'UserPasswordCredentials' object or None; got '{}' instead."),
    OCE10 => ("OCE-010", "The 'table' parameter in a TableOutput must be a 'str' or a list of 'str'; got '{}' of type '{}' instead."),
    OCE11 => ("OCE-011", "The 'uri' parameter in a MySQLOutput must be a 'str', got '{}' instead"),
    RE1 => ("RE-001", "The 'function' parameter of the register function must be a DatasetDefinition. Build one from a dataset file or in code before registering it."),
    RE2 => ("RE-002", "The 'code_location' and 'save_target' parameters of the register function cannot be used simultaneously. Either provide 'code_location' and a path to the code you want to be stored, or 'save_target' with value 'file' (to save only the file where the function is declared) or 'folder' (to save the entire folder where the original file of the function is)."),
    RE3 => ("RE-003", "The 'save_target' parameter of the register function has value {}, which is not one of the allowed values: {}."),
    RE4 => ("RE-004", "The 'save_location' parameter of the register function has value {}, which is not a valid folder path. Please ensure the path to the folder exists."),
    RE5 => ("RE-005", "The 'path_to_code' parameter of the register function has value {}, which is not a valid system path. Please ensure it is a valid path to either a folder or a file."),
    RE6 => ("RE-006", "The 'local_packages' parameter provided to the register function must be a string or a list of strings representing valid paths to folders in your local system. The provided path '{}' does not exist or is not a folder."),
    RE7 => ("RE-007", "The 'requirements' parameter provided to the register function must be a string representing a valid path to a yaml file in your local system. The provided path '{}' does not exist or is not a file."),
    RE8 => ("RE-008", "The 'requirements' file provided to the register function must contain the key '{}', which indicates the runtime version to use. The provided file '{}' does not contain this key. The data it contains is: '{}'"),
    RE9 => ("RE-009", "The 'requirements' file provided to the register function must contain the key '{}', which indicates the packages to install. The provided file '{}' does not contain this key. The data it contains is: '{}'"),
    RE10 => ("RE-010", "The 'requirements' file provided to the register function must contain the key '{}' with a list of packages to install. The provided file '{}' contains this key, but it has a content of type '{}'."),
    SDKE1 => ("SDKE-001", "The SDK tried to raise an exception of type '{}', but the error code provided was '{}', which does not start with the expected prefix '{}'. The message provided by the original exception was: '{}'."),
    SDKE2 => ("SDKE-002", "The SDK tried to raise the error code '{}' with {} argument(s), but its message template expects {}."),
    SCE1 => ("SCE-001", "The dictionary to build a Secret object must contain exactly one key, which must be one of the following: {}. Instead, got the following key(s) in the dictionary: {}."),
    SCE2 => ("SCE-002", "The '{}' key in the dictionary to build a Secret must have an object of type 'dict' as its value. Instead, got an object of type '{}'."),
    SCE3 => ("SCE-003", "The parameter to build a Secret object must be one of {}, got '{}' instead."),
    SCE4 => ("SCE-004", "The '{}' dictionary to build a Secret must contain the key '{}' with a 'str' value, but it is not present."),
    SCE5 => ("SCE-005", "The '{}' dictionary to build a Secret does not accept the key '{}'. The accepted keys are {}."),
    TDF1 => ("TDF-001", "The input DataFrame is missing the required column(s) '{}'."),
    TDF2 => ("TDF-002", "A restricted frame must be instantiated with a lazy frame, a data frame, or another restricted frame. '{}' was provided instead."),
    TSE1 => ("TSE-001", "If you want to update the directory_to_bundle, requirements or local_packages, you must provide the function_path."),
    UCE1 => ("UCE-001", "The 'version' parameter of a Version object must be a 'str', got '{}' instead."),
    UCE2 => ("UCE-002", "The 'initial_version' parameter of a VersionRange object must resolve to a '{}' object, got '{}' instead that is of type '{}'."),
    UCE3 => ("UCE-003", "The 'final_version' parameter of a VersionRange object must resolve to a '{}' object, got '{}' instead that is of type '{}'."),
    UCE4 => ("UCE-004", "The 'version' parameter to build any Version object must be one of '{}', got type '{}' instead."),
    UCE5 => ("UCE-005", "A string to create a VersionRange object must contain exactly two valid versions, separated by a '..', got {} instead."),
    UCE6 => ("UCE-006", "The 'version_list' parameter to build a VersionList object must be of type '{}', got '{}' instead."),
    UCE7 => ("UCE-007", "The 'version_list' parameter must be a list of objects that resolve to type '{}', got '{}' that is of type '{}' instead."),
    UCE8 => ("UCE-008", "The 'version_list' parameter must be a list of 2 or more elements, got '{}' that has length '{}' instead."),
    UCE9 => ("UCE-009", "A valid version string must be of the form 'HEAD', 'HEAD^', 'HEAD~1' or a Hash, i.e., match the regex '{}'. Got '{}' instead."),
    UCE10 => ("UCE-010", "The 'datastore' parameter to build a URI object must be of type 'str' or 'None', got '{}' instead."),
    UCE11 => ("UCE-011", "The 'dataset' parameter to build a URI object must be of type 'str' or 'None', got '{}' instead."),
    UCE12 => ("UCE-012", "The 'table' parameter to build a URI object must be of type 'str' or 'None', got '{}' instead."),
    UCE13 => ("UCE-013", "The 'uri' parameter to build a URI must be of the form td:///datastore</dataset></table><@versions> or td://dataset</table><@versions>, where everything inside <> is optional, got '{}' instead."),
    UCE14 => ("UCE-014", "The 'uri' parameter to build a URI object must be of type 'str' or URI, got '{}' instead."),
    UCE15 => ("UCE-015", "A URI object must have either a valid 'datastore' or 'dataset' parameter, got neither."),
    UCE16 => ("UCE-016", "A URI object cannot have a 'table' parameter without a 'dataset' parameter."),
    UCE17 => ("UCE-017", "The '{}' parameter of a URI object cannot contain the characters '/' or '@', got '{}' instead."),
}

impl ErrorCode {
    /// Category this code belongs to, derived from the code prefix
    pub fn category(self) -> Option<ErrorCategory> {
        let (prefix, _) = self.code().split_once('-')?;
        ErrorCategory::ALL
            .into_iter()
            .find(|category| category.prefix() == prefix)
    }

    /// Number of positional placeholders in the template
    pub fn arity(self) -> usize {
        self.template().matches("{}").count()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A catalog entry bound to its interpolated message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodedError {
    code: ErrorCode,
    message: String,
}

impl CodedError {
    /// The catalog entry
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// The interpolated message, without the code
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CodedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CodedError {}

/// Error payload returned by the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiServerError {
    /// Server-side error code
    #[serde(default)]
    pub code: Option<String>,
    /// Short error identifier
    #[serde(default)]
    pub error: Option<String>,
    /// Human-readable description
    #[serde(default)]
    pub error_description: Option<String>,
}

impl fmt::Display for ApiServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error_description.as_deref() {
            Some(description) if !description.is_empty() => f.write_str(description),
            _ => f.write_str("Unknown error"),
        }
    }
}

impl std::error::Error for ApiServerError {}

/// Errors that can occur in tabset-core
#[derive(Error, Debug)]
pub enum Error {
    /// Credentials object could not be built
    #[error("{0}")]
    Credentials(CodedError),

    /// File format could not be built
    #[error("{0}")]
    Format(CodedError),

    /// Dataset definition is not properly configured
    #[error("{0}")]
    Function(CodedError),

    /// Input connector could not be built
    #[error("{0}")]
    Input(CodedError),

    /// Output connector could not be built
    #[error("{0}")]
    Output(CodedError),

    /// Registration of a dataset function failed
    #[error("{0}")]
    Registration(CodedError),

    /// Internal inconsistency, likely a bug in this crate
    #[error("{0}")]
    Sdk(CodedError),

    /// Secret could not be built
    #[error("{0}")]
    Secret(CodedError),

    /// Restricted dataframe misuse
    #[error("{0}")]
    DataFrame(CodedError),

    /// Server-side update could not be assembled
    #[error("{0}")]
    Server(CodedError),

    /// URI or version qualifier could not be built
    #[error("{0}")]
    Uri(CodedError),

    /// The server answered with an error payload
    #[error("server error: {0}")]
    Api(#[from] ApiServerError),

    /// Configuration file could not be found
    #[error("configuration file not found: {path}")]
    ConfigNotFound {
        /// Path that was searched
        path: String,
    },

    /// Failed to parse YAML
    #[error("failed to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Bind a catalog entry to its arguments under the given category
    ///
    /// A code outside the category, or an argument count that does not match
    /// the template, yields an [`Error::Sdk`] describing the mismatch instead.
    pub fn new(category: ErrorCategory, code: ErrorCode, args: &[&dyn fmt::Display]) -> Self {
        let Some(message) = render(code.template(), args) else {
            return Self::internal(
                ErrorCode::SDKE2,
                &[&code.code(), &args.len(), &code.arity()],
            );
        };
        if !code.code().starts_with(category.prefix()) {
            return Self::internal(
                ErrorCode::SDKE1,
                &[
                    &category.error_name(),
                    &code.code(),
                    &category.prefix(),
                    &message,
                ],
            );
        }
        Self::wrap(category, CodedError { code, message })
    }

    /// Credentials configuration error
    pub fn credentials(code: ErrorCode, args: &[&dyn fmt::Display]) -> Self {
        Self::new(ErrorCategory::Credentials, code, args)
    }

    /// Format configuration error
    pub fn format(code: ErrorCode, args: &[&dyn fmt::Display]) -> Self {
        Self::new(ErrorCategory::Format, code, args)
    }

    /// Dataset definition error
    pub fn function(code: ErrorCode, args: &[&dyn fmt::Display]) -> Self {
        Self::new(ErrorCategory::Function, code, args)
    }

    /// Input configuration error
    pub fn input(code: ErrorCode, args: &[&dyn fmt::Display]) -> Self {
        Self::new(ErrorCategory::Input, code, args)
    }

    /// Output configuration error
    pub fn output(code: ErrorCode, args: &[&dyn fmt::Display]) -> Self {
        Self::new(ErrorCategory::Output, code, args)
    }

    /// Registration error
    pub fn registration(code: ErrorCode, args: &[&dyn fmt::Display]) -> Self {
        Self::new(ErrorCategory::Registration, code, args)
    }

    /// Secret configuration error
    pub fn secret(code: ErrorCode, args: &[&dyn fmt::Display]) -> Self {
        Self::new(ErrorCategory::Secret, code, args)
    }

    /// Restricted dataframe error
    pub fn dataframe(code: ErrorCode, args: &[&dyn fmt::Display]) -> Self {
        Self::new(ErrorCategory::DataFrame, code, args)
    }

    /// Server update error
    pub fn server(code: ErrorCode, args: &[&dyn fmt::Display]) -> Self {
        Self::new(ErrorCategory::Server, code, args)
    }

    /// URI configuration error
    pub fn uri(code: ErrorCode, args: &[&dyn fmt::Display]) -> Self {
        Self::new(ErrorCategory::Uri, code, args)
    }

    /// The coded payload, if this error comes from the catalog
    pub fn coded(&self) -> Option<&CodedError> {
        match self {
            Self::Credentials(e)
            | Self::Format(e)
            | Self::Function(e)
            | Self::Input(e)
            | Self::Output(e)
            | Self::Registration(e)
            | Self::Sdk(e)
            | Self::Secret(e)
            | Self::DataFrame(e)
            | Self::Server(e)
            | Self::Uri(e) => Some(e),
            _ => None,
        }
    }

    /// The catalog entry, if this error comes from the catalog
    pub fn code(&self) -> Option<ErrorCode> {
        self.coded().map(CodedError::code)
    }

    /// The category, if this error comes from the catalog
    pub fn category(&self) -> Option<ErrorCategory> {
        Some(match self {
            Self::Credentials(_) => ErrorCategory::Credentials,
            Self::Format(_) => ErrorCategory::Format,
            Self::Function(_) => ErrorCategory::Function,
            Self::Input(_) => ErrorCategory::Input,
            Self::Output(_) => ErrorCategory::Output,
            Self::Registration(_) => ErrorCategory::Registration,
            Self::Sdk(_) => ErrorCategory::Sdk,
            Self::Secret(_) => ErrorCategory::Secret,
            Self::DataFrame(_) => ErrorCategory::DataFrame,
            Self::Server(_) => ErrorCategory::Server,
            Self::Uri(_) => ErrorCategory::Uri,
            _ => return None,
        })
    }

    fn internal(code: ErrorCode, args: &[&dyn fmt::Display]) -> Self {
        let message = render(code.template(), args).unwrap_or_else(|| code.template().to_string());
        Self::Sdk(CodedError { code, message })
    }

    fn wrap(category: ErrorCategory, coded: CodedError) -> Self {
        match category {
            ErrorCategory::Credentials => Self::Credentials(coded),
            ErrorCategory::Format => Self::Format(coded),
            ErrorCategory::Function => Self::Function(coded),
            ErrorCategory::Input => Self::Input(coded),
            ErrorCategory::Output => Self::Output(coded),
            ErrorCategory::Registration => Self::Registration(coded),
            ErrorCategory::Sdk => Self::Sdk(coded),
            ErrorCategory::Secret => Self::Secret(coded),
            ErrorCategory::DataFrame => Self::DataFrame(coded),
            ErrorCategory::Server => Self::Server(coded),
            ErrorCategory::Uri => Self::Uri(coded),
        }
    }
}

/// Fill `{}` placeholders in order; `None` when the argument count differs
fn render(template: &str, args: &[&dyn fmt::Display]) -> Option<String> {
    let pieces: Vec<&str> = template.split("{}").collect();
    if pieces.len() != args.len() + 1 {
        return None;
    }
    let mut message = String::with_capacity(template.len());
    for (piece, arg) in pieces.iter().zip(args) {
        message.push_str(piece);
        message.push_str(&arg.to_string());
    }
    message.push_str(pieces[pieces.len() - 1]);
    Some(message)
}
