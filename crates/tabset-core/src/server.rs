//! Client-side façade over the server API
//!
//! The HTTP transport and the code bundler are collaborators supplied by the
//! caller through [`ServerConnection`] and [`BundleBuilder`]. [`TabsetServer`]
//! knows the API endpoints, builds their payloads from dataset definitions
//! and decodes the responses into the models below.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};

use crate::connectors::{Input, Output};
use crate::error::{ApiServerError, Error, ErrorCode, Result};
use crate::function::DatasetDefinition;

/// Result of a raw API call
pub type ApiResult<T> = std::result::Result<T, ApiServerError>;

/// Transport to the server API
///
/// Endpoints are paths relative to the API root (`/datastores`). Error
/// responses are returned as their decoded [`ApiServerError`] payload.
#[async_trait]
pub trait ServerConnection: Send + Sync {
    /// GET an endpoint
    async fn get(&self, endpoint: &str) -> ApiResult<Value>;

    /// POST a JSON body
    async fn post(&self, endpoint: &str, data: Value) -> ApiResult<Value>;

    /// POST a binary body
    async fn post_binary(&self, endpoint: &str, data: Vec<u8>) -> ApiResult<Value>;

    /// DELETE an endpoint
    async fn delete(&self, endpoint: &str) -> ApiResult<Value>;
}

/// What to put in a code bundle
#[derive(Debug, Clone, Default)]
pub struct BundleOptions {
    /// Directory to bundle; defaults to the one holding the definition
    pub path_to_bundle: Option<PathBuf>,
    /// Requirements file describing the runtime environment
    pub requirements: Option<PathBuf>,
    /// Local packages shipped with the code
    pub local_packages: Vec<PathBuf>,
}

impl BundleOptions {
    /// True when nothing about the bundle was requested
    pub fn is_empty(&self) -> bool {
        self.path_to_bundle.is_none() && self.requirements.is_none() && self.local_packages.is_empty()
    }
}

/// Produces the archive uploaded for a dataset
pub trait BundleBuilder: Send + Sync {
    /// Write the archive for `definition` under `save_location` and return its path
    fn create_bundle(
        &self,
        definition_path: &Path,
        definition: &DatasetDefinition,
        options: &BundleOptions,
        save_location: &Path,
    ) -> Result<PathBuf>;
}

// ============================================================================
// Models
// ============================================================================

/// Render a millisecond epoch timestamp as `YYYY-MM-DDTHH:MM:SSZ`
pub fn format_millis(timestamp: Option<i64>) -> String {
    match timestamp {
        None => "None".to_string(),
        Some(0) => "0".to_string(),
        Some(millis) => DateTime::from_timestamp_millis(millis)
            .map(|t| t.format("%Y-%m-%dT%H:%M:%SZ").to_string())
            .unwrap_or_else(|| millis.to_string()),
    }
}

/// A top-level namespace of datasets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Datastore {
    /// Datastore name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Creation time, milliseconds since the epoch
    #[serde(default)]
    pub created_on: Option<i64>,
    /// Creator
    #[serde(default)]
    pub created_by: Option<String>,
    /// Fields this client does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Datastore {
    /// Creation time as text
    pub fn created_on_string(&self) -> String {
        format_millis(self.created_on)
    }
}

impl PartialEq for Datastore {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Display for Datastore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Name: '{}', description: '{}', created_on: '{}', created_by: '{}'",
            self.name,
            self.description.as_deref().unwrap_or_default(),
            self.created_on_string(),
            self.created_by.as_deref().unwrap_or_default()
        )
    }
}

/// A version of the code behind a dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    /// URI of the triggering dataset
    #[serde(default)]
    pub trigger_with_names: Option<String>,
    /// Tables the function produces
    #[serde(default)]
    pub tables: Vec<String>,
    /// URIs the function reads
    #[serde(default)]
    pub dependencies_with_names: Vec<String>,
    /// Function name
    #[serde(default)]
    pub name: Option<String>,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Creation time, milliseconds since the epoch
    #[serde(default)]
    pub created_on: Option<i64>,
    /// Creator
    #[serde(default)]
    pub created_by: Option<String>,
    /// Fields this client does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Function {
    const DEFINITION_KEYS: [&'static str; 3] =
        ["trigger_with_names", "tables", "dependencies_with_names"];

    /// Creation time as text
    pub fn created_on_string(&self) -> String {
        format_millis(self.created_on)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "Name: {}, ", name)?;
        }
        if let Some(description) = &self.description {
            write!(f, "description: '{}', ", description)?;
        }
        if self.created_on.is_some() {
            write!(f, "created on: {}, ", self.created_on_string())?;
        }
        if let Some(created_by) = &self.created_by {
            write!(f, "created by: {}, ", created_by)?;
        }
        write!(
            f,
            "dependency URIs: {:?}, trigger URI: {}, tables: {:?}",
            self.dependencies_with_names,
            self.trigger_with_names.as_deref().unwrap_or("None"),
            self.tables
        )
    }
}

/// A dataset registered in a datastore
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    /// Dataset name
    pub name: String,
    /// Owning datastore
    #[serde(default)]
    pub datastore: String,
    /// Creation time, milliseconds since the epoch
    #[serde(default)]
    pub created_on: Option<i64>,
    /// Creator
    #[serde(default)]
    pub created_by: Option<String>,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Current function, when fetched individually
    #[serde(default)]
    pub function: Option<Function>,
    /// Fields this client does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Dataset {
    /// Creation time as text
    pub fn created_on_string(&self) -> String {
        format_millis(self.created_on)
    }
}

impl PartialEq for Dataset {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.datastore == other.datastore
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Name: {}, datastore: {}, description: '{}', created on: {}, created by: {}",
            self.name,
            self.datastore,
            self.description.as_deref().unwrap_or_default(),
            self.created_on_string(),
            self.created_by.as_deref().unwrap_or_default()
        )?;
        if let Some(function) = &self.function {
            write!(f, ", function: <{}>", function)?;
        }
        Ok(())
    }
}

/// State of an execution plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExecutionPlanStatus {
    /// `C`
    Cancelled,
    /// `D`
    Done,
    /// `E`
    Error,
    /// `F`
    Failed,
    /// `R`
    Running,
    /// `S`
    Scheduled,
    /// Any status letter this client does not know
    Other(String),
}

impl From<String> for ExecutionPlanStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "C" => Self::Cancelled,
            "D" => Self::Done,
            "E" => Self::Error,
            "F" => Self::Failed,
            "R" => Self::Running,
            "S" => Self::Scheduled,
            _ => Self::Other(status),
        }
    }
}

impl From<ExecutionPlanStatus> for String {
    fn from(status: ExecutionPlanStatus) -> Self {
        match status {
            ExecutionPlanStatus::Cancelled => "C".to_string(),
            ExecutionPlanStatus::Done => "D".to_string(),
            ExecutionPlanStatus::Error => "E".to_string(),
            ExecutionPlanStatus::Failed => "F".to_string(),
            ExecutionPlanStatus::Running => "R".to_string(),
            ExecutionPlanStatus::Scheduled => "S".to_string(),
            ExecutionPlanStatus::Other(status) => status,
        }
    }
}

impl fmt::Display for ExecutionPlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cancelled => "Cancelled",
            Self::Done => "Done",
            Self::Error => "Error",
            Self::Failed => "Failed",
            Self::Running => "Running",
            Self::Scheduled => "Scheduled",
            Self::Other(status) => status,
        };
        write!(f, "{}", name)
    }
}

/// A triggered run of a dataset and everything downstream of it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    /// Datastore of the triggering dataset
    pub datastore: String,
    /// Triggering dataset
    pub dataset: String,
    /// User that triggered the plan
    #[serde(default)]
    pub triggered_by: Option<String>,
    /// Trigger time, milliseconds since the epoch
    #[serde(default)]
    pub triggered_on: Option<i64>,
    /// Start time, milliseconds since the epoch
    #[serde(default)]
    pub started_on: Option<i64>,
    /// End time, milliseconds since the epoch
    #[serde(default)]
    pub ended_on: Option<i64>,
    /// Current state
    pub status: ExecutionPlanStatus,
    /// Fields this client does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl fmt::Display for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Datastore: {}, dataset : {}, triggered by: '{}', triggered on: {}, status: {}",
            self.datastore,
            self.dataset,
            self.triggered_by.as_deref().unwrap_or("None"),
            format_millis(self.triggered_on),
            self.status
        )
    }
}

/// A server user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Login name
    pub name: String,
    /// Full name
    #[serde(default)]
    pub full_name: Option<String>,
    /// Email address
    #[serde(default)]
    pub email: Option<String>,
    /// Whether the user can log in
    #[serde(default)]
    pub enabled: bool,
    /// Fields this client does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Name: '{}', full name: '{}', email: '{}', enabled: {}",
            self.name,
            self.full_name.as_deref().unwrap_or_default(),
            self.email.as_deref().unwrap_or_default(),
            self.enabled
        )
    }
}

/// Health of the server database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerStatus {
    /// Status text
    pub status: String,
    /// Round-trip latency in nanoseconds
    #[serde(default)]
    pub latency_as_nanos: u64,
    /// Fields this client does not model
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PartialEq for ServerStatus {
    fn eq(&self, other: &Self) -> bool {
        self.status == other.status
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Status: '{}', latency_as_nanos: {}",
            self.status, self.latency_as_nanos
        )
    }
}

// ============================================================================
// Façade
// ============================================================================

/// Hex-encoded SHA-256 of a file's contents
pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 4096];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Client for the server API
pub struct TabsetServer<C, B> {
    connection: C,
    bundler: B,
}

impl<C: ServerConnection, B: BundleBuilder> TabsetServer<C, B> {
    /// Wrap an authenticated connection and a bundler
    pub fn new(connection: C, bundler: B) -> Self {
        Self {
            connection,
            bundler,
        }
    }

    /// The underlying connection
    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// All datastores, fetched on every call
    pub async fn datastores(&self) -> Result<Vec<Datastore>> {
        list(self.connection.get("/datastores").await?)
    }

    /// All execution plans, fetched on every call
    pub async fn execution_plans(&self) -> Result<Vec<ExecutionPlan>> {
        list(self.connection.get("/execution_plans").await?)
    }

    /// All users, fetched on every call
    pub async fn users(&self) -> Result<Vec<User>> {
        list(self.connection.get("/users").await?)
    }

    /// Database status of the server
    pub async fn status(&self) -> Result<ServerStatus> {
        let body = self.connection.get("/status").await?;
        let status = body.get("database_status").cloned().unwrap_or(Value::Null);
        Ok(serde_json::from_value(status)?)
    }

    /// Create a datastore; the description defaults to the name
    pub async fn datastore_create(&self, name: &str, description: Option<&str>) -> Result<()> {
        let data = json!({
            "name": name,
            "description": description.unwrap_or(name),
        });
        self.connection.post("/datastores", data).await?;
        tracing::info!(datastore = name, "Created datastore");
        Ok(())
    }

    /// Delete a datastore
    pub async fn datastore_delete(&self, name: &str) -> Result<()> {
        self.connection
            .delete(&format!("/datastores/{}", name))
            .await?;
        Ok(())
    }

    /// Fetch a datastore by name
    pub async fn datastore_get(&self, name: &str) -> Result<Datastore> {
        let body = self.connection.get(&format!("/datastores/{}", name)).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Rename a datastore or change its description
    pub async fn datastore_update(
        &self,
        name: &str,
        new_name: Option<&str>,
        new_description: Option<&str>,
    ) -> Result<()> {
        let data = present(&[("name", new_name.map(Value::from)), ("description", new_description.map(Value::from))]);
        self.connection
            .post(&format!("/datastores/{}", name), data)
            .await?;
        Ok(())
    }

    /// Datasets of a datastore
    pub async fn datastore_list_datasets(&self, datastore: &str) -> Result<Vec<Dataset>> {
        list(
            self.connection
                .get(&format!("/datastores/{}/datasets", datastore))
                .await?,
        )
    }

    /// Create a user; the full name defaults to the login name
    pub async fn user_create(
        &self,
        name: &str,
        password: &str,
        full_name: Option<&str>,
        email: Option<&str>,
        enabled: bool,
    ) -> Result<()> {
        let data = json!({
            "name": name,
            "full_name": full_name.unwrap_or(name),
            "email": email,
            "password": password,
            "enabled": enabled,
        });
        self.connection.post("/users", data).await?;
        Ok(())
    }

    /// Delete a user
    pub async fn user_delete(&self, name: &str) -> Result<()> {
        self.connection.delete(&format!("/users/{}", name)).await?;
        Ok(())
    }

    /// Fetch a user by name
    pub async fn user_get(&self, name: &str) -> Result<User> {
        let body = self.connection.get(&format!("/users/{}", name)).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Change a user's full name, email or enabled flag
    pub async fn user_update(
        &self,
        name: &str,
        full_name: Option<&str>,
        email: Option<&str>,
        enabled: Option<bool>,
    ) -> Result<()> {
        let data = present(&[
            ("full_name", full_name.map(Value::from)),
            ("email", email.map(Value::from)),
            ("enabled", enabled.map(Value::from)),
        ]);
        self.connection.post(&format!("/users/{}", name), data).await?;
        Ok(())
    }

    /// Register a dataset from its definition file and upload its bundle
    pub async fn dataset_create(
        &self,
        datastore: &str,
        definition_path: &Path,
        description: Option<&str>,
        options: &BundleOptions,
    ) -> Result<()> {
        let scratch = tempfile::tempdir()?;
        let upload = self.prepare_upload(definition_path, options, scratch.path())?;
        let mut data = upload.payload();
        data.insert(
            "description".into(),
            description.unwrap_or(&upload.dataset).into(),
        );
        let response = self
            .connection
            .post(&format!("/datastores/{}/datasets", datastore), data.into())
            .await?;
        self.upload_bundle(datastore, &upload.dataset, &response, &upload.archive)
            .await?;
        tracing::info!(datastore, dataset = %upload.dataset, "Created dataset");
        Ok(())
    }

    /// Update a dataset
    ///
    /// Without a definition file only the description changes; asking for a
    /// different bundle then is an error.
    pub async fn dataset_update(
        &self,
        datastore: &str,
        dataset: &str,
        definition_path: Option<&Path>,
        description: &str,
        options: &BundleOptions,
    ) -> Result<()> {
        let endpoint = format!("/datastores/{}/datasets/{}", datastore, dataset);
        let Some(definition_path) = definition_path else {
            if !options.is_empty() {
                return Err(Error::server(ErrorCode::TSE1, &[]));
            }
            self.connection
                .post(&endpoint, json!({ "description": description }))
                .await?;
            return Ok(());
        };

        let scratch = tempfile::tempdir()?;
        let upload = self.prepare_upload(definition_path, options, scratch.path())?;
        let mut data = upload.payload();
        data.insert("description".into(), description.into());
        let response = self.connection.post(&endpoint, data.into()).await?;
        self.upload_bundle(datastore, &upload.dataset, &response, &upload.archive)
            .await?;
        tracing::info!(datastore, dataset = %upload.dataset, "Updated dataset");
        Ok(())
    }

    /// Delete a dataset
    pub async fn dataset_delete(&self, datastore: &str, dataset: &str) -> Result<()> {
        self.connection
            .delete(&format!("/datastores/{}/datasets/{}", datastore, dataset))
            .await?;
        Ok(())
    }

    /// Functions registered for a dataset
    pub async fn dataset_list_functions(&self, datastore: &str, dataset: &str) -> Result<Vec<Function>> {
        list(
            self.connection
                .get(&format!("/datastores/{}/datasets/{}/functions", datastore, dataset))
                .await?,
        )
    }

    /// Trigger an execution of a dataset
    pub async fn dataset_trigger(&self, datastore: &str, dataset: &str) -> Result<Value> {
        Ok(self
            .connection
            .post(
                &format!("/datastores/{}/datasets/{}/execute", datastore, dataset),
                json!({}),
            )
            .await?)
    }

    /// Fetch a dataset together with its current function
    pub async fn dataset_get(&self, datastore: &str, dataset: &str) -> Result<Dataset> {
        let body = self
            .connection
            .get(&format!("/datastores/{}/datasets/{}/function", datastore, dataset))
            .await?;
        let Value::Object(mut fields) = body else {
            return Ok(serde_json::from_value(body)?);
        };
        let mut function = Map::new();
        for key in Function::DEFINITION_KEYS {
            if let Some(value) = fields.remove(key) {
                function.insert(key.to_string(), value);
            }
        }
        fields.insert("datastore".into(), datastore.into());
        fields.insert("function".into(), function.into());
        Ok(serde_json::from_value(fields.into())?)
    }

    fn prepare_upload(
        &self,
        definition_path: &Path,
        options: &BundleOptions,
        scratch: &Path,
    ) -> Result<Upload> {
        let snippet = std::fs::read_to_string(definition_path)?;
        let definition = DatasetDefinition::from_yaml(&snippet)?;
        let archive = self
            .bundler
            .create_bundle(definition_path, &definition, options, scratch)?;
        let bundle_hash = file_sha256(&archive)?;
        tracing::debug!(archive = %archive.display(), %bundle_hash, "Bundled dataset code");

        let tables = match definition.output() {
            Some(Output::Table(output)) => output.tables().to_vec(),
            _ => vec![],
        };
        let dependencies = match definition.input() {
            Some(Input::Table(input)) => input.uris().iter().map(ToString::to_string).collect(),
            _ => vec![],
        };
        Ok(Upload {
            dataset: definition.name().to_string(),
            bundle_hash,
            tables,
            dependencies,
            trigger_by: definition.trigger_by().map(ToString::to_string),
            function_snippet: snippet,
            archive,
        })
    }

    async fn upload_bundle(
        &self,
        datastore: &str,
        dataset: &str,
        response: &Value,
        archive: &Path,
    ) -> Result<()> {
        let function_id = match response.get("current_function_id") {
            Some(Value::String(id)) => id.clone(),
            Some(id @ Value::Number(_)) => id.to_string(),
            _ => {
                return Err(Error::Api(ApiServerError {
                    code: None,
                    error: None,
                    error_description: Some(
                        "The server response did not include 'current_function_id'".to_string(),
                    ),
                }));
            }
        };
        let bundle = tokio::fs::read(archive).await?;
        self.connection
            .post_binary(
                &format!(
                    "/datastores/{}/datasets/{}/function/{}",
                    datastore, dataset, function_id
                ),
                bundle,
            )
            .await?;
        Ok(())
    }
}

/// Everything sent to the server for a new function version
struct Upload {
    dataset: String,
    bundle_hash: String,
    tables: Vec<String>,
    dependencies: Vec<String>,
    trigger_by: Option<String>,
    function_snippet: String,
    archive: PathBuf,
}

impl Upload {
    fn payload(&self) -> Map<String, Value> {
        let mut data = Map::new();
        data.insert("name".into(), self.dataset.clone().into());
        data.insert("bundle_hash".into(), self.bundle_hash.clone().into());
        data.insert("tables".into(), self.tables.clone().into());
        data.insert("dependencies".into(), self.dependencies.clone().into());
        data.insert("trigger_by".into(), self.trigger_by.clone().into());
        data.insert("function_snippet".into(), self.function_snippet.clone().into());
        data
    }
}

/// Decode the `data` list of a listing response
fn list<T: DeserializeOwned>(body: Value) -> Result<Vec<T>> {
    match body {
        Value::Object(mut fields) => match fields.remove("data") {
            Some(data) => Ok(serde_json::from_value(data)?),
            None => Ok(vec![]),
        },
        _ => Ok(vec![]),
    }
}

/// Object holding only the fields that were given
fn present(fields: &[(&str, Option<Value>)]) -> Value {
    fields
        .iter()
        .filter_map(|(key, value)| value.clone().map(|v| (key.to_string(), v)))
        .collect::<Map<String, Value>>()
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockConnection {
        responses: HashMap<String, Value>,
        calls: Mutex<Vec<(String, String, Value)>>,
    }

    impl MockConnection {
        fn with(mut self, endpoint: &str, response: Value) -> Self {
            self.responses.insert(endpoint.to_string(), response);
            self
        }

        fn record(&self, method: &str, endpoint: &str, data: Value) -> ApiResult<Value> {
            self.calls
                .lock()
                .unwrap()
                .push((method.to_string(), endpoint.to_string(), data));
            self.responses.get(endpoint).cloned().ok_or(ApiServerError {
                code: Some("NotFound".to_string()),
                error: Some("not_found".to_string()),
                error_description: Some(format!("No such endpoint: {}", endpoint)),
            })
        }

        fn calls(&self) -> Vec<(String, String, Value)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ServerConnection for MockConnection {
        async fn get(&self, endpoint: &str) -> ApiResult<Value> {
            self.record("GET", endpoint, Value::Null)
        }

        async fn post(&self, endpoint: &str, data: Value) -> ApiResult<Value> {
            self.record("POST", endpoint, data)
        }

        async fn post_binary(&self, endpoint: &str, data: Vec<u8>) -> ApiResult<Value> {
            self.record("POST", endpoint, json!(data.len()))
        }

        async fn delete(&self, endpoint: &str) -> ApiResult<Value> {
            self.record("DELETE", endpoint, Value::Null)
        }
    }

    /// Writes the definition itself as the archive
    struct CopyBundler;

    impl BundleBuilder for CopyBundler {
        fn create_bundle(
            &self,
            definition_path: &Path,
            _definition: &DatasetDefinition,
            _options: &BundleOptions,
            save_location: &Path,
        ) -> Result<PathBuf> {
            let archive = save_location.join("bundle.tar");
            std::fs::copy(definition_path, &archive)?;
            Ok(archive)
        }
    }

    #[test]
    fn test_format_millis() {
        assert_eq!(format_millis(None), "None");
        assert_eq!(format_millis(Some(1_700_000_000_000)), "2023-11-14T22:13:20Z");
    }

    #[test]
    fn test_execution_plan_status() {
        let plan: ExecutionPlan = serde_json::from_value(json!({
            "datastore": "ds",
            "dataset": "d",
            "triggered_by": "admin",
            "triggered_on": 1_700_000_000_000i64,
            "status": "R",
            "id": "plan-1",
        }))
        .unwrap();
        assert_eq!(plan.status, ExecutionPlanStatus::Running);
        assert_eq!(plan.extra["id"], json!("plan-1"));
        assert!(plan.to_string().contains("status: Running"));

        let other = ExecutionPlanStatus::from("X".to_string());
        assert_eq!(other.to_string(), "X");
    }

    #[test]
    fn test_file_sha256() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(
            file_sha256(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn test_datastores_and_status() {
        let connection = MockConnection::default()
            .with(
                "/datastores",
                json!({"data": [{"name": "sales", "description": "Sales", "created_on": 0, "created_by": "admin"}]}),
            )
            .with(
                "/status",
                json!({"database_status": {"status": "OK", "latency_as_nanos": 1200}}),
            );
        let server = TabsetServer::new(connection, CopyBundler);

        let datastores = server.datastores().await.unwrap();
        assert_eq!(datastores.len(), 1);
        assert_eq!(datastores[0].name, "sales");

        let status = server.status().await.unwrap();
        assert_eq!(status.status, "OK");
        assert_eq!(status.latency_as_nanos, 1200);
    }

    #[tokio::test]
    async fn test_api_errors_surface() {
        let server = TabsetServer::new(MockConnection::default(), CopyBundler);
        let err = server.users().await.unwrap_err();
        assert!(matches!(err, Error::Api(_)));
        assert_eq!(err.to_string(), "server error: No such endpoint: /users");
    }

    #[tokio::test]
    async fn test_update_payloads_only_carry_given_fields() {
        let connection = MockConnection::default()
            .with("/datastores/sales", json!({}))
            .with("/datastores", json!({}));
        let server = TabsetServer::new(connection, CopyBundler);

        server
            .datastore_update("sales", None, Some("All sales"))
            .await
            .unwrap();
        server.datastore_create("hr", None).await.unwrap();

        let calls = server.connection().calls();
        assert_eq!(calls[0].2, json!({"description": "All sales"}));
        assert_eq!(calls[1].2, json!({"name": "hr", "description": "hr"}));
    }

    #[tokio::test]
    async fn test_dataset_get_splits_function() {
        let connection = MockConnection::default().with(
            "/datastores/sales/datasets/orders/function",
            json!({
                "name": "orders",
                "description": "Orders",
                "created_on": 1_700_000_000_000i64,
                "created_by": "admin",
                "trigger_with_names": "td://sales/raw",
                "tables": ["clean"],
                "dependencies_with_names": ["td://sales/raw/t"],
            }),
        );
        let server = TabsetServer::new(connection, CopyBundler);
        let dataset = server.dataset_get("sales", "orders").await.unwrap();
        assert_eq!(dataset.datastore, "sales");
        let function = dataset.function.unwrap();
        assert_eq!(function.tables, vec!["clean"]);
        assert_eq!(function.trigger_with_names.as_deref(), Some("td://sales/raw"));
        assert!(!dataset.extra.contains_key("tables"));
    }

    #[tokio::test]
    async fn test_dataset_create_uploads_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let definition = dir.path().join("orders.yaml");
        std::fs::write(
            &definition,
            "name: orders\ninput:\n  table-input:\n    uri: td://sales/raw\noutput:\n  table-output:\n    table: [clean, rejected]\ntrigger_by: td://sales\n",
        )
        .unwrap();

        let connection = MockConnection::default()
            .with("/datastores/sales/datasets", json!({"current_function_id": "f-1"}))
            .with("/datastores/sales/datasets/orders/function/f-1", json!({}));
        let server = TabsetServer::new(connection, CopyBundler);
        server
            .dataset_create("sales", &definition, None, &BundleOptions::default())
            .await
            .unwrap();

        let calls = server.connection().calls();
        assert_eq!(calls.len(), 2);
        let payload = &calls[0].2;
        assert_eq!(payload["name"], json!("orders"));
        assert_eq!(payload["description"], json!("orders"));
        assert_eq!(payload["tables"], json!(["clean", "rejected"]));
        assert_eq!(payload["dependencies"], json!(["td://sales/raw"]));
        assert_eq!(payload["trigger_by"], json!("td://sales"));
        assert_eq!(
            payload["bundle_hash"],
            json!(file_sha256(&definition).unwrap())
        );
        assert_eq!(calls[1].1, "/datastores/sales/datasets/orders/function/f-1");
    }

    #[tokio::test]
    async fn test_update_bundle_without_definition_fails() {
        let server = TabsetServer::new(MockConnection::default(), CopyBundler);
        let options = BundleOptions {
            requirements: Some(PathBuf::from("requirements.yaml")),
            ..Default::default()
        };
        let err = server
            .dataset_update("sales", "orders", None, "desc", &options)
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::TSE1));
        assert!(server.connection().calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_description_only() {
        let connection = MockConnection::default().with("/datastores/sales/datasets/orders", json!({}));
        let server = TabsetServer::new(connection, CopyBundler);
        server
            .dataset_update("sales", "orders", None, "Fresh orders", &BundleOptions::default())
            .await
            .unwrap();
        assert_eq!(
            server.connection().calls()[0].2,
            json!({"description": "Fresh orders"})
        );
    }
}
