//! Dataset definitions
//!
//! A dataset definition ties a transformation function to where it reads
//! from, where it writes to, and which dataset triggers it. Definitions are
//! usually kept in `datasets/*.yaml`:
//!
//! ```yaml
//! name: orders_clean
//! function: clean_orders
//! input:
//!   table-input:
//!     uri: td://orders/raw
//! output:
//!   table-output:
//!     table: clean
//! trigger_by: td://orders
//! ```

use std::path::Path;

use serde_json::{Value, json};

use crate::connectors::{Input, IntoInput, IntoOutput, Output, build_input, build_output};
use crate::error::{Error, ErrorCode, Result};
use crate::uri::{IntoUri, Uri, build_uri_object};
use crate::wire::{self, KeyError, type_name};

/// A transformation function with its connectors
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetDefinition {
    name: String,
    function: Option<String>,
    input: Option<Input>,
    output: Option<Output>,
    trigger_by: Option<Uri>,
}

impl DatasetDefinition {
    const KEYS: [&'static str; 5] = ["name", "function", "input", "output", "trigger_by"];

    /// Definition with no connectors and no trigger
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            function: None,
            input: None,
            output: None,
            trigger_by: None,
        }
    }

    /// Set the entry point of the dataset code
    pub fn with_function(mut self, entry_point: impl Into<String>) -> Self {
        self.function = Some(entry_point.into());
        self
    }

    /// Set the input
    pub fn with_input(mut self, input: impl IntoInput) -> Result<Self> {
        self.input = build_input(input)?;
        self.check_connectors()?;
        Ok(self)
    }

    /// Set the output
    pub fn with_output(mut self, output: impl IntoOutput) -> Result<Self> {
        self.output = build_output(output)?;
        self.check_connectors()?;
        Ok(self)
    }

    /// Set the dataset whose new versions trigger this one
    pub fn with_trigger_by(mut self, trigger_by: impl IntoUri) -> Result<Self> {
        let uri = build_uri_object(trigger_by)?;
        if uri.dataset().is_none() {
            return Err(Error::function(ErrorCode::FCE3, &[&uri]));
        }
        if uri.table().is_some() {
            return Err(Error::function(ErrorCode::FCE4, &[&uri]));
        }
        self.trigger_by = Some(uri);
        Ok(self)
    }

    /// Dataset name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entry point of the dataset code
    pub fn function(&self) -> Option<&str> {
        self.function.as_deref()
    }

    /// Input, if any
    pub fn input(&self) -> Option<&Input> {
        self.input.as_ref()
    }

    /// Output, if any
    pub fn output(&self) -> Option<&Output> {
        self.output.as_ref()
    }

    /// Trigger, if any
    pub fn trigger_by(&self) -> Option<&Uri> {
        self.trigger_by.as_ref()
    }

    /// Payload handed to the server
    pub fn to_dict(&self) -> Result<Value> {
        let input = self.input.as_ref().map(Input::to_dict).transpose()?;
        Ok(json!({
            "name": self.name,
            "function": self.function,
            "input": input,
            "output": self.output.as_ref().map(Output::to_dict),
            "trigger_by": self.trigger_by.as_ref().map(ToString::to_string),
        }))
    }

    /// Build from a parsed dictionary
    pub fn from_value(value: &Value) -> Result<Self> {
        let empty = wire::Object::new();
        let object = value.as_object().unwrap_or(&empty);
        wire::check_keys(object, &Self::KEYS, &["name"]).map_err(|e| match e {
            KeyError::Missing(key) => Error::function(ErrorCode::FCE7, &[&key]),
            KeyError::Unexpected(key) => Error::function(
                ErrorCode::FCE8,
                &[&key, &wire::quoted_list(&Self::KEYS)],
            ),
        })?;

        let name = &object["name"];
        let name = name
            .as_str()
            .ok_or_else(|| Error::function(ErrorCode::FCE6, &[&type_name(name)]))?;
        let mut definition = Self::new(name);

        if let Some(function) = wire::field(object, "function") {
            let function = function
                .as_str()
                .ok_or_else(|| Error::function(ErrorCode::FCE1, &[&type_name(function)]))?;
            definition = definition.with_function(function);
        }
        definition.input = build_input(object.get("input"))?;
        definition.output = build_output(object.get("output"))?;
        definition.check_connectors()?;

        match wire::field(object, "trigger_by") {
            None => {}
            Some(trigger @ Value::String(_)) => definition = definition.with_trigger_by(trigger)?,
            Some(other) => return Err(Error::function(ErrorCode::FCE2, &[&type_name(other)])),
        }
        tracing::debug!(name = %definition.name, "Loaded dataset definition");
        Ok(definition)
    }

    /// Parse a YAML document
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(contents)?;
        Self::from_value(&value)
    }

    /// Read a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Both connectors present means one of them must be a table
    fn check_connectors(&self) -> Result<()> {
        match (&self.input, &self.output) {
            (Some(input), Some(output))
                if !matches!(input, Input::Table(_)) && !matches!(output, Output::Table(_)) =>
            {
                Err(Error::function(
                    ErrorCode::FCE5,
                    &[&input.identifier(), &output.identifier()],
                ))
            }
            _ => Ok(()),
        }
    }
}
