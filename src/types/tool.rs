//! Tools agents can call.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DeckError;

use super::validation::{check_parameter_schema, reject_blank, require_non_blank, Validate};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON Schema of the tool's arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewTool {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

impl Validate for NewTool {
    fn validate(&self) -> Result<(), DeckError> {
        require_non_blank("name", &self.name)?;
        check_parameter_schema(self.parameters.as_ref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ToolUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

impl Validate for ToolUpdate {
    fn validate(&self) -> Result<(), DeckError> {
        reject_blank("name", self.name.as_deref())?;
        check_parameter_schema(self.parameters.as_ref())
    }
}
