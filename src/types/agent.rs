//! Agents.

use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DeckError;

use super::validation::{check_temperature, reject_blank, require_non_blank, Validate};

/// An agent as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// System prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Ids of the tools the agent may call.
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Fields this client does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Payload for creating an agent.
///
/// ```
/// use agentdeck::types::{NewAgent, Validate};
///
/// let agent = NewAgent::builder()
///     .name("researcher".to_string())
///     .model("gpt-4o".to_string())
///     .build();
/// assert!(agent.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Builder, Serialize, Deserialize, PartialEq)]
pub struct NewAgent {
    pub name: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default)]
    #[builder(default)]
    pub tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl Validate for NewAgent {
    fn validate(&self) -> Result<(), DeckError> {
        require_non_blank("name", &self.name)?;
        require_non_blank("model", &self.model)?;
        check_temperature(self.temperature)
    }
}

/// Partial update; omitted fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AgentUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

impl Validate for AgentUpdate {
    fn validate(&self) -> Result<(), DeckError> {
        reject_blank("name", self.name.as_deref())?;
        reject_blank("model", self.model.as_deref())?;
        check_temperature(self.temperature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn agent_keeps_unknown_fields() {
        let agent: Agent = serde_json::from_value(json!({
            "id": "a-1",
            "name": "writer",
            "model": "gpt-4o",
            "status": "active",
        }))
        .unwrap();
        assert_eq!(agent.model.as_deref(), Some("gpt-4o"));
        assert!(agent.tools.is_empty());
        assert_eq!(agent.extra.get("status"), Some(&json!("active")));
    }

    #[test]
    fn new_agent_requires_name_and_model() {
        let missing_model = NewAgent {
            name: "writer".into(),
            ..Default::default()
        };
        match missing_model.validate() {
            Err(DeckError::Validation { field, .. }) => assert_eq!(field, "model"),
            other => panic!("expected validation error, got {other:?}"),
        }

        let bad_temp = NewAgent {
            name: "writer".into(),
            model: "gpt-4o".into(),
            temperature: Some(3.0),
            ..Default::default()
        };
        assert!(bad_temp.validate().is_err());
    }

    #[test]
    fn empty_update_is_valid_and_serializes_to_empty_object() {
        let update = AgentUpdate::default();
        assert!(update.validate().is_ok());
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({}));

        let blank = AgentUpdate {
            name: Some(" ".into()),
            ..Default::default()
        };
        assert!(blank.validate().is_err());
    }
}
