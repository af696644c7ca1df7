//! Teams of agents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

use crate::error::DeckError;

use super::validation::{reject_blank, require_non_blank, Validate};

/// How a team routes a message among its members.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TeamMode {
    /// A coordinator agent delegates to members.
    #[default]
    Coordinate,
    /// The message is routed to the single best-suited member.
    Route,
    /// Every member answers.
    Collaborate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, alias = "members")]
    pub agent_ids: Vec<String>,
    #[serde(default)]
    pub mode: TeamMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewTeam {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub agent_ids: Vec<String>,
    #[serde(default)]
    pub mode: TeamMode,
}

impl Validate for NewTeam {
    fn validate(&self) -> Result<(), DeckError> {
        require_non_blank("name", &self.name)?;
        check_members(&self.agent_ids)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TeamUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<TeamMode>,
}

impl Validate for TeamUpdate {
    fn validate(&self) -> Result<(), DeckError> {
        reject_blank("name", self.name.as_deref())?;
        match self.agent_ids {
            Some(ref ids) => check_members(ids),
            None => Ok(()),
        }
    }
}

fn check_members(agent_ids: &[String]) -> Result<(), DeckError> {
    if agent_ids.is_empty() {
        return Err(DeckError::validation(
            "agent_ids",
            "a team needs at least one agent",
        ));
    }
    if agent_ids.iter().any(|id| id.trim().is_empty()) {
        return Err(DeckError::validation("agent_ids", "contains a blank id"));
    }
    Ok(())
}
