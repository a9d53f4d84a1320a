use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A speech-writing project (`speech_projects`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Changes applied to a project; `updated_at` is always refreshed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// What the speech should contain (`speech_requirements`, one per project)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirements {
    pub id: String,
    pub project_id: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub relationship_length: Option<String>,
    #[serde(default)]
    pub tone_preference: Option<String>,
    #[serde(default)]
    pub desired_length: Option<u32>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub key_anecdotes: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub who_to_mention: Vec<String>,
    #[serde(default)]
    pub additional_context: Option<String>,
}

/// Partial requirements; only the fields that are set get written
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone_preference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_anecdotes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub who_to_mention: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<String>,
}

impl Requirements {
    /// Empty requirements row for a project
    pub fn empty(id: String, project_id: String) -> Self {
        Self {
            id,
            project_id,
            role: None,
            relationship_length: None,
            tone_preference: None,
            desired_length: None,
            key_anecdotes: Vec::new(),
            who_to_mention: Vec::new(),
            additional_context: None,
        }
    }

    pub fn apply(&mut self, update: &RequirementsUpdate) {
        if let Some(role) = &update.role {
            self.role = Some(role.clone());
        }
        if let Some(length) = &update.relationship_length {
            self.relationship_length = Some(length.clone());
        }
        if let Some(tone) = &update.tone_preference {
            self.tone_preference = Some(tone.clone());
        }
        if let Some(minutes) = update.desired_length {
            self.desired_length = Some(minutes);
        }
        if let Some(anecdotes) = &update.key_anecdotes {
            self.key_anecdotes = anecdotes.clone();
        }
        if let Some(people) = &update.who_to_mention {
            self.who_to_mention = people.clone();
        }
        if let Some(context) = &update.additional_context {
            self.additional_context = Some(context.clone());
        }
    }
}

/// A versioned speech draft (`speech_drafts`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub id: String,
    pub project_id: String,
    pub content: String,
    pub version: u32,
    pub user_edited: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDraft {
    pub project_id: String,
    pub content: String,
    pub version: u32,
    pub user_edited: bool,
}

/// A project with its requirements and drafts (newest version first)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectDetails {
    #[serde(flatten)]
    pub project: Project,
    pub requirements: Option<Requirements>,
    pub drafts: Vec<Draft>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<Vec<String>> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}
