use crate::error::TranscriptionError;
use crate::storage::{Requirements, RequirementsUpdate};
use serde::{Deserialize, Serialize};

/// Requirements field a transcript can be saved into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementsField {
    /// Replaced by the transcript
    AdditionalContext,
    /// The transcript is appended as a new anecdote
    KeyAnecdotes,
}

impl RequirementsField {
    pub fn parse(value: &str) -> Result<Self, TranscriptionError> {
        match value {
            "additional_context" => Ok(Self::AdditionalContext),
            "key_anecdotes" => Ok(Self::KeyAnecdotes),
            other => Err(TranscriptionError::InvalidField(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AdditionalContext => "additional_context",
            Self::KeyAnecdotes => "key_anecdotes",
        }
    }
}

/// Inbound save request; every field is required
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveTranscriptionRequest {
    pub project_id: Option<String>,
    pub transcription: Option<String>,
    pub field: Option<String>,
}

/// Validated change to a project's requirements
#[derive(Debug, Clone, PartialEq)]
pub struct RequirementsPatch {
    pub project_id: String,
    pub field: RequirementsField,
    pub value: String,
}

impl TryFrom<SaveTranscriptionRequest> for RequirementsPatch {
    type Error = TranscriptionError;

    fn try_from(request: SaveTranscriptionRequest) -> Result<Self, Self::Error> {
        let project_id = present(request.project_id).ok_or(TranscriptionError::MissingParameter("project_id"))?;
        let value = present(request.transcription).ok_or(TranscriptionError::MissingParameter("transcription"))?;
        let field = present(request.field).ok_or(TranscriptionError::MissingParameter("field"))?;

        Ok(Self {
            project_id,
            field: RequirementsField::parse(&field)?,
            value,
        })
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl RequirementsPatch {
    /// Fields to write given the current requirements row (if any)
    pub fn to_update(&self, current: Option<&Requirements>) -> RequirementsUpdate {
        match self.field {
            RequirementsField::AdditionalContext => RequirementsUpdate {
                additional_context: Some(self.value.clone()),
                ..Default::default()
            },
            RequirementsField::KeyAnecdotes => {
                let mut anecdotes = current.map(|r| r.key_anecdotes.clone()).unwrap_or_default();
                anecdotes.push(self.value.clone());
                RequirementsUpdate {
                    key_anecdotes: Some(anecdotes),
                    ..Default::default()
                }
            }
        }
    }
}

/// Outcome of a successful save
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedTranscription {
    pub project_id: String,
    pub updated_field: RequirementsField,
}
