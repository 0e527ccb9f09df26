use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Question {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }
}

/// A saved answer. `audio` is a self-contained data URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    pub id: Uuid,
    pub question_id: Uuid,
    pub audio: String,
    pub created_at: DateTime<Utc>,
}

impl Recording {
    pub fn new(question_id: Uuid, audio: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            question_id,
            audio,
            created_at: Utc::now(),
        }
    }
}

/// Recordings made on the same calendar day
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingGroup {
    pub date: NaiveDate,
    pub recordings: Vec<Recording>,
}
