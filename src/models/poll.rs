use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Poll {
    pub id: Uuid,
    pub question: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PollOption {
    pub id: Uuid,
    pub poll_id: Uuid,
    pub option_text: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

/// Normalized question and option list, ready for the store.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct PollInput {
    #[validate(length(min = 1, message = "Please provide a question"))]
    pub question: String,
    #[validate(length(min = 2, message = "Please provide at least two options"))]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePollInput {
    pub poll_id: Uuid,
    pub poll: PollInput,
}

/// Options arrive either as a JSON array or as newline-separated text.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OptionsField {
    List(Vec<String>),
    Text(String),
}

impl Default for OptionsField {
    fn default() -> Self {
        OptionsField::List(Vec::new())
    }
}

// Create / update poll request (JSON API)
#[derive(Debug, Clone, Deserialize)]
pub struct PollRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub options: OptionsField,
}

/// Fields posted by the server-rendered forms. Every flow reads the subset
/// it needs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PollForm {
    #[serde(default)]
    pub poll_id: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub options: Option<String>,
    #[serde(default)]
    pub option: Option<String>,
}

// Listing row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollSummary {
    pub id: Uuid,
    pub question: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub total_votes: i64,
}

#[derive(Debug, Serialize)]
pub struct PollListItem {
    #[serde(flatten)]
    pub summary: PollSummary,
    pub is_owner: bool,
}
