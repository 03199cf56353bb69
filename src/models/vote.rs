use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PollVote {
    pub id: Uuid,
    pub poll_id: Uuid,
    pub option_id: Uuid,
    pub voter_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// One row of the `poll_vote_counts` view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct VoteCount {
    pub poll_id: Uuid,
    pub option_id: Uuid,
    pub votes: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoteInput {
    pub poll_id: Uuid,
    pub option_id: Option<Uuid>,
}

// Vote request (JSON API)
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub option_id: Option<Uuid>,
}
