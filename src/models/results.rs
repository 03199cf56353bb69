use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Poll;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionTally {
    pub option_id: Uuid,
    pub option_text: String,
    pub position: i32,
    pub votes: i64,
    /// Unrounded share of the total, 0..=100.
    pub percentage: f64,
}

impl OptionTally {
    pub fn rounded_percentage(&self) -> i64 {
        self.percentage.round() as i64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollResults {
    pub poll_id: Uuid,
    pub question: String,
    pub total_votes: i64,
    pub options: Vec<OptionTally>,
}

impl PollResults {
    pub fn is_empty(&self) -> bool {
        self.total_votes == 0
    }
}

/// A poll with its ordered options and current tallies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollDetail {
    pub poll: Poll,
    pub results: PollResults,
}

#[derive(Debug, Serialize)]
pub struct ViewerState {
    pub existing_vote: Option<Uuid>,
    pub can_edit: bool,
}
