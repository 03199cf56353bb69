use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::VoteInput,
    store::PollStore,
};

/// Record the caller's choice for a poll.
///
/// A missing option and a missing caller fail with different error kinds
/// so the form flow can tell them apart. A repeat vote overwrites the
/// caller's earlier choice in the store.
pub async fn submit_vote(
    store: &dyn PollStore,
    input: &VoteInput,
    caller_id: Option<Uuid>,
) -> Result<()> {
    let option_id = input
        .option_id
        .ok_or_else(|| AppError::Validation("Please select an option.".to_string()))?;

    let voter_id = caller_id.ok_or_else(|| {
        AppError::Authentication("You must be logged in to vote.".to_string())
    })?;

    store.upsert_vote(input.poll_id, option_id, voter_id).await?;

    tracing::info!(poll_id = %input.poll_id, option_id = %option_id, "Vote recorded");

    Ok(())
}
