//! Storage seam for polls, options and votes.
//!
//! Every implementation must uphold the storage-level rules the services
//! rely on: one vote row per `(poll_id, voter_id)` (a second vote updates
//! it), a vote's option must belong to the vote's poll, and deleting a poll
//! or an option removes what depends on it.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{Poll, PollOption, PollVote, VoteCount},
};

pub use memory::MemoryPollStore;
pub use postgres::PgPollStore;

#[async_trait]
pub trait PollStore: Send + Sync {
    /// Insert a poll and its options (positions 1..N) in one step and
    /// return the new poll id.
    async fn create_poll_with_options(
        &self,
        question: &str,
        options: &[String],
        created_by: Uuid,
    ) -> Result<Uuid>;

    /// All polls, newest first.
    async fn list_polls(&self) -> Result<Vec<Poll>>;

    async fn get_poll(&self, poll_id: Uuid) -> Result<Option<Poll>>;

    /// The poll only if `owner` created it.
    async fn get_owned_poll(&self, poll_id: Uuid, owner: Uuid) -> Result<Option<Poll>>;

    /// Options ordered by position.
    async fn get_options(&self, poll_id: Uuid) -> Result<Vec<PollOption>>;

    /// Set the question and replace every option, atomically.
    async fn replace_poll(&self, poll_id: Uuid, question: &str, options: &[String]) -> Result<()>;

    async fn delete_poll(&self, poll_id: Uuid) -> Result<()>;

    /// Insert the vote, or repoint the caller's existing vote for this poll.
    async fn upsert_vote(&self, poll_id: Uuid, option_id: Uuid, voter_id: Uuid) -> Result<()>;

    async fn get_vote(&self, poll_id: Uuid, voter_id: Uuid) -> Result<Option<PollVote>>;

    /// Tally rows for one poll, or for every poll when `poll_id` is `None`.
    async fn vote_counts(&self, poll_id: Option<Uuid>) -> Result<Vec<VoteCount>>;
}
