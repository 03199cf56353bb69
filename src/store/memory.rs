use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{Poll, PollOption, PollVote, VoteCount},
    store::PollStore,
};

#[derive(Default)]
struct Tables {
    polls: Vec<Poll>,
    options: Vec<PollOption>,
    // keyed by (poll_id, voter_id): the uniqueness constraint itself
    votes: HashMap<(Uuid, Uuid), PollVote>,
}

impl Tables {
    fn insert_options(&mut self, poll_id: Uuid, options: &[String]) {
        let now = Utc::now();
        self.options
            .extend(options.iter().enumerate().map(|(idx, text)| PollOption {
                id: Uuid::new_v4(),
                poll_id,
                option_text: text.clone(),
                position: idx as i32 + 1,
                created_at: now,
            }));
    }

    fn remove_options(&mut self, poll_id: Uuid) {
        self.options.retain(|option| option.poll_id != poll_id);
        self.votes.retain(|(vote_poll, _), _| *vote_poll != poll_id);
    }
}

/// In-process store with the same constraint behaviour as the Postgres
/// schema. Everything sits behind a single lock so each call is atomic.
#[derive(Default)]
pub struct MemoryPollStore {
    tables: RwLock<Tables>,
}

impl MemoryPollStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored vote row for a poll.
    pub async fn votes_for_poll(&self, poll_id: Uuid) -> Vec<PollVote> {
        let tables = self.tables.read().await;
        tables
            .votes
            .values()
            .filter(|vote| vote.poll_id == poll_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl PollStore for MemoryPollStore {
    async fn create_poll_with_options(
        &self,
        question: &str,
        options: &[String],
        created_by: Uuid,
    ) -> Result<Uuid> {
        if question.trim().is_empty() {
            return Err(AppError::Storage(
                "new row for relation \"polls\" violates check constraint".to_string(),
            ));
        }
        if options.len() < 2 {
            return Err(AppError::Storage(
                "a poll needs at least two options".to_string(),
            ));
        }

        let mut tables = self.tables.write().await;
        let poll = Poll {
            id: Uuid::new_v4(),
            question: question.to_string(),
            created_by,
            created_at: Utc::now(),
        };
        let poll_id = poll.id;
        tables.polls.push(poll);
        tables.insert_options(poll_id, options);

        Ok(poll_id)
    }

    async fn list_polls(&self) -> Result<Vec<Poll>> {
        let tables = self.tables.read().await;
        // insertion order breaks ties between equal timestamps
        let mut polls: Vec<Poll> = tables.polls.iter().rev().cloned().collect();
        polls.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(polls)
    }

    async fn get_poll(&self, poll_id: Uuid) -> Result<Option<Poll>> {
        let tables = self.tables.read().await;
        Ok(tables.polls.iter().find(|poll| poll.id == poll_id).cloned())
    }

    async fn get_owned_poll(&self, poll_id: Uuid, owner: Uuid) -> Result<Option<Poll>> {
        let tables = self.tables.read().await;
        Ok(tables
            .polls
            .iter()
            .find(|poll| poll.id == poll_id && poll.created_by == owner)
            .cloned())
    }

    async fn get_options(&self, poll_id: Uuid) -> Result<Vec<PollOption>> {
        let tables = self.tables.read().await;
        let mut options: Vec<PollOption> = tables
            .options
            .iter()
            .filter(|option| option.poll_id == poll_id)
            .cloned()
            .collect();
        options.sort_by_key(|option| option.position);
        Ok(options)
    }

    async fn replace_poll(&self, poll_id: Uuid, question: &str, options: &[String]) -> Result<()> {
        let mut tables = self.tables.write().await;

        let Some(poll) = tables.polls.iter_mut().find(|poll| poll.id == poll_id) else {
            return Err(AppError::NotFound("Poll not found".to_string()));
        };
        poll.question = question.to_string();

        tables.remove_options(poll_id);
        tables.insert_options(poll_id, options);

        Ok(())
    }

    async fn delete_poll(&self, poll_id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.polls.retain(|poll| poll.id != poll_id);
        tables.remove_options(poll_id);
        Ok(())
    }

    async fn upsert_vote(&self, poll_id: Uuid, option_id: Uuid, voter_id: Uuid) -> Result<()> {
        let mut tables = self.tables.write().await;

        let option_in_poll = tables
            .options
            .iter()
            .any(|option| option.id == option_id && option.poll_id == poll_id);
        if !option_in_poll {
            return Err(AppError::Storage(
                "insert or update on table \"poll_votes\" violates foreign key constraint"
                    .to_string(),
            ));
        }

        let now = Utc::now();
        tables
            .votes
            .entry((poll_id, voter_id))
            .and_modify(|vote| {
                vote.option_id = option_id;
                vote.created_at = now;
            })
            .or_insert_with(|| PollVote {
                id: Uuid::new_v4(),
                poll_id,
                option_id,
                voter_id,
                created_at: now,
            });

        Ok(())
    }

    async fn get_vote(&self, poll_id: Uuid, voter_id: Uuid) -> Result<Option<PollVote>> {
        let tables = self.tables.read().await;
        Ok(tables.votes.get(&(poll_id, voter_id)).cloned())
    }

    async fn vote_counts(&self, poll_id: Option<Uuid>) -> Result<Vec<VoteCount>> {
        let tables = self.tables.read().await;

        let mut by_option: HashMap<Uuid, i64> = HashMap::new();
        for vote in tables.votes.values() {
            *by_option.entry(vote.option_id).or_default() += 1;
        }

        Ok(tables
            .options
            .iter()
            .filter(|option| poll_id.is_none_or(|id| option.poll_id == id))
            .map(|option| VoteCount {
                poll_id: option.poll_id,
                option_id: option.id,
                votes: by_option.get(&option.id).copied().unwrap_or(0),
            })
            .collect())
    }
}
