use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{Poll, PollOption, PollVote, VoteCount},
    store::PollStore,
};

#[derive(Clone)]
pub struct PgPollStore {
    db: PgPool,
}

impl PgPollStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PollStore for PgPollStore {
    async fn create_poll_with_options(
        &self,
        question: &str,
        options: &[String],
        created_by: Uuid,
    ) -> Result<Uuid> {
        let row = sqlx::query("SELECT create_poll_with_options($1, $2, $3) AS id")
            .bind(question)
            .bind(options)
            .bind(created_by)
            .fetch_one(&self.db)
            .await?;

        Ok(row.try_get("id")?)
    }

    async fn list_polls(&self) -> Result<Vec<Poll>> {
        let polls = sqlx::query_as::<_, Poll>(
            "SELECT id, question, created_by, created_at FROM polls ORDER BY created_at DESC",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(polls)
    }

    async fn get_poll(&self, poll_id: Uuid) -> Result<Option<Poll>> {
        let poll = sqlx::query_as::<_, Poll>(
            "SELECT id, question, created_by, created_at FROM polls WHERE id = $1",
        )
        .bind(poll_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(poll)
    }

    async fn get_owned_poll(&self, poll_id: Uuid, owner: Uuid) -> Result<Option<Poll>> {
        let poll = sqlx::query_as::<_, Poll>(
            r#"
            SELECT id, question, created_by, created_at
            FROM polls
            WHERE id = $1 AND created_by = $2
            "#,
        )
        .bind(poll_id)
        .bind(owner)
        .fetch_optional(&self.db)
        .await?;

        Ok(poll)
    }

    async fn get_options(&self, poll_id: Uuid) -> Result<Vec<PollOption>> {
        let options = sqlx::query_as::<_, PollOption>(
            r#"
            SELECT id, poll_id, option_text, position, created_at
            FROM poll_options
            WHERE poll_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(poll_id)
        .fetch_all(&self.db)
        .await?;

        Ok(options)
    }

    async fn replace_poll(&self, poll_id: Uuid, question: &str, options: &[String]) -> Result<()> {
        let mut tx = self.db.begin().await?;

        let updated = sqlx::query("UPDATE polls SET question = $1 WHERE id = $2")
            .bind(question)
            .bind(poll_id)
            .execute(&mut *tx)
            .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("Poll not found".to_string()));
        }

        sqlx::query("DELETE FROM poll_options WHERE poll_id = $1")
            .bind(poll_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO poll_options (poll_id, option_text, position)
            SELECT $1, t.option_text, t.ord::INTEGER
            FROM unnest($2::TEXT[]) WITH ORDINALITY AS t(option_text, ord)
            "#,
        )
        .bind(poll_id)
        .bind(options)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    async fn delete_poll(&self, poll_id: Uuid) -> Result<()> {
        // options and votes go with it via ON DELETE CASCADE
        sqlx::query("DELETE FROM polls WHERE id = $1")
            .bind(poll_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn upsert_vote(&self, poll_id: Uuid, option_id: Uuid, voter_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO poll_votes (id, poll_id, option_id, voter_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (poll_id, voter_id)
            DO UPDATE SET option_id = EXCLUDED.option_id, created_at = EXCLUDED.created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(poll_id)
        .bind(option_id)
        .bind(voter_id)
        .bind(chrono::Utc::now())
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn get_vote(&self, poll_id: Uuid, voter_id: Uuid) -> Result<Option<PollVote>> {
        let vote = sqlx::query_as::<_, PollVote>(
            r#"
            SELECT id, poll_id, option_id, voter_id, created_at
            FROM poll_votes
            WHERE poll_id = $1 AND voter_id = $2
            "#,
        )
        .bind(poll_id)
        .bind(voter_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(vote)
    }

    async fn vote_counts(&self, poll_id: Option<Uuid>) -> Result<Vec<VoteCount>> {
        let counts = sqlx::query_as::<_, VoteCount>(
            r#"
            SELECT poll_id, option_id, votes
            FROM poll_vote_counts
            WHERE $1::UUID IS NULL OR poll_id = $1
            "#,
        )
        .bind(poll_id)
        .fetch_all(&self.db)
        .await?;

        Ok(counts)
    }
}
