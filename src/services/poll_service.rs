use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{PollDetail, PollInput, UpdatePollInput},
    services::results_service,
    store::PollStore,
};

/// Create a poll and its options in a single store call, then read it back.
pub async fn create_poll_with_options(
    store: &dyn PollStore,
    input: &PollInput,
    created_by: Uuid,
) -> Result<PollDetail> {
    let poll_id = store
        .create_poll_with_options(&input.question, &input.options, created_by)
        .await?;

    tracing::info!(
        poll_id = %poll_id,
        created_by = %created_by,
        options = input.options.len(),
        "Poll created"
    );

    results_service::load_poll_detail(store, poll_id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Poll {} missing after insert", poll_id)))
}

/// Replace a poll's question and options. Only the creator may do this.
pub async fn update_poll(
    store: &dyn PollStore,
    input: &UpdatePollInput,
    caller_id: Uuid,
) -> Result<()> {
    let denied = || {
        AppError::Authorization(
            "Poll not found or you do not have permission to update it.".to_string(),
        )
    };

    if store
        .get_owned_poll(input.poll_id, caller_id)
        .await?
        .is_none()
    {
        return Err(denied());
    }

    // a delete can land between the ownership check and the replace
    store
        .replace_poll(input.poll_id, &input.poll.question, &input.poll.options)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => denied(),
            other => other,
        })?;

    tracing::info!(poll_id = %input.poll_id, options = input.poll.options.len(), "Poll updated");

    Ok(())
}

/// Delete a poll. Only the creator may do this; options and votes cascade.
pub async fn delete_poll(store: &dyn PollStore, poll_id: Uuid, caller_id: Uuid) -> Result<()> {
    if store.get_owned_poll(poll_id, caller_id).await?.is_none() {
        return Err(AppError::Authorization(
            "Poll not found or you do not have permission to delete it.".to_string(),
        ));
    }

    store.delete_poll(poll_id).await?;

    tracing::info!(poll_id = %poll_id, "Poll deleted");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{Poll, PollOption, PollVote, VoteCount},
        store::MemoryPollStore,
        validation::split_options,
    };
    use async_trait::async_trait;

    /// Deletes the poll right after confirming who owns it.
    struct DeletedMidUpdate(MemoryPollStore);

    #[async_trait]
    impl PollStore for DeletedMidUpdate {
        async fn create_poll_with_options(
            &self,
            question: &str,
            options: &[String],
            created_by: Uuid,
        ) -> Result<Uuid> {
            self.0.create_poll_with_options(question, options, created_by).await
        }

        async fn list_polls(&self) -> Result<Vec<Poll>> {
            self.0.list_polls().await
        }

        async fn get_poll(&self, poll_id: Uuid) -> Result<Option<Poll>> {
            self.0.get_poll(poll_id).await
        }

        async fn get_owned_poll(&self, poll_id: Uuid, owner: Uuid) -> Result<Option<Poll>> {
            let poll = self.0.get_owned_poll(poll_id, owner).await?;
            self.0.delete_poll(poll_id).await?;
            Ok(poll)
        }

        async fn get_options(&self, poll_id: Uuid) -> Result<Vec<PollOption>> {
            self.0.get_options(poll_id).await
        }

        async fn replace_poll(
            &self,
            poll_id: Uuid,
            question: &str,
            options: &[String],
        ) -> Result<()> {
            self.0.replace_poll(poll_id, question, options).await
        }

        async fn delete_poll(&self, poll_id: Uuid) -> Result<()> {
            self.0.delete_poll(poll_id).await
        }

        async fn upsert_vote(&self, poll_id: Uuid, option_id: Uuid, voter_id: Uuid) -> Result<()> {
            self.0.upsert_vote(poll_id, option_id, voter_id).await
        }

        async fn get_vote(&self, poll_id: Uuid, voter_id: Uuid) -> Result<Option<PollVote>> {
            self.0.get_vote(poll_id, voter_id).await
        }

        async fn vote_counts(&self, poll_id: Option<Uuid>) -> Result<Vec<VoteCount>> {
            self.0.vote_counts(poll_id).await
        }
    }

    fn input(question: &str, options: &str) -> PollInput {
        PollInput {
            question: question.to_string(),
            options: split_options(options),
        }
    }

    #[tokio::test]
    async fn created_poll_has_ordered_options_and_no_votes() {
        let store = MemoryPollStore::new();

        let detail = create_poll_with_options(&store, &input("Q", "A\nB"), Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(detail.poll.question, "Q");
        let texts: Vec<&str> = detail
            .results
            .options
            .iter()
            .map(|o| o.option_text.as_str())
            .collect();
        assert_eq!(texts, vec!["A", "B"]);
        assert!(detail.results.options.iter().all(|o| o.votes == 0));
    }

    #[tokio::test]
    async fn update_replaces_options_with_contiguous_positions() {
        let store = MemoryPollStore::new();
        let owner = Uuid::new_v4();
        let detail = create_poll_with_options(&store, &input("Q", "A\nB"), owner)
            .await
            .unwrap();

        let update = UpdatePollInput {
            poll_id: detail.poll.id,
            poll: input("New Q", "C\n\n  D \nE"),
        };
        update_poll(&store, &update, owner).await.unwrap();

        let poll = store.get_poll(detail.poll.id).await.unwrap().unwrap();
        assert_eq!(poll.question, "New Q");
        let options = store.get_options(detail.poll.id).await.unwrap();
        let shape: Vec<(i32, &str)> = options
            .iter()
            .map(|o| (o.position, o.option_text.as_str()))
            .collect();
        assert_eq!(shape, vec![(1, "C"), (2, "D"), (3, "E")]);
    }

    #[tokio::test]
    async fn non_owner_cannot_update_or_delete() {
        let store = MemoryPollStore::new();
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let detail = create_poll_with_options(&store, &input("Q", "A\nB"), owner)
            .await
            .unwrap();
        let before = store.get_options(detail.poll.id).await.unwrap();

        let update = UpdatePollInput {
            poll_id: detail.poll.id,
            poll: input("Hijacked", "X\nY"),
        };
        let err = update_poll(&store, &update, intruder).await.unwrap_err();
        assert!(matches!(err, AppError::Authorization(ref m) if m.contains("permission")));

        let err = delete_poll(&store, detail.poll.id, intruder).await.unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));

        let poll = store.get_poll(detail.poll.id).await.unwrap().unwrap();
        assert_eq!(poll.question, "Q");
        assert_eq!(store.get_options(detail.poll.id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn missing_poll_reads_as_permission_failure() {
        let store = MemoryPollStore::new();

        let err = delete_poll(&store, Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Authorization(_)));
    }

    #[tokio::test]
    async fn owner_can_delete() {
        let store = MemoryPollStore::new();
        let owner = Uuid::new_v4();
        let detail = create_poll_with_options(&store, &input("Q", "A\nB"), owner)
            .await
            .unwrap();

        delete_poll(&store, detail.poll.id, owner).await.unwrap();

        assert!(store.get_poll(detail.poll.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn poll_deleted_during_update_reads_as_permission_failure() {
        let store = DeletedMidUpdate(MemoryPollStore::new());
        let owner = Uuid::new_v4();
        let detail = create_poll_with_options(&store, &input("Q", "A\nB"), owner)
            .await
            .unwrap();

        let update = UpdatePollInput {
            poll_id: detail.poll.id,
            poll: input("New Q", "C\nD"),
        };
        let err = update_poll(&store, &update, owner).await.unwrap_err();

        assert!(matches!(err, AppError::Authorization(ref m) if m.contains("update it")));
    }
}
