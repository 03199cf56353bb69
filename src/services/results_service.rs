use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{OptionTally, Poll, PollDetail, PollOption, PollResults, PollSummary, VoteCount},
    store::PollStore,
};

/// Join tally rows against a poll's options.
///
/// Options missing from `counts` have zero votes. Percentages stay
/// unrounded; rounding is a presentation concern.
pub fn aggregate(poll: &Poll, options: &[PollOption], counts: &HashMap<Uuid, i64>) -> PollResults {
    let mut ordered: Vec<&PollOption> = options.iter().collect();
    ordered.sort_by_key(|option| option.position);

    let total_votes: i64 = ordered
        .iter()
        .map(|option| counts.get(&option.id).copied().unwrap_or(0))
        .sum();

    let options = ordered
        .into_iter()
        .map(|option| {
            let votes = counts.get(&option.id).copied().unwrap_or(0);
            let percentage = if total_votes > 0 {
                votes as f64 / total_votes as f64 * 100.0
            } else {
                0.0
            };
            OptionTally {
                option_id: option.id,
                option_text: option.option_text.clone(),
                position: option.position,
                votes,
                percentage,
            }
        })
        .collect();

    PollResults {
        poll_id: poll.id,
        question: poll.question.clone(),
        total_votes,
        options,
    }
}

pub fn votes_by_option(counts: &[VoteCount]) -> HashMap<Uuid, i64> {
    let mut by_option = HashMap::new();
    for count in counts {
        *by_option.entry(count.option_id).or_insert(0) += count.votes;
    }
    by_option
}

pub fn total_votes_by_poll(counts: &[VoteCount]) -> HashMap<Uuid, i64> {
    let mut by_poll = HashMap::new();
    for count in counts {
        *by_poll.entry(count.poll_id).or_insert(0) += count.votes;
    }
    by_poll
}

pub async fn load_poll_detail(store: &dyn PollStore, poll_id: Uuid) -> Result<Option<PollDetail>> {
    let Some(poll) = store.get_poll(poll_id).await? else {
        return Ok(None);
    };

    let options = store.get_options(poll_id).await?;
    let counts = store.vote_counts(Some(poll_id)).await?;
    let results = aggregate(&poll, &options, &votes_by_option(&counts));

    Ok(Some(PollDetail { poll, results }))
}

pub async fn list_poll_summaries(store: &dyn PollStore) -> Result<Vec<PollSummary>> {
    let polls = store.list_polls().await?;
    let totals = total_votes_by_poll(&store.vote_counts(None).await?);

    Ok(polls
        .into_iter()
        .map(|poll| PollSummary {
            total_votes: totals.get(&poll.id).copied().unwrap_or(0),
            id: poll.id,
            question: poll.question,
            created_by: poll.created_by,
            created_at: poll.created_at,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn poll_with(texts: &[&str]) -> (Poll, Vec<PollOption>) {
        let poll = Poll {
            id: Uuid::new_v4(),
            question: "Which option?".to_string(),
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        };
        let options = texts
            .iter()
            .enumerate()
            .map(|(idx, text)| PollOption {
                id: Uuid::new_v4(),
                poll_id: poll.id,
                option_text: text.to_string(),
                position: idx as i32 + 1,
                created_at: Utc::now(),
            })
            .collect();
        (poll, options)
    }

    #[test]
    fn percentages_follow_vote_share() {
        let (poll, options) = poll_with(&["Alpha", "Beta", "Gamma"]);
        let counts = HashMap::from([(options[0].id, 3), (options[1].id, 6), (options[2].id, 1)]);

        let results = aggregate(&poll, &options, &counts);

        assert_eq!(results.total_votes, 10);
        let rounded: Vec<i64> = results.options.iter().map(|o| o.rounded_percentage()).collect();
        assert_eq!(rounded, vec![30, 60, 10]);
        assert_eq!(rounded.iter().sum::<i64>(), 100);
    }

    #[test]
    fn zero_total_gives_zero_percentages() {
        let (poll, options) = poll_with(&["A", "B"]);

        let results = aggregate(&poll, &options, &HashMap::new());

        assert!(results.is_empty());
        assert!(results.options.iter().all(|o| o.votes == 0 && o.percentage == 0.0));
    }

    #[test]
    fn options_come_back_in_position_order() {
        let (poll, mut options) = poll_with(&["A", "B", "C"]);
        options.reverse();
        let counts = HashMap::from([(options[0].id, 2)]);

        let results = aggregate(&poll, &options, &counts);

        let texts: Vec<&str> = results.options.iter().map(|o| o.option_text.as_str()).collect();
        assert_eq!(texts, vec!["A", "B", "C"]);
        assert_eq!(results.options[2].votes, 2);
        assert_eq!(results.options[2].percentage, 100.0);
    }

    #[test]
    fn unrounded_share_is_kept() {
        let (poll, options) = poll_with(&["A", "B", "C"]);
        let counts = HashMap::from([(options[0].id, 1), (options[1].id, 1), (options[2].id, 1)]);

        let results = aggregate(&poll, &options, &counts);

        assert!((results.options[0].percentage - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(results.options[0].rounded_percentage(), 33);
    }

    #[test]
    fn totals_per_poll_sum_option_rows() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let counts = vec![
            VoteCount { poll_id: a, option_id: Uuid::new_v4(), votes: 2 },
            VoteCount { poll_id: a, option_id: Uuid::new_v4(), votes: 5 },
            VoteCount { poll_id: b, option_id: Uuid::new_v4(), votes: 0 },
        ];

        let totals = total_votes_by_poll(&counts);

        assert_eq!(totals[&a], 7);
        assert_eq!(totals[&b], 0);
    }
}
