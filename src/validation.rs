//! Normalization of raw form and JSON input.
//!
//! Strings are trimmed, option blobs are split on newlines with blank lines
//! dropped, and identifiers must be present and well-formed. No length
//! limits, escaping, or duplicate-option checks are applied here.

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, Result},
    models::{OptionsField, PollForm, PollInput, PollRequest, UpdatePollInput, VoteInput},
};

/// Split a newline-separated option blob, trimming each line and dropping
/// empty ones.
pub fn split_options(raw: &str) -> Vec<String> {
    clean_options(raw.split('\n'))
}

fn clean_options<'a>(lines: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    lines
        .into_iter()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_poll(question: &str, options: Vec<String>) -> Result<PollInput> {
    let input = PollInput {
        question: question.trim().to_string(),
        options,
    };
    input.validate()?;
    Ok(input)
}

/// Parse a required identifier field. Blank is "missing", anything else
/// must be a UUID.
pub fn parse_id(raw: Option<&str>, field: &str) -> Result<Uuid> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(AppError::Validation(format!("Missing {}", field)));
    }
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("Invalid {}", field)))
}

fn parse_optional_id(raw: Option<&str>, field: &str) -> Result<Option<Uuid>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_id(Some(value), field).map(Some),
    }
}

pub fn parse_create_poll(form: &PollForm) -> Result<PollInput> {
    normalize_poll(
        form.question.as_deref().unwrap_or_default(),
        split_options(form.options.as_deref().unwrap_or_default()),
    )
}

pub fn parse_update_poll(form: &PollForm) -> Result<UpdatePollInput> {
    let poll_id = parse_id(form.poll_id.as_deref(), "poll id")?;
    let poll = parse_create_poll(form)?;
    Ok(UpdatePollInput { poll_id, poll })
}

pub fn parse_delete_poll(form: &PollForm) -> Result<Uuid> {
    parse_id(form.poll_id.as_deref(), "poll id")
}

/// The option stays optional here; the vote service reports a missing
/// choice as its own failure.
pub fn parse_vote(form: &PollForm) -> Result<VoteInput> {
    let poll_id = parse_id(form.poll_id.as_deref(), "poll id")?;
    let option_id = parse_optional_id(form.option.as_deref(), "option id")?;
    Ok(VoteInput { poll_id, option_id })
}

/// Validate a JSON create/update body.
pub fn validate_poll_request(request: &PollRequest) -> Result<PollInput> {
    let options = match &request.options {
        OptionsField::List(items) => clean_options(items.iter().map(String::as_str)),
        OptionsField::Text(raw) => split_options(raw),
    };
    normalize_poll(&request.question, options)
}
