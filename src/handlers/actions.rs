//! Form-submission endpoints used by the server-rendered pages.
//!
//! Each flow finishes with a [`FormOutcome`]: a redirect target on success,
//! or a structured failure. The vote flow reports failures as a redirect
//! back to the poll with an `error` query parameter.

use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Json, Redirect, Response},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    AppState,
    auth::OptionalAuthUser,
    cache::{POLLS_PATH, poll_path, revalidate_path},
    error::{AppError, Result},
    models::PollForm,
    services::{poll_service, vote_service},
    validation,
};

#[derive(Debug)]
pub enum FormOutcome {
    Redirect(String),
    Failed {
        context: &'static str,
        error: AppError,
    },
}

impl FormOutcome {
    fn redirect_with_error(path: &str, code: &str) -> Self {
        FormOutcome::Redirect(format!("{}?error={}", path, code))
    }
}

impl IntoResponse for FormOutcome {
    fn into_response(self) -> Response {
        match self {
            FormOutcome::Redirect(to) => Redirect::to(&to).into_response(),
            FormOutcome::Failed { context, error } => {
                let (status, message) = error.status_and_message();
                let body = Json(json!({
                    "ok": false,
                    "error": {
                        "code": error.code(),
                        "message": format!("{} {}", context, message).trim(),
                    }
                }));
                (status, body).into_response()
            }
        }
    }
}

async fn create_flow(
    state: &AppState,
    auth_user: &OptionalAuthUser,
    form: &PollForm,
) -> Result<()> {
    let caller_id = auth_user.require()?;
    let input = validation::parse_create_poll(form)?;
    poll_service::create_poll_with_options(state.store.as_ref(), &input, caller_id).await?;
    Ok(())
}

async fn update_flow(
    state: &AppState,
    auth_user: &OptionalAuthUser,
    form: &PollForm,
) -> Result<Uuid> {
    let caller_id = auth_user.require()?;
    let input = validation::parse_update_poll(form)?;
    poll_service::update_poll(state.store.as_ref(), &input, caller_id).await?;
    Ok(input.poll_id)
}

async fn delete_flow(
    state: &AppState,
    auth_user: &OptionalAuthUser,
    form: &PollForm,
) -> Result<Uuid> {
    let caller_id = auth_user.require()?;
    let poll_id = validation::parse_delete_poll(form)?;
    poll_service::delete_poll(state.store.as_ref(), poll_id, caller_id).await?;
    Ok(poll_id)
}

pub async fn create_poll(
    State(state): State<AppState>,
    auth_user: OptionalAuthUser,
    Form(form): Form<PollForm>,
) -> FormOutcome {
    match create_flow(&state, &auth_user, &form).await {
        Ok(()) => {
            revalidate_path(state.cache.as_ref(), POLLS_PATH).await;
            FormOutcome::Redirect(format!("{}?created=1", POLLS_PATH))
        }
        Err(error) => FormOutcome::Failed {
            context: "Failed to create poll:",
            error,
        },
    }
}

pub async fn update_poll(
    State(state): State<AppState>,
    auth_user: OptionalAuthUser,
    Form(form): Form<PollForm>,
) -> FormOutcome {
    match update_flow(&state, &auth_user, &form).await {
        Ok(poll_id) => {
            let path = poll_path(poll_id);
            revalidate_path(state.cache.as_ref(), &path).await;
            revalidate_path(state.cache.as_ref(), POLLS_PATH).await;
            FormOutcome::Redirect(format!("{}?updated=1", path))
        }
        Err(error) => FormOutcome::Failed {
            context: "Failed to update poll:",
            error,
        },
    }
}

pub async fn delete_poll(
    State(state): State<AppState>,
    auth_user: OptionalAuthUser,
    Form(form): Form<PollForm>,
) -> FormOutcome {
    match delete_flow(&state, &auth_user, &form).await {
        Ok(poll_id) => {
            revalidate_path(state.cache.as_ref(), &poll_path(poll_id)).await;
            revalidate_path(state.cache.as_ref(), POLLS_PATH).await;
            FormOutcome::Redirect(POLLS_PATH.to_string())
        }
        Err(error) => FormOutcome::Failed {
            context: "Failed to delete poll:",
            error,
        },
    }
}

pub async fn vote(
    State(state): State<AppState>,
    auth_user: OptionalAuthUser,
    Form(form): Form<PollForm>,
) -> FormOutcome {
    let poll_id = match validation::parse_id(form.poll_id.as_deref(), "poll id") {
        Ok(poll_id) => poll_id,
        Err(e) => {
            tracing::debug!("Vote without a usable poll id: {}", e);
            return FormOutcome::redirect_with_error(POLLS_PATH, "missing_poll");
        }
    };
    let path = poll_path(poll_id);

    let input = match validation::parse_vote(&form) {
        Ok(input) => input,
        Err(e) => {
            tracing::debug!("Vote with an unusable option: {}", e);
            return FormOutcome::redirect_with_error(&path, "no_option");
        }
    };

    match vote_service::submit_vote(state.store.as_ref(), &input, auth_user.user_id()).await {
        Ok(()) => {
            revalidate_path(state.cache.as_ref(), &path).await;
            revalidate_path(state.cache.as_ref(), POLLS_PATH).await;
            FormOutcome::Redirect(path)
        }
        Err(AppError::Validation(_)) => FormOutcome::redirect_with_error(&path, "no_option"),
        Err(AppError::Authentication(_)) => {
            FormOutcome::redirect_with_error(&path, "unauthenticated")
        }
        Err(e) => {
            tracing::warn!("Failed to submit vote on {}: {}", poll_id, e);
            FormOutcome::redirect_with_error(&path, "vote_failed")
        }
    }
}
