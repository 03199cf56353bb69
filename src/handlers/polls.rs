use axum::{
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    AppState,
    auth::{AuthUser, OptionalAuthUser},
    cache::{self, POLLS_PATH, poll_path, revalidate_path},
    chart::{self, ChartType, ChartView},
    error::{AppError, Result},
    models::{
        Poll, PollDetail, PollListItem, PollRequest, PollResults, PollSummary, UpdatePollInput,
        ViewerState, VoteInput, VoteRequest,
    },
    services::{poll_service, results_service, vote_service},
    validation,
};

#[derive(Debug, Default, Deserialize)]
pub struct ChartQuery {
    pub chart: Option<ChartType>,
    pub toggle: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct PollDetailResponse {
    pub poll: Poll,
    pub results: PollResults,
    pub chart: ChartView,
    pub viewer: ViewerState,
}

fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

async fn cached_detail(state: &AppState, poll_id: Uuid) -> Result<PollDetail> {
    let store = state.store.as_ref();
    cache::cached_json(
        state.cache.as_ref(),
        &poll_path(poll_id),
        state.config.cache_ttl_seconds,
        move || async move {
            results_service::load_poll_detail(store, poll_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Poll not found".to_string()))
        },
    )
    .await
}

pub async fn list_polls(
    State(state): State<AppState>,
    auth_user: OptionalAuthUser,
) -> Result<Json<Vec<PollListItem>>> {
    let store = state.store.as_ref();
    let summaries: Vec<PollSummary> = cache::cached_json(
        state.cache.as_ref(),
        POLLS_PATH,
        state.config.cache_ttl_seconds,
        move || results_service::list_poll_summaries(store),
    )
    .await?;

    let viewer_id = auth_user.user_id();
    let polls = summaries
        .into_iter()
        .map(|summary| PollListItem {
            is_owner: viewer_id == Some(summary.created_by),
            summary,
        })
        .collect();

    Ok(Json(polls))
}

pub async fn get_poll(
    State(state): State<AppState>,
    Path(poll_id): Path<Uuid>,
    Query(query): Query<ChartQuery>,
    auth_user: OptionalAuthUser,
) -> Result<Json<PollDetailResponse>> {
    let detail = cached_detail(&state, poll_id).await?;

    let viewer_id = auth_user.user_id();
    let existing_vote = match viewer_id {
        Some(voter_id) => state
            .store
            .get_vote(poll_id, voter_id)
            .await?
            .map(|vote| vote.option_id),
        None => None,
    };

    let chart = chart::build_chart(
        &detail.results,
        query.chart.unwrap_or_default(),
        query.toggle.unwrap_or(true),
    );

    Ok(Json(PollDetailResponse {
        viewer: ViewerState {
            existing_vote,
            can_edit: viewer_id == Some(detail.poll.created_by),
        },
        poll: detail.poll,
        results: detail.results,
        chart,
    }))
}

pub async fn results_svg(
    State(state): State<AppState>,
    Path(poll_id): Path<Uuid>,
    Query(query): Query<ChartQuery>,
) -> Result<impl IntoResponse> {
    let detail = cached_detail(&state, poll_id).await?;
    let view = chart::build_chart(&detail.results, query.chart.unwrap_or_default(), false);

    let svg = chart::render_svg(&view)
        .map_err(|e| AppError::Internal(format!("Failed to render chart: {}", e)))?;

    Ok(([(CONTENT_TYPE, "image/svg+xml")], svg))
}

pub async fn create_poll(
    State(state): State<AppState>,
    auth_user: AuthUser,
    payload: std::result::Result<Json<PollRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PollDetail>)> {
    let input = validation::validate_poll_request(&json_body(payload)?)?;

    let detail =
        poll_service::create_poll_with_options(state.store.as_ref(), &input, auth_user.user_id)
            .await?;

    revalidate_path(state.cache.as_ref(), POLLS_PATH).await;

    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn update_poll(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(poll_id): Path<Uuid>,
    payload: std::result::Result<Json<PollRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let poll = validation::validate_poll_request(&json_body(payload)?)?;

    poll_service::update_poll(
        state.store.as_ref(),
        &UpdatePollInput { poll_id, poll },
        auth_user.user_id,
    )
    .await?;

    revalidate_path(state.cache.as_ref(), &poll_path(poll_id)).await;
    revalidate_path(state.cache.as_ref(), POLLS_PATH).await;

    Ok(Json(json!({
        "message": "Poll updated successfully"
    })))
}

pub async fn delete_poll(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(poll_id): Path<Uuid>,
) -> Result<StatusCode> {
    poll_service::delete_poll(state.store.as_ref(), poll_id, auth_user.user_id).await?;

    revalidate_path(state.cache.as_ref(), &poll_path(poll_id)).await;
    revalidate_path(state.cache.as_ref(), POLLS_PATH).await;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn vote_poll(
    State(state): State<AppState>,
    auth_user: OptionalAuthUser,
    Path(poll_id): Path<Uuid>,
    payload: std::result::Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let request = json_body(payload)?;
    let input = VoteInput {
        poll_id,
        option_id: request.option_id,
    };

    vote_service::submit_vote(state.store.as_ref(), &input, auth_user.user_id()).await?;

    revalidate_path(state.cache.as_ref(), &poll_path(poll_id)).await;
    revalidate_path(state.cache.as_ref(), POLLS_PATH).await;

    Ok(Json(json!({
        "message": "Vote recorded successfully"
    })))
}
