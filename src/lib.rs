pub mod auth;
pub mod cache;
pub mod chart;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod models;
pub mod redis;
pub mod services;
pub mod store;
pub mod validation;

use axum::{
    Router,
    http::{
        HeaderValue, Method,
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, post},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{cache::PageCache, config::Config, store::PollStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PollStore>,
    pub cache: Arc<dyn PageCache>,
    pub config: Arc<Config>,
}

pub fn create_app(state: AppState) -> Router {
    let origins = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid allowed origin: {}", origin);
                None
            }
        })
        .collect::<Vec<_>>();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]);

    // JSON API
    let api_routes = Router::new()
        .route(
            "/api/polls",
            get(handlers::polls::list_polls).post(handlers::polls::create_poll),
        )
        .route(
            "/api/polls/{poll_id}",
            get(handlers::polls::get_poll)
                .put(handlers::polls::update_poll)
                .delete(handlers::polls::delete_poll),
        )
        .route("/api/polls/{poll_id}/vote", post(handlers::polls::vote_poll))
        .route(
            "/polls/{poll_id}/results.svg",
            get(handlers::polls::results_svg),
        );

    // Form posts from the rendered pages
    let action_routes = Router::new()
        .route("/actions/polls/create", post(handlers::actions::create_poll))
        .route("/actions/polls/update", post(handlers::actions::update_poll))
        .route("/actions/polls/delete", post(handlers::actions::delete_poll))
        .route("/actions/polls/vote", post(handlers::actions::vote));

    Router::new()
        .merge(api_routes)
        .merge(action_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
