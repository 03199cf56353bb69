pub mod poll_service;
pub mod results_service;
pub mod vote_service;
