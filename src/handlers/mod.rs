pub mod actions;
pub mod polls;
