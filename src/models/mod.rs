pub mod poll;
pub mod results;
pub mod vote;

pub use poll::*;
pub use results::*;
pub use vote::*;
