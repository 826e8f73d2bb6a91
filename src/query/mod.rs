//! Query engine: latest-status projection, risk evaluation, history paging.

mod history;
mod latest;
mod risk;

pub use history::*;
pub use latest::*;
pub use risk::*;
