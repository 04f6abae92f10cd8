//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `UrlState`: per-URL state machine held in the visited set
//! - `VisitOutcome`: what a finished visit produced (success, extraction-failed, fetch-failed)
//! - `RunState`: overall state of a crawl run

mod run_state;
mod url_state;

pub use run_state::RunState;
pub use url_state::{UrlState, VisitOutcome};
