/// Per-URL state definitions for tracking crawl progress
///
/// A URL moves `Pending -> InProgress -> Done | Failed` exactly once per run.
use std::fmt;

/// Represents the current state of a URL in the visited set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlState {
    /// Discovered and waiting in the frontier
    Pending,

    /// Handed to a worker; fetch or extraction in flight
    InProgress,

    /// Fetched successfully (extraction may still have failed)
    Done,

    /// Fetch failed after retries
    Failed,
}

impl UrlState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: UrlState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InProgress)
                | (Self::InProgress, Self::Done)
                | (Self::InProgress, Self::Failed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Parses a state from its string representation
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns all possible URL states
    pub fn all_states() -> Vec<Self> {
        vec![Self::Pending, Self::InProgress, Self::Done, Self::Failed]
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Final outcome recorded for a visited URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitOutcome {
    /// Fetched and extracted into a page
    Success,

    /// Fetched, but the page could not be turned into usable content
    ExtractionFailed,

    /// Could not be fetched
    FetchFailed,
}

impl VisitOutcome {
    /// The URL state an outcome leaves the URL in
    pub fn url_state(&self) -> UrlState {
        match self {
            Self::Success | Self::ExtractionFailed => UrlState::Done,
            Self::FetchFailed => UrlState::Failed,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::ExtractionFailed => "extraction-failed",
            Self::FetchFailed => "fetch-failed",
        }
    }
}

impl fmt::Display for VisitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
