//! Donor ranking for a recipient.

pub mod ranker;
pub mod score;
pub mod service;

pub use ranker::MatchRanker;
pub use score::Scorer;
pub use service::MatchService;
