//! Metric engines. Each engine is a pure function over an already-scoped
//! snapshot of problems and attempts; none of them performs I/O.

pub mod abandoned;
pub mod difficulty;
pub mod rating;
pub mod status;
pub mod tags;

pub use abandoned::{find_abandoned, AbandonedEntry};
pub use difficulty::{compute_difficulty_distribution, DifficultyDistribution};
pub use rating::{compute_rating_distribution, BinConfig, RatingDistribution};
pub use tags::{compute_tag_overview, compute_weak_tags, TagInfo, TagStat};
