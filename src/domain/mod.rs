//! Domain layer types and invariants.

pub mod drafts;
pub mod error;
pub mod filter;
pub mod markdown;
pub mod posts;
pub mod slug;
