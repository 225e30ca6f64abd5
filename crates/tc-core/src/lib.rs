//! town-chronicle/crates/tc-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Town Chronicle:
//! theme and sentiment analysis, crest and motto generation, and the
//! aggregate recompute that follows every story mutation.

pub mod analysis;
pub mod crest;
pub mod error;
pub mod lexicon;
pub mod models;
pub mod motto;
pub mod service;
pub mod stats;
pub mod traits;

#[cfg(test)]
mod test_support;

// Re-exporting for easier access in other crates
pub use analysis::{analyze_sentiment, extract_themes};
pub use crest::{generate_crest, CrestCatalog, CrestGate, CrestPattern, Rarity};
pub use error::*;
pub use lexicon::Lexicon;
pub use models::*;
pub use motto::{generate_motto, MottoBook};
pub use service::Chronicle;
pub use stats::{recompute_stats, DerivedStats, ThemeHistogram};
pub use traits::*;
