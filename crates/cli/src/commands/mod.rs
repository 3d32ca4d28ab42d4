//! Command handlers.

mod ask;
mod clean;
mod index;
mod stats;

pub use ask::AskCommand;
pub use clean::CleanCommand;
pub use index::IndexCommand;
pub use stats::StatsCommand;
