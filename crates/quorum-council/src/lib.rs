//! Three-stage multi-model council deliberation engine.
//!
//! Stage 1 fans the user query out to every council model in parallel,
//! Stage 2 has the same models rank each other's anonymized answers, and
//! Stage 3 asks a chairman model to synthesize a final answer from all of
//! the prior context. Individual model failures degrade gracefully; only a
//! fully unresponsive Stage 1 or a failed Stage 3 aborts the run.
mod aggregate;
mod config;
mod council;
mod executor;
mod prompts;
mod ranking;
mod types;

pub use aggregate::calculate_aggregate_rankings;
pub use config::CouncilConfig;
pub use council::{Council, CouncilError};
pub use executor::query_models_parallel;
pub use ranking::parse_ranking_from_text;
pub use types::{
    AggregateRanking, CouncilMetadata, CouncilOutcome, Stage1Response, Stage2Ranking,
    Stage3Response,
};
