// Judging pipeline: pairing, pacing, checkpointed execution and the final write.
// All judge calls go through `judge::Judge`, never straight to a provider.

pub mod finalize;
pub mod governor;
pub mod pairing;
pub mod runner;

pub use finalize::{check_output_path, finalize, write_output};
pub use governor::{RateLimitGovernor, TokioWaiter};
pub use pairing::PairingStrategy;
pub use runner::{CheckpointPolicy, Pipeline, PipelineOptions};
