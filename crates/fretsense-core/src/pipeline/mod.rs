pub mod config;
mod orchestrator;
mod session;
mod types;

pub use orchestrator::{run_sample, run_session, run_session_reported, SampleOutput, SessionOutput};
pub use session::{FretSession, PipelineStep};
pub use types::{NoOpReporter, PipelineStage, ProgressReporter};
