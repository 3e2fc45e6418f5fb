//! Signal engine: the orchestrator that sequences the stages, and the
//! decision types it returns.

pub mod decision;
pub mod orchestrator;

pub use decision::{Decision, NoSignal, Signal, SignalReasons, Stage};
pub use orchestrator::{EvaluationRequest, PipelineError, SignalOrchestrator};
