pub mod orchestrator;
pub mod phase;
pub mod state;

pub use orchestrator::{PipelineOrchestrator, StrategyFactory};
pub use phase::{stage_definition, StageDefinition, STAGES};
pub use state::{PipelineStatus, PipelineSummary, StageResult};
