//! The plan -> research -> summarize pipeline.

pub mod orchestrator;
pub mod planner;
pub mod researcher;
pub mod summarizer;

pub use orchestrator::{ResearchWorkflow, WorkflowSettings};
pub use planner::QueryPlanner;
pub use researcher::Researcher;
pub use summarizer::Summarizer;
