//! 研究阶段 - 时效闸门、工具多样性、研究周期与按竞争对手的限时编排

pub mod classify;
pub mod cycle;
pub mod diversity;
pub mod orchestrator;
pub mod recency;

pub use cycle::ResearchCycle;
pub use diversity::ToolDiversityEnforcer;
pub use orchestrator::DeepResearchOrchestrator;
pub use recency::{RecencyGate, RecencyWindow};
