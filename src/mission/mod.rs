//! 情报任务 - 研究、分析、建议合成与报告输出的完整流水线

pub mod analysis;
pub mod context;
pub mod outlet;
pub mod research;
pub mod sandbox;
pub mod workflow;

pub use context::{MissionMetrics, MissionServices, ResearchState};
pub use workflow::{MissionOutcome, execute_mission, run_mission, trigger_mission};
