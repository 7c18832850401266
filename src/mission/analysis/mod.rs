//! 分析阶段 - 关键路径排序、模式识别与战略建议

pub mod critical_path;
pub mod recommendations;

pub use critical_path::{CriticalPath, CriticalPathAnalyzer, StrategicAnswer};
pub use recommendations::{Deliberation, ReasoningService, RecommendationSynthesizer};
