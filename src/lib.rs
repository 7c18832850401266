pub mod capability;
pub mod cli;
pub mod config;
pub mod llm;
pub mod memory;
pub mod mission;
pub mod scheduler;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use mission::{execute_mission, run_mission, trigger_mission};
