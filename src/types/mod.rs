pub mod finding;
pub mod graph;
pub mod mission;
