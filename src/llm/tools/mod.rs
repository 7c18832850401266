pub mod sequential_thinking;
