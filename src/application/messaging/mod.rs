//! Message handling - Console input parsing

pub mod parser;

pub use parser::{Input, InputParser};
