pub mod driver;
mod lexer;
pub mod output;
pub mod parser;
pub mod runqueue;
pub mod scheduler;
pub mod stdlib;
pub mod types;

// Re-export main types
pub use types::*;

// Re-export the parse API and execution surface for convenience
pub use parser::{parse, parse_blocks, ParseError};
pub use runqueue::{ConfiguredNode, Node, RunQueue};
pub use scheduler::{NodeOutput, Scheduler, StageResult};
