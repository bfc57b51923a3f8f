//! Rule: load block
//!
//! A `load` header names a driver-qualified function path and carries no
//! body.
//!
//! ```flowl
//! load cmd:/tmp/function3
//! load go:function1
//! ```

use crate::parser::semantic_validator::BlockRule;
use crate::parser::ParseError;
use crate::types::Block;

pub struct LoadBlockRule;

impl BlockRule for LoadBlockRule {
    fn id(&self) -> &'static str {
        "load-block"
    }

    fn kind(&self) -> &'static str {
        "load"
    }

    fn description(&self) -> &'static str {
        "load targets must be '<driver>:<path>' and take no body"
    }

    fn check(&self, block: &Block) -> Result<(), ParseError> {
        if !block.target.matches_pattern() {
            return Err(ParseError::token(
                block.line,
                format!(
                    "load target '{}' does not match '<driver>:<path>'",
                    block.target
                ),
            ));
        }
        if block.body.is_some() || !block.children.is_empty() {
            return Err(ParseError::structure(block.line, "load takes no body"));
        }
        Ok(())
    }
}
