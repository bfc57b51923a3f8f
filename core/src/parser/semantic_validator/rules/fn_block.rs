//! Rule: fn block
//!
//! An `fn` block binds an alias to an underlying function. The alias and
//! the function are both function names, the operator is `=`, and the only
//! permitted child is a single `args` block holding key/value pairs.
//!
//! ```flowl
//! fn f1 = function1 {
//!     args = {
//!         k1: v1
//!     }
//! }
//! ```

use crate::parser::semantic_validator::BlockRule;
use crate::parser::ParseError;
use crate::types::Block;

pub struct FnBlockRule;

impl BlockRule for FnBlockRule {
    fn id(&self) -> &'static str {
        "fn-block"
    }

    fn kind(&self) -> &'static str {
        "fn"
    }

    fn description(&self) -> &'static str {
        "fn binds '<alias> = <function>' with an optional args map"
    }

    fn check(&self, block: &Block) -> Result<(), ParseError> {
        if !block.target.matches_pattern() {
            return Err(ParseError::token(
                block.line,
                format!("'{}' is not a valid alias name", block.target),
            ));
        }
        if !block.operator.matches_pattern() {
            return Err(ParseError::token(
                block.line,
                format!("expected '=' after the alias name, got '{}'", block.operator),
            ));
        }
        if !block.type_or_value.matches_pattern() {
            return Err(ParseError::token(
                block.line,
                format!("'{}' is not a valid function name", block.type_or_value),
            ));
        }

        if block.children.len() > 1 {
            return Err(ParseError::structure(
                block.line,
                "fn allows at most one 'args' block",
            ));
        }
        if let Some(child) = block.children.first() {
            if !child.kind_is("args") {
                return Err(ParseError::structure(
                    child.line,
                    format!("unexpected '{}' block inside fn", child.kind),
                ));
            }
            let map = child
                .body_map()
                .ok_or_else(|| ParseError::structure(child.line, "args requires a key/value body"))?;
            for stmt in map.statements() {
                let key = &stmt.tokens[0];
                if key.is_empty() || !key.matches_pattern() {
                    return Err(ParseError::token(
                        stmt.line,
                        format!("'{}' is not a valid args key", key),
                    ));
                }
            }
        }
        Ok(())
    }
}
