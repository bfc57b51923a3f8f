//! Rule: run block
//!
//! A `run` appends one execution stage and comes in three forms:
//!
//! ```flowl
//! run function1
//!
//! run function2 {
//!     k1: v1
//! }
//!
//! run {
//!     function4
//!     function5
//! }
//! ```
//!
//! A parallel body may hold only bare function names; keywords and numeric
//! literals are rejected. A named run with a body requires key/value pairs.

use crate::parser::semantic_validator::BlockRule;
use crate::parser::ParseError;
use crate::types::{is_function_name, is_int_literal, Block, BlockBody};

const KEYWORDS: [&str; 4] = ["load", "run", "input", "fn"];

pub struct RunBlockRule;

impl BlockRule for RunBlockRule {
    fn id(&self) -> &'static str {
        "run-block"
    }

    fn kind(&self) -> &'static str {
        "run"
    }

    fn description(&self) -> &'static str {
        "run names one function, one function with args, or a parallel group"
    }

    fn check(&self, block: &Block) -> Result<(), ParseError> {
        if block.target.is_empty() {
            return check_parallel(block);
        }

        if !block.target.matches_pattern() {
            return Err(ParseError::token(
                block.line,
                format!("'{}' is not a valid function name", block.target),
            ));
        }
        match &block.body {
            None | Some(BlockBody::Map(_)) => Ok(()),
            Some(body) => Err(ParseError::structure(
                block.line,
                format!(
                    "run '{}' requires a key/value body, found a {} body",
                    block.target,
                    body.type_tag()
                ),
            )),
        }
    }
}

fn check_parallel(block: &Block) -> Result<(), ParseError> {
    let list = match block.body_list() {
        Some(list) => list,
        None => {
            return Err(ParseError::structure(
                block.line,
                "a parallel run requires a body of function names",
            ));
        }
    };
    if list.len() < 2 {
        return Err(ParseError::structure(
            block.line,
            "a parallel run requires at least two function names",
        ));
    }
    for stmt in list.statements() {
        let name = stmt.tokens[0].value.as_str();
        let first_word = name.split_whitespace().next().unwrap_or(name);
        if KEYWORDS.contains(&first_word) {
            return Err(ParseError::structure(
                stmt.line,
                format!("keyword '{}' is not allowed inside a parallel run", first_word),
            ));
        }
        if is_int_literal(name) {
            return Err(ParseError::token(
                stmt.line,
                format!("numeric literal '{}' is not a function name", name),
            ));
        }
        if !is_function_name(name) {
            return Err(ParseError::token(
                stmt.line,
                format!("'{}' is not a valid function name", name),
            ));
        }
    }
    Ok(())
}
