//! Semantic validation for parsed blocks.
//!
//! The block parser hands every block to the [`Validator`] the moment the
//! block closes. Validation enforces the well-formedness the line grammar
//! cannot: header tokens must match their kind's pattern, a nested `args`
//! belongs only to `fn`, a parallel `run` body may hold only function
//! names, and so on.
//!
//! # Architecture
//!
//! 1. **BlockRule trait** - one rule per block kind
//! 2. **Validator** - owns the rule set and dispatches by kind
//!
//! To add a rule: create a file in `semantic_validator/rules/`, implement
//! `BlockRule`, and register it in `Validator::new()`.

pub mod rules;

#[cfg(test)]
mod tests;

use crate::parser::ParseError;
use crate::types::Block;

/// A well-formedness check applied to one kind of closed block.
///
/// Rules are independent of each other and must report the offending
/// source line on failure.
pub trait BlockRule: Send + Sync {
    /// Unique identifier, e.g. "run-block".
    fn id(&self) -> &'static str;

    /// The block kind this rule applies to ("load", "fn", "run").
    fn kind(&self) -> &'static str;

    /// Human-readable description of what this rule checks.
    fn description(&self) -> &'static str;

    /// Check a closed block of the matching kind.
    fn check(&self, block: &Block) -> Result<(), ParseError>;
}

/// Runs the registered rules against every closed block.
pub struct Validator {
    rules: Vec<Box<dyn BlockRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(rules::LoadBlockRule),
                Box::new(rules::FnBlockRule),
                Box::new(rules::RunBlockRule),
            ],
        }
    }

    /// Validate one closed block. The first failing rule aborts.
    pub fn validate(&self, block: &Block) -> Result<(), ParseError> {
        for rule in &self.rules {
            if block.kind_is(rule.kind()) {
                rule.check(block)?;
            }
        }
        Ok(())
    }

    /// All registered rules as (id, description) pairs.
    #[allow(dead_code)]
    pub fn rules(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.rules.iter().map(|r| (r.id(), r.description()))
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
