//! Standard library of native functions for the in-process driver, plus
//! the manifest shape every shipped function declares itself with.

pub mod command;
pub mod print;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Describes one argument or return value of a function.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageDesc {
    pub name: String,
    pub desc: String,
}

impl UsageDesc {
    pub fn new(name: impl Into<String>, desc: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            desc: desc.into(),
        }
    }
}

/// Everything a shipped function declares about itself: identity, owning
/// driver, default args, and usage documentation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub category: String,
    pub name: String,
    pub driver: String,
    pub description: String,
    pub default_args: HashMap<String, String>,
    pub usage_args: Vec<UsageDesc>,
    pub return_values: Vec<UsageDesc>,
}
