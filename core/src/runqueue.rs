//! Run queue: lowering of a validated block list into ordered stages.
//!
//! Lowering runs in two passes. The registration pass records every `load`
//! in the loaded-function registry (keyed by canonical name, the last path
//! component) and every `fn` in the configured-node table. The synthesis
//! pass walks `run` blocks in source order and emits one numbered stage
//! per block, resolving names against the alias table first and the
//! registry second.
//!
//! The queue is a passive, immutable structure once built; executing it is
//! the scheduler's job.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::driver::DriverSpec;
use crate::parser::ParseError;
use crate::types::{Block, BlockList};

/// A `fn` alias binding: alias name, underlying function, default args.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfiguredNode {
    pub alias: String,
    pub function_name: String,
    pub driver: DriverSpec,
    pub default_args: HashMap<String, String>,
}

/// One invocation target of a stage: function name, owning driver,
/// effective args, and the optional next member of a parallel group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub driver: DriverSpec,
    pub args: HashMap<String, String>,
    pub parallel: Option<Box<Node>>,
}

impl Node {
    /// The node itself followed by its parallel siblings, in order.
    pub fn chain(&self) -> Vec<&Node> {
        let mut nodes = vec![self];
        let mut current = self;
        while let Some(next) = current.parallel.as_deref() {
            nodes.push(next);
            current = next;
        }
        nodes
    }
}

/// The ordered execution plan of one parsed source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunQueue {
    pub configured_nodes: HashMap<String, ConfiguredNode>,
    loaded: HashMap<String, DriverSpec>,
    queue: Vec<Node>,
}

impl RunQueue {
    /// Lower a validated block list. Blocks are read-only inputs; any
    /// unresolved or colliding name aborts with the block's line number.
    pub fn compile(blocks: &BlockList) -> Result<Self, ParseError> {
        let mut rq = RunQueue::default();
        blocks.foreach(|b| {
            if b.kind_is("load") {
                rq.register_load(b)
            } else {
                Ok(())
            }
        })?;
        blocks.foreach(|b| {
            if b.kind_is("fn") {
                rq.register_alias(b)
            } else {
                Ok(())
            }
        })?;
        blocks.foreach(|b| {
            if b.kind_is("run") {
                rq.push_stage(b)
            } else {
                Ok(())
            }
        })?;
        Ok(rq)
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// The driver spec a canonical function name was loaded with.
    pub fn loaded_function(&self, name: &str) -> Option<&DriverSpec> {
        self.loaded.get(name)
    }

    /// Head nodes in stage order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.queue.iter()
    }

    /// Stage-by-stage traversal. Stages are numbered from 1; the callback
    /// receives each stage's head node and walks `parallel` for siblings.
    /// Returning an error stops traversal immediately.
    pub fn stage<E>(&self, mut f: impl FnMut(usize, &Node) -> Result<(), E>) -> Result<(), E> {
        for (idx, node) in self.queue.iter().enumerate() {
            f(idx + 1, node)?;
        }
        Ok(())
    }

    fn register_load(&mut self, block: &Block) -> Result<(), ParseError> {
        let spec = DriverSpec::parse(&block.target.value, block.line)?;
        let name = spec.function_name().to_string();
        if self.loaded.contains_key(&name) {
            return Err(ParseError::resolution(
                block.line,
                format!("function '{}' is already loaded", name),
            ));
        }
        self.loaded.insert(name, spec);
        Ok(())
    }

    fn register_alias(&mut self, block: &Block) -> Result<(), ParseError> {
        let alias = block.target.value.clone();
        let function_name = block.type_or_value.value.clone();
        if self.loaded.contains_key(&alias) {
            return Err(ParseError::resolution(
                block.line,
                format!("alias '{}' collides with a loaded function", alias),
            ));
        }
        if self.configured_nodes.contains_key(&alias) {
            return Err(ParseError::resolution(
                block.line,
                format!("alias '{}' is already defined", alias),
            ));
        }
        let driver = self.loaded.get(&function_name).cloned().ok_or_else(|| {
            ParseError::resolution(
                block.line,
                format!(
                    "fn '{}' references unknown function '{}'",
                    alias, function_name
                ),
            )
        })?;
        let default_args = block
            .children
            .first()
            .and_then(Block::body_map)
            .map(|map| map.to_map())
            .unwrap_or_default();
        self.configured_nodes.insert(
            alias.clone(),
            ConfiguredNode {
                alias,
                function_name,
                driver,
                default_args,
            },
        );
        Ok(())
    }

    fn push_stage(&mut self, block: &Block) -> Result<(), ParseError> {
        if block.target.is_empty() {
            // Parallel group: head node plus a singly linked chain.
            let list = block.body_list().expect("validated parallel run");
            let mut chain: Option<Box<Node>> = None;
            for stmt in list.statements().iter().rev() {
                let mut node = self.resolve(&stmt.tokens[0].value, stmt.line)?;
                node.parallel = chain;
                chain = Some(Box::new(node));
            }
            self.queue.push(*chain.expect("non-empty parallel run"));
            return Ok(());
        }

        let mut node = self.resolve(&block.target.value, block.line)?;
        if let Some(map) = block.body_map() {
            // Body args override alias defaults key by key.
            for (k, v) in map.iter() {
                node.args.insert(k.to_string(), v.to_string());
            }
        }
        self.queue.push(node);
        Ok(())
    }

    /// Resolve a run target: configured alias first, loaded function second.
    fn resolve(&self, name: &str, line: usize) -> Result<Node, ParseError> {
        if let Some(cn) = self.configured_nodes.get(name) {
            return Ok(Node {
                name: name.to_string(),
                driver: cn.driver.clone(),
                args: cn.default_args.clone(),
                parallel: None,
            });
        }
        if let Some(spec) = self.loaded.get(name) {
            return Ok(Node {
                name: name.to_string(),
                driver: spec.clone(),
                args: HashMap::new(),
                parallel: None,
            });
        }
        Err(ParseError::resolution(
            line,
            format!("run references unknown function or alias '{}'", name),
        ))
    }
}
