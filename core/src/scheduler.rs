//! Staged scheduler: executes a run queue through the driver registry.
//!
//! Stages run strictly in order; inside a stage, the head node and its
//! parallel chain are spawned concurrently and the stage completes when
//! every member has. The queue itself stays immutable; all execution
//! state lives here.

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::driver::{DriverRegistry, EntrypointBundle, FunctionResult, Resources};
use crate::runqueue::{Node, RunQueue};

/// Result of one node inside a stage.
#[derive(Debug, Clone)]
pub struct NodeOutput {
    pub name: String,
    pub result: FunctionResult,
}

/// Result of one completed stage, in chain order.
#[derive(Debug, Clone)]
pub struct StageResult {
    pub stage: usize,
    pub outputs: Vec<NodeOutput>,
}

pub struct Scheduler {
    registry: DriverRegistry,
    resources: Resources,
}

impl Scheduler {
    pub fn new(registry: DriverRegistry, resources: Resources) -> Self {
        Self {
            registry,
            resources,
        }
    }

    /// The shipped drivers, logging to stdout.
    pub fn with_defaults() -> Self {
        Self::new(DriverRegistry::with_defaults(), Resources::stdout())
    }

    /// Execute every stage in order. The first failing node aborts the run
    /// with its stage and name in the error chain.
    pub async fn run(&self, queue: &RunQueue) -> Result<Vec<StageResult>> {
        let mut results = Vec::with_capacity(queue.len());
        for (idx, head) in queue.iter().enumerate() {
            results.push(self.run_stage(idx + 1, head).await?);
        }
        info!(stages = results.len(), "workflow finished");
        Ok(results)
    }

    async fn run_stage(&self, stage: usize, head: &Node) -> Result<StageResult> {
        let chain = head.chain();
        debug!(stage, nodes = chain.len(), "stage started");

        let mut handles = Vec::with_capacity(chain.len());
        for node in chain {
            let driver = self.registry.get(node.driver.driver_name()).with_context(|| {
                format!(
                    "no driver registered for '{}' (stage {}, node '{}')",
                    node.driver.driver_name(),
                    stage,
                    node.name
                )
            })?;
            let bundle = EntrypointBundle {
                spec: node.driver.clone(),
                resources: self.resources.clone(),
            };
            let args = node.args.clone();
            let name = node.name.clone();
            let task = tokio::spawn(async move { driver.call(bundle, args).await });
            handles.push((name, task));
        }

        let mut outputs = Vec::with_capacity(handles.len());
        for (name, task) in handles {
            let result = task
                .await
                .context("function task panicked")?
                .with_context(|| format!("function '{}' failed in stage {}", name, stage))?;
            outputs.push(NodeOutput { name, result });
        }

        debug!(stage, "stage finished");
        Ok(StageResult { stage, outputs })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::driver::{DriverRegistry, Resources};
    use crate::parser::parse;
    use crate::scheduler::Scheduler;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_stages_in_order_through_the_native_driver() {
        let source = r#"
    load go:print
    load go:command

    fn greet = print {
        args = {
            _1: hello flowl
        }
    }

    run greet
    run command {
        script: echo done
    }
    "#;
        let (queue, _) = parse(source.as_bytes()).unwrap();

        let buf = SharedBuf::default();
        let scheduler = Scheduler::new(DriverRegistry::with_defaults(), Resources::new(buf.clone()));
        let results = scheduler.run(&queue).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].stage, 1);
        assert_eq!(results[0].outputs[0].name, "greet");
        assert_eq!(
            results[0].outputs[0].result.get("status").map(String::as_str),
            Some("ok")
        );
        assert_eq!(
            results[1].outputs[0].result.get("last_line").map(String::as_str),
            Some("done")
        );

        let log = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(log.contains("hello flowl"));
    }

    #[tokio::test]
    async fn parallel_chain_failure_aborts_the_stage() {
        let source = r#"
    load go:print
    load go:command

    run {
        print
        command
    }
    "#;
        let (queue, _) = parse(source.as_bytes()).unwrap();

        // command without a script arg fails, and the stage fails with it
        let scheduler = Scheduler::new(DriverRegistry::with_defaults(), Resources::new(std::io::sink()));
        let err = scheduler.run(&queue).await.unwrap_err();
        assert!(err.to_string().contains("stage 1"));
    }

    #[tokio::test]
    async fn unknown_driver_fails_at_schedule_time() {
        let source = "load java:function1\nrun function1\n";
        let (queue, _) = parse(source.as_bytes()).unwrap();

        let scheduler = Scheduler::new(DriverRegistry::with_defaults(), Resources::new(std::io::sink()));
        let err = scheduler.run(&queue).await.unwrap_err();
        assert!(err.to_string().contains("java"));
    }
}
