//! In-process function driver.
//!
//! Runs functions inside the host process, looked up by their canonical
//! name. Registered under the driver name `go`, so sources address it as
//! `load go:function1`.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use crate::stdlib::{self, Manifest};

use super::{EntrypointBundle, FunctionArgs, FunctionDriver, FunctionResult};

/// Future returned by a native entrypoint.
pub type NativeFuture = Pin<Box<dyn Future<Output = anyhow::Result<FunctionResult>> + Send>>;

/// Entry point of a native function.
pub type EntrypointFn = fn(EntrypointBundle, FunctionArgs) -> NativeFuture;

/// A native function: its manifest plus entrypoint.
pub struct NativeFunction {
    pub manifest: Manifest,
    pub entrypoint: EntrypointFn,
}

#[derive(Default)]
pub struct NativeDriver {
    table: HashMap<String, NativeFunction>,
}

impl NativeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// A driver with the standard library installed.
    pub fn with_stdlib() -> Self {
        let mut driver = Self::default();
        driver.register(stdlib::print::function());
        driver.register(stdlib::command::function());
        driver
    }

    pub fn register(&mut self, function: NativeFunction) {
        self.table.insert(function.manifest.name.clone(), function);
    }

    pub fn manifest(&self, name: &str) -> Option<&Manifest> {
        self.table.get(name).map(|f| &f.manifest)
    }
}

#[async_trait]
impl FunctionDriver for NativeDriver {
    fn name(&self) -> &'static str {
        "go"
    }

    async fn call(
        &self,
        bundle: EntrypointBundle,
        args: FunctionArgs,
    ) -> anyhow::Result<FunctionResult> {
        let name = bundle.spec.function_name().to_string();
        let function = self
            .table
            .get(&name)
            .ok_or_else(|| anyhow::anyhow!("native function '{}' is not registered", name))?;
        // Manifest defaults sit under the caller's args.
        let mut effective = function.manifest.default_args.clone();
        effective.extend(args);
        (function.entrypoint)(bundle, effective).await
    }
}
