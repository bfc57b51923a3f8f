//! The function-driver seam.
//!
//! The parser core never executes anything; it records, per loaded
//! function, which driver owns it and where it lives ([`DriverSpec`]).
//! The scheduler resolves each run-queue node's spec against a
//! [`DriverRegistry`] and invokes the [`FunctionDriver`] with the node's
//! effective args.

pub mod cmd;
pub mod native;

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::parser::ParseError;

/// String→string argument map handed to a function.
pub type FunctionArgs = HashMap<String, String>;

/// String→string result map returned by a function.
pub type FunctionResult = HashMap<String, String>;

/* ===================== Driver specification ===================== */

/// A parsed `<driver>:<path>` load target.
///
/// The core does not interpret the path beyond extracting the canonical
/// function name; driver names are opaque until schedule time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverSpec {
    driver: String,
    path: String,
}

impl DriverSpec {
    pub(crate) fn parse(target: &str, line: usize) -> Result<Self, ParseError> {
        let (driver, path) = target.split_once(':').ok_or_else(|| {
            ParseError::resolution(
                line,
                format!("load target '{}' is missing a driver prefix", target),
            )
        })?;
        Ok(Self {
            driver: driver.to_string(),
            path: path.to_string(),
        })
    }

    pub fn driver_name(&self) -> &str {
        &self.driver
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Canonical function name: the last path component.
    pub fn function_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/* ===================== Resources ===================== */

/// Services shared by every function of one run. The only resource carried
/// is the log writer; functions write their human-readable output there.
#[derive(Clone)]
pub struct Resources {
    log_writer: Arc<Mutex<dyn Write + Send>>,
}

impl Resources {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            log_writer: Arc::new(Mutex::new(writer)),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// A writer handle that forwards into the shared log writer.
    pub fn writer(&self) -> LogWriter {
        LogWriter {
            inner: Arc::clone(&self.log_writer),
        }
    }

    /// Write one line to the shared log writer.
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        writeln!(self.writer(), "{}", line)
    }
}

/// `io::Write` handle over the shared log writer.
pub struct LogWriter {
    inner: Arc<Mutex<dyn Write + Send>>,
}

impl LogWriter {
    fn lock(&self) -> io::Result<std::sync::MutexGuard<'_, dyn Write + Send + 'static>> {
        self.inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer poisoned"))
    }
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock()?.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock()?.flush()
    }
}

/* ===================== Driver trait ===================== */

/// What a driver receives alongside the call args.
#[derive(Clone)]
pub struct EntrypointBundle {
    pub spec: DriverSpec,
    pub resources: Resources,
}

/// Executes one named function on behalf of the scheduler.
#[async_trait]
pub trait FunctionDriver: Send + Sync {
    /// Driver name as written in load directives (e.g. "cmd").
    fn name(&self) -> &'static str;

    /// Invoke the function the bundle's spec points at.
    async fn call(
        &self,
        bundle: EntrypointBundle,
        args: FunctionArgs,
    ) -> anyhow::Result<FunctionResult>;
}

/* ===================== Registry ===================== */

/// Maps driver names to implementations.
#[derive(Clone, Default)]
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn FunctionDriver>>,
}

impl DriverRegistry {
    /// An empty registry; register drivers explicitly.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The shipped registry: `cmd` and the in-process `go` driver with the
    /// standard library installed.
    pub fn with_defaults() -> Self {
        let mut registry = Self::default();
        registry.register(Arc::new(cmd::CmdDriver));
        registry.register(Arc::new(native::NativeDriver::with_stdlib()));
        registry
    }

    pub fn register(&mut self, driver: Arc<dyn FunctionDriver>) {
        self.drivers.insert(driver.name().to_string(), driver);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn FunctionDriver>> {
        self.drivers.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_name_is_the_last_path_component() {
        let spec = DriverSpec::parse("cmd:/tmp/function3", 1).unwrap();
        assert_eq!(spec.driver_name(), "cmd");
        assert_eq!(spec.path(), "/tmp/function3");
        assert_eq!(spec.function_name(), "function3");

        let spec = DriverSpec::parse("go:function1", 1).unwrap();
        assert_eq!(spec.function_name(), "function1");

        let spec = DriverSpec::parse("cmd:url/function2", 1).unwrap();
        assert_eq!(spec.function_name(), "function2");
    }

    #[test]
    fn default_registry_knows_go_and_cmd() {
        let registry = DriverRegistry::with_defaults();
        assert!(registry.get("go").is_some());
        assert!(registry.get("cmd").is_some());
        assert!(registry.get("java").is_none());
    }
}
