//! Shell-exec driver: runs the load path as an external program.
//!
//! Args are exported to the child as `FLOWL_ARG_<KEY>` environment
//! variables. Stdout is mirrored to the run's log writer line by line; the
//! last non-empty line becomes the `outcome` result value.

use std::io::Write as _;

use anyhow::Context;
use async_trait::async_trait;
use tokio::process::Command;

use crate::output::LineWriter;

use super::{EntrypointBundle, FunctionArgs, FunctionDriver, FunctionResult};

pub struct CmdDriver;

#[async_trait]
impl FunctionDriver for CmdDriver {
    fn name(&self) -> &'static str {
        "cmd"
    }

    async fn call(
        &self,
        bundle: EntrypointBundle,
        args: FunctionArgs,
    ) -> anyhow::Result<FunctionResult> {
        let path = bundle.spec.path().to_string();
        let mut command = Command::new(&path);
        for (key, value) in &args {
            command.env(format!("FLOWL_ARG_{}", key.to_uppercase()), value);
        }
        let output = command
            .output()
            .await
            .with_context(|| format!("failed to execute '{}'", path))?;
        if !output.status.success() {
            anyhow::bail!(
                "'{}' exited with {}: {}",
                path,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let mut last_line = String::new();
        {
            let mut writer = LineWriter::new(Some(bundle.resources.writer()), |line: &[u8]| {
                let text = String::from_utf8_lossy(line);
                let trimmed = text.trim_end();
                if !trimmed.is_empty() {
                    last_line = trimmed.to_string();
                }
            });
            writer.write_all(&output.stdout)?;
            writer.close();
        }

        Ok(FunctionResult::from([("outcome".to_string(), last_line)]))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::driver::{DriverSpec, EntrypointBundle, FunctionDriver, Resources};

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
    async fn runs_an_executable_and_captures_the_last_line() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("function3");
        std::fs::write(&script, "#!/bin/sh\necho one\necho two $FLOWL_ARG_K\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let buf = SharedBuf::default();
        let bundle = EntrypointBundle {
            spec: DriverSpec::parse(&format!("cmd:{}", script.display()), 1).unwrap(),
            resources: Resources::new(buf.clone()),
        };
        let args = maplit::hashmap! { "k".to_string() => "v3".to_string() };

        let result = super::CmdDriver.call(bundle, args).await.unwrap();
        assert_eq!(result.get("outcome").map(String::as_str), Some("two v3"));

        let log = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert_eq!(log, "one\ntwo v3\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_is_an_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("failing");
        std::fs::write(&script, "#!/bin/sh\necho boom >&2\nexit 3\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let bundle = EntrypointBundle {
            spec: DriverSpec::parse(&format!("cmd:{}", script.display()), 1).unwrap(),
            resources: Resources::new(std::io::sink()),
        };

        let err = super::CmdDriver
            .call(bundle, Default::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
