//! `command`: run a shell script and capture its output.
//!
//! The script comes from the `script` arg and runs through `sh -c`. Stdout
//! is mirrored line by line to the run's log writer; the last non-empty
//! line is returned under `last_line`.

use std::collections::HashMap;
use std::io::Write as _;

use anyhow::Context;
use tokio::process::Command;

use crate::driver::native::NativeFunction;
use crate::driver::{EntrypointBundle, FunctionArgs, FunctionResult};
use crate::output::LineWriter;

use super::{Manifest, UsageDesc};

pub fn function() -> NativeFunction {
    NativeFunction {
        manifest: Manifest {
            name: "command".to_string(),
            driver: "go".to_string(),
            description: "Run a shell script".to_string(),
            usage_args: vec![UsageDesc::new("script", "The shell script to run")],
            return_values: vec![
                UsageDesc::new("status", "'ok' on success"),
                UsageDesc::new("last_line", "Last non-empty stdout line"),
            ],
            ..Default::default()
        },
        entrypoint: |bundle, args| Box::pin(entrypoint(bundle, args)),
    }
}

async fn entrypoint(
    bundle: EntrypointBundle,
    args: FunctionArgs,
) -> anyhow::Result<FunctionResult> {
    let script = args
        .get("script")
        .ok_or_else(|| anyhow::anyhow!("command requires a 'script' arg"))?;

    let output = Command::new("sh")
        .arg("-c")
        .arg(script)
        .output()
        .await
        .context("failed to run script")?;
    if !output.status.success() {
        anyhow::bail!(
            "script exited with {}: {}",
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

    Ok(HashMap::from([
        ("status".to_string(), "ok".to_string()),
        ("last_line".to_string(), last_line),
    ]))
}

#[cfg(test)]
mod tests {
    use crate::driver::native::NativeDriver;
    use crate::driver::{DriverSpec, EntrypointBundle, FunctionDriver, Resources};

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_the_last_stdout_line() {
        let bundle = EntrypointBundle {
            spec: DriverSpec::parse("go:command", 1).unwrap(),
            resources: Resources::new(std::io::sink()),
        };
        let args = maplit::hashmap! {
            "script".to_string() => "echo hello flowl && echo hello flowl2".to_string(),
        };

        let result = NativeDriver::with_stdlib().call(bundle, args).await.unwrap();
        assert_eq!(result.get("status").map(String::as_str), Some("ok"));
        assert_eq!(
            result.get("last_line").map(String::as_str),
            Some("hello flowl2")
        );
    }

    #[tokio::test]
    async fn missing_script_is_an_error() {
        let bundle = EntrypointBundle {
            spec: DriverSpec::parse("go:command", 1).unwrap(),
            resources: Resources::new(std::io::sink()),
        };
        let err = NativeDriver::with_stdlib()
            .call(bundle, Default::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("script"));
    }
}
