//! `print`: write args to the run's log writer.
//!
//! Keys prefixed with `_` print their value only; all other entries print
//! as `key: value`. Lines are emitted in sorted order.

use std::collections::HashMap;

use crate::driver::native::NativeFunction;
use crate::driver::{EntrypointBundle, FunctionArgs, FunctionResult};

use super::{Manifest, UsageDesc};

pub fn function() -> NativeFunction {
    NativeFunction {
        manifest: Manifest {
            name: "print".to_string(),
            driver: "go".to_string(),
            description: "Output string to stdout".to_string(),
            usage_args: vec![UsageDesc::new(
                "_<anything>",
                "Underscore-prefixed args print their value only",
            )],
            return_values: vec![UsageDesc::new("status", "'ok' on success")],
            ..Default::default()
        },
        entrypoint: |bundle, args| Box::pin(entrypoint(bundle, args)),
    }
}

async fn entrypoint(
    bundle: EntrypointBundle,
    args: FunctionArgs,
) -> anyhow::Result<FunctionResult> {
    let mut lines: Vec<String> = args
        .iter()
        .map(|(k, v)| {
            if k.starts_with('_') {
                v.clone()
            } else {
                format!("{}: {}", k, v)
            }
        })
        .collect();
    lines.sort();
    for line in &lines {
        bundle.resources.write_line(line)?;
    }
    Ok(HashMap::from([("status".to_string(), "ok".to_string())]))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::driver::native::NativeDriver;
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

    #[tokio::test]
    async fn prints_sorted_lines_and_bare_values() {
        let buf = SharedBuf::default();
        let bundle = EntrypointBundle {
            spec: DriverSpec::parse("go:print", 1).unwrap(),
            resources: Resources::new(buf.clone()),
        };
        let args = maplit::hashmap! {
            "b".to_string() => "2".to_string(),
            "a".to_string() => "1".to_string(),
            "_raw".to_string() => "just this".to_string(),
        };

        let result = NativeDriver::with_stdlib().call(bundle, args).await.unwrap();
        assert_eq!(result.get("status").map(String::as_str), Some("ok"));

        let log = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert_eq!(log, "a: 1\nb: 2\njust this\n");
    }

    #[tokio::test]
    async fn unknown_native_function_is_an_error() {
        let bundle = EntrypointBundle {
            spec: DriverSpec::parse("go:nosuch", 1).unwrap(),
            resources: Resources::new(std::io::sink()),
        };
        let err = NativeDriver::with_stdlib()
            .call(bundle, Default::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nosuch"));
    }
}
