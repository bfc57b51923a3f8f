//! Parse and execute a small flowl source with the shipped drivers.

use flowl_core::driver::{DriverRegistry, Resources};
use flowl_core::Scheduler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let source = r#"
load go:print
load go:command

fn greet = print {
    args = {
        _1: hello from flowl
    }
}

run greet
run command {
    script: date
}

run {
    greet
    print
}
"#;

    let (queue, _) = flowl_core::parse(source.as_bytes())?;
    let scheduler = Scheduler::new(DriverRegistry::with_defaults(), Resources::stdout());

    for stage in scheduler.run(&queue).await? {
        for output in &stage.outputs {
            println!("stage {}: {} -> {:?}", stage.stage, output.name, output.result);
        }
    }
    Ok(())
}
