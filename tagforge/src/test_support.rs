//! Test-only helpers for building transforms and on-disk fixtures.

use std::fs;
use std::path::{Path, PathBuf};

use crate::core::state::IterationState;
use crate::engine::Engine;
use crate::strategy::IterationStrategy;
use crate::transform::{StepResult, TransformSet};

/// Step body that substitutes the presented element unchanged.
pub fn echo(element: &str, _state: &mut IterationState) -> StepResult {
    Ok(element.to_string())
}

/// Register one list-strategy echo transform per `(name, values)` pair.
pub fn list_transforms(pairs: &[(&str, &[&str])]) -> TransformSet {
    let mut set = TransformSet::new();
    for (name, values) in pairs {
        set.register_iterative(name, IterationStrategy::list([values.iter().copied()]), echo)
            .expect("register list transform");
    }
    set
}

/// Drain `engine`, returning every payload body.
pub fn collect_bodies(engine: Engine) -> Vec<String> {
    engine
        .map(|payload| payload.expect("payload").body)
        .collect()
}

/// Write `contents` to `dir/name`, creating parent directories.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create fixture directory");
    }
    fs::write(&path, contents).expect("write fixture");
    path
}

/// Generator config exercising every strategy that needs no extra files.
pub const SAMPLE_CONFIG: &str = r#"
seed = 1

[iterative.method]
strategy = "list"
values = ["GET", "POST"]

[iterative.id]
strategy = "range"
start = 1
end = 3

[persistent.shout]
ops = ["upper"]
"#;
