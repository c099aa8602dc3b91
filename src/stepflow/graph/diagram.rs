// SPDX-License-Identifier: MIT

use std::path::Path;

use super::compiled::CompiledGraph;

/// Write the Mermaid rendering of `graph` to `path`.
///
/// Failures are logged and swallowed; returns whether the file was written.
pub fn write_diagram(path: impl AsRef<Path>, graph: &CompiledGraph) -> bool {
    let path = path.as_ref();
    match std::fs::write(path, graph.to_mermaid()) {
        Ok(()) => {
            log::info!("Wrote diagram of '{}' to {}", graph.name(), path.display());
            true
        }
        Err(e) => {
            log::warn!("Could not write diagram to {}: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stepflow::graph::{step_fn, ErrorPolicy, GraphBuilder, StepResult, END};
    use crate::stepflow::state::StateUpdate;

    fn graph() -> CompiledGraph {
        let mut builder = GraphBuilder::new("one");
        builder
            .add_step(
                "only",
                step_fn(ErrorPolicy::Propagate, |_state| async {
                    Ok(StepResult::update(StateUpdate::new()))
                }),
            )
            .add_edge("only", END)
            .set_entry_point("only");
        builder.compile().unwrap()
    }

    #[test]
    fn test_write_diagram() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.mmd");
        assert!(write_diagram(&path, &graph()));
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("only --> __end__"));
    }

    #[test]
    fn test_write_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("one.mmd");
        assert!(!write_diagram(&path, &graph()));
    }
}
