//! Developer tooling: registry inspection for the CLI and the debug overlay.

mod inspector;

pub use inspector::{EntityInfo, SceneInspector, SceneSummary};

pub fn crate_info() -> &'static str {
    "prism-tools v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("tools"));
    }
}
