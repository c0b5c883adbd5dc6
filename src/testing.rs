//! Helpers shared by unit and integration tests.

pub mod mysql;

use std::path::{Path, PathBuf};

/// Write `yaml` to `config.yaml` inside `dir` and return its path.
pub fn write_config(dir: &Path, yaml: &str) -> std::io::Result<PathBuf> {
    let path = dir.join("config.yaml");
    std::fs::write(&path, yaml)?;
    Ok(path)
}
