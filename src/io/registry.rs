//! Model registry JSON files.
//!
//! A registry file is a JSON array of model specs, for example:
//!
//! ```json
//! [
//!   { "name": "Ridge (strong)", "requires_standardized_input": true,
//!     "kind": { "type": "ridge", "alpha": 10.0 } },
//!   { "name": "Small forest", "requires_standardized_input": false,
//!     "kind": { "type": "random_forest", "n_trees": 25, "max_depth": 6,
//!               "min_samples_split": 2, "min_samples_leaf": 1, "seed": 7 } }
//! ]
//! ```
//!
//! Order matters: ties in held-out R² go to the earlier entry.

use std::fs::File;
use std::path::Path;

use crate::domain::ModelSpec;
use crate::error::AppError;

pub fn read_registry_json(path: &Path) -> Result<Vec<ModelSpec>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open registry JSON '{}': {e}", path.display())))?;
    let registry: Vec<ModelSpec> =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid registry JSON: {e}")))?;
    if registry.is_empty() {
        return Err(AppError::new(2, format!("Registry '{}' has no models.", path.display())));
    }
    Ok(registry)
}

pub fn write_registry_json(path: &Path, registry: &[ModelSpec]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create registry JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, registry)
        .map_err(|e| AppError::new(2, format!("Failed to write registry JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ModelKind, default_registry};

    #[test]
    fn default_registry_survives_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        let registry = default_registry(11);
        write_registry_json(&path, &registry).unwrap();
        assert_eq!(read_registry_json(&path).unwrap(), registry);
    }

    #[test]
    fn hand_written_entry_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(
            &path,
            r#"[{"name":"R","requires_standardized_input":true,"kind":{"type":"ridge","alpha":10.0}}]"#,
        )
        .unwrap();
        let registry = read_registry_json(&path).unwrap();
        assert_eq!(registry[0].kind, ModelKind::Ridge { alpha: 10.0 });
    }

    #[test]
    fn empty_or_malformed_is_exit_2() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(&path, "[]").unwrap();
        assert_eq!(read_registry_json(&path).unwrap_err().exit_code(), 2);
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(read_registry_json(&path).unwrap_err().exit_code(), 2);
    }
}
