//! Seed loading for the in-memory binding source.
//!
//! The seed file is a YAML (or JSON) list of role bindings in the same shape
//! the API returns. Bindings are grouped by their `namespace` field.
use anyhow::Context;
use grantscope_rbac::RoleBinding;
use std::collections::HashMap;
use std::path::Path;

pub fn load_seed(path: &Path) -> anyhow::Result<HashMap<String, Vec<RoleBinding>>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("read memory seed: {}", path.display()))?;
    let bindings: Vec<RoleBinding> = serde_yaml::from_str(&contents)
        .with_context(|| format!("parse memory seed: {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        bindings = bindings.len(),
        "loaded role binding seed"
    );
    Ok(group_by_namespace(bindings))
}

/// Group bindings by namespace, keeping their relative order.
pub fn group_by_namespace(bindings: Vec<RoleBinding>) -> HashMap<String, Vec<RoleBinding>> {
    let mut grouped: HashMap<String, Vec<RoleBinding>> = HashMap::new();
    for binding in bindings {
        grouped
            .entry(binding.namespace.clone())
            .or_default()
            .push(binding);
    }
    grouped
}
