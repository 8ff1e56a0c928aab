//! Binding-source capability.
//!
//! # Purpose
//! Abstracts the cluster access-control store behind a single namespace-scoped
//! list operation so the enumerator can run against Kubernetes in production
//! and against an in-memory map in tests and local development.
//!
//! # Key invariants
//! - An empty namespace means "all namespaces" (cluster-wide list).
//! - Sources do not retry; a failed call surfaces as a [`SourceError`].
use crate::types::RoleBinding;
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    Unavailable(String),
    #[error("source rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type SourceResult<T> = Result<T, SourceError>;

#[async_trait]
pub trait RoleBindingSource: Send + Sync {
    async fn list_role_bindings(&self, namespace: &str) -> SourceResult<Vec<RoleBinding>>;
    fn backend_name(&self) -> &'static str;
}

/// Bindings grouped by namespace. Unknown namespaces list as empty.
#[async_trait]
impl RoleBindingSource for HashMap<String, Vec<RoleBinding>> {
    async fn list_role_bindings(&self, namespace: &str) -> SourceResult<Vec<RoleBinding>> {
        if namespace.is_empty() {
            let mut namespaces: Vec<&String> = self.keys().collect();
            namespaces.sort();
            return Ok(namespaces
                .into_iter()
                .flat_map(|ns| self[ns].iter().cloned())
                .collect());
        }
        Ok(self.get(namespace).cloned().unwrap_or_default())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Subject;

    fn seeded() -> HashMap<String, Vec<RoleBinding>> {
        let mut map = HashMap::new();
        map.insert(
            "default".to_string(),
            vec![RoleBinding::new(
                "a",
                "default",
                "viewer",
                vec![Subject::new("User", "alice")],
            )],
        );
        map.insert(
            "payments".to_string(),
            vec![RoleBinding::new(
                "b",
                "payments",
                "editor",
                vec![Subject::new("User", "bob")],
            )],
        );
        map
    }

    #[tokio::test]
    async fn map_source_lists_single_namespace() {
        let source = seeded();
        let items = source.list_role_bindings("payments").await.expect("list");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "b");
    }

    #[tokio::test]
    async fn map_source_unknown_namespace_is_empty() {
        let source = seeded();
        let items = source.list_role_bindings("missing").await.expect("list");
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn map_source_empty_namespace_lists_everything_in_namespace_order() {
        let source = seeded();
        let items = source.list_role_bindings("").await.expect("list");
        let names: Vec<&str> = items.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(source.backend_name(), "memory");
    }
}
