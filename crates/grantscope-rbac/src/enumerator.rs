//! Retrieval-then-filter enumeration of role bindings.
//!
//! # Purpose
//! Lists a namespace's role bindings from a [`RoleBindingSource`] and keeps
//! those matched by at least one [`SubjectFilter`].
//!
//! # Key invariants
//! - Exactly one source call per enumeration; errors are never retried.
//! - Output is a subset of the source result in source order, with each
//!   binding retained at most once.
//! - An empty filter set yields an empty result (no implicit "match all").
use crate::errors::RbacResult;
use crate::filter::SubjectFilter;
use crate::source::RoleBindingSource;
use crate::types::RoleBinding;
use std::sync::Arc;

#[derive(Clone)]
pub struct RoleBindingEnumerator {
    source: Arc<dyn RoleBindingSource>,
}

impl RoleBindingEnumerator {
    pub fn new(source: Arc<dyn RoleBindingSource>) -> Self {
        Self { source }
    }

    pub fn backend_name(&self) -> &'static str {
        self.source.backend_name()
    }

    /// Return the bindings in `namespace` matched by any of `filters`.
    ///
    /// # Errors
    /// - `RbacError::RetrievalFailed` wrapping the source error.
    pub async fn enumerate(
        &self,
        namespace: &str,
        filters: &[SubjectFilter],
    ) -> RbacResult<Vec<RoleBinding>> {
        let bindings = self.source.list_role_bindings(namespace).await?;
        let listed = bindings.len();
        let matched: Vec<RoleBinding> = bindings
            .into_iter()
            .filter(|binding| filters.iter().any(|filter| filter.matches(binding)))
            .collect();
        tracing::debug!(
            namespace,
            filters = filters.len(),
            listed,
            matched = matched.len(),
            backend = self.source.backend_name(),
            "enumerated role bindings"
        );
        Ok(matched)
    }
}

impl std::fmt::Debug for RoleBindingEnumerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleBindingEnumerator")
            .field("backend", &self.source.backend_name())
            .finish()
    }
}

/// Stable ascending sort by role name (byte-wise); ties keep their order.
pub fn sort_by_role_name(bindings: &mut [RoleBinding]) {
    bindings.sort_by(|a, b| a.role_ref.name.cmp(&b.role_ref.name));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RbacError;
    use crate::filter::compile_filters;
    use crate::source::{SourceError, SourceResult};
    use crate::types::Subject;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingSource;

    #[async_trait]
    impl RoleBindingSource for FailingSource {
        async fn list_role_bindings(&self, _namespace: &str) -> SourceResult<Vec<RoleBinding>> {
            Err(SourceError::Unavailable("something went wrong".to_string()))
        }

        fn backend_name(&self) -> &'static str {
            "failing"
        }
    }

    struct CountingSource {
        calls: AtomicUsize,
        bindings: Vec<RoleBinding>,
    }

    #[async_trait]
    impl RoleBindingSource for CountingSource {
        async fn list_role_bindings(&self, _namespace: &str) -> SourceResult<Vec<RoleBinding>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.bindings.clone())
        }

        fn backend_name(&self) -> &'static str {
            "counting"
        }
    }

    fn fixtures() -> Vec<RoleBinding> {
        vec![
            RoleBinding::new(
                "role3-for-subject3and4",
                "default",
                "role3",
                vec![
                    Subject::new("User", "subject3"),
                    Subject::new("", "subject4").with_namespace("default"),
                ],
            ),
            RoleBinding::new(
                "role1-for-subject1",
                "default",
                "role1",
                vec![Subject::new("User", "subject1")],
            ),
            RoleBinding::new(
                "role2-for-subject2",
                "default",
                "role2",
                vec![Subject::new("User", "subject2")],
            ),
        ]
    }

    fn enumerator_with(bindings: Vec<RoleBinding>) -> RoleBindingEnumerator {
        let mut map = HashMap::new();
        map.insert("default".to_string(), bindings);
        RoleBindingEnumerator::new(Arc::new(map))
    }

    fn criteria(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[tokio::test]
    async fn filter_by_exact_and_pattern_keeps_source_order() {
        let enumerator = enumerator_with(fixtures());
        let filters =
            compile_filters(&criteria(&["subject1", "subject2", "subject[3,4]"])).expect("filters");
        let got = enumerator.enumerate("default", &filters).await.expect("enumerate");
        let roles: Vec<&str> = got.iter().map(RoleBinding::role_name).collect();
        assert_eq!(roles, vec!["role3", "role1", "role2"]);
    }

    #[tokio::test]
    async fn binding_matched_by_several_filters_is_returned_once() {
        let enumerator = enumerator_with(fixtures());
        let filters = compile_filters(&criteria(&["subject3", "subject4", "subject[3,4]"]))
            .expect("filters");
        let got = enumerator.enumerate("default", &filters).await.expect("enumerate");
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].name, "role3-for-subject3and4");
    }

    #[tokio::test]
    async fn empty_filter_set_yields_nothing() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            bindings: fixtures(),
        });
        let enumerator = RoleBindingEnumerator::new(source.clone());
        let got = enumerator.enumerate("default", &[]).await.expect("enumerate");
        assert!(got.is_empty());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unmatched_filters_yield_nothing() {
        let enumerator = enumerator_with(fixtures());
        let filters = compile_filters(&criteria(&["nobody", "^ghost"])).expect("filters");
        let got = enumerator.enumerate("default", &filters).await.expect("enumerate");
        assert!(got.is_empty());
    }

    #[tokio::test]
    async fn source_error_is_retrieval_failed() {
        let enumerator = RoleBindingEnumerator::new(Arc::new(FailingSource));
        let filters = compile_filters(&criteria(&["does-not-matter"])).expect("filters");
        let err = enumerator
            .enumerate("default", &filters)
            .await
            .expect_err("should fail");
        assert!(matches!(
            err,
            RbacError::RetrievalFailed(SourceError::Unavailable(_))
        ));
    }

    #[test]
    fn sort_by_role_name_is_stable() {
        let mut bindings = vec![
            RoleBinding::new("b-first", "default", "b", vec![]),
            RoleBinding::new("a", "default", "a", vec![]),
            RoleBinding::new("b-second", "default", "b", vec![]),
            RoleBinding::new("upper", "default", "B", vec![]),
        ];
        sort_by_role_name(&mut bindings);
        let names: Vec<&str> = bindings.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["upper", "a", "b-first", "b-second"]);
    }

    #[test]
    fn debug_shows_backend_only() {
        let enumerator = enumerator_with(vec![]);
        assert_eq!(
            format!("{enumerator:?}"),
            "RoleBindingEnumerator { backend: \"memory\" }"
        );
    }
}
