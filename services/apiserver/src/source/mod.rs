//! Role binding source backends.
//!
//! # Purpose
//! Selects and constructs the [`RoleBindingSource`] the enumerator reads from:
//! the Kubernetes RBAC API in clusters, or a seeded in-memory map for local
//! development and tests.
use crate::config::{ApiServerConfig, SourceBackend};
use anyhow::Context;
use grantscope_rbac::RoleBindingSource;
use std::collections::HashMap;
use std::sync::Arc;

pub mod kubernetes;
pub mod memory;

pub fn build_source(config: &ApiServerConfig) -> anyhow::Result<Arc<dyn RoleBindingSource>> {
    match config.source {
        SourceBackend::Kubernetes => {
            let source = kubernetes::KubernetesSource::new(&config.kubernetes)
                .context("build kubernetes source")?;
            Ok(Arc::new(source))
        }
        SourceBackend::Memory => {
            let bindings = match &config.memory_seed {
                Some(path) => memory::load_seed(path)?,
                None => HashMap::new(),
            };
            Ok(Arc::new(bindings))
        }
    }
}
