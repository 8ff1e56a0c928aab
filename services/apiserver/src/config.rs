use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_METRICS_BIND: &str = "127.0.0.1:9090";
pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 5000;
pub const IN_CLUSTER_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";
pub const IN_CLUSTER_CA_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceBackend {
    Kubernetes,
    Memory,
}

impl std::str::FromStr for SourceBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "kubernetes" | "k8s" => Ok(Self::Kubernetes),
            "memory" => Ok(Self::Memory),
            other => bail!("unknown binding source backend: {other}"),
        }
    }
}

// Connection settings for the Kubernetes API server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubernetesConfig {
    // Base URL, e.g. https://10.0.0.1:443.
    pub api_url: Option<String>,
    // Bearer token file, re-read on every request.
    pub token_path: Option<PathBuf>,
    // PEM bundle trusted in addition to the system roots.
    pub ca_path: Option<PathBuf>,
}

// API server configuration sourced from environment variables.
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    // Time in-flight requests get to finish after a shutdown signal.
    pub shutdown_grace: Duration,
    pub source: SourceBackend,
    // YAML or JSON list of role bindings for the memory backend.
    pub memory_seed: Option<PathBuf>,
    pub kubernetes: KubernetesConfig,
}

#[derive(Debug, Deserialize)]
struct ApiServerConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    shutdown_grace_ms: Option<u64>,
    source: Option<SourceBackend>,
    memory_seed: Option<PathBuf>,
    kubernetes: Option<KubernetesConfigOverride>,
}

#[derive(Debug, Deserialize)]
struct KubernetesConfigOverride {
    api_url: Option<String>,
    token_path: Option<PathBuf>,
    ca_path: Option<PathBuf>,
}

impl ApiServerConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("GRANTSCOPE_BIND")
            .unwrap_or_else(|_| DEFAULT_BIND.to_string())
            .parse()
            .with_context(|| "parse GRANTSCOPE_BIND")?;
        let metrics_bind = std::env::var("GRANTSCOPE_METRICS_BIND")
            .unwrap_or_else(|_| DEFAULT_METRICS_BIND.to_string())
            .parse()
            .with_context(|| "parse GRANTSCOPE_METRICS_BIND")?;
        let shutdown_grace_ms = match std::env::var("GRANTSCOPE_SHUTDOWN_GRACE_MS") {
            Ok(value) => value
                .parse::<u64>()
                .with_context(|| "parse GRANTSCOPE_SHUTDOWN_GRACE_MS")?,
            Err(_) => DEFAULT_SHUTDOWN_GRACE_MS,
        };
        let source = match std::env::var("GRANTSCOPE_SOURCE") {
            Ok(value) => value.parse().with_context(|| "parse GRANTSCOPE_SOURCE")?,
            Err(_) => SourceBackend::Kubernetes,
        };
        let memory_seed = std::env::var("GRANTSCOPE_MEMORY_SEED").ok().map(PathBuf::from);
        Ok(Self {
            bind_addr,
            metrics_bind,
            shutdown_grace: Duration::from_millis(shutdown_grace_ms),
            source,
            memory_seed,
            kubernetes: KubernetesConfig::from_env(),
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("GRANTSCOPE_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read GRANTSCOPE_CONFIG: {path}"))?;
            config.apply_yaml(&contents)?;
        }
        Ok(config)
    }

    fn apply_yaml(&mut self, contents: &str) -> Result<()> {
        let override_cfg: ApiServerConfigOverride =
            serde_yaml::from_str(contents).with_context(|| "parse apiserver config yaml")?;
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        if let Some(value) = override_cfg.shutdown_grace_ms {
            self.shutdown_grace = Duration::from_millis(value);
        }
        if let Some(value) = override_cfg.source {
            self.source = value;
        }
        if let Some(value) = override_cfg.memory_seed {
            self.memory_seed = Some(value);
        }
        if let Some(kube) = override_cfg.kubernetes {
            if let Some(value) = kube.api_url {
                self.kubernetes.api_url = Some(value);
            }
            if let Some(value) = kube.token_path {
                self.kubernetes.token_path = Some(value);
            }
            if let Some(value) = kube.ca_path {
                self.kubernetes.ca_path = Some(value);
            }
        }
        Ok(())
    }
}

impl KubernetesConfig {
    /// Explicit `GRANTSCOPE_KUBE_*` settings win; otherwise fall back to the
    /// in-cluster service account environment.
    pub fn from_env() -> Self {
        let api_url = std::env::var("GRANTSCOPE_KUBE_API_URL").ok().or_else(|| {
            let host = std::env::var("KUBERNETES_SERVICE_HOST").ok()?;
            let port =
                std::env::var("KUBERNETES_SERVICE_PORT").unwrap_or_else(|_| "443".to_string());
            Some(in_cluster_url(&host, &port))
        });
        let token_path = std::env::var("GRANTSCOPE_KUBE_TOKEN_PATH")
            .map(PathBuf::from)
            .ok()
            .or_else(|| Some(PathBuf::from(IN_CLUSTER_TOKEN_PATH)));
        let ca_path = std::env::var("GRANTSCOPE_KUBE_CA_PATH")
            .map(PathBuf::from)
            .ok()
            .or_else(|| Some(PathBuf::from(IN_CLUSTER_CA_PATH)));
        Self {
            api_url,
            token_path,
            ca_path,
        }
    }
}

fn in_cluster_url(host: &str, port: &str) -> String {
    // IPv6 service hosts must be bracketed.
    if host.contains(':') {
        format!("https://[{host}]:{port}")
    } else {
        format!("https://{host}:{port}")
    }
}
