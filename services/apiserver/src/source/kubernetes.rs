//! Kubernetes RBAC API binding source.
//!
//! # Purpose
//! Lists `rbac.authorization.k8s.io/v1` RoleBindings for a namespace (or the
//! whole cluster when the namespace is empty) and maps them into the flat
//! binding model.
//!
//! # Key invariants
//! - One HTTP request per listing; no retries and no client-side timeout.
//! - The namespace is always appended as a single escaped path segment.
//! - The service-account token is re-read on every call because projected
//!   tokens rotate underneath a running pod.
//!
//! # Security considerations
//! - The bearer token is never logged.
//! - Upstream error bodies are carried in `SourceError` for server-side logs
//!   only; the API layer does not expose them.
use crate::config::KubernetesConfig;
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use grantscope_rbac::{RoleBinding, RoleBindingSource, RoleRef, SourceError, SourceResult, Subject};
use reqwest::Url;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::PathBuf;

const RBAC_API_PATH: [&str; 3] = ["apis", "rbac.authorization.k8s.io", "v1"];
const MAX_ERROR_MESSAGE_LEN: usize = 512;

#[derive(Debug, Clone)]
pub struct KubernetesSource {
    client: reqwest::Client,
    api_url: Url,
    token_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RoleBindingList {
    #[serde(default)]
    items: Vec<KubeRoleBinding>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KubeRoleBinding {
    metadata: ObjectMeta,
    #[serde(default)]
    subjects: Option<Vec<Subject>>,
    role_ref: RoleRef,
}

#[derive(Debug, Deserialize)]
struct ObjectMeta {
    #[serde(default)]
    name: String,
    #[serde(default)]
    namespace: String,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    message: String,
}

impl From<KubeRoleBinding> for RoleBinding {
    fn from(item: KubeRoleBinding) -> Self {
        RoleBinding {
            name: item.metadata.name,
            namespace: item.metadata.namespace,
            subjects: item.subjects.unwrap_or_default(),
            role_ref: item.role_ref,
        }
    }
}

impl KubernetesSource {
    pub fn new(config: &KubernetesConfig) -> anyhow::Result<Self> {
        let api_url = config.api_url.as_deref().context(
            "kubernetes api url missing; set GRANTSCOPE_KUBE_API_URL or run in-cluster",
        )?;
        let api_url = Url::parse(api_url).with_context(|| format!("parse api url: {api_url}"))?;
        if api_url.cannot_be_a_base() {
            return Err(anyhow!("api url cannot be a base: {api_url}"));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(ca_path) = &config.ca_path {
            match std::fs::read(ca_path) {
                Ok(pem) => {
                    let cert = reqwest::Certificate::from_pem(&pem)
                        .with_context(|| format!("parse cluster ca: {}", ca_path.display()))?;
                    builder = builder.add_root_certificate(cert);
                }
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    tracing::debug!(path = %ca_path.display(), "cluster ca not found; using system roots");
                }
                Err(err) => {
                    return Err(anyhow::Error::new(err)
                        .context(format!("read cluster ca: {}", ca_path.display())));
                }
            }
        }
        let client = builder.build().context("build kubernetes http client")?;

        Ok(Self {
            client,
            api_url,
            token_path: config.token_path.clone(),
        })
    }

    fn list_url(&self, namespace: &str) -> SourceResult<Url> {
        let mut url = self.api_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| SourceError::Unexpected(anyhow!("api url cannot be a base")))?;
            segments.pop_if_empty().extend(RBAC_API_PATH);
            if !namespace.is_empty() {
                segments.extend(["namespaces", namespace]);
            }
            segments.push("rolebindings");
        }
        Ok(url)
    }

    async fn bearer_token(&self) -> SourceResult<Option<String>> {
        let Some(path) = &self.token_path else {
            return Ok(None);
        };
        match tokio::fs::read_to_string(path).await {
            Ok(token) => {
                let token = token.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(SourceError::Unavailable(format!(
                "read service account token {}: {err}",
                path.display()
            ))),
        }
    }
}

#[async_trait]
impl RoleBindingSource for KubernetesSource {
    async fn list_role_bindings(&self, namespace: &str) -> SourceResult<Vec<RoleBinding>> {
        let url = self.list_url(namespace)?;
        let mut request = self.client.get(url).header(ACCEPT, "application/json");
        if let Some(token) = self.bearer_token().await? {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|err| SourceError::Unavailable(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Rejected {
                status: status.as_u16(),
                message: status_message(&body),
            });
        }

        let list: RoleBindingList = response
            .json()
            .await
            .map_err(|err| SourceError::Unexpected(anyhow!(err).context("decode role binding list")))?;
        Ok(list.items.into_iter().map(RoleBinding::from).collect())
    }

    fn backend_name(&self) -> &'static str {
        "kubernetes"
    }
}

// Prefer the `message` of a Kubernetes `Status` body; fall back to raw text.
fn status_message(body: &str) -> String {
    let message = match serde_json::from_str::<Status>(body) {
        Ok(status) if !status.message.is_empty() => status.message,
        _ => body.trim().to_string(),
    };
    message.chars().take(MAX_ERROR_MESSAGE_LEN).collect()
}
