#![allow(dead_code)]

use apiserver::app::{AppState, build_router};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use grantscope_rbac::{
    RoleBinding, RoleBindingEnumerator, RoleBindingSource, SourceError, SourceResult, Subject,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub type TestApp = axum::routing::RouterIntoService<Body, ()>;

pub const NS_DEFAULT: &str = "default";

pub fn role_binding_role1_subject1() -> RoleBinding {
    RoleBinding::new(
        "role1-for-subject1",
        NS_DEFAULT,
        "role1",
        vec![Subject::new("User", "subject1")],
    )
}

pub fn role_binding_role2_subject2() -> RoleBinding {
    RoleBinding::new(
        "role2-for-subject2",
        NS_DEFAULT,
        "role2",
        vec![Subject::new("User", "subject2")],
    )
}

pub fn role_binding_role3_subject3and4() -> RoleBinding {
    RoleBinding::new(
        "role3-for-subject3and4",
        NS_DEFAULT,
        "role3",
        vec![
            Subject::new("User", "subject3"),
            Subject::new("", "subject4").with_namespace(NS_DEFAULT),
        ],
    )
}

/// Fake source that records the namespaces it was asked for.
pub struct RecordingSource {
    pub bindings: HashMap<String, Vec<RoleBinding>>,
    pub fail: bool,
    pub calls: Mutex<Vec<String>>,
}

#[async_trait]
impl RoleBindingSource for RecordingSource {
    async fn list_role_bindings(&self, namespace: &str) -> SourceResult<Vec<RoleBinding>> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(namespace.to_string());
        if self.fail {
            return Err(SourceError::Unavailable("some error".to_string()));
        }
        self.bindings.list_role_bindings(namespace).await
    }

    fn backend_name(&self) -> &'static str {
        "recording"
    }
}

impl RecordingSource {
    pub fn with(bindings: Vec<RoleBinding>) -> Arc<Self> {
        let mut map = HashMap::new();
        map.insert(NS_DEFAULT.to_string(), bindings);
        Arc::new(Self {
            bindings: map,
            fail: false,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            bindings: HashMap::new(),
            fail: true,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }
}

pub fn app_with_source(source: Arc<dyn RoleBindingSource>) -> TestApp {
    let state = AppState {
        enumerator: RoleBindingEnumerator::new(source),
    };
    build_router(state).into_service()
}

pub fn request(method: &str, uri: &str, content_type: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

pub fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    request("POST", uri, Some("application/json"), &body.to_string())
}

pub async fn read_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body")
        .to_vec()
}

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&read_bytes(response).await).expect("json")
}
