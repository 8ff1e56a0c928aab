use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A subject referenced by a role binding (user, group, or service account).
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct Subject {
    #[serde(default)]
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl Subject {
    pub fn new(kind: &str, name: &str) -> Self {
        Self {
            kind: kind.to_string(),
            name: name.to_string(),
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }
}

/// The role granted by a binding.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct RoleRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub name: String,
}

/// One access-control grant linking subjects to a role within a namespace.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoleBinding {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    pub role_ref: RoleRef,
}

impl RoleBinding {
    pub fn new(name: &str, namespace: &str, role: &str, subjects: Vec<Subject>) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            subjects,
            role_ref: RoleRef {
                kind: None,
                name: role.to_string(),
            },
        }
    }

    pub fn role_name(&self) -> &str {
        &self.role_ref.name
    }
}
