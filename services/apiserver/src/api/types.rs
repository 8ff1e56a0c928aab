//! HTTP API request/response types.
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Body of `POST /v1/rbac/enumerateBySubjectNames`.
///
/// Missing and `null` fields decode as empty so they are reported by
/// validation rather than as a parse failure.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct EnumerateRequest {
    #[serde(default, deserialize_with = "null_as_default")]
    pub namespace: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subject_names: Vec<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_fields_decode_as_empty() {
        let json: EnumerateRequest =
            serde_json::from_str(r#"{"namespace":null,"subjectNames":null}"#).expect("json");
        assert!(json.namespace.is_empty());
        assert!(json.subject_names.is_empty());

        let yaml: EnumerateRequest =
            serde_yaml::from_str("namespace: ~\nsubjectNames:\n").expect("yaml");
        assert!(yaml.namespace.is_empty());
        assert!(yaml.subject_names.is_empty());
    }

    #[test]
    fn wrong_field_types_still_fail() {
        assert!(serde_json::from_str::<EnumerateRequest>(r#"{"namespace":3}"#).is_err());
        assert!(
            serde_json::from_str::<EnumerateRequest>(r#"{"subjectNames":"subject1"}"#).is_err()
        );
    }
}
