//! Role binding enumeration endpoint.
//!
//! # Purpose
//! Turns an untrusted `{namespace, subjectNames}` request into subject
//! filters, enumerates matching bindings, and returns them sorted by role
//! name in the request's codec.
//!
//! # Key invariants
//! - Validation order is parse, namespace, criteria, filter compilation,
//!   retrieval; the first failure ends the request.
//! - There is no partial success: either the full sorted list or an error.
use crate::api::codec::{Codec, Negotiated};
use crate::api::error::{
    ApiError, api_malformed_request, api_rbac_error, api_validation_error, request_id_from_headers,
};
use crate::api::types::EnumerateRequest;
use crate::app::AppState;
use crate::observability::{ENUMERATE_MATCHED_BINDINGS, ENUMERATE_REQUESTS_TOTAL};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use grantscope_rbac::{RoleBinding, compile_filters, sort_by_role_name};

#[utoipa::path(
    post,
    path = "/v1/rbac/enumerateBySubjectNames",
    tag = "rbac",
    request_body = EnumerateRequest,
    responses(
        (status = 200, description = "Matching role bindings sorted by role name", body = [RoleBinding]),
        (status = 400, description = "Malformed request, missing fields, or invalid criterion", body = crate::api::types::ErrorResponse),
        (status = 500, description = "Role bindings could not be retrieved", body = crate::api::types::ErrorResponse)
    )
)]
/// Enumerate role bindings whose subjects match any of the given names or
/// patterns.
///
/// # Errors
/// - 400 for an undecodable body, a missing namespace or subject list, or a
///   criterion that does not compile.
/// - 500 if the binding source fails.
pub(crate) async fn enumerate_by_subject_names(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Negotiated<Vec<RoleBinding>>, ApiError> {
    let codec = Codec::from_headers(&headers);
    let result = enumerate(&state, codec, &body)
        .await
        .map_err(|err| err.with_request_id(request_id_from_headers(&headers)));
    let outcome = match &result {
        Ok(_) => "ok".to_string(),
        Err(err) => err.body.code.clone(),
    };
    metrics::counter!(ENUMERATE_REQUESTS_TOTAL, "outcome" => outcome).increment(1);
    result
}

async fn enumerate(
    state: &AppState,
    codec: Codec,
    body: &[u8],
) -> Result<Negotiated<Vec<RoleBinding>>, ApiError> {
    // Step 1: decode in the declared format.
    let request: EnumerateRequest = codec.decode(body).map_err(|err| {
        tracing::debug!(error = %err, "could not parse enumerate request");
        api_malformed_request(codec)
    })?;

    // Steps 2-3: required fields.
    if request.namespace.is_empty() {
        return Err(api_validation_error(codec, "missing namespace in request"));
    }
    if request.subject_names.is_empty() {
        return Err(api_validation_error(
            codec,
            "missing subject names in request",
        ));
    }

    // Step 4: classify and compile criteria.
    let filters =
        compile_filters(&request.subject_names).map_err(|err| api_rbac_error(codec, err))?;

    // Step 5: retrieve and filter.
    let mut bindings = state
        .enumerator
        .enumerate(&request.namespace, &filters)
        .await
        .map_err(|err| api_rbac_error(codec, err))?;

    // Step 6: deterministic order for clients.
    sort_by_role_name(&mut bindings);
    metrics::histogram!(ENUMERATE_MATCHED_BINDINGS).record(bindings.len() as f64);

    Ok(Negotiated::ok(codec, bindings))
}
