//! Health endpoint.
//!
//! # Purpose
//! Exercises connectivity to the binding source with a cluster-wide
//! enumeration that carries no filters and therefore matches nothing.
use crate::api::codec::{Codec, Negotiated};
use crate::api::error::{ApiError, api_rbac_error, request_id_from_headers};
use crate::api::types::HealthStatus;
use crate::app::AppState;
use axum::extract::State;
use axum::http::HeaderMap;

#[utoipa::path(
    get,
    path = "/healthz",
    tag = "system",
    responses(
        (status = 200, description = "Binding source reachable", body = HealthStatus),
        (status = 500, description = "Binding source unreachable", body = crate::api::types::ErrorResponse)
    )
)]
/// Return `ok` if the binding source answers a listing.
///
/// # Errors
/// - Returns 500 if the source call fails.
pub(crate) async fn health(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Negotiated<HealthStatus>, ApiError> {
    let codec = Codec::from_headers(&headers);
    state
        .enumerator
        .enumerate("", &[])
        .await
        .map_err(|err| {
            api_rbac_error(codec, err).with_request_id(request_id_from_headers(&headers))
        })?;
    Ok(Negotiated::ok(
        codec,
        HealthStatus {
            status: "ok".to_string(),
        },
    ))
}
