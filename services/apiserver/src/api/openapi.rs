//! OpenAPI schema aggregation for the API server.
use crate::api::types::{EnumerateRequest, ErrorResponse, HealthStatus};
use crate::api::{enumerate, system};
use axum::Json;
use grantscope_rbac::{RoleBinding, RoleRef, Subject};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "grantscope-apiserver",
        version = "v1",
        description = "Enumerate role bindings by subject name"
    ),
    paths(enumerate::enumerate_by_subject_names, system::health),
    components(schemas(
        EnumerateRequest,
        ErrorResponse,
        HealthStatus,
        RoleBinding,
        RoleRef,
        Subject
    )),
    tags(
        (name = "rbac", description = "Role binding enumeration"),
        (name = "system", description = "Health")
    )
)]
pub struct ApiDoc;

pub(crate) async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
