use api_problem::{ErrDef, ProblemResponse};
use axum::http::{Method, Uri};

pub const ROUTE_NOT_FOUND: ErrDef = ErrDef {
    status: 404,
    title: "Not Found",
    code: "ROUTE_NOT_FOUND",
};

/// Router fallback: unknown paths answer with a Problem body instead of an empty 404.
pub async fn route_not_found(method: Method, uri: Uri) -> ProblemResponse {
    tracing::debug!(%method, path = %uri.path(), "No route matched");
    ROUTE_NOT_FOUND.respond(
        format!("No route for {method} {}", uri.path()),
        uri.path(),
    )
}
