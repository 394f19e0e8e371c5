//! RFC 9457 Problem Details shared by every REST surface of the server,
//! plus the static error-definition type used to build catalog-driven problems.

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Content type for Problem Details as per RFC 9457.
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

/// RFC 9457 Problem Details for HTTP APIs.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(
    title = "Problem",
    description = "RFC 9457 Problem Details for HTTP APIs"
)]
pub struct Problem {
    /// A URI reference that identifies the problem type.
    #[serde(rename = "type")]
    pub type_url: String,
    /// A short, human-readable summary of the problem type.
    pub title: String,
    /// The HTTP status code for this occurrence of the problem.
    pub status: u16,
    /// A human-readable explanation specific to this occurrence of the problem.
    pub detail: String,
    /// A URI reference that identifies the specific occurrence of the problem.
    pub instance: String,
    /// Machine-readable error code defined by the application.
    pub code: String,
    /// Request id useful for correlating with server logs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Problem-specific extension members (e.g. a redirect target).
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub extensions: Option<serde_json::Value>,
}

impl Problem {
    pub fn new(status: StatusCode, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            type_url: "about:blank".to_string(),
            title: title.into(),
            status: status.as_u16(),
            detail: detail.into(),
            instance: String::new(),
            code: String::new(),
            request_id: None,
            extensions: None,
        }
    }

    pub fn with_type(mut self, type_url: impl Into<String>) -> Self {
        self.type_url = type_url.into();
        self
    }

    pub fn with_instance(mut self, uri: impl Into<String>) -> Self {
        self.instance = uri.into();
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Attach one extension member, merging with any already present.
    pub fn with_extension(mut self, key: &str, value: serde_json::Value) -> Self {
        let mut map = match self.extensions.take() {
            Some(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };
        map.insert(key.to_string(), value);
        self.extensions = Some(serde_json::Value::Object(map));
        self
    }
}

/// Axum response wrapper that renders `Problem` with correct status & content type.
#[derive(Debug, Clone)]
pub struct ProblemResponse(pub Problem);

impl From<Problem> for ProblemResponse {
    fn from(p: Problem) -> Self {
        Self(p)
    }
}

impl IntoResponse for ProblemResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut resp = axum::Json(self.0).into_response();
        *resp.status_mut() = status;
        resp.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            HeaderValue::from_static(APPLICATION_PROBLEM_JSON),
        );
        resp
    }
}

/// Static error definition from a module's error catalog.
#[derive(Debug, Clone, Copy)]
pub struct ErrDef {
    pub status: u16,
    pub title: &'static str,
    pub code: &'static str,
}

impl ErrDef {
    /// Build a problem for this definition; the type URL is derived from the code.
    pub fn to_problem(&self, detail: impl Into<String>) -> Problem {
        Problem::new(
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            self.title,
            detail,
        )
        .with_type(format!("https://errors.workhub.dev/{}", self.code))
        .with_code(self.code)
    }

    /// Same as [`ErrDef::to_problem`], stamped with the request path and the
    /// id of the current tracing span.
    pub fn respond(&self, detail: impl Into<String>, instance: &str) -> ProblemResponse {
        let problem = self.to_problem(detail).with_instance(instance);
        let problem = match tracing::Span::current().id() {
            Some(id) => problem.with_request_id(id.into_u64().to_string()),
            None => problem,
        };
        ProblemResponse(problem)
    }
}

pub fn bad_request(detail: impl Into<String>) -> ProblemResponse {
    Problem::new(StatusCode::BAD_REQUEST, "Bad Request", detail).into()
}

pub fn internal_error(detail: impl Into<String>) -> ProblemResponse {
    Problem::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error",
        detail,
    )
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn problem_into_response_sets_status_and_content_type() {
        let p = Problem::new(StatusCode::GONE, "Gone", "invite expired");
        let resp = ProblemResponse(p).into_response();
        assert_eq!(resp.status(), StatusCode::GONE);
        let ct = resp
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        assert_eq!(ct, APPLICATION_PROBLEM_JSON);
    }

    #[test]
    fn err_def_builds_coded_problem() {
        let def = ErrDef {
            status: 409,
            title: "Invitation already used",
            code: "WA_INVITE_CONSUMED",
        };

        let problem = def.to_problem("token was accepted earlier");
        assert_eq!(problem.status, 409);
        assert_eq!(problem.code, "WA_INVITE_CONSUMED");
        assert_eq!(
            problem.type_url,
            "https://errors.workhub.dev/WA_INVITE_CONSUMED"
        );
        assert!(problem.extensions.is_none());
    }

    #[test]
    fn extensions_merge_and_serialize() {
        let p = bad_request("nope")
            .0
            .with_extension("workspace_id", serde_json::json!("abc"))
            .with_extension("retry", serde_json::json!(false));

        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["type"], "about:blank");
        assert_eq!(json["extensions"]["workspace_id"], "abc");
        assert_eq!(json["extensions"]["retry"], false);
        assert!(json.get("request_id").is_none());
    }

    #[test]
    fn internal_error_is_500() {
        let resp = internal_error("db down");
        assert_eq!(resp.0.status, 500);
        assert_eq!(resp.0.title, "Internal Server Error");
    }
}
