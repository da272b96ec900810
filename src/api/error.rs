use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Every way a proxy call can fail. All variants funnel through the same
/// `IntoResponse` impl, so the caller always gets `{ "error": message }`
/// and the details stay in the server logs.
#[derive(Debug)]
pub enum ApiError {
    MethodNotAllowed,
    MissingCredential,
    InvalidAction,
    MalformedPayload { action: &'static str, detail: String },
    /// Gemini responded with a non-2xx status. The raw body is logged at the
    /// call site, never relayed.
    Downstream(StatusCode),
    EmptyCandidate,
    BadCandidateJson(serde_json::Error),
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::InvalidAction | ApiError::MalformedPayload { .. } => StatusCode::BAD_REQUEST,
            ApiError::MissingCredential
            | ApiError::Downstream(_)
            | ApiError::EmptyCandidate
            | ApiError::BadCandidateJson(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::MethodNotAllowed => write!(f, "method not allowed"),
            ApiError::MissingCredential => write!(f, "GEMINI_API_KEY is not set"),
            ApiError::InvalidAction => write!(f, "invalid action"),
            ApiError::MalformedPayload { action, detail } => {
                write!(f, "malformed payload for action {action}: {detail}")
            }
            ApiError::Downstream(status) => {
                write!(f, "Gemini API responded with status: {}", status.as_u16())
            }
            ApiError::EmptyCandidate => write!(f, "invalid or empty response from Gemini"),
            ApiError::BadCandidateJson(e) => write!(f, "Gemini returned malformed JSON: {e}"),
            ApiError::Internal(e) => write!(f, "{e}"),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Internal(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("proxy request failed: {self}");
        } else {
            tracing::warn!("proxy request rejected: {self}");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
