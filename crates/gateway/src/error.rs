use {
    axum::{
        Json,
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    thiserror::Error,
};

/// The two failure kinds the HTTP surface distinguishes.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Missing or empty required input. Answered locally with a 400; no
    /// session state is touched.
    #[error("{0}")]
    Validation(String),
    /// Any failure from the upstream AI service — network, auth, quota and
    /// malformed responses all collapse here. Never retried.
    #[error("upstream call failed: {0}")]
    Upstream(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        };
        (
            status,
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}
