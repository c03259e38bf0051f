use axum::{
    Json,
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::{Error, ErrorKind};

pub enum ApiError {
    /// A required query parameter is absent.
    MissingParameter(&'static str),
    /// The query string does not deserialize, e.g. `format=xml`.
    InvalidQuery(QueryRejection),
    Discovery(Error),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Discovery(err)
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidQuery(rejection)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingParameter(_) => StatusCode::BAD_REQUEST,
            Self::InvalidQuery(rejection) => rejection.status(),
            Self::Discovery(err) => match err.kind() {
                ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                ErrorKind::DeviceUnreachable => StatusCode::GATEWAY_TIMEOUT,
                ErrorKind::Protocol | ErrorKind::Decode => StatusCode::BAD_GATEWAY,
                ErrorKind::Forward => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::MissingParameter(name) => format!("must set {name} variable"),
            Self::InvalidQuery(rejection) => rejection.body_text(),
            Self::Discovery(err) => {
                tracing::warn!(error = %err, kind = %err.kind(), "query failed");
                err.to_string()
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
