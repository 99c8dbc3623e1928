//! Error responses of the HTTP API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use leychile_harvester::resolver::NotFoundDiagnostic;
use leychile_harvester::HarvesterError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Harvester(#[from] HarvesterError),

    /// The article query was understood but matched nothing.
    #[error("{}", .0.message)]
    ArticleNotFound(Box<NotFoundDiagnostic>),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Internal(format!("background task failed: {e}"))
    }
}

fn harvester_status(error: &HarvesterError) -> StatusCode {
    match error {
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        HarvesterError::NormaNotFound(_) | HarvesterError::HtmlFragmentNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        HarvesterError::Download { source, .. }
            if source.status().is_some_and(|status| status.as_u16() == 404) =>
        {
            StatusCode::NOT_FOUND
        }
        HarvesterError::Download { .. } | HarvesterError::Http(_) | HarvesterError::XmlParse(_) => {
            StatusCode::BAD_GATEWAY
        }
        HarvesterError::RetriesExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
        HarvesterError::InvalidLawNumber(_)
        | HarvesterError::InvalidIdNorma(_)
        | HarvesterError::InvalidIdParte(_)
        | HarvesterError::InvalidQuery { .. } => StatusCode::BAD_REQUEST,
        HarvesterError::Io(_)
        | HarvesterError::JsonSerialization(_)
        | HarvesterError::YamlSerialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Harvester(e) => harvester_status(e),
            Self::ArticleNotFound(_) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostic: Option<&'a NotFoundDiagnostic>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "request rejected");
        }

        let diagnostic = match &self {
            Self::ArticleNotFound(diagnostic) => Some(diagnostic.as_ref()),
            _ => None,
        };
        let body = ErrorBody {
            error: self.to_string(),
            diagnostic,
        };
        (status, Json(body)).into_response()
    }
}
