use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use imgroll_catalog::CatalogError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("image {0} not found, try again")]
    ImageMissing(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// The HTTP status this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Catalog(err) if err.is_not_found_class() => StatusCode::NOT_FOUND,
            Self::ImageMissing(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, self.to_string()).into_response()
    }
}

pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(
            ServerError::Catalog(CatalogError::NoImages).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServerError::ImageMissing("a.jpg".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServerError::Catalog(CatalogError::Cancelled).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServerError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn catalog_errors_keep_their_message() {
        let err = ServerError::from(CatalogError::NoImages);
        assert_eq!(err.to_string(), "no images found");
    }
}
