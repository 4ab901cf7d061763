use crate::errors::{error::ErrorResponse, repository::RepositoryError, service::ServiceError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

#[derive(Debug)]
pub enum HttpError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl From<ServiceError> for HttpError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(errors) => {
                HttpError::BadRequest(format!("Validation failed: {errors:?}"))
            }

            ServiceError::BadRequest(msg) => HttpError::BadRequest(msg),

            ServiceError::InsufficientFunds { needed, available } => HttpError::BadRequest(
                format!("Not enough balance. Need {needed}, have {available}"),
            ),

            ServiceError::NotFound(entity) => HttpError::NotFound(format!("{entity} not found")),

            ServiceError::Forbidden(msg) => HttpError::Forbidden(msg),

            ServiceError::Conflict(msg) => HttpError::Conflict(msg),

            ServiceError::Repo(repo_err) => match repo_err {
                RepositoryError::NotFound => HttpError::NotFound("Not found".into()),
                RepositoryError::InsufficientFunds => {
                    HttpError::BadRequest("Insufficient balance".into())
                }
                RepositoryError::Conflict(msg) => HttpError::Conflict(msg),
                RepositoryError::ForeignKey(msg) => {
                    HttpError::BadRequest(format!("Foreign key violation: {msg}"))
                }
                _ => HttpError::Internal("Repository error".into()),
            },

            ServiceError::Jwt(err) => HttpError::Unauthorized(format!("JWT error: {err}")),

            ServiceError::TokenExpired => HttpError::Unauthorized("Token expired".into()),

            ServiceError::InvalidTokenType => HttpError::Unauthorized("Invalid token type".into()),

            ServiceError::Internal(msg) | ServiceError::Custom(msg) => HttpError::Internal(msg),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, msg) = match self {
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            HttpError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            HttpError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            HttpError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            HttpError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            HttpError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse {
            status: "error".into(),
            message: msg,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ServiceError) -> StatusCode {
        HttpError::from(err).into_response().status()
    }

    #[test]
    fn insufficient_funds_maps_to_bad_request() {
        let err = ServiceError::InsufficientFunds {
            needed: 30_000,
            available: 12_500,
        };
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn validation_maps_to_bad_request() {
        let err = ServiceError::Validation(vec!["quantity: must be at least 1".into()]);
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(status_of(ServiceError::NotFound("Order".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(ServiceError::Repo(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn conflict_maps_to_409() {
        let err = ServiceError::Conflict("Order already served".into());
        assert_eq!(status_of(err), StatusCode::CONFLICT);
    }

    #[test]
    fn forbidden_maps_to_403() {
        let err = ServiceError::Forbidden("You can only cancel your own orders".into());
        assert_eq!(status_of(err), StatusCode::FORBIDDEN);
    }

    #[test]
    fn repo_insufficient_funds_maps_to_bad_request() {
        let err = ServiceError::Repo(RepositoryError::InsufficientFunds);
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn token_failures_map_to_401() {
        assert_eq!(status_of(ServiceError::TokenExpired), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(ServiceError::InvalidTokenType), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn internal_maps_to_500() {
        let err = ServiceError::Internal("boom".into());
        assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
