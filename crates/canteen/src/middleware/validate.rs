use axum::{
    Json,
    extract::{FromRequest, Request},
    http::StatusCode,
};
use serde::de::DeserializeOwned;
use shared::errors::ErrorResponse;
use validator::{Validate, ValidationErrors};

/// Json extractor that runs `validator` rules before the handler sees
/// the payload. Malformed JSON keeps the status axum picked for it;
/// rule violations come back as 400.
pub struct SimpleValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for SimpleValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                (
                    rejection.status(),
                    Json(ErrorResponse::fail(rejection.body_text())),
                )
            })?;

        value.validate().map_err(|validation_errors| {
            let messages = collect_validation_errors(&validation_errors);
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::fail(format!(
                    "Validation failed: {messages:?}"
                ))),
            )
        })?;

        Ok(Self(value))
    }
}

fn collect_validation_errors(errors: &ValidationErrors) -> Vec<String> {
    let mut messages = Vec::new();

    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| match error.code.as_ref() {
                    "length" => "Invalid length".to_string(),
                    "range" => "Value out of range".to_string(),
                    _ => format!("Invalid {field}"),
                });
            messages.push(format!("{field}: {message}"));
        }
    }

    if messages.is_empty() {
        messages.push("Validation failed".to_string());
    }

    messages
}
