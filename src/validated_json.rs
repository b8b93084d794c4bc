//! Axum extractor that deserialises and validates JSON

use crate::error::AtlasError;

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Json},
    http::Request,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// An axum extractor based on the Json extractor that also performs validation using the validator
/// crate.
///
/// A field that fails a `required` validation is reported as [AtlasError::MissingField].
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S, B> FromRequest<S, B> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    Json<T>: FromRequest<S, B, Rejection = JsonRejection>,
    B: Send + 'static,
{
    type Rejection = AtlasError;

    /// Extract a `ValidatedJson` from a `Request`.
    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate().map_err(|errors| match missing_field(&errors) {
            Some(field) => AtlasError::MissingField { field },
            None => AtlasError::RequestDataValidation(errors),
        })?;
        Ok(ValidatedJson(value))
    }
}

/// Returns the dotted path of the first field, in name order, that failed a `required`
/// validation.
fn missing_field(errors: &ValidationErrors) -> Option<String> {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by_key(|(name, _)| **name);
    fields.into_iter().find_map(|(name, kind)| match kind {
        ValidationErrorsKind::Field(field_errors) => field_errors
            .iter()
            .any(|error| error.code == "required")
            .then(|| name.to_string()),
        ValidationErrorsKind::Struct(nested) => {
            missing_field(nested).map(|field| format!("{name}.{field}"))
        }
        ValidationErrorsKind::List(_) => None,
    })
}
