//! Error handling.

use axum::{
    extract::rejection::JsonRejection,
    http::header,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::error::Error;
use thiserror::Error;
use tokio::sync::AcquireError;
use tracing::{event, Level};

/// Incident Atlas error type
///
/// This type encapsulates the various errors that may occur, both while loading the dataset at
/// startup and while serving requests.
#[derive(Debug, Error)]
pub enum AtlasError {
    /// Error reading the dataset file
    #[error("failed to read dataset {path}")]
    DatasetRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Dataset is not valid UTF-8
    #[error("dataset is not valid UTF-8")]
    DatasetDecode(#[from] std::string::FromUtf8Error),

    /// Error parsing the dataset as CSV
    #[error("failed to parse dataset")]
    DatasetCsv(#[from] csv::Error),

    /// A required column is absent from the dataset header
    #[error("dataset has no column {column}")]
    DatasetMissingColumn { column: &'static str },

    /// A numeric column holds a value that is not a number
    #[error("invalid value {value:?} in column {column} on line {line}")]
    DatasetInvalidNumber {
        column: &'static str,
        line: u64,
        value: String,
    },

    /// A date range did not contain exactly a start and an end
    #[error("date_range must contain a start and an end date, got {len} values")]
    DateRangeLength { len: usize },

    /// A date supplied in a request could not be parsed
    #[error("invalid date {value:?}")]
    InvalidDate { value: String },

    /// The listen host is not an IP address
    #[error("invalid listen address {host}")]
    InvalidListenAddress {
        host: String,
        #[source]
        source: std::net::AddrParseError,
    },

    /// A required request field is absent
    #[error("missing required field `{field}`")]
    MissingField { field: String },

    /// Error deserialising request data
    #[error("request data is not valid")]
    RequestDataJsonRejection(#[from] JsonRejection),

    /// Error validating request data (single error)
    #[error("request data is not valid")]
    RequestDataValidationSingle(#[from] validator::ValidationError),

    /// Error validating request data (multiple errors)
    #[error("request data is not valid")]
    RequestDataValidation(#[from] validator::ValidationErrors),

    /// Error acquiring a semaphore
    #[error("error acquiring resources")]
    SemaphoreAcquireError(#[from] AcquireError),

    /// Error binding or running the HTTP server
    #[error("server error")]
    Server(#[source] std::io::Error),

    /// Error serialising response data
    #[error("failed to serialise response")]
    Serialisation(#[from] serde_json::Error),

    /// Error converting between integer types
    #[error(transparent)]
    TryFromInt(#[from] std::num::TryFromIntError),
}

impl IntoResponse for AtlasError {
    /// Convert from an `AtlasError` into an [axum::response::Response].
    fn into_response(self) -> Response {
        ErrorResponse::from(self).into_response()
    }
}

/// Return an error message including its causes, separated by colons.
///
/// # Arguments
///
/// * `error`: The error that occurred
fn error_message<E>(error: &E) -> String
where
    E: std::error::Error + Send + Sync,
{
    let mut messages = vec![error.to_string()];
    let mut current = error.source();
    while let Some(source) = current {
        messages.push(source.to_string());
        current = source.source();
    }
    // Remove duplicate entries.
    messages.dedup();
    messages.join(": ")
}

/// A response to send in error cases
///
/// Implements serde (de)serialise. The body is a single `error` message string.
#[derive(Deserialize, Serialize)]
struct ErrorResponse {
    /// HTTP status of the response
    #[serde(skip)]
    status: StatusCode,

    /// Error message
    error: String,
}

impl ErrorResponse {
    /// Return a new ErrorResponse
    ///
    /// # Arguments
    ///
    /// * `status`: HTTP status of the response
    /// * `error`: The error that occurred. This will be formatted with its causes.
    fn new<E>(status: StatusCode, error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        ErrorResponse {
            status,
            error: error_message(error),
        }
    }

    /// Return a 500 internal server error ErrorResponse
    fn internal_server_error<E>(error: &E) -> Self
    where
        E: std::error::Error + Send + Sync,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error)
    }
}

impl From<AtlasError> for ErrorResponse {
    /// Convert from an `AtlasError` into an `ErrorResponse`.
    fn from(error: AtlasError) -> Self {
        let response = match &error {
            // Client errors. Existing clients expect these as 500s rather than 400s.
            AtlasError::DateRangeLength { len: _ }
            | AtlasError::InvalidDate { value: _ }
            | AtlasError::MissingField { field: _ }
            | AtlasError::RequestDataJsonRejection(_)
            | AtlasError::RequestDataValidationSingle(_)
            | AtlasError::RequestDataValidation(_) => Self::internal_server_error(&error),

            // Internal server error
            AtlasError::DatasetRead { path: _, source: _ }
            | AtlasError::DatasetDecode(_)
            | AtlasError::DatasetCsv(_)
            | AtlasError::DatasetMissingColumn { column: _ }
            | AtlasError::DatasetInvalidNumber {
                column: _,
                line: _,
                value: _,
            }
            | AtlasError::InvalidListenAddress { host: _, source: _ }
            | AtlasError::SemaphoreAcquireError(_)
            | AtlasError::Server(_)
            | AtlasError::Serialisation(_)
            | AtlasError::TryFromInt(_) => Self::internal_server_error(&error),
        };

        // Log server errors.
        if response.status.is_server_error() {
            event!(Level::ERROR, "{}", error.to_string());
            let mut current = error.source();
            while let Some(source) = current {
                event!(Level::ERROR, "Caused by: {}", source.to_string());
                current = source.source();
            }
        }

        response
    }
}

impl IntoResponse for ErrorResponse {
    /// Convert from an `ErrorResponse` into an `axum::response::Response`.
    ///
    /// Renders the response as JSON.
    fn into_response(self) -> Response {
        let json_body = serde_json::to_string(&self);
        match json_body {
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to serialise error response: {}", err),
            )
                .into_response(),
            Ok(json_body) => (
                self.status,
                [(&header::CONTENT_TYPE, mime::APPLICATION_JSON.to_string())],
                json_body,
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use hyper::HeaderMap;

    // Jump through the hoops to get the body as a string.
    async fn body_string(response: Response) -> String {
        String::from_utf8(
            hyper::body::to_bytes(response.into_body())
                .await
                .unwrap()
                .to_vec(),
        )
        .unwrap()
    }

    async fn test_atlas_error(error: AtlasError, status: StatusCode, message: &str) {
        let response = error.into_response();
        assert_eq!(status, response.status());
        let mut headers = HeaderMap::new();
        headers.insert(&header::CONTENT_TYPE, "application/json".parse().unwrap());
        assert_eq!(headers, *response.headers());
        let error_response: ErrorResponse =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(message.to_string(), error_response.error);
    }

    #[tokio::test]
    async fn dataset_read_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let error = AtlasError::DatasetRead {
            path: "GTD-suicide.csv".to_string(),
            source: io_error,
        };
        let message = "failed to read dataset GTD-suicide.csv: no such file";
        test_atlas_error(error, StatusCode::INTERNAL_SERVER_ERROR, message).await;
    }

    #[tokio::test]
    async fn dataset_missing_column_error() {
        let error = AtlasError::DatasetMissingColumn { column: "city" };
        let message = "dataset has no column city";
        test_atlas_error(error, StatusCode::INTERNAL_SERVER_ERROR, message).await;
    }

    #[tokio::test]
    async fn dataset_invalid_number_error() {
        let error = AtlasError::DatasetInvalidNumber {
            column: "nkill",
            line: 3,
            value: "many".to_string(),
        };
        let message = "invalid value \"many\" in column nkill on line 3";
        test_atlas_error(error, StatusCode::INTERNAL_SERVER_ERROR, message).await;
    }

    #[tokio::test]
    async fn date_range_length_error() {
        let error = AtlasError::DateRangeLength { len: 3 };
        let message = "date_range must contain a start and an end date, got 3 values";
        test_atlas_error(error, StatusCode::INTERNAL_SERVER_ERROR, message).await;
    }

    #[tokio::test]
    async fn invalid_date_error() {
        let error = AtlasError::InvalidDate {
            value: "yesterday".to_string(),
        };
        let message = "invalid date \"yesterday\"";
        test_atlas_error(error, StatusCode::INTERNAL_SERVER_ERROR, message).await;
    }

    #[tokio::test]
    async fn missing_field_error() {
        let error = AtlasError::MissingField {
            field: "bounds".to_string(),
        };
        let message = "missing required field `bounds`";
        test_atlas_error(error, StatusCode::INTERNAL_SERVER_ERROR, message).await;
    }

    #[tokio::test]
    async fn request_data_validation_single() {
        let validation_error = validator::ValidationError::new("foo");
        let error = AtlasError::RequestDataValidationSingle(validation_error);
        let message = "request data is not valid: Validation error: foo [{}]";
        test_atlas_error(error, StatusCode::INTERNAL_SERVER_ERROR, message).await;
    }

    #[tokio::test]
    async fn request_data_validation() {
        let mut validation_errors = validator::ValidationErrors::new();
        let validation_error = validator::ValidationError::new("foo");
        validation_errors.add("bar", validation_error);
        let error = AtlasError::RequestDataValidation(validation_errors);
        let message = "request data is not valid: bar: Validation error: foo [{}]";
        test_atlas_error(error, StatusCode::INTERNAL_SERVER_ERROR, message).await;
    }

    #[tokio::test]
    async fn invalid_listen_address_error() {
        let error = AtlasError::InvalidListenAddress {
            host: "localhost".to_string(),
            source: "localhost".parse::<std::net::IpAddr>().unwrap_err(),
        };
        let message = "invalid listen address localhost: invalid IP address syntax";
        test_atlas_error(error, StatusCode::INTERNAL_SERVER_ERROR, message).await;
    }

    #[tokio::test]
    async fn server_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use");
        let error = AtlasError::Server(io_error);
        let message = "server error: address in use";
        test_atlas_error(error, StatusCode::INTERNAL_SERVER_ERROR, message).await;
    }

    #[tokio::test]
    async fn serialisation_error() {
        let json_error = serde_json::from_str::<u32>("x").unwrap_err();
        let error = AtlasError::Serialisation(json_error);
        let message = "failed to serialise response: expected value at line 1 column 1";
        test_atlas_error(error, StatusCode::INTERNAL_SERVER_ERROR, message).await;
    }

    #[tokio::test]
    async fn try_from_int_error() {
        let error = AtlasError::TryFromInt(u8::try_from(-1_i32).unwrap_err());
        let message = "out of range integral type conversion attempted";
        test_atlas_error(error, StatusCode::INTERNAL_SERVER_ERROR, message).await;
    }
}
