use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::post::post_store::StoreError;
use crate::spreadsheet::SpreadsheetError;
use crate::utils::helpers::service_name;

#[derive(Debug, Error)]
pub enum CustomError {
    #[error("{0}")]
    InvalidInputError(String),

    #[error("Post not found with id {0}")]
    NotFoundError(i64),

    #[error("{message}: {source}")]
    IoError {
        message: String,
        #[source]
        source: SpreadsheetError,
    },

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
}

impl CustomError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CustomError::InvalidInputError(message.into())
    }

    pub fn io(message: impl Into<String>, source: SpreadsheetError) -> Self {
        CustomError::IoError {
            message: message.into(),
            source,
        }
    }
}

impl From<StoreError> for CustomError {
    fn from(err: StoreError) -> Self {
        CustomError::InternalServerError(err.to_string())
    }
}

impl ResponseError for CustomError {
    fn status_code(&self) -> StatusCode {
        match *self {
            CustomError::InvalidInputError(..) => StatusCode::BAD_REQUEST,
            CustomError::NotFoundError(..) => StatusCode::NOT_FOUND,
            CustomError::IoError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            CustomError::InternalServerError(..) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_message = json!({
            "success": false,
            "message": self.to_string(),
            "httpStatusCode": self.status_code().as_u16(),
            "error": match *self {
                CustomError::InvalidInputError(..) => "INVALID_INPUT_ERROR",
                CustomError::NotFoundError(..) => "NOT_FOUND_ERROR",
                CustomError::IoError { .. } => "IO_ERROR",
                CustomError::InternalServerError(..) => "INTERNAL_SERVER_ERROR",
            },
            "service": service_name(),
        });

        HttpResponse::build(self.status_code()).json(error_message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            CustomError::invalid_input("file is empty").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(CustomError::NotFoundError(3).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            CustomError::from(StoreError::Unavailable("down".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_io_error_keeps_cause() {
        let err = CustomError::io(
            "Failed to read Excel file",
            SpreadsheetError::MissingPart("xl/workbook.xml".into()),
        );
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().starts_with("Failed to read Excel file: "));
        assert!(err.source().is_some());
    }
}
