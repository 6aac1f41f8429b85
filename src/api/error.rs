use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::error::CrmError;
use crate::wire::ErrorBody;

impl ResponseError for CrmError {
    fn status_code(&self) -> StatusCode {
        match self {
            CrmError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            CrmError::NotFound(_) => StatusCode::NOT_FOUND,
            CrmError::Conflict(_) => StatusCode::CONFLICT,
            CrmError::StoreFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Store failures stay opaque to clients.
        let error = match self {
            CrmError::StoreFailure(source) => {
                tracing::error!(error = %source, "Request failed in the store");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(ErrorBody { error })
    }
}
