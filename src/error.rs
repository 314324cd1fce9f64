use crate::calendar::CalendarError;
use crate::lifecycle::LifecycleError;
use crate::store::StoreError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use derive_more::Display;
use serde_json::json;

/// Errors leaving the HTTP layer, rendered as `{"message": ...}`.
#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "{}", _0)]
    Lifecycle(LifecycleError),
    #[display(fmt = "{}", _0)]
    Calendar(CalendarError),
    #[display(fmt = "{}", _0)]
    Store(StoreError),
    #[display(fmt = "{}", _0)]
    BadRequest(String),
    #[display(fmt = "{}", _0)]
    Forbidden(String),
    #[display(fmt = "{}", _0)]
    NotFound(String),
}

impl std::error::Error for ApiError {}

impl From<LifecycleError> for ApiError {
    fn from(value: LifecycleError) -> Self {
        ApiError::Lifecycle(value)
    }
}

impl From<CalendarError> for ApiError {
    fn from(value: CalendarError) -> Self {
        ApiError::Calendar(value)
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        ApiError::Store(value)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Lifecycle(err) => match err {
                LifecycleError::InvalidTransition { .. }
                | LifecycleError::ConcurrentModification(_) => StatusCode::CONFLICT,
                LifecycleError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                LifecycleError::NotFound(_) => StatusCode::NOT_FOUND,
                LifecycleError::DataIntegrity(_) | LifecycleError::Store(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Calendar(CalendarError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            ApiError::Calendar(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::Conflict) => StatusCode::CONFLICT,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(json!({ "message": message }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_request::LeaveStatus;

    #[test]
    fn lifecycle_errors_map_to_http_status() {
        let cases = [
            (
                LifecycleError::InvalidTransition {
                    from: LeaveStatus::Allowed,
                    to: LeaveStatus::Allowed,
                },
                StatusCode::CONFLICT,
            ),
            (LifecycleError::ConcurrentModification(1), StatusCode::CONFLICT),
            (
                LifecycleError::InvalidRequest("bad".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                LifecycleError::NotFound("leave request 1".to_string()),
                StatusCode::NOT_FOUND,
            ),
            (
                LifecycleError::DataIntegrity("pair".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status_code(), status);
        }
    }

    #[test]
    fn server_errors_hide_details() {
        let response =
            ApiError::from(LifecycleError::DataIntegrity("secret detail".to_string()))
                .error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
