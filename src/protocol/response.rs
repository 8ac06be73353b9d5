use super::errors::{ErrorBody, IndexError, RoomError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{Map, Value};

/// Wraps any successful payload with `ok: true`, matching `spec.md` §6:
/// "All successful responses carry `ok: true`".
pub struct Ok<T: Serialize>(pub T);

impl<T: Serialize> IntoResponse for Ok<T> {
    fn into_response(self) -> Response {
        let mut value = serde_json::to_value(self.0).unwrap_or(Value::Null);
        match &mut value {
            Value::Object(map) => {
                let mut with_ok = Map::with_capacity(map.len() + 1);
                with_ok.insert("ok".to_string(), Value::Bool(true));
                with_ok.append(map);
                (StatusCode::OK, Json(Value::Object(with_ok))).into_response()
            }
            other => (StatusCode::OK, Json(serde_json::json!({ "ok": true, "value": other })))
                .into_response(),
        }
    }
}

/// API failure envelope: `{error: <code>}` with the status the code maps to.
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<RoomError> for ApiError {
    fn from(e: RoomError) -> Self {
        ApiError {
            status: e.status(),
            body: e.into(),
        }
    }
}

impl From<IndexError> for ApiError {
    fn from(e: IndexError) -> Self {
        ApiError {
            status: e.status(),
            body: e.into(),
        }
    }
}

pub type ApiResult<T> = Result<Ok<T>, ApiError>;
