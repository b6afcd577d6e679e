use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// The response body of every query.
///
/// `status` is `0` with `data` on success, `1` with `message` when nothing was
/// found or the request could not be answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope<T> {
    /// `0` on success, `1` otherwise.
    pub status: u8,
    /// The payload, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// The reason, present when `status` is `1`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// A successful answer carrying `data`.
    pub const fn ok(data: T) -> Self {
        Self { status: 0, data: Some(data), message: None }
    }

    /// A soft failure carrying `message`.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self { status: 1, data: None, message: Some(message.into()) }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
