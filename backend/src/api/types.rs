//! REST API types.
//!
//! A successful import answers with the [`AggregateResult`] itself
//! (`total_items`, `total_categories`, `total_price`); failures answer with
//! [`error_response`].

use serde_json::{json, Value};

use crate::error::ErrorKind;

pub use crate::models::AggregateResult as UploadResponse;

/// Build the JSON body of a failed request.
pub fn error_response(kind: Option<ErrorKind>, error: &str, request_id: Option<&str>) -> Value {
    json!({
        "status": "error",
        "kind": kind,
        "error": error,
        "requestId": request_id,
    })
}
