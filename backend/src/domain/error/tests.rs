//! Tests for the error payload formatting and trace propagation.

use super::*;
use crate::domain::TraceId;
use actix_web::{ResponseError, body::to_bytes, http::StatusCode};
use rstest::{fixture, rstest};
use serde_json::json;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn expected_trace_id() -> String {
    TRACE_ID.to_owned()
}

#[fixture]
fn base_error() -> Error {
    Error::invalid_request("bad")
}

#[fixture]
fn internal_error_case(expected_trace_id: String) -> Error {
    Error::internal("boom")
        .with_trace_id(expected_trace_id)
        .with_details(json!({"secret": "x"}))
}

#[fixture]
fn conflict_case(expected_trace_id: String) -> Error {
    Error::conflict("document changed underneath the request")
        .with_trace_id(expected_trace_id)
        .with_details(json!({"documentId": "d1"}))
}

#[rstest]
fn convenience_constructors_set_codes() {
    let cases = [
        (Error::invalid_request("bad"), ErrorCode::InvalidRequest),
        (Error::unauthorized("no auth"), ErrorCode::Unauthorized),
        (Error::forbidden("denied"), ErrorCode::Forbidden),
        (Error::not_found("missing"), ErrorCode::NotFound),
        (Error::conflict("raced"), ErrorCode::Conflict),
        (
            Error::service_unavailable("down"),
            ErrorCode::ServiceUnavailable,
        ),
        (Error::internal("boom"), ErrorCode::InternalError),
    ];
    for (err, code) in cases {
        assert_eq!(err.code(), code);
    }
}

#[rstest]
fn try_new_rejects_empty_messages() {
    let result = Error::try_new(ErrorCode::InvalidRequest, "   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyMessage)));
}

#[rstest]
fn try_with_trace_id_rejects_empty_values(base_error: Error) {
    let result = base_error.try_with_trace_id("   ");
    assert!(matches!(result, Err(ErrorValidationError::EmptyTraceId)));
}

#[rstest]
fn new_returns_none_when_trace_id_out_of_scope() {
    let error = Error::internal("boom");
    assert!(error.trace_id().is_none());
}

#[rstest]
#[tokio::test]
async fn new_captures_trace_id_in_scope(expected_trace_id: String) {
    let trace_id: TraceId = expected_trace_id
        .parse()
        .expect("fixtures provide a valid UUID");
    let error = TraceId::scope(trace_id, async move {
        Error::try_new(ErrorCode::InternalError, "boom")
            .expect("validation accepts non-empty message")
    })
    .await;

    assert_eq!(error.trace_id(), Some(expected_trace_id.as_str()));
}

#[rstest]
#[tokio::test]
async fn try_from_error_dto_clears_ambient_trace(expected_trace_id: String) {
    let trace_id: TraceId = expected_trace_id
        .parse()
        .expect("fixtures provide a valid UUID");
    let dto = ErrorDto {
        code: ErrorCode::InvalidRequest,
        message: "bad".to_string(),
        trace_id: None,
        details: None,
    };

    let error = TraceId::scope(trace_id, async move {
        Error::try_from(dto).expect("conversion succeeds for valid payload without trace")
    })
    .await;

    assert!(error.trace_id().is_none());
}

async fn assert_error_response(
    error: Error,
    expected_status: StatusCode,
    expected_trace_id: Option<&str>,
) -> Error {
    let response = error.error_response();
    assert_eq!(response.status(), expected_status);

    let header = response.headers().get(TRACE_ID_HEADER);
    match expected_trace_id {
        Some(expected) => {
            let trace_id = header
                .expect("trace header is set by Error::error_response")
                .to_str()
                .expect("trace header not valid UTF-8");
            assert_eq!(trace_id, expected);
        }
        None => {
            assert!(header.is_none(), "trace header should not be present");
        }
    }

    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");

    serde_json::from_slice(&bytes).expect("Error JSON deserialisation succeeds")
}

#[rstest]
#[actix_web::test]
async fn error_responses_include_trace_id_and_payloads(
    #[from(internal_error_case)] internal_error: Error,
    #[from(conflict_case)] conflict: Error,
    expected_trace_id: String,
) {
    let redacted = assert_error_response(
        internal_error,
        StatusCode::INTERNAL_SERVER_ERROR,
        Some(expected_trace_id.as_str()),
    )
    .await;
    assert_eq!(redacted.code(), ErrorCode::InternalError);
    assert_eq!(redacted.message(), "Internal server error");
    assert!(redacted.details().is_none());

    let payload = assert_error_response(
        conflict,
        StatusCode::CONFLICT,
        Some(expected_trace_id.as_str()),
    )
    .await;
    assert_eq!(payload.code(), ErrorCode::Conflict);
    assert_eq!(payload.message(), "document changed underneath the request");
    assert_eq!(payload.details(), Some(&json!({"documentId": "d1"})));
}

#[rstest]
fn serde_skips_absent_optional_fields(base_error: Error) {
    let value = serde_json::to_value(base_error).expect("serialise to JSON");
    assert_eq!(value.get("code"), Some(&json!("invalid_request")));
    assert!(value.get("traceId").is_none());
    assert!(value.get("details").is_none());
}
