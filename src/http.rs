use reqwest::StatusCode;

use crate::errors::{APIError, Error, TransportError, TransportErrorKind};

/// Map a non-success registry response to an [`APIError`], pulling out the
/// `{"error": {"type", "message"}}` envelope when the body carries one.
pub(crate) fn parse_api_error_parts(status: StatusCode, body: String) -> Error {
    let status_code = status.as_u16();
    let status_text = status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string();

    if body.is_empty() {
        return APIError {
            status: status_code,
            code: None,
            message: status_text,
            raw_body: None,
        }
        .into();
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&body) {
        if let Some(err_obj) = value.get("error").and_then(|v| v.as_object()) {
            let code = err_obj
                .get("type")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());
            let message = err_obj
                .get("message")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
                .unwrap_or(status_text);
            return APIError {
                status: status_code,
                code,
                message,
                raw_body: Some(body.clone()),
            }
            .into();
        }
    }

    APIError {
        status: status_code,
        code: None,
        message: body.clone(),
        raw_body: Some(body),
    }
    .into()
}

pub(crate) fn to_transport_error(err: reqwest::Error) -> Error {
    let kind = if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_connect() {
        TransportErrorKind::Connect
    } else if err.is_request() {
        TransportErrorKind::Request
    } else {
        TransportErrorKind::Other
    };

    TransportError {
        kind,
        message: err.to_string(),
        source: Some(err),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_registry_error_envelope() {
        let body = r#"{"error":{"type":"token-not-found","message":"API token not found"}}"#;
        let err = parse_api_error_parts(StatusCode::UNAUTHORIZED, body.to_string());
        match err {
            Error::Api(api) => {
                assert_eq!(api.status, 401);
                assert_eq!(api.code.as_deref(), Some("token-not-found"));
                assert_eq!(api.message, "API token not found");
                assert!(api.raw_body.is_some());
            }
            other => panic!("expected APIError, got {other:?}"),
        }
    }

    #[test]
    fn plain_text_body_becomes_message() {
        let err = parse_api_error_parts(StatusCode::BAD_GATEWAY, "upstream unavailable".into());
        match err {
            Error::Api(api) => {
                assert_eq!(api.status, 502);
                assert_eq!(api.code, None);
                assert_eq!(api.message, "upstream unavailable");
            }
            other => panic!("expected APIError, got {other:?}"),
        }
    }

    #[test]
    fn empty_body_falls_back_to_status_text() {
        let err = parse_api_error_parts(StatusCode::NOT_FOUND, String::new());
        match err {
            Error::Api(api) => {
                assert_eq!(api.message, "Not Found");
                assert_eq!(api.raw_body, None);
            }
            other => panic!("expected APIError, got {other:?}"),
        }
    }
}
