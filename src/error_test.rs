use super::*;
use serde_json::json;

#[test]
fn backend_messages_flattens_field_errors() {
    let body = json!({
        "errors": {
            "email": ["The email has already been taken."],
            "password": ["The password must be at least 6 characters."]
        }
    });
    assert_eq!(
        backend_messages(&body),
        vec![
            "The email has already been taken.".to_owned(),
            "The password must be at least 6 characters.".to_owned(),
        ]
    );
}

#[test]
fn backend_messages_falls_back_to_error_then_message() {
    assert_eq!(backend_messages(&json!({ "error": "Unauthorized" })), vec!["Unauthorized".to_owned()]);
    assert_eq!(backend_messages(&json!({ "message": "Server Error" })), vec!["Server Error".to_owned()]);
}

#[test]
fn backend_messages_empty_for_non_textual_bodies() {
    assert!(backend_messages(&json!(null)).is_empty());
    assert!(backend_messages(&json!({ "error": "   " })).is_empty());
    assert!(backend_messages(&json!({ "errors": {} })).is_empty());
}

#[test]
fn backend_error_displays_joined_messages() {
    let err = ApiError::Backend {
        status: 422,
        body: json!({ "errors": { "nombre": ["required"], "precio": ["numeric"] } }),
    };
    assert_eq!(err.to_string(), "required\nnumeric");
    assert_eq!(err.status(), Some(422));
}

#[test]
fn backend_error_without_messages_displays_status() {
    let err = ApiError::Backend { status: 500, body: json!(null) };
    assert_eq!(err.to_string(), "server returned HTTP 500");
}

#[test]
fn login_failure_with_backend_body_is_invalid_credentials() {
    let err = AuthError::from_login_failure(ApiError::Backend {
        status: 401,
        body: json!({ "error": "Credenciales incorrectas" }),
    });
    assert!(matches!(err, AuthError::InvalidCredentials(ref m) if m == "Credenciales incorrectas"));
}

#[test]
fn login_failure_without_message_uses_default() {
    let err = AuthError::from_login_failure(ApiError::Backend { status: 401, body: json!({}) });
    assert_eq!(err.to_string(), DEFAULT_INVALID_CREDENTIALS_MESSAGE);
}

#[test]
fn login_failure_network_stays_network() {
    let err = AuthError::from_login_failure(ApiError::Network("connection refused".into()));
    assert!(err.is_network());
}
