//! OAuth error responses for `AuthError`.

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::error::AuthError;
use crate::token::IntrospectionError;

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error) = error_details(&self);

        if self.is_server_error() {
            tracing::error!(error = %self, category = %self.category(), "Introspection request failed");
        } else {
            tracing::debug!(error = %self, category = %self.category(), "Introspection request rejected");
        }

        let mut headers = HeaderMap::new();
        if status == StatusCode::UNAUTHORIZED {
            let www_auth = build_www_authenticate_header(&error);
            if let Ok(value) = HeaderValue::from_str(&www_auth) {
                headers.insert(header::WWW_AUTHENTICATE, value);
            }
        }

        (status, headers, Json(error)).into_response()
    }
}

/// Maps an error to its HTTP status and OAuth error body.
///
/// Server-side failures get a generic description.
fn error_details(error: &AuthError) -> (StatusCode, IntrospectionError) {
    let (status, description) = match error {
        AuthError::InvalidClient { message } => (StatusCode::UNAUTHORIZED, message.as_str()),
        AuthError::InvalidRequest { message } => (StatusCode::BAD_REQUEST, message.as_str()),
        AuthError::InvalidIssuer => (StatusCode::BAD_REQUEST, "Invalid issuer"),
        AuthError::Storage { .. } | AuthError::Configuration { .. } | AuthError::Internal { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    };

    (
        status,
        IntrospectionError::with_description(error.oauth_error_code(), description),
    )
}

fn build_www_authenticate_header(error: &IntrospectionError) -> String {
    let description = error
        .error_description
        .as_deref()
        .unwrap_or_default()
        .replace('"', "\\\"");
    format!(
        "Basic realm=\"oidc\", error=\"{}\", error_description=\"{}\"",
        error.error, description
    )
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_invalid_issuer_response() {
        let response = AuthError::InvalidIssuer.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            serde_json::json!({"error": "invalid_request", "error_description": "Invalid issuer"})
        );
    }

    #[tokio::test]
    async fn test_invalid_client_response_has_challenge() {
        let response = AuthError::invalid_client("Client authentication failed").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let challenge = response
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(challenge.starts_with("Basic "));
        assert!(challenge.contains("error=\"invalid_client\""));

        assert_eq!(json_body(response).await["error"], "invalid_client");
    }

    #[tokio::test]
    async fn test_body_error_matches_oauth_code() {
        for error in [
            AuthError::invalid_client("bad secret"),
            AuthError::invalid_request("missing token"),
            AuthError::InvalidIssuer,
            AuthError::configuration("no key"),
        ] {
            let code = error.oauth_error_code();
            let body = json_body(error.into_response()).await;
            assert_eq!(body["error"], code.as_str());
        }
    }

    #[tokio::test]
    async fn test_server_error_hides_details() {
        let response = AuthError::storage("postgres at 10.0.0.3 refused").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(response).await;
        assert_eq!(body["error"], "server_error");
        assert!(!body.to_string().contains("10.0.0.3"));
    }
}
