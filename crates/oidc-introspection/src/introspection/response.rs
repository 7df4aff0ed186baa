//! Final HTTP response assembly.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::audit::{AuditRecord, AuditSink, INTROSPECTION_RESPONSE_LABEL};
use crate::introspection::{INTROSPECTION_JWT_MEDIA_TYPE, IntrospectionFailure, IntrospectionPayload};

/// Body returned when the JWT form cannot be produced.
pub const JWT_FAILURE_MESSAGE: &str = "Unable to produce introspection JWT claims";

/// Turns the encoding result into the HTTP response.
///
/// JWT responses are recorded through `audit` before they are returned.
/// Failures are logged and answered with a fixed message.
pub fn assemble(
    audit: &dyn AuditSink,
    result: Result<IntrospectionPayload, IntrospectionFailure>,
) -> Response {
    match result {
        Ok(IntrospectionPayload::Json(body)) => (StatusCode::OK, Json(body)).into_response(),
        Ok(IntrospectionPayload::Jwt {
            token,
            client_id,
            service_name,
        }) => {
            let record = AuditRecord::new(INTROSPECTION_RESPONSE_LABEL)
                .with_context("Content-Type", INTROSPECTION_JWT_MEDIA_TYPE)
                .with_context("Client ID", client_id)
                .with_context("Service", service_name)
                .with_payload(token.clone());
            audit.record(&record);

            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, INTROSPECTION_JWT_MEDIA_TYPE)],
                token,
            )
                .into_response()
        }
        Err(failure) => {
            tracing::warn!(error = %failure, "Unable to produce introspection JWT");
            (
                StatusCode::BAD_REQUEST,
                [(header::CONTENT_TYPE, "text/plain")],
                JWT_FAILURE_MESSAGE,
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;
    use crate::audit::testing::RecordingAuditSink;
    use crate::token::IntrospectionBody;

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn content_type(response: &Response) -> &str {
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_json_response_is_not_audited() {
        let sink = RecordingAuditSink::default();
        let response = assemble(
            &sink,
            Ok(IntrospectionPayload::Json(IntrospectionBody::inactive())),
        );

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(content_type(&response), "application/json");
        assert_eq!(body_string(response).await, r#"{"active":false}"#);
        assert!(sink.records().is_empty());
    }

    #[tokio::test]
    async fn test_jwt_response_forces_content_type_and_audits() {
        let sink = RecordingAuditSink::default();
        let response = assemble(
            &sink,
            Ok(IntrospectionPayload::Jwt {
                token: "a.b.".to_string(),
                client_id: "sp-client".to_string(),
                service_name: "Sample".to_string(),
            }),
        );

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(content_type(&response), INTROSPECTION_JWT_MEDIA_TYPE);
        assert_eq!(body_string(response).await, "a.b.");

        let records = sink.records();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.label, "OpenID Connect Introspection Response");
        assert_eq!(record.context["Content-Type"], INTROSPECTION_JWT_MEDIA_TYPE);
        assert_eq!(record.context["Client ID"], "sp-client");
        assert_eq!(record.context["Service"], "Sample");
        assert_eq!(record.payload.as_deref(), Some("a.b."));
    }

    #[tokio::test]
    async fn test_failure_hides_cause() {
        let sink = RecordingAuditSink::default();
        let response = assemble(
            &sink,
            Err(IntrospectionFailure::ServiceNotFound {
                client_id: "secret-internal-name".to_string(),
            }),
        );

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(content_type(&response), "text/plain");
        let body = body_string(response).await;
        assert_eq!(body, JWT_FAILURE_MESSAGE);
        assert!(!body.contains("secret-internal-name"));
        assert!(sink.records().is_empty());
    }
}
