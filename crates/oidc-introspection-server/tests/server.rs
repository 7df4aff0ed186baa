use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use oidc_introspection::{RegisteredService, TokenRecord};
use oidc_introspection_server::{AppConfig, build_app};
use serde_json::{Value, json};
use tower::ServiceExt;

fn config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.introspection.issuer = "http://sso.example.org/cas/oidc".to_string();
    cfg.services.push(
        RegisteredService::new(1, "Sample SP", "https://sp\\.example.*", "sp-client")
            .with_client_secret("sp-secret"),
    );
    cfg.tokens.push(
        TokenRecord::new("AT-1", "sp-client", "casuser")
            .with_service("https://sp.example")
            .with_scopes(["openid", "profile"]),
    );
    cfg
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn healthz_reports_ok() {
    let app = build_app(&config()).unwrap();
    let response = app
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn introspection_served_below_issuer_path() {
    let app = build_app(&config()).unwrap();
    let request = Request::post("/cas/oidc/introspect")
        .header(header::HOST, "sso.example.org")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(
            "token=AT-1&client_id=sp-client&client_secret=sp-secret",
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["active"], true);
    assert_eq!(body["iss"], "http://sso.example.org/cas/oidc");
    assert_eq!(body["scope"], "openid profile");
}

#[tokio::test]
async fn default_path_is_not_routed_for_custom_issuer() {
    let app = build_app(&config()).unwrap();
    let response = app
        .oneshot(
            Request::post("/oidc/introspect")
                .header(header::HOST, "sso.example.org")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn tenant_path_served_when_dynamic_issuers_enabled() {
    let mut cfg = config();
    cfg.introspection.allow_dynamic_issuers = true;
    let app = build_app(&cfg).unwrap();

    let request = Request::post("/cas/oidc/tenant-a/introspect")
        .header(header::HOST, "sso.example.org")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(
            "token=AT-1&client_id=sp-client&client_secret=sp-secret",
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["active"], true);
}

#[test]
fn invalid_seed_service_fails_build() {
    let mut cfg = config();
    cfg.services
        .push(RegisteredService::new(2, "Broken", "https://(", "broken-client"));
    assert!(build_app(&cfg).is_err());
}
