use super::*;
use axum::{body, body::Body, http::Request};
use shared::domain::ResourceKind;
use tower::ServiceExt;

async fn test_app(auth_token: Option<&str>) -> (Router, Storage) {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let api = ApiContext {
        storage: storage.clone(),
    };
    let settings = Settings {
        auth_token: auth_token.map(str::to_string),
        ..Settings::default()
    };
    let app = build_router(Arc::new(AppState { api, settings }));
    (app, storage)
}

async fn body_text(response: Response) -> String {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

#[tokio::test]
async fn healthz_reports_ok_when_storage_is_ready() {
    let (app, _storage) = test_app(None).await;
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn renders_notebook_page_for_stored_notebook() {
    let (app, storage) = test_app(None).await;
    storage
        .put(
            "analysis/demo.ipynb",
            ResourceKind::Notebook,
            b"{\"cells\": []}",
            Some("application/json"),
        )
        .await
        .expect("put");

    let request = Request::get("/notebooks/analysis/demo.ipynb")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/html"));

    let html = body_text(response).await;
    assert!(html.contains("data-notebook-path=\"analysis/demo.ipynb\""));
    assert!(html.contains("data-notebook-name=\"demo.ipynb\""));
}

#[tokio::test]
async fn missing_notebook_returns_not_found() {
    let (app, _storage) = test_app(None).await;
    let request = Request::get("/notebooks/nope/missing.ipynb")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let err: ApiError = serde_json::from_str(&body_text(response).await).expect("json");
    assert_eq!(err.code, ErrorCode::NotFound);
    assert!(err.message.contains("nope/missing.ipynb"));
}

#[tokio::test]
async fn plain_file_redirects_to_file_route() {
    let (app, storage) = test_app(None).await;
    storage
        .put("data/report.csv", ResourceKind::File, b"a,b\n", Some("text/csv"))
        .await
        .expect("put");

    let request = Request::get("/notebooks/data/report.csv")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert!(response.status().is_redirection());
    assert_eq!(
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok()),
        Some("/files/data/report.csv")
    );
}

#[tokio::test]
async fn missing_path_with_files_segment_redirects_instead_of_404() {
    let (app, _storage) = test_app(None).await;
    let request = Request::get("/notebooks/a/files/b.png")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert!(response.status().is_redirection());
    assert_eq!(
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok()),
        Some("/files/a/files/b.png")
    );
}

#[tokio::test]
async fn trailing_slash_resolves_like_trimmed_path() {
    let (app, storage) = test_app(None).await;
    storage
        .put("a/b.ipynb", ResourceKind::Notebook, b"{}", None)
        .await
        .expect("put");

    let request = Request::get("/notebooks/a/b.ipynb/")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response)
        .await
        .contains("data-notebook-name=\"b.ipynb\""));
}

#[tokio::test]
async fn special_characters_never_render_raw() {
    let (app, storage) = test_app(None).await;
    storage
        .put(r#"notes/<b>&"x.ipynb"#, ResourceKind::Notebook, b"{}", None)
        .await
        .expect("put");

    let request = Request::get("/notebooks/notes/%3Cb%3E%26%22x.ipynb")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(!html.contains(r#"<b>&"x.ipynb"#));
    assert!(html.contains("notes/%3Cb%3E%26%22x.ipynb"));
}

#[tokio::test]
async fn files_route_serves_stored_body() {
    let (app, storage) = test_app(None).await;
    storage
        .put("data/report.csv", ResourceKind::File, b"a,b\n1,2\n", Some("text/csv"))
        .await
        .expect("put");

    let request = Request::get("/files/data/report.csv")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("text/csv")
    );
    assert_eq!(body_text(response).await, "a,b\n1,2\n");
}

#[tokio::test]
async fn files_route_falls_back_to_extension_content_type() {
    let (app, storage) = test_app(None).await;
    storage
        .put("img/plot.png", ResourceKind::File, b"\x89PNG", None)
        .await
        .expect("put");

    let request = Request::get("/files/img/plot.png")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok()),
        Some("image/png")
    );
}

#[tokio::test]
async fn missing_file_returns_not_found() {
    let (app, _storage) = test_app(None).await;
    let request = Request::get("/files/nope.bin")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn notebook_route_requires_token_when_configured() {
    let (app, storage) = test_app(Some("sekrit")).await;
    storage
        .put("a/b.ipynb", ResourceKind::Notebook, b"{}", None)
        .await
        .expect("put");

    let anonymous = Request::get("/notebooks/a/b.ipynb")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(anonymous).await.expect("response");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let authed = Request::get("/notebooks/a/b.ipynb")
        .header(header::AUTHORIZATION, "Bearer sekrit")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(authed).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn healthz_stays_open_when_token_configured() {
    let (app, _storage) = test_app(Some("sekrit")).await;
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn wrong_token_is_rejected() {
    let (app, _storage) = test_app(Some("sekrit")).await;
    let request = Request::get("/notebooks/a/b.ipynb")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
