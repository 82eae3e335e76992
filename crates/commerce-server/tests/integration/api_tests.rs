use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tower::ServiceExt;

use crate::integration::common::{CATALOG_JSON, ROBOTS, body_json, body_text, setup_test_app};

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

#[tokio::test]
async fn health_returns_200() {
    let app = setup_test_app();

    let response = app
        .router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json, serde_json::json!({"status": "ok"}));
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = setup_test_app();

    let response = app
        .router
        .oneshot(
            Request::get("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["paths"]["/v1/process"].is_object());
    assert!(json["paths"]["/v1/process/from-file"].is_object());
}

// ---------------------------------------------------------------------------
// Inline processing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn process_inline_json() {
    let app = setup_test_app();

    let response = app
        .router
        .oneshot(post_json(
            "/v1/process",
            serde_json::json!({"kind": "json", "content": CATALOG_JSON, "title": "Shop"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["extracted"], 2);
    assert_eq!(json["skipped"], 1);
    assert_eq!(json["skipped_items"][0]["index"], 1);
    assert_eq!(json["items"][0]["name"], "Linen Shirt");
    assert_eq!(json["items"][1]["price"], 245.0);
    assert_eq!(json["content_hash"].as_str().unwrap().len(), 64);

    let markdown = json["markdown"].as_str().unwrap();
    assert!(markdown.starts_with("# Shop\n\n1. [Linen Shirt](https://shop.example.com/p/linen-shirt) — USD 68.00\n"));
    assert!(markdown.contains("2. [Field Jacket]"));
}

#[tokio::test]
async fn process_inline_bundle_with_limit() {
    let app = setup_test_app();
    let bundle = "const wf=[{id:1,name:'Tee',price:20},{id:2,name:'Hat',price:15}];";

    let response = app
        .router
        .oneshot(post_json(
            "/v1/process",
            serde_json::json!({"kind": "bundled-script", "content": bundle, "max_items": 1}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["extracted"], 1);
    assert_eq!(
        json["items"][0]["url"],
        "https://effulgent-kataifi-4fc56b.netlify.app/#product-1"
    );
    assert!(json["markdown"].as_str().unwrap().starts_with("# commerce.txt spotlight\n"));
}

#[tokio::test]
async fn process_unrecognized_source_returns_422() {
    let app = setup_test_app();

    let response = app
        .router
        .oneshot(post_json(
            "/v1/process",
            serde_json::json!({"kind": "html-snapshot", "content": "<p>nothing to see</p>"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["error"], "unrecognized_source");
}

#[tokio::test]
async fn process_abort_policy_returns_400() {
    let app = setup_test_app();

    let response = app
        .router
        .oneshot(post_json(
            "/v1/process",
            serde_json::json!({"kind": "json", "content": CATALOG_JSON, "skip_policy": "abort"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "validation_error");
    assert!(json["message"].as_str().unwrap().contains("Item 1"));
}

#[tokio::test]
async fn process_rejects_bad_parameters() {
    let app = setup_test_app();

    for body in [
        serde_json::json!({"kind": "xml", "content": "[]"}),
        serde_json::json!({"kind": "json", "content": "[]", "max_items": 0}),
        serde_json::json!({"kind": "json", "content": "[]", "skip_policy": "retry"}),
    ] {
        let response = app
            .router
            .clone()
            .oneshot(post_json("/v1/process", body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        let json = body_json(response).await;
        assert_eq!(json["error"], "invalid_request");
    }
}

#[tokio::test]
async fn process_rejects_malformed_bodies_with_json_error() {
    let app = setup_test_app();

    for body in [
        r#"{"kind": "json", "content": "[]", "max_items": -1}"#,
        r#"{"kind": "json", "content": "[]", "max_items": 2.5}"#,
        r#"{"content": "[]"}"#,
        r#"{"kind": "json", "content": "#,
    ] {
        let response = app
            .router
            .clone()
            .oneshot(
                Request::post("/v1/process")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        let json = body_json(response).await;
        assert_eq!(json["error"], "invalid_request");
        assert!(json["message"].as_str().unwrap().contains("Invalid request body"));
    }
}

#[tokio::test]
async fn process_from_file_rejects_negative_limit() {
    let app = setup_test_app();

    let response = app
        .router
        .oneshot(post_json(
            "/v1/process/from-file",
            serde_json::json!({"path": "feeds/catalog.json", "max_items": -3}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "invalid_request");
}

// ---------------------------------------------------------------------------
// File processing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn process_from_file_infers_kind() {
    let app = setup_test_app();

    let response = app
        .router
        .oneshot(post_json(
            "/v1/process/from-file",
            serde_json::json!({"path": "feeds/catalog.json", "max_items": 1}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["extracted"], 1);
    assert_eq!(json["items"][0]["name"], "Linen Shirt");
    assert_eq!(json["skipped"], 1);
}

#[tokio::test]
async fn process_from_file_missing_returns_404() {
    let app = setup_test_app();

    let response = app
        .router
        .oneshot(post_json(
            "/v1/process/from-file",
            serde_json::json!({"path": "feeds/missing.json"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn process_from_file_rejects_escaping_paths() {
    let app = setup_test_app();

    for path in ["../robots.txt", "/etc/passwd", "feeds/notes.txt"] {
        let response = app
            .router
            .clone()
            .oneshot(post_json(
                "/v1/process/from-file",
                serde_json::json!({"path": path}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{path}");
    }
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn commerce_txt_regenerates_artifact() {
    let app = setup_test_app();

    let response = app
        .router
        .clone()
        .oneshot(Request::get("/commerce.txt").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers().clone();
    assert_eq!(headers[header::CONTENT_TYPE], "text/markdown; charset=utf-8");
    assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
    let etag = headers[header::ETAG].to_str().unwrap().to_string();

    let markdown = body_text(response).await;
    assert!(markdown.starts_with("# Test sweaters\n\n1. [Cashmere crew](https://www.jcrew.com/p/crew)"));
    assert_eq!(std::fs::read_to_string(app.output_path()).unwrap(), markdown);

    let response = app
        .router
        .oneshot(
            Request::get("/commerce.txt")
                .header(header::IF_NONE_MATCH, etag)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
}

#[tokio::test]
async fn commerce_txt_serves_concurrent_requests() {
    let app = setup_test_app();
    let get = || Request::get("/commerce.txt").body(Body::empty()).unwrap();

    let (first, second) = tokio::join!(
        app.router.clone().oneshot(get()),
        app.router.clone().oneshot(get()),
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(first.headers()[header::ETAG], second.headers()[header::ETAG]);
    assert!(app.output_path().exists());
}

#[tokio::test]
async fn commerce_txt_falls_back_to_last_artifact() {
    let app = setup_test_app();
    std::fs::remove_file(app.source_path()).unwrap();
    std::fs::write(app.output_path(), "# Cached\n").unwrap();

    let response = app
        .router
        .oneshot(Request::get("/commerce.txt").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "# Cached\n");
}

#[tokio::test]
async fn commerce_txt_without_source_or_artifact_returns_404() {
    let app = setup_test_app();
    std::fs::remove_file(app.source_path()).unwrap();

    let response = app
        .router
        .oneshot(Request::get("/commerce.txt").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn commerce_txt_parse_failure_returns_500() {
    let app = setup_test_app();
    std::fs::write(app.source_path(), "<html><body>maintenance</body></html>").unwrap();

    let response = app
        .router
        .clone()
        .oneshot(Request::get("/commerce.txt").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!app.output_path().exists());
}

#[tokio::test]
async fn robots_txt_is_served() {
    let app = setup_test_app();

    let response = app
        .router
        .clone()
        .oneshot(Request::get("/robots.txt").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/plain; charset=utf-8"
    );
    assert_eq!(body_text(response).await, ROBOTS);

    std::fs::remove_file(app.dir.path().join("robots.txt")).unwrap();
    let response = app
        .router
        .oneshot(Request::get("/robots.txt").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
