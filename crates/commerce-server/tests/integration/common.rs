use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::Response;
use http_body_util::BodyExt;
use tempfile::TempDir;

use commerce_core::models::{SkipPolicy, SourceKind};
use commerce_server::config::ServerConfig;
use commerce_server::routes;
use commerce_server::state::AppState;

pub const CATALOG_JSON: &str = r#"{"products": [
    {"name": "Linen Shirt", "price": "$68.00", "url": "https://shop.example.com/p/linen-shirt", "tags": ["shirts"]},
    {"name": "", "price": 10, "url": "https://shop.example.com/p/blank"},
    {"name": "Field Jacket", "price": 245, "url": "https://shop.example.com/p/field-jacket"}
]}"#;

pub const PLP_HTML: &str = r#"<html><body><ul>
  <li class="product-card" data-category="Sweaters"><a href="/p/crew"><span class="product-name">Cashmere crew</span></a><span class="price">$148.00</span></li>
  <li class="product-card"><a href="/p/vest"><span class="product-name">Sweater vest</span></a><span class="price">$79.50</span></li>
</ul></body></html>"#;

pub const ROBOTS: &str = "User-agent: *\nAllow: /commerce.txt\n";

pub struct TestApp {
    pub router: Router,
    pub dir: TempDir,
}

impl TestApp {
    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    pub fn source_path(&self) -> PathBuf {
        self.data_dir().join("listing.html")
    }

    pub fn output_path(&self) -> PathBuf {
        self.data_dir().join("commerce.txt")
    }
}

/// Router over a temp data dir holding a listing snapshot, a JSON catalog and robots.txt.
pub fn setup_test_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    std::fs::create_dir_all(data_dir.join("feeds")).unwrap();
    std::fs::write(data_dir.join("listing.html"), PLP_HTML).unwrap();
    std::fs::write(data_dir.join("feeds/catalog.json"), CATALOG_JSON).unwrap();
    std::fs::write(dir.path().join("robots.txt"), ROBOTS).unwrap();

    let config = ServerConfig {
        port: 0,
        data_dir: data_dir.clone(),
        source: data_dir.join("listing.html"),
        source_kind: SourceKind::HtmlSnapshot,
        output: data_dir.join("commerce.txt"),
        title: "Test sweaters".to_string(),
        robots: dir.path().join("robots.txt"),
        skip_policy: SkipPolicy::Skip,
    };

    let router = routes::router(Arc::new(AppState::new(config)));
    TestApp { router, dir }
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(body.to_vec()).unwrap()
}
