//! Local axum server for fetch and scraper tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Html;
use axum::routing::{get, post};
use tokio::task::JoinHandle;

pub const LISTING: &str = r#"<html><head><title>Deals</title></head><body>
<ul>
  <li class="deal"><a href="/deal/1">Lamp</a><span class="price">$19.99</span></li>
  <li class="deal"><a href="/deal/2">Desk</a><span class="price">$129.00</span></li>
</ul>
</body></html>"#;

#[derive(Clone, Default)]
pub struct Hits {
	pub flaky: Arc<AtomicUsize>,
	pub down: Arc<AtomicUsize>,
	pub missing: Arc<AtomicUsize>,
}

impl Hits {
	pub fn get(counter: &AtomicUsize) -> usize {
		counter.load(Ordering::SeqCst)
	}
}

async fn listing() -> Html<&'static str> {
	Html(LISTING)
}

/// Fails twice with 503, then succeeds.
async fn flaky(State(hits): State<Hits>) -> (StatusCode, &'static str) {
	if hits.flaky.fetch_add(1, Ordering::SeqCst) < 2 {
		(StatusCode::SERVICE_UNAVAILABLE, "busy")
	} else {
		(StatusCode::OK, "<p>ready</p>")
	}
}

async fn down(State(hits): State<Hits>) -> (StatusCode, &'static str) {
	hits.down.fetch_add(1, Ordering::SeqCst);
	(StatusCode::TOO_MANY_REQUESTS, "slow down")
}

async fn missing(State(hits): State<Hits>) -> (StatusCode, &'static str) {
	hits.missing.fetch_add(1, Ordering::SeqCst);
	(StatusCode::NOT_FOUND, "<h1>not here</h1>")
}

async fn echo_header(headers: HeaderMap) -> String {
	headers.get("x-token").and_then(|value| value.to_str().ok()).unwrap_or("none").to_string()
}

async fn echo_body(body: String) -> String {
	format!("{{\"received\":{}}}", body.len())
}

pub struct TestServer {
	base: String,
	pub hits: Hits,
	handle: JoinHandle<()>,
}

impl TestServer {
	pub async fn start() -> Self {
		let hits = Hits::default();
		let app = Router::new()
			.route("/listing", get(listing))
			.route("/flaky", get(flaky))
			.route("/down", get(down))
			.route("/missing", get(missing))
			.route("/header", get(echo_header))
			.route("/echo", post(echo_body))
			.with_state(hits.clone());

		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind test server");
		let addr = listener.local_addr().expect("local addr");
		let handle = tokio::spawn(async move {
			axum::serve(listener, app).await.expect("serve");
		});

		Self {
			base: format!("http://{addr}"),
			hits,
			handle,
		}
	}

	pub fn url(&self, path: &str) -> String {
		format!("{}{path}", self.base)
	}

	pub fn shutdown(self) {
		self.handle.abort();
	}
}
