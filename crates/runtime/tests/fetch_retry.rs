//! Retry and response behaviour of the fetcher against a local server.

mod test_server;

use std::time::Duration;

use quarry_runtime::{FetchError, FetchOptions, Fetcher, Method};
use test_server::{Hits, TestServer};

fn fast(retries: u32) -> FetchOptions {
	FetchOptions::default()
		.retries(retries)
		.backoff(Duration::from_millis(1), Duration::from_millis(5))
		.timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn retries_server_errors_until_success() {
	let server = TestServer::start().await;
	let response = Fetcher::new().fetch(&server.url("/flaky"), &fast(2)).await.expect("fetch should succeed");

	assert_eq!(response.status(), 200);
	assert_eq!(Hits::get(&server.hits.flaky), 3);
	assert_eq!(response.text().await.unwrap(), "<p>ready</p>");
	server.shutdown();
}

#[tokio::test]
async fn last_retryable_response_is_returned() {
	let server = TestServer::start().await;
	let response = Fetcher::new().fetch(&server.url("/down"), &fast(1)).await.expect("response expected");

	assert_eq!(response.status(), 429);
	assert_eq!(Hits::get(&server.hits.down), 2);
	server.shutdown();
}

#[tokio::test]
async fn client_errors_are_not_retried() {
	let server = TestServer::start().await;
	let response = Fetcher::new().fetch(&server.url("/missing"), &fast(3)).await.expect("response expected");

	assert_eq!(response.status(), 404);
	assert!(!response.is_success());
	assert_eq!(Hits::get(&server.hits.missing), 1);
	server.shutdown();
}

#[tokio::test]
async fn transport_errors_exhaust_retries() {
	let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
	let addr = listener.local_addr().unwrap();
	drop(listener);

	let err = Fetcher::new().fetch(&format!("http://{addr}/"), &fast(1)).await.unwrap_err();
	assert!(matches!(err, FetchError::RetriesExhausted { attempts: 2, .. }), "{err}");
}

#[tokio::test]
async fn sends_headers_and_body() {
	let server = TestServer::start().await;
	let fetcher = Fetcher::new();

	let response = fetcher.fetch(&server.url("/header"), &fast(0).header("X-Token", "abc")).await.unwrap();
	assert_eq!(response.text().await.unwrap(), "abc");

	let response = fetcher.fetch(&server.url("/echo"), &fast(0).method(Method::Post).body("hello")).await.unwrap();
	let json: serde_json::Value = response.json().await.unwrap();
	assert_eq!(json["received"], 5);

	assert_eq!(fetcher.pool().len(), 1);
	server.shutdown();
}

#[tokio::test]
async fn exposes_headers_and_url() {
	let server = TestServer::start().await;
	let response = Fetcher::new().fetch(&server.url("/listing"), &fast(0)).await.unwrap();

	assert!(response.header("content-type").is_some_and(|value| value.starts_with("text/html")));
	assert_eq!(response.url().path(), "/listing");
	assert!(!response.bytes().await.unwrap().is_empty());
	server.shutdown();
}
