use std::{
	io::{BufRead, BufReader, Read, Write},
	net::{TcpListener, TcpStream},
	sync::{
		Arc,
		atomic::{AtomicU32, Ordering},
	},
	thread,
};

use reqwest::header::{AUTHORIZATION, HeaderName};
use serde_json::{Map, Value};

/// Answers every request with 503 and counts the connections it served.
fn unavailable_upstream() -> (String, Arc<AtomicU32>) {
	let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind listener.");
	let addr = listener.local_addr().expect("Failed to read listener address.");
	let hits = Arc::new(AtomicU32::new(0));
	let counter = hits.clone();

	thread::spawn(move || {
		for stream in listener.incoming() {
			let Ok(stream) = stream else { break };

			counter.fetch_add(1, Ordering::SeqCst);
			answer_unavailable(stream);
		}
	});

	(format!("http://{addr}"), hits)
}

fn answer_unavailable(mut stream: TcpStream) {
	let mut reader = BufReader::new(&mut stream);
	let mut content_length = 0;
	let mut line = String::new();

	while reader.read_line(&mut line).is_ok_and(|read| read > 0) {
		if line == "\r\n" {
			break;
		}
		if let Some((name, value)) = line.split_once(':')
			&& name.eq_ignore_ascii_case("content-length")
		{
			content_length = value.trim().parse().unwrap_or(0);
		}

		line.clear();
	}

	let mut body = vec![0; content_length];
	let _ = reader.read_exact(&mut body);
	let _ = stream.write_all(
		b"HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
	);
}

#[test]
fn builds_bearer_auth_header() {
	let headers =
		fex_providers::auth_headers("secret", &Map::new()).expect("Failed to build headers.");
	let value = headers.get(AUTHORIZATION).expect("Missing authorization header.");

	assert_eq!(value, "Bearer secret");
}

#[test]
fn copies_default_headers() {
	let mut defaults = Map::new();

	defaults.insert("x-tenant".to_string(), Value::String("fair".to_string()));

	let headers = fex_providers::auth_headers("secret", &defaults).expect("Failed to build headers.");

	assert_eq!(headers.get(HeaderName::from_static("x-tenant")).expect("Missing header."), "fair");
}

#[test]
fn rejects_non_string_default_headers() {
	let mut defaults = Map::new();

	defaults.insert("x-retries".to_string(), Value::from(3));

	let err = fex_providers::auth_headers("secret", &defaults).expect_err("Expected an error.");

	assert!(matches!(err, fex_providers::Error::InvalidConfig { .. }));
	assert!(!err.is_transient());
}

#[tokio::test]
async fn transient_upstream_errors_are_retried_once() {
	let (api_base, hits) = unavailable_upstream();
	let cfg = fex_config::EmbeddingProviderConfig {
		provider_id: "local".to_string(),
		api_base,
		api_key: "secret".to_string(),
		path: "/v1/embeddings".to_string(),
		model: "test-embed".to_string(),
		dimensions: 3,
		timeout_ms: 5_000,
		default_headers: Map::new(),
	};
	let err = fex_providers::embedding::embed(&cfg, &["LED".to_string()])
		.await
		.expect_err("Expected the upstream error to surface.");

	assert!(err.is_transient());
	assert_eq!(hits.load(Ordering::SeqCst), fex_providers::MAX_ATTEMPTS);
}
