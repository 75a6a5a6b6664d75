use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a mock crt.sh server that answers `GET /?q=<domain>` with `html`.
///
/// Requests must carry the configured User-Agent header to match.
pub async fn mock_crtsh_page(domain: &str, user_agent: &str, html: &str) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("q", domain))
        .and(header("user-agent", user_agent))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html.to_string())
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .expect(1)
        .mount(&server)
        .await;

    server
}

/// Creates a mock HTTP server that delays responses to simulate network timeouts.
///
/// The server will wait for `delay_ms` milliseconds before responding with a 200 OK.
pub async fn mock_timeout_server(delay_ms: u64) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("delayed response")
                .set_delay(Duration::from_millis(delay_ms)),
        )
        .mount(&server)
        .await;

    server
}

/// Creates a mock HTTP server that returns the specified HTTP error status code.
pub async fn mock_error_server(status_code: u16) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(status_code))
        .mount(&server)
        .await;

    server
}
