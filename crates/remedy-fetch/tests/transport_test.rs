use remedy_core::{AdvisoryUrl, FetchConfig};
use remedy_fetch::{
    FetchFailure, HttpTransport, ReqwestTransport, RetryingFetcher, TransportRequest,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{headers, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport_request(url: String) -> TransportRequest {
    TransportRequest {
        url,
        headers: BTreeMap::from([("accept-language".to_string(), "en-US,en;q=0.9".to_string())]),
        timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn test_reqwest_transport_returns_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/advisory"))
        .and(headers("accept-language", vec!["en-US", "en;q=0.9"]))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>advisory</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let response = ReqwestTransport::new()
        .execute(&transport_request(format!("{}/advisory", server.uri())), None)
        .await
        .expect("execute");

    assert_eq!(response.status, 200);
    assert_eq!(response.body, "<html>advisory</html>");
    assert!(response.session.is_some());
}

#[tokio::test]
async fn test_reqwest_transport_passes_error_statuses_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let response = ReqwestTransport::new()
        .execute(&transport_request(format!("{}/missing", server.uri())), None)
        .await
        .expect("non-2xx is not a transport error");

    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn test_fetcher_against_forbidden_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/blocked"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = RetryingFetcher::new(Arc::new(ReqwestTransport::new()), &FetchConfig::default());
    let url = AdvisoryUrl::parse(format!("{}/blocked", server.uri())).expect("url");

    let result = fetcher
        .fetch(&fetcher.request_for(&url), &CancellationToken::new())
        .await;

    assert!(!result.success);
    assert_eq!(result.failure, Some(FetchFailure::Forbidden));
    assert_eq!(result.attempts, 1);
}
