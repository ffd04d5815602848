use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use audify::executor::{BackingOff, Caching, Logging, Retrying, default_stack};
use audify::prelude::*;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BODY: &str = r#"{
    "status": 200,
    "message": "ok",
    "items": [
        {"title": "Mars rover wakes up", "duration": 120.5, "num_plays": 3},
        {"title": "Senate vote", "source_id": "npr"}
    ],
    "identifiers": {}
}"#;

fn response_cache() -> Arc<TtlCache<CapturedResponse>> {
    Arc::new(TtlCache::new(CacheConfig::default()))
}

fn client_for(server: &MockServer, attempts: u32) -> AudifyClient {
    let config = ClientConfig::new(format!("{}/streams/recent", server.uri()))
        .with_retry_attempts(attempts)
        .with_backoff(Duration::from_millis(10));
    AudifyClient::from_config(&config, response_cache()).unwrap()
}

#[tokio::test]
async fn search_sends_expected_query_and_decodes_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/streams/recent"))
        .and(query_param("duration", "1800"))
        .and(query_param("tag", "president trump,mars"))
        .respond_with(ResponseTemplate::new(200).set_body_string(BODY))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 3);
    let request = SearchRequest::tags(["president trump", "mars"]);

    let built = client.build_request(&request).unwrap();
    let url = built.url().as_str();
    assert!(url.contains("duration=1800&tag=president+trump%2Cmars"), "{url}");
    assert!(!url.contains("source="));

    let items = client.search(&Context::background(), &request).await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].title, "Mars rover wakes up");
    assert_eq!(items[0].duration, 120.5);
    assert_eq!(items[1].source_id, "npr");
}

#[tokio::test]
async fn repeated_search_is_served_from_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/streams/recent"))
        .respond_with(ResponseTemplate::new(200).set_body_string(BODY))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 3);
    let request = SearchRequest::tags(["mars"]).with_source("npr");

    let first = client.search(&Context::background(), &request).await.unwrap();
    let second = client.search(&Context::background(), &request).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn transient_failures_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(BODY))
        .mount(&server)
        .await;

    // Fails the first call, then forwards to the mock.
    struct FlakyOnce {
        calls: AtomicU32,
    }

    #[async_trait]
    impl Executor for FlakyOnce {
        async fn execute(
            &self,
            ctx: &Context,
            client: &reqwest::Client,
            request: &reqwest::Request,
        ) -> Result<CapturedResponse> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(AudifyError::HttpError("connection reset".into()));
            }
            HttpExecutor.execute(ctx, client, request).await
        }
    }

    let flaky = Arc::new(FlakyOnce {
        calls: AtomicU32::new(0),
    });
    let executor = ExecutorBuilder::from_shared(flaky.clone())
        .logging()
        .caching(response_cache())
        .backoff(Duration::from_millis(10))
        .retrying(3)
        .build();
    let client =
        AudifyClient::with_executor(&format!("{}/streams/recent", server.uri()), executor).unwrap();

    let items = client
        .search(&Context::background(), &SearchRequest::tags(["mars"]))
        .await
        .unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(flaky.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unreachable_upstream_exhausts_retries() {
    let cache = response_cache();
    let executor = default_stack(cache.clone(), 3, Duration::from_millis(10));
    // Nothing listens on port 1.
    let client = AudifyClient::with_executor("http://127.0.0.1:1/streams/recent", executor).unwrap();

    let err = client
        .search(&Context::background(), &SearchRequest::tags(["mars"]))
        .await
        .unwrap_err();

    let AudifyError::RetryExhausted(agg) = err else {
        panic!("expected retry aggregate, got {err:?}");
    };
    assert_eq!(agg.attempts, 3);
    assert_eq!(agg.errors.len(), 3);
    assert!(agg.errors.iter().all(|e| matches!(e, AudifyError::HttpError(_))));
    assert_eq!(agg.message, "failed to make request, made 3 attempts");
    assert!(cache.is_empty());
}

#[tokio::test]
async fn non_success_status_is_decoded_and_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(500).set_body_string(r#"{"status":500,"message":"boom"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, 3);
    for _ in 0..2 {
        let items = client
            .search(&Context::background(), &SearchRequest::tags(["mars"]))
            .await
            .unwrap();
        assert!(items.is_empty());
    }
}

struct Counting {
    calls: AtomicU32,
}

#[async_trait]
impl Executor for Counting {
    async fn execute(
        &self,
        _ctx: &Context,
        _client: &reqwest::Client,
        _request: &reqwest::Request,
    ) -> Result<CapturedResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AudifyError::InternalError("must not be reached".into()))
    }
}

type Wrap = fn(Arc<dyn Executor>) -> Arc<dyn Executor>;

fn logging_layer(inner: Arc<dyn Executor>) -> Arc<dyn Executor> {
    Arc::new(Logging::new(inner))
}

fn caching_layer(inner: Arc<dyn Executor>) -> Arc<dyn Executor> {
    Arc::new(Caching::new(inner, response_cache()))
}

fn backoff_layer(inner: Arc<dyn Executor>) -> Arc<dyn Executor> {
    Arc::new(BackingOff::new(inner, Duration::from_secs(1)))
}

fn retrying_layer(inner: Arc<dyn Executor>) -> Arc<dyn Executor> {
    Arc::new(Retrying::new(inner, 3))
}

fn http_layer(_inner: Arc<dyn Executor>) -> Arc<dyn Executor> {
    Arc::new(HttpExecutor)
}

#[tokio::test]
async fn cancelled_context_stops_every_layer() {
    let cancelled = Context::background();
    cancelled.cancel();
    let request = reqwest::Request::new(
        reqwest::Method::GET,
        reqwest::Url::parse("https://www.example.com/").unwrap(),
    );
    let http = reqwest::Client::new();

    let layers = [
        ("logging", logging_layer as Wrap),
        ("caching", caching_layer as Wrap),
        ("backoff", backoff_layer as Wrap),
        ("retrying", retrying_layer as Wrap),
        ("http", http_layer as Wrap),
    ];

    for (name, wrap) in layers {
        let counting = Arc::new(Counting {
            calls: AtomicU32::new(0),
        });
        let layer = wrap(counting.clone());

        let err = layer.execute(&cancelled, &http, &request).await.unwrap_err();
        assert_eq!(err, AudifyError::Cancelled, "{name}");
        assert_eq!(counting.calls.load(Ordering::SeqCst), 0, "{name}");
    }
}
