//! Integration tests for the write path using wiremock upstreams and the
//! in-process store backend.

use std::sync::Arc;
use std::time::Duration;

use hotspot_collector::{
    CollectionJob, Collector, CollectorError, HotApiClient, PlatformRegistry, RegistryError,
    RetryPolicy,
};
use hotspot_core::{Clock, ManualClock, PlatformConfig, PlatformRoute};
use hotspot_store::{CacheKeys, KvBackend, MemoryBackend, TopicStore};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NOW: i64 = 1_760_000_000;
const WEEK: i64 = 604_800;

struct Harness {
    clock: Arc<ManualClock>,
    backend: Arc<MemoryBackend>,
    store: Arc<TopicStore>,
    client: Arc<HotApiClient>,
}

fn harness(server: &MockServer) -> Harness {
    let clock = Arc::new(ManualClock::new(NOW));
    let backend = Arc::new(MemoryBackend::new(clock.clone()));
    let store = Arc::new(TopicStore::new(
        backend.clone(),
        CacheKeys::new("test"),
        clock.clone(),
    ));
    let client = Arc::new(
        HotApiClient::with_base_url(&server.uri(), 5).expect("client construction should not fail"),
    );
    Harness {
        clock,
        backend,
        store,
        client,
    }
}

fn no_delay() -> RetryPolicy {
    RetryPolicy::new(3, 0)
}

fn collector(h: &Harness) -> Collector {
    let clock: Arc<dyn Clock> = h.clock.clone();
    Collector::new(h.client.clone(), clock, no_delay())
}

fn registry(h: &Harness) -> PlatformRegistry {
    PlatformRegistry::new(h.client.clone(), h.store.clone(), no_delay(), WEEK)
}

fn platform_config(names: &[&str]) -> PlatformConfig {
    let routes = names
        .iter()
        .map(|name| PlatformRoute {
            name: Some((*name).to_string()),
            path: Some(format!("/{name}")),
        })
        .collect();
    PlatformConfig::from_routes(routes, NOW).0
}

async fn mount_platform(server: &MockServer, name: &str, data: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/{name}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200, "data": data})))
        .mount(server)
        .await;
}

async fn mount_routes(server: &MockServer, names: &[&str]) {
    let routes: Vec<_> = names
        .iter()
        .map(|n| json!({"name": n, "path": format!("/{n}")}))
        .collect();
    Mock::given(method("GET"))
        .and(path("/all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200, "routes": routes})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn failed_platform_is_excluded_not_fatal() {
    let server = MockServer::start().await;
    mount_platform(&server, "weibo", json!([{"title": "one", "hot": 5}, {"title": "  "}])).await;
    mount_platform(&server, "zhihu", json!([{"title": "two", "hot": "7"}])).await;
    Mock::given(method("GET"))
        .and(path("/douyin"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let h = harness(&server);
    let outcome = collector(&h)
        .fetch_all(&platform_config(&["weibo", "zhihu", "douyin"]))
        .await
        .expect("partial success");

    assert_eq!(outcome.topics.len(), 2);
    assert_eq!(outcome.succeeded.len(), 2);
    assert_eq!(outcome.succeeded[0].platform, "weibo");
    assert_eq!(outcome.succeeded[0].count, 1);
    assert_eq!(outcome.failed_names(), vec!["douyin"]);
    assert!(outcome.topics.iter().all(|t| t.fetch_time == NOW));
}

#[tokio::test]
async fn envelope_code_other_than_200_is_a_failure() {
    let server = MockServer::start().await;
    mount_platform(&server, "weibo", json!([{"title": "one"}])).await;
    Mock::given(method("GET"))
        .and(path("/baidu"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 500, "data": [{"title": "x"}]})))
        .expect(3)
        .mount(&server)
        .await;

    let h = harness(&server);
    let outcome = collector(&h)
        .fetch_all(&platform_config(&["weibo", "baidu"]))
        .await
        .expect("partial success");
    assert_eq!(outcome.failed_names(), vec!["baidu"]);
    assert!(outcome.failed[0].error.contains("code"));
}

#[tokio::test]
async fn malformed_json_is_a_failure() {
    let server = MockServer::start().await;
    mount_platform(&server, "weibo", json!([{"title": "one"}])).await;
    Mock::given(method("GET"))
        .and(path("/baidu"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let h = harness(&server);
    let outcome = collector(&h)
        .fetch_all(&platform_config(&["weibo", "baidu"]))
        .await
        .expect("partial success");
    assert_eq!(outcome.failed_names(), vec!["baidu"]);
}

#[tokio::test]
async fn all_platforms_failing_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let h = harness(&server);
    let err = collector(&h)
        .fetch_all(&platform_config(&["a", "b"]))
        .await
        .expect_err("nothing succeeded");
    match err {
        CollectorError::NoPlatformSucceeded { failed } => assert_eq!(failed, vec!["a", "b"]),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn empty_config_is_an_error() {
    let server = MockServer::start().await;
    let h = harness(&server);
    let err = collector(&h)
        .fetch_all(&platform_config(&[]))
        .await
        .expect_err("no platforms");
    assert!(matches!(err, CollectorError::NoPlatforms));
}

#[tokio::test]
async fn slow_platform_hits_the_deadline() {
    let server = MockServer::start().await;
    mount_platform(&server, "fast", json!([{"title": "quick"}])).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"code": 200, "data": []}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let h = harness(&server);
    let outcome = collector(&h)
        .with_platform_timeout(Duration::from_millis(200))
        .fetch_all(&platform_config(&["fast", "slow"]))
        .await
        .expect("fast platform succeeds");
    assert_eq!(outcome.failed_names(), vec!["slow"]);
    assert!(outcome.failed[0].error.contains("timed out"));
}

#[tokio::test]
async fn api_key_is_sent_as_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weibo"))
        .and(header("authorization", "Bearer secret-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200, "data": [{"title": "t"}]})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HotApiClient::with_api_key(&server.uri(), "secret-key", 5)
        .expect("client construction should not fail");
    let topics = client.fetch_platform("/weibo").await.expect("authorized");
    assert_eq!(topics.len(), 1);
}

#[tokio::test]
async fn refresh_drops_reserved_and_blank_routes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 200,
            "routes": [
                {"name": "weibo", "path": "/weibo"},
                {"name": "all", "path": "/all"},
                {"name": "config", "path": "/config"},
                {"name": "", "path": "/x"},
                {"path": "/y"},
                "garbage"
            ]
        })))
        .mount(&server)
        .await;

    let h = harness(&server);
    let config = registry(&h).refresh().await.expect("refresh");
    assert_eq!(config.len(), 1);
    assert!(config.platforms.contains_key("weibo"));

    let cached = h.store.load_platform_config().await.expect("load");
    assert_eq!(cached, Some(config));
}

#[tokio::test]
async fn refresh_with_no_valid_routes_fails() {
    let server = MockServer::start().await;
    mount_routes(&server, &["all", "config"]).await;

    let h = harness(&server);
    let err = registry(&h).refresh().await.expect_err("nothing usable");
    assert!(matches!(err, RegistryError::NoValidRoutes { rejected: 2 }));
}

#[tokio::test]
async fn load_uses_fresh_cache_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/all"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let h = harness(&server);
    let cached = platform_config(&["weibo"]);
    h.store.save_platform_config(&cached).await.expect("seed");

    let loaded = registry(&h).load().await.expect("cached");
    assert_eq!(loaded, cached);
}

#[tokio::test]
async fn load_falls_back_to_stale_cache_when_refresh_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/all"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let h = harness(&server);
    let cached = platform_config(&["weibo"]);
    h.store.save_platform_config(&cached).await.expect("seed");
    h.clock.advance(WEEK + 1);

    let loaded = registry(&h).load().await.expect("stale fallback");
    assert_eq!(loaded, cached);
}

#[tokio::test]
async fn load_fails_when_nothing_cached_and_refresh_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/all"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let h = harness(&server);
    let err = registry(&h).load().await.expect_err("no mapping");
    assert!(matches!(err, RegistryError::Upstream(_)));
}

#[tokio::test]
async fn stale_cache_is_refreshed() {
    let server = MockServer::start().await;
    mount_routes(&server, &["weibo", "zhihu"]).await;

    let h = harness(&server);
    h.store
        .save_platform_config(&platform_config(&["weibo"]))
        .await
        .expect("seed");
    h.clock.advance(WEEK);

    let loaded = registry(&h).load().await.expect("refreshed");
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.update_time, NOW + WEEK);
}

#[tokio::test]
async fn duplicate_title_across_platforms_is_stored_once() {
    let server = MockServer::start().await;
    mount_routes(&server, &["alpha", "beta", "gamma"]).await;
    mount_platform(&server, "alpha", json!([{"title": "A", "hot": 100}])).await;
    mount_platform(&server, "beta", json!([{"title": "A", "hot": 50}])).await;
    mount_platform(&server, "gamma", json!([{"title": "B", "hot": 10}])).await;

    let h = harness(&server);
    let job = CollectionJob::new(registry(&h), collector(&h), h.store.clone());
    let report = job
        .run_cycle()
        .await
        .expect("cycle")
        .expect("not skipped");

    assert_eq!(report.platforms, 3);
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.fetched, 3);
    assert_eq!(report.written, 2);

    let topic_keys = h.backend.scan_keys("test:topic:*").await.expect("scan");
    assert_eq!(topic_keys.len(), 2);

    let platforms = h.store.all_platforms().await.expect("platforms");
    assert_eq!(platforms, vec!["alpha", "gamma"]);
    let a = h.store.platform_topics("alpha").await.expect("alpha");
    assert_eq!(a[0].hot, Some(100));
}

#[tokio::test]
async fn total_failure_records_failed_platforms() {
    let server = MockServer::start().await;
    mount_routes(&server, &["alpha", "beta"]).await;
    Mock::given(method("GET"))
        .and(path("/alpha"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/beta"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let h = harness(&server);
    let job = CollectionJob::new(registry(&h), collector(&h), h.store.clone());
    let err = job.run_cycle().await.expect_err("total failure");
    assert!(matches!(err, CollectorError::NoPlatformSucceeded { .. }));

    let stats = h.store.stats().await.expect("stats").expect("recorded");
    assert_eq!(stats.failed_platforms, vec!["alpha", "beta"]);
}

#[tokio::test]
async fn overlapping_cycles_are_skipped() {
    let server = MockServer::start().await;
    mount_routes(&server, &["slow"]).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"code": 200, "data": [{"title": "t"}]}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let h = harness(&server);
    let job = CollectionJob::new(registry(&h), collector(&h), h.store.clone());
    let (first, second) = tokio::join!(job.run_cycle(), job.run_cycle());

    let first = first.expect("first cycle");
    let second = second.expect("second cycle");
    assert!(first.is_some() != second.is_some(), "exactly one cycle runs");
}
