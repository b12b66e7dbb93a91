use super::*;
use crate::registry::Registry;
use pulse_core::{Instance, Operation};
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn instance() -> Instance {
    Instance::builder("payments", "payments-7")
        .host("10.1.2.3")
        .port(7443)
        .meta("region", "us-east")
        .meta("version", "2.4.1")
        .build()
        .unwrap()
}

fn key_body() -> serde_json::Value {
    json!({"serviceName": "payments", "instanceID": "payments-7"})
}

async fn setup() -> (MockServer, HttpRegistry) {
    let _ = env_logger::builder().is_test(true).try_init();
    let server = MockServer::start().await;
    let registry = HttpRegistry::new(RegistryConfig::new(server.uri())).expect("registry");
    (server, registry)
}

#[tokio::test]
async fn test_register_sends_full_instance() {
    let (server, registry) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/register"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "serviceName": "payments",
            "instanceID": "payments-7",
            "host": "10.1.2.3",
            "port": 7443,
            "metadata": {"region": "us-east", "version": "2.4.1"},
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    registry
        .register(&instance(), &CancellationToken::new())
        .await
        .expect("register");
}

#[tokio::test]
async fn test_register_conflict_is_not_retried() {
    let (server, registry) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/register"))
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&server)
        .await;

    let err = registry
        .register(&instance(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.operation(), Some(Operation::Register));
    assert_eq!(err.status(), Some(409));
    assert!(err.to_string().contains("409"));
}

#[tokio::test]
async fn test_register_requires_created() {
    let (server, registry) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/register"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let err = registry
        .register(&instance(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(200));
}

#[tokio::test]
async fn test_heartbeat_sends_identity_only() {
    let (server, registry) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/heartbeat"))
        .and(header("content-type", "application/json"))
        .and(body_json(key_body()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    registry
        .heartbeat(&instance().key(), &CancellationToken::new())
        .await
        .expect("heartbeat");
}

#[tokio::test]
async fn test_deregister_sends_identity_only() {
    let (server, registry) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/deregister"))
        .and(body_json(key_body()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    registry
        .deregister(&instance().key(), &CancellationToken::new())
        .await
        .expect("deregister");
}

#[tokio::test]
async fn test_deregister_not_found_is_surfaced() {
    let (server, registry) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/deregister"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = registry
        .deregister(&instance().key(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.operation(), Some(Operation::Deregister));
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_base_url_prefix_is_kept() {
    let _ = env_logger::builder().is_test(true).try_init();
    let server = MockServer::start().await;
    let registry = HttpRegistry::new(RegistryConfig::new(format!("{}/registry/", server.uri()))).unwrap();

    Mock::given(method("PUT"))
        .and(path("/registry/api/heartbeat"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    registry
        .heartbeat(&instance().key(), &CancellationToken::new())
        .await
        .expect("heartbeat");
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let _ = env_logger::builder().is_test(true).try_init();
    let server = MockServer::start().await;
    let config = RegistryConfig::new(server.uri()).with_timeout(Duration::from_millis(100));
    let registry = HttpRegistry::new(config).unwrap();

    Mock::given(method("PUT"))
        .and(path("/api/heartbeat"))
        .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let err = registry
        .heartbeat(&instance().key(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.operation(), Some(Operation::Heartbeat));
    assert!(err.is_transport());
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_cancel_aborts_in_flight_call() {
    let (server, registry) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/register"))
        .respond_with(ResponseTemplate::new(201).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let err = registry.register(&instance(), &cancel).await.unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(2));
    assert!(err.is_transport());
    assert!(err.to_string().contains("cancelled"));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // 先占用一个端口再释放，保证无人监听
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let uri = format!("http://127.0.0.1:{}", port);
    let registry = HttpRegistry::new(RegistryConfig::new(uri)).unwrap();

    let err = registry
        .heartbeat(&instance().key(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.is_transport());
}

#[test]
fn test_config_validation() {
    assert!(RegistryConfig::default().validate().is_ok());
    assert!(RegistryConfig::new("not a url").validate().is_err());
    assert!(RegistryConfig::new("ftp://registry").validate().is_err());
    assert!(RegistryConfig::default()
        .with_timeout(Duration::ZERO)
        .validate()
        .is_err());
    assert!(RegistryConfig::default()
        .with_heartbeat_interval(Duration::ZERO)
        .validate()
        .is_err());
    assert_eq!(RegistryConfig::default().timeout, Duration::from_secs(5));
}

#[test]
fn test_config_url_join() {
    let config = RegistryConfig::new("http://registry:8500/");
    assert_eq!(config.url(REGISTER_PATH), "http://registry:8500/api/register");
}
