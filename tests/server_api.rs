//! HTTP API against an SNMP agent on a loopback UDP socket.
#![cfg(feature = "server")]

mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use common::{COMMUNITY, FakeAgent, switch_mib};
use dot1q_discovery::server::{AppState, ServerSettings, create_routes};
use dot1q_discovery::transport::SharedUdpTransport;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn app() -> (Router, AppState) {
    let transport = SharedUdpTransport::bind("127.0.0.1:0").await.unwrap();
    let state = AppState::new(transport, ServerSettings::default());
    (create_routes(state.clone()), state)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn trunk_ports_as_json_and_lld() {
    let agent = FakeAgent::start(switch_mib(), COMMUNITY).await;
    let (app, state) = app().await;

    let (status, body) = get(app.clone(), &format!("/trunkports?host={}", agent.addr())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            { "interface_index": 53, "interface_name": "Po1" },
            { "interface_index": 54, "interface_name": "Po2" }
        ])
    );

    let requests = agent.request_count();
    let (status, body) = get(
        app,
        &format!("/trunkports?host={}&community=public&format=lld", agent.addr()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "data": [
            { "{#IFINDEX}": 53, "{#IFNAME}": "Po1" },
            { "{#IFINDEX}": 54, "{#IFNAME}": "Po2" }
        ]})
    );
    // Second query is answered from the cache.
    assert_eq!(agent.request_count(), requests);
    assert_eq!(state.cache.len(), 3);
}

#[tokio::test]
async fn static_vlans_keyed_by_vlan_id() {
    let agent = FakeAgent::start(switch_mib(), COMMUNITY).await;
    let (app, _) = app().await;

    let (status, body) = get(app, &format!("/staticvlans?host={}", agent.addr())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["20"],
        json!({
            "name": "voice",
            "access_ports": [],
            "access_trunks": [],
            "tagged_ports": ["Gi0/11", "Gi0/12"],
            "tagged_trunks": ["Po1"]
        })
    );
    let keys: Vec<&String> = body.as_object().unwrap().keys().collect();
    assert_eq!(keys, ["1", "20", "30"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn repeated_queries_on_multi_thread_runtime() {
    let agent = FakeAgent::start(switch_mib(), COMMUNITY).await;
    let (app, _) = app().await;

    for _ in 0..50 {
        let (status, body) = get(app.clone(), &format!("/staticvlans?host={}", agent.addr())).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body.as_object().unwrap().len(), 3);
    }
}
