//! End-to-end routing: local chain versus upstream fallback.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::Path,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect},
    routing::get,
    Router,
};

mod common;
use common::EchoedRequest;

fn local_chain() -> Router {
    Router::new()
        .route("/api", get(|| async { "api root" }))
        .route("/api/status", get(|| async { (StatusCode::CREATED, "made locally") }))
        .route(
            "/api/item/{id}",
            get(|Path(id): Path<u32>| async move { format!("local-{id}") }),
        )
}

#[tokio::test]
async fn test_redirect_scenario() {
    // Upstream that counts how often it is contacted.
    let upstream_hits = Arc::new(AtomicUsize::new(0));
    let hits = upstream_hits.clone();
    let upstream = common::start_app_backend(Router::new().fallback(move || {
        let hits = hits.clone();
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            "Outsource Backend response\n"
        }
    }))
    .await;

    let local_backend = common::start_app_backend(
        Router::new().fallback(|| async { "Local Backend response\n" }),
    )
    .await;
    let local_url = format!("http://{}/", local_backend);

    // Local chain redirects everything it receives to the local backend.
    let redirect_to = local_url.clone();
    let local = Router::new().fallback(move || {
        let target = redirect_to.clone();
        async move { Redirect::temporary(&target) }
    });

    let gateway = common::start_gateway(common::gateway_config(upstream), local).await;
    let client = common::client();

    // "/" is not under /api, so the upstream answers.
    let res = client.get(gateway.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "Outsource Backend response\n");
    assert_eq!(upstream_hits.load(Ordering::SeqCst), 1);

    // "/api/" stays local: the redirect is returned as-is, upstream untouched.
    let res = client.get(gateway.url("/api/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = res.headers()["location"].to_str().unwrap().to_string();
    assert_eq!(location, local_url);
    assert_eq!(upstream_hits.load(Ordering::SeqCst), 1);

    let followed = client.get(&location).send().await.unwrap();
    assert_eq!(followed.text().await.unwrap(), "Local Backend response\n");
}

#[tokio::test]
async fn test_local_responses_pass_through_unmodified() {
    let upstream = common::start_app_backend(common::echo_router()).await;
    let gateway = common::start_gateway(common::gateway_config(upstream), local_chain()).await;
    let client = common::client();

    let res = client.get(gateway.url("/api/status")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(res.text().await.unwrap(), "made locally");

    let res = client.get(gateway.url("/api")).send().await.unwrap();
    assert_eq!(res.text().await.unwrap(), "api root");

    // Unknown local path: the local router's own 404, not the upstream.
    let res = client.get(gateway.url("/api/nope")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_lookalike_prefix_is_proxied() {
    let upstream = common::start_app_backend(common::echo_router()).await;
    let gateway = common::start_gateway(common::gateway_config(upstream), local_chain()).await;

    let res = common::client().get(gateway.url("/apicola")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let echoed: EchoedRequest = res.json().await.unwrap();
    assert_eq!(echoed.uri, "/apicola");
}

#[tokio::test]
async fn test_upstream_status_and_body_pass_through() {
    let upstream = common::start_app_backend(
        Router::new()
            .route("/teapot", get(|| async { (StatusCode::IM_A_TEAPOT, "short and stout") }))
            .route(
                "/missing",
                get(|| async { (StatusCode::NOT_FOUND, [("x-origin", "legacy")], "not here") }),
            ),
    )
    .await;
    let gateway = common::start_gateway(common::gateway_config(upstream), local_chain()).await;
    let client = common::client();

    let res = client.get(gateway.url("/teapot")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(res.text().await.unwrap(), "short and stout");

    let res = client.get(gateway.url("/missing")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.headers()["x-origin"], "legacy");
    assert_eq!(res.text().await.unwrap(), "not here");
}

#[tokio::test]
async fn test_method_path_and_query_are_verbatim() {
    let upstream = common::start_app_backend(common::echo_router()).await;
    let gateway = common::start_gateway(common::gateway_config(upstream), local_chain()).await;
    let client = common::client();

    let res = client
        .get(gateway.url("/posts/2024/hello/?page=2&q=a%20b"))
        .send()
        .await
        .unwrap();
    let echoed: EchoedRequest = res.json().await.unwrap();
    assert_eq!(echoed.method, "GET");
    assert_eq!(echoed.uri, "/posts/2024/hello/?page=2&q=a%20b");

    for method in [reqwest::Method::PUT, reqwest::Method::DELETE, reqwest::Method::PATCH] {
        let res = client
            .request(method.clone(), gateway.url("/resource"))
            .body("data")
            .send()
            .await
            .unwrap();
        let echoed: EchoedRequest = res.json().await.unwrap();
        assert_eq!(echoed.method, method.as_str());
        assert_eq!(echoed.body, "data");
    }
}

#[tokio::test]
async fn test_request_headers_are_rewritten_for_the_hop() {
    let upstream = common::start_app_backend(common::echo_router()).await;
    let gateway = common::start_gateway(common::gateway_config(upstream), local_chain()).await;

    let mut headers = HeaderMap::new();
    headers.insert("connection", HeaderValue::from_static("x-hop-secret"));
    headers.insert("x-hop-secret", HeaderValue::from_static("1"));
    headers.insert("proxy-authorization", HeaderValue::from_static("Basic Zm9vOmJhcg=="));
    headers.insert("authorization", HeaderValue::from_static("Bearer end-to-end"));
    headers.insert("x-custom", HeaderValue::from_static("kept"));

    let res = common::client()
        .get(gateway.url("/headers"))
        .headers(headers)
        .send()
        .await
        .unwrap();
    let echoed: EchoedRequest = res.json().await.unwrap();
    let seen = &echoed.headers;

    assert!(!seen.contains_key("x-hop-secret"));
    assert!(!seen.contains_key("proxy-authorization"));
    assert_eq!(seen["authorization"], "Bearer end-to-end");
    assert_eq!(seen["x-custom"], "kept");

    assert_eq!(seen["host"], upstream.to_string());
    assert_eq!(seen["x-forwarded-host"], gateway.addr.to_string());
    assert_eq!(seen["x-forwarded-for"], "127.0.0.1");
    assert_eq!(seen["x-forwarded-proto"], "http");
    assert!(seen.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_forwarded_headers_can_be_disabled() {
    let upstream = common::start_app_backend(common::echo_router()).await;
    let mut config = common::gateway_config(upstream);
    config.upstream.forwarded_headers = false;
    config.upstream.pool_idle_per_host = 0;
    let gateway = common::start_gateway(config, local_chain()).await;

    let res = common::client().get(gateway.url("/plain")).send().await.unwrap();
    let echoed: EchoedRequest = res.json().await.unwrap();
    assert!(!echoed.headers.contains_key("x-forwarded-for"));
    assert!(!echoed.headers.contains_key("x-forwarded-host"));
    assert_eq!(echoed.headers["host"], upstream.to_string());
}

#[tokio::test]
async fn test_response_hop_by_hop_headers_are_stripped() {
    let upstream = common::start_app_backend(Router::new().route(
        "/hop",
        get(|| async {
            (
                [
                    ("connection", "x-private"),
                    ("x-private", "secret"),
                    ("keep-alive", "timeout=5"),
                    ("x-public", "ok"),
                ],
                "body",
            )
                .into_response()
        }),
    ))
    .await;
    let gateway = common::start_gateway(common::gateway_config(upstream), local_chain()).await;

    let res = common::client().get(gateway.url("/hop")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get("x-private").is_none());
    assert!(res.headers().get("keep-alive").is_none());
    assert_eq!(res.headers()["x-public"], "ok");
    assert_eq!(res.text().await.unwrap(), "body");
}

#[tokio::test]
async fn test_large_body_round_trip() {
    let upstream = common::start_app_backend(common::echo_router()).await;
    let gateway = common::start_gateway(common::gateway_config(upstream), local_chain()).await;

    let payload: Vec<u8> = (0..4 * 1024 * 1024u32).map(|i| (i.wrapping_mul(31) % 251) as u8).collect();

    let res = common::client()
        .post(gateway.url("/upload"))
        .body(payload.clone())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let returned = res.bytes().await.unwrap();
    assert_eq!(returned.len(), payload.len());
    assert!(returned[..] == payload[..], "body bytes differ after round trip");
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let upstream = common::start_app_backend(common::echo_router()).await;
    let gateway = common::start_gateway(common::gateway_config(upstream), local_chain()).await;
    let client = common::client();

    let res = client
        .get(gateway.url("/traced"))
        .header("x-request-id", "given-id-42")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "given-id-42");
    let echoed: EchoedRequest = res.json().await.unwrap();
    assert_eq!(echoed.headers["x-request-id"], "given-id-42");

    let res = client.get(gateway.url("/api")).send().await.unwrap();
    let generated = res.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok());
}

#[tokio::test]
async fn test_concurrent_mixed_requests_do_not_cross_talk() {
    let upstream = common::start_app_backend(common::echo_router()).await;
    let gateway = Arc::new(
        common::start_gateway(common::gateway_config(upstream), local_chain()).await,
    );
    let client = common::client();

    let mut tasks = Vec::new();
    for i in 0..60u32 {
        let client = client.clone();
        let gateway = gateway.clone();
        tasks.push(tokio::spawn(async move {
            match i % 3 {
                0 => {
                    let res = client.get(gateway.url(&format!("/api/item/{i}"))).send().await.unwrap();
                    assert_eq!(res.text().await.unwrap(), format!("local-{i}"));
                }
                1 => {
                    let res = client.get(gateway.url(&format!("/item/{i}"))).send().await.unwrap();
                    let echoed: EchoedRequest = res.json().await.unwrap();
                    assert_eq!(echoed.uri, format!("/item/{i}"));
                }
                _ => {
                    let body = format!("payload-{i}-").repeat(1000);
                    let res = client
                        .post(gateway.url("/upload"))
                        .body(body.clone())
                        .send()
                        .await
                        .unwrap();
                    assert_eq!(res.text().await.unwrap(), body);
                }
            }
        }));
    }

    for task in tasks {
        task.await.unwrap();
    }
}
