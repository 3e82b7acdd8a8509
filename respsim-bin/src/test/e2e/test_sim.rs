use rama::http::{
    BodyExtractExt as _, Method, StatusCode,
    header::{
        ACCEPT_ENCODING, ACCESS_CONTROL_ALLOW_ORIGIN, AUTHORIZATION, CONTENT_ENCODING,
        CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, ORIGIN, RANGE, SERVER, VARY,
    },
    service::client::HttpClientExt as _,
};

use super::runtime;

#[tokio::test]
#[tracing_test::traced_test]
async fn test_serves_sized_body() {
    let runtime = runtime::spawn_with_args(&[]).await;
    let client = runtime.client();

    let resp = client
        .get(runtime.uri("/?bytes=2048&content=zero"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[CONTENT_LENGTH], "2048");
    assert_eq!(resp.headers()[CONTENT_TYPE], "application/octet-stream");
    assert!(
        resp.headers()[SERVER]
            .to_str()
            .unwrap()
            .starts_with("respsim/")
    );
    let body = runtime::body_bytes(resp).await;
    assert_eq!(body.as_ref(), vec![0u8; 2048].as_slice());
}

#[tokio::test]
#[tracing_test::traced_test]
async fn test_head_and_range() {
    let runtime = runtime::spawn_with_args(&[]).await;
    let client = runtime.client();

    let resp = client
        .head(runtime.uri("/?bytes=100"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[CONTENT_LENGTH], "100");
    assert!(runtime::body_bytes(resp).await.is_empty());

    let resp = client
        .get(runtime.uri("/?bytes=1000&content=lorem"))
        .header(RANGE, "bytes=990-")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(resp.headers()[CONTENT_RANGE], "bytes 990-999/1000");
    assert_eq!(runtime::body_bytes(resp).await.len(), 10);

    let resp = client
        .get(runtime.uri("/?bytes=1000"))
        .header(RANGE, "bytes=1000-")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(resp.headers()[CONTENT_RANGE], "bytes */1000");
}

#[tokio::test]
#[tracing_test::traced_test]
async fn test_gzip_body_is_streamed_and_decodes() {
    let runtime = runtime::spawn_with_args(&[]).await;

    let plain = runtime
        .client()
        .get(runtime.uri("/?bytes=5000&content=lorem&chunk=700"))
        .send()
        .await
        .unwrap();
    assert_eq!(plain.status(), StatusCode::OK);
    let plain = runtime::body_bytes(plain).await;
    assert_eq!(plain.len(), 5000);

    let resp = runtime
        .client()
        .get(runtime.uri("/?bytes=5000&content=lorem&chunk=700&gzip=1"))
        .header(ACCEPT_ENCODING, "gzip")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[CONTENT_ENCODING], "gzip");
    assert_eq!(resp.headers()[VARY], "Accept-Encoding");
    assert!(resp.headers().get(CONTENT_LENGTH).is_none());
    let compressed = runtime::body_bytes(resp).await;
    assert_eq!(&compressed[..2], &[0x1f, 0x8b]);
    assert_ne!(compressed, plain);

    let resp = runtime
        .client_with_decompression()
        .get(runtime.uri("/?bytes=5000&content=lorem&chunk=700&gzip=1"))
        .header(ACCEPT_ENCODING, "gzip")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(runtime::body_bytes(resp).await, plain);
}

#[tokio::test]
#[tracing_test::traced_test]
async fn test_token_and_scenario() {
    let runtime =
        runtime::spawn_with_args(&["--token", "e2e-token", "--scenario", "heavy-load"]).await;
    let client = runtime.client();

    let resp = client
        .get(runtime.uri("/?bytes=16"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(resp.try_into_string().await.unwrap(), "unauthorized");

    let resp = client
        .request(Method::OPTIONS, runtime.uri("/"))
        .header(ORIGIN, "https://app.example")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        resp.headers()[ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://app.example"
    );

    let resp = client
        .get(runtime.uri("/?cpu_ms=0&mem_mb=0&content=zero"))
        .header(AUTHORIZATION, "Bearer e2e-token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    // body size of the heavy-load scenario
    assert_eq!(runtime::body_bytes(resp).await.len(), 262_144);
}
