use std::{
    io::ErrorKind,
    path::PathBuf,
    sync::{
        Arc, OnceLock,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use clap::Parser;
use rama::{
    Layer as _, Service as _,
    bytes::Bytes,
    error::OpaqueError,
    http::{
        Body, Request, Response,
        body::util::BodyExt as _,
        client::EasyHttpWebClient,
        layer::{
            decompression::DecompressionLayer, map_request_body::MapRequestBodyLayer,
            map_response_body::MapResponseBodyLayer, timeout::TimeoutLayer,
        },
    },
    layer::MapErrLayer,
    net::address::SocketAddress,
    rt::Executor,
    service::BoxService,
};

use crate::Args;

/// A simulator app running on its own thread and runtime.
pub(super) struct Runtime {
    addr: SocketAddress,
}

impl Runtime {
    /// Absolute uri pointing to the simulator for the given path and query.
    pub fn uri(&self, path_and_query: &str) -> String {
        format!("http://{}{path_and_query}", self.addr)
    }

    /// Plain http client, bodies are delivered as sent by the simulator.
    #[inline(always)]
    pub fn client(&self) -> BoxService<Request, Response, OpaqueError> {
        create_client_inner(false)
    }

    /// Http client which advertises gzip support and decodes compressed bodies.
    #[inline(always)]
    pub fn client_with_decompression(&self) -> BoxService<Request, Response, OpaqueError> {
        create_client_inner(true)
    }
}

fn create_client_inner(decompress: bool) -> BoxService<Request, Response, OpaqueError> {
    let inner_http_client = EasyHttpWebClient::connector_builder()
        .with_default_transport_connector()
        .without_tls_proxy_support()
        .without_proxy_support()
        .without_tls_support()
        .with_default_http_connector(Executor::default())
        .try_with_default_connection_pool()
        .expect("create connection pool for e2e web client")
        .build_client();

    // large enough for heavy-load scenarios on slow CI machines
    let timeout = Duration::from_secs(60);

    if decompress {
        (
            MapResponseBodyLayer::new(Body::new),
            DecompressionLayer::new(),
            MapErrLayer::new(OpaqueError::from_std),
            TimeoutLayer::new(timeout),
            MapRequestBodyLayer::new(Body::new),
        )
            .into_layer(inner_http_client)
            .boxed()
    } else {
        (
            MapErrLayer::new(OpaqueError::from_std),
            TimeoutLayer::new(timeout),
            MapRequestBodyLayer::new(Body::new),
        )
            .into_layer(inner_http_client)
            .boxed()
    }
}

pub(super) async fn body_bytes(resp: Response) -> Bytes {
    resp.into_body().collect().await.unwrap().to_bytes()
}

pub(super) async fn spawn_with_args(extra_args: &[&str]) -> Runtime {
    let data_dir = spawn_respsim_app_with_args(extra_args);

    let addr = tokio::time::timeout(
        Duration::from_secs(60),
        read_file_or_wait(data_dir.join("respsim.addr.txt")),
    )
    .await
    .unwrap();
    assert!(addr.ip_addr.is_loopback());

    Runtime { addr }
}

async fn read_file_or_wait(path: PathBuf) -> SocketAddress {
    loop {
        match tokio::fs::read_to_string(&path).await {
            Ok(s) => {
                let s = s.trim();
                if s.is_empty() {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    continue;
                }
                match s.parse() {
                    Ok(addr) => return addr,
                    Err(err) => {
                        eprintln!("unexpected error parsing socket addr (content={s:?}): {err}");
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        continue;
                    }
                }
            }
            Err(err) => {
                if err.kind() == ErrorKind::NotFound {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    continue;
                } else {
                    panic!("unexpected error: {err}");
                }
            }
        }
    }
}

fn new_data_dir() -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let dir = std::env::temp_dir().join(format!(
        "respsim_app_e2e_{}_{}",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed),
    ));
    if let Err(err) = std::fs::remove_dir_all(&dir)
        && err.kind() != ErrorKind::NotFound
    {
        panic!("clean stale e2e data dir: {err}");
    }
    dir
}

fn spawn_respsim_app_with_args(extra_args: &[&str]) -> PathBuf {
    let data_dir = new_data_dir();
    eprintln!("respsim_app_e2e all data stored under: {data_dir:?}");

    let data_dir_str = data_dir.display().to_string();

    let mut argv: Vec<&str> = vec![
        respsim_lib::utils::env::project_name(),
        "--bind",
        "127.0.0.1:0",
        "--data",
        &data_dir_str,
        "--graceful",
        "0.42",
    ];
    argv.extend(extra_args);

    let args = Args::try_parse_from(argv).unwrap();

    let wait_server_ready = Arc::new(OnceLock::new());
    let notify_server_ready = wait_server_ready.clone();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .unwrap();

        let server_future = crate::run_with_args(std::future::pending::<()>(), args);

        notify_server_ready.set(()).expect("waiter to be notified");

        rt.block_on(server_future).expect("serve without errors");
    });

    wait_server_ready.wait();

    data_dir
}
