use std::sync::Arc;

use rama::{
    Layer,
    error::{BoxError, ErrorContext},
    graceful::ShutdownGuard,
    http::{
        HeaderValue,
        layer::{required_header::AddRequiredResponseHeadersLayer, trace::TraceLayer},
        server::HttpServer,
    },
    rt::Executor,
    tcp::server::TcpListener,
    telemetry::tracing,
};

use respsim_lib::{
    config::ServiceSettings, http::SimulatorService, utils::env::network_service_identifier,
};

use crate::Args;

/// Serve the simulator on the bound interface until shutdown.
///
/// No connection timeout is applied, throttled bodies
/// may legitimately stream for minutes.
pub async fn run_sim_server(
    args: Args,
    guard: ShutdownGuard,
    settings: ServiceSettings,
) -> Result<(), BoxError> {
    let http_svc = (
        TraceLayer::new_for_http(),
        AddRequiredResponseHeadersLayer::new()
            .with_server_header_value(HeaderValue::from_static(network_service_identifier())),
    )
        .into_layer(SimulatorService::new(settings));

    let exec = Executor::graceful(guard);
    let http_server = HttpServer::auto(exec.clone()).service(Arc::new(http_svc));

    let tcp_listener = TcpListener::bind(args.bind, exec)
        .await
        .context("bind simulator http server")?;

    let sim_addr = tcp_listener
        .local_addr()
        .context("get bound address for simulator http server")?;

    tracing::info!("simulator http server bound to: {sim_addr}");
    crate::server::write_server_socket_address_as_file(&args.data, "respsim", sim_addr.into())
        .await?;

    tcp_listener.serve(http_server).await;

    Ok(())
}
