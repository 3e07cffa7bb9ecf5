use crate::{fetcher, ipc::Ipc, settings::ServerSettings, settings::Settings, Result};

/// Runs server mode: probes every configured node once at startup and
/// serves the surviving one for the lifetime of the process. There is no
/// mid-flight failover; a node that later stops answering simply fails
/// every subsequent control request until the process is restarted.
pub async fn run(settings: Settings, server: ServerSettings) -> Result<()> {
    let client = fetcher::probe_nodes(&server.nodes, &server.payout_address).await?;

    let ipc = settings
        .stratifier_socket
        .clone()
        .map(Ipc::new)
        .unwrap_or_else(Ipc::disabled);

    fetcher::serve(
        &settings.control_socket,
        client,
        ipc,
        tokio_util::sync::CancellationToken::new(),
    )
    .await
}
