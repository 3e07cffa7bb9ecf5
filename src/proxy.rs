use {
    crate::{
        control,
        ipc::Ipc,
        receive_loop::{self, SharedWriter},
        send_loop::{self, ShareReceiver},
        session::{self, UpstreamSession},
        settings::{ProxySettings, Settings},
        Result, SEND_QUEUE_CAPACITY,
    },
    std::sync::Arc,
    tokio::sync::{mpsc, Mutex},
    tokio_util::sync::CancellationToken,
};

/// Runs the proxy mode for the lifetime of the process: negotiates and
/// re-negotiates a single upstream Stratum session, forwarding its work to
/// the adjacent stratifier and its shares back upstream, while a control
/// server answers session queries and accepts share submissions
/// concurrently with whichever connection attempt is current.
pub async fn run(settings: Settings, proxy: ProxySettings) -> Result<()> {
    let session = Arc::new(UpstreamSession::new(
        proxy.username.clone(),
        proxy.password.clone(),
        proxy.user_agent.clone(),
    ));
    let ipc = settings
        .stratifier_socket
        .clone()
        .map(Ipc::new)
        .unwrap_or_else(Ipc::disabled);
    let (shares_tx, mut shares_rx) = mpsc::channel(SEND_QUEUE_CAPACITY);
    let shutdown = CancellationToken::new();

    let control_task = tokio::spawn({
        let session = session.clone();
        let shutdown = shutdown.clone();
        let control_socket = settings.control_socket.clone();
        async move { control::run(&control_socket, session, shares_tx, shutdown).await }
    });

    let result = run_sessions(&proxy, &session, &ipc, &mut shares_rx, &shutdown).await;

    shutdown.cancel();
    if let Ok(Err(error)) = control_task.await {
        tracing::warn!(%error, "control server exited with an error");
    }

    result
}

async fn run_sessions(
    proxy: &ProxySettings,
    session: &Arc<UpstreamSession>,
    ipc: &Ipc,
    shares_rx: &mut ShareReceiver,
    shutdown: &CancellationToken,
) -> Result<()> {
    loop {
        // The upstream job namespace from the previous connection is dead;
        // start the new session with an empty cache.
        session.notify_cache.lock().await.flush();

        let connection = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            result = session::connect_and_handshake(proxy.addr, session, proxy.read_timeout) => result?,
        };

        ipc.subscribe().await;

        let (read_half, write_half) = connection.split();
        let writer: SharedWriter = Arc::new(Mutex::new(write_half));

        tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            result = receive_loop::run(
                read_half,
                writer.clone(),
                session.clone(),
                ipc.clone(),
                proxy.user_agent.clone(),
                proxy.read_timeout,
                proxy.max_idle_reads,
            ) => {
                if let Err(error) = result {
                    tracing::warn!(%error, "receive loop ended, reconnecting");
                }
            }
            result = send_loop::run(shares_rx, writer, session.clone(), proxy.username.clone()) => {
                if let Err(error) = result {
                    tracing::warn!(%error, "send loop ended, reconnecting");
                }
            }
        }
    }
}
