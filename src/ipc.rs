use {
    serde_json::Value,
    std::path::PathBuf,
    tokio::net::UnixDatagram,
};

/// Fire-and-forget delivery of lifecycle notifications to the adjacent
/// stratifier process over a Unix datagram socket. The stratifier owns
/// connected-miner state and share grading; this type only models the
/// send side the generator itself is responsible for.
#[derive(Debug, Clone)]
pub struct Ipc {
    path: Option<PathBuf>,
}

impl Ipc {
    pub fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    /// An IPC sink with no configured destination: every call is logged
    /// and dropped. Used when `--stratifier-socket` is omitted.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    async fn send(&self, message: &str) {
        let Some(path) = &self.path else {
            tracing::debug!(message, "no stratifier socket configured, dropping notification");
            return;
        };

        let socket = match UnixDatagram::unbound() {
            Ok(socket) => socket,
            Err(error) => {
                tracing::warn!(%error, "failed to create stratifier notification socket");
                return;
            }
        };

        if let Err(error) = socket.send_to(message.as_bytes(), path).await {
            tracing::warn!(?path, %error, "failed to notify stratifier");
        }
    }

    pub async fn subscribe(&self) {
        self.send("subscribe").await;
    }

    pub async fn notify(&self) {
        self.send("notify").await;
    }

    pub async fn diff(&self) {
        self.send("diff").await;
    }

    pub async fn update(&self) {
        self.send("update").await;
    }

    pub async fn shutdown(&self) {
        self.send("shutdown").await;
    }

    /// Surfaces an upstream share accept/reject decision, keyed by the
    /// stratifier's own client and message ids so pool-side accounting can
    /// reflect the upstream's verdict instead of discarding it.
    pub async fn share_result(&self, client_id: u64, msg_id: Value, accepted: bool) {
        let payload = serde_json::json!({
            "type": "share_result",
            "client_id": client_id,
            "msg_id": msg_id,
            "accepted": accepted,
        });

        self.send(&payload.to_string()).await;
    }
}
