use {
    crate::{send_loop::OutboundShare, send_loop::ShareSender, session::UpstreamSession},
    anyhow::{Context, Result},
    serde_json::Value,
    std::{path::Path, sync::Arc},
    tokio::{
        io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
        net::{UnixListener, UnixStream},
    },
    tokio_util::sync::CancellationToken,
};

/// Accepts one control connection at a time: reads a single line, answers
/// it, and closes. Verbs are the small fixed set the adjacent stratifier
/// process uses to query negotiated session state and forward shares;
/// anything else is parsed as a share submission.
pub async fn run(
    control_socket: &Path,
    session: Arc<UpstreamSession>,
    shares: ShareSender,
    shutdown: CancellationToken,
) -> Result<()> {
    let _ = std::fs::remove_file(control_socket);
    let listener = UnixListener::bind(control_socket)
        .with_context(|| format!("failed to bind control socket at {}", control_socket.display()))?;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            accepted = listener.accept() => {
                let (stream, _addr) = accepted.context("failed to accept control connection")?;
                let session = session.clone();
                let shares = shares.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    if let Err(error) = handle_connection(stream, session, shares, shutdown).await {
                        tracing::warn!(%error, "control connection error");
                    }
                });
            }
        }
    }
}

async fn handle_connection(
    stream: UnixStream,
    session: Arc<UpstreamSession>,
    shares: ShareSender,
    shutdown: CancellationToken,
) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let mut line = String::new();
    let read = reader.read_line(&mut line).await.context("failed to read control request")?;
    if read == 0 {
        return Ok(());
    }

    let response = handle_request(line.trim(), &session, &shares, &shutdown).await;

    write_half
        .write_all(response.as_bytes())
        .await
        .context("failed to write control response")?;
    write_half.write_all(b"\n").await.context("failed to write control response")?;
    write_half.flush().await.context("failed to flush control response")?;

    Ok(())
}

async fn handle_request(
    line: &str,
    session: &Arc<UpstreamSession>,
    shares: &ShareSender,
    shutdown: &CancellationToken,
) -> String {
    match line {
        "shutdown" => {
            shutdown.cancel();
            "ok".to_string()
        }
        "ping" => "pong".to_string(),
        "getsubscribe" => {
            let state = session.state.lock().await;
            serde_json::json!({
                "enonce1": state.enonce1.to_string(),
                "nonce2len": state.enonce2_size,
            })
            .to_string()
        }
        "getdiff" => {
            let state = session.state.lock().await;
            serde_json::json!({ "diff": state.difficulty.as_f64() }).to_string()
        }
        "getnotify" => {
            let cache = session.notify_cache.lock().await;
            match cache.current() {
                Some(entry) => serde_json::json!({ "notify": entry.notify }).to_string(),
                None => serde_json::json!({ "notify": null }).to_string(),
            }
        }
        other => handle_share_submission(other, session, shares).await,
    }
}

/// Parses an arbitrary non-verb line as a share submission: the
/// stratifier's own `client_id`/`msg_id` are recorded in the share tracker
/// (stripped from the wire message that eventually goes upstream and
/// replaced there by the tracker's own correlation id), and `jobid`
/// identifies which cached notification it was mined against.
async fn handle_share_submission(line: &str, session: &Arc<UpstreamSession>, shares: &ShareSender) -> String {
    let request: Value = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(error) => return serde_json::json!({ "error": format!("unrecognized request: {error}") }).to_string(),
    };

    let client_id = request.get("client_id").and_then(Value::as_u64);
    let msg_id = request.get("msg_id").cloned();
    let job_id = request
        .get("jobid")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok());
    let extranonce2 = request.get("nonce2").and_then(Value::as_str).map(str::to_string);
    let ntime = request.get("ntime").and_then(Value::as_str).map(str::to_string);
    let nonce = request.get("nonce").and_then(Value::as_str).map(str::to_string);

    let (Some(client_id), Some(msg_id), Some(job_id), Some(extranonce2), Some(ntime), Some(nonce)) =
        (client_id, msg_id, job_id, extranonce2, ntime, nonce)
    else {
        return serde_json::json!({ "error": "share submission missing a required field" }).to_string();
    };

    let correlation_id = session
        .share_tracker
        .lock()
        .await
        .insert(client_id, msg_id, std::time::Instant::now());

    let queued = shares
        .send(OutboundShare {
            job_id,
            correlation_id,
            extranonce2,
            ntime,
            nonce,
        })
        .await
        .is_ok();

    serde_json::json!({ "queued": queued, "correlation_id": correlation_id.to_string() }).to_string()
}

#[cfg(test)]
mod tests {
    use {super::*, stratum::Extranonce, tokio::sync::mpsc};

    fn sample_session() -> Arc<UpstreamSession> {
        Arc::new(UpstreamSession::new(
            "bc1qexample.worker1".parse().unwrap(),
            "x".into(),
            "ckgen/0.1.0".into(),
        ))
    }

    #[tokio::test]
    async fn ping_replies_pong() {
        let session = sample_session();
        let (tx, _rx) = mpsc::channel(1);
        let shutdown = CancellationToken::new();
        assert_eq!(handle_request("ping", &session, &tx, &shutdown).await, "pong");
    }

    #[tokio::test]
    async fn shutdown_cancels_the_token() {
        let session = sample_session();
        let (tx, _rx) = mpsc::channel(1);
        let shutdown = CancellationToken::new();
        handle_request("shutdown", &session, &tx, &shutdown).await;
        assert!(shutdown.is_cancelled());
    }

    #[tokio::test]
    async fn getsubscribe_reports_negotiated_extranonce() {
        let session = sample_session();
        {
            let mut state = session.state.lock().await;
            state.enonce1 = Extranonce::from_bytes(&[0xab, 0xcd]);
            state.enonce2_size = 4;
        }
        let (tx, _rx) = mpsc::channel(1);
        let shutdown = CancellationToken::new();
        let response = handle_request("getsubscribe", &session, &tx, &shutdown).await;
        let value: Value = serde_json::from_str(&response).unwrap();
        assert_eq!(value["enonce1"], "abcd");
        assert_eq!(value["nonce2len"], 4);
    }

    #[tokio::test]
    async fn getnotify_reports_null_when_nothing_cached() {
        let session = sample_session();
        let (tx, _rx) = mpsc::channel(1);
        let shutdown = CancellationToken::new();
        let response = handle_request("getnotify", &session, &tx, &shutdown).await;
        let value: Value = serde_json::from_str(&response).unwrap();
        assert!(value["notify"].is_null());
    }

    #[tokio::test]
    async fn share_submission_is_queued_and_tracked() {
        let session = sample_session();
        let (tx, mut rx) = mpsc::channel(1);
        let line = serde_json::json!({
            "client_id": 7,
            "msg_id": 42,
            "jobid": "bf",
            "nonce2": "deadbeef",
            "ntime": "504e86b9",
            "nonce": "0000af3c",
        })
        .to_string();

        let response = handle_share_submission(&line, &session, &tx).await;
        let value: Value = serde_json::from_str(&response).unwrap();
        assert_eq!(value["queued"], true);

        let queued = rx.recv().await.unwrap();
        assert_eq!(queued.extranonce2, "deadbeef");

        assert_eq!(session.share_tracker.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn share_submission_missing_fields_is_an_error() {
        let session = sample_session();
        let (tx, _rx) = mpsc::channel(1);
        let response = handle_share_submission("{}", &session, &tx).await;
        let value: Value = serde_json::from_str(&response).unwrap();
        assert!(value.get("error").is_some());
    }
}
