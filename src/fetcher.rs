use {
    crate::{ipc::Ipc, node_client::NodeClient, settings::NodeEndpoint},
    anyhow::{bail, Context, Result},
    std::path::Path,
    tokio::{
        io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
        net::{UnixListener, UnixStream},
    },
    tokio_util::sync::CancellationToken,
};

/// Probes every configured node once at startup: a template fetch and a
/// payout-address validation both have to succeed for a node to be
/// considered alive. The first alive node is served for the lifetime of
/// the process; a node that later goes unreachable is not failed over to
/// another configured endpoint, a known limitation of this simple
/// first-alive selection.
pub async fn probe_nodes(nodes: &[NodeEndpoint], payout_address: &str) -> Result<NodeClient> {
    for node in nodes {
        let client = NodeClient::new(node);
        match probe_one(&client, payout_address).await {
            Ok(()) => {
                tracing::info!(url = %node.base_url, "node probe succeeded");
                return Ok(client);
            }
            Err(error) => {
                tracing::warn!(url = %node.base_url, %error, "node probe failed, marking dead");
            }
        }
    }

    bail!("no configured node survived the startup probe")
}

async fn probe_one(client: &NodeClient, payout_address: &str) -> Result<()> {
    client.gen_gbtbase().await.context("test block template fetch failed")?;

    let valid = client
        .validate_address(payout_address)
        .await
        .context("payout address validation call failed")?;
    if !valid {
        bail!("node rejected payout address `{payout_address}` as invalid");
    }

    Ok(())
}

/// Serves the server-mode control loop: one connection at a time, verbs
/// `getbase`/`getbest`/`getlast`/`submitblock:<hex>`/`ping`/`shutdown`.
pub async fn serve(
    control_socket: &Path,
    client: NodeClient,
    ipc: Ipc,
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
                let client = client.clone();
                let ipc = ipc.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    if let Err(error) = handle_connection(stream, client, ipc, shutdown).await {
                        tracing::warn!(%error, "control connection error");
                    }
                });
            }
        }
    }
}

async fn handle_connection(
    stream: UnixStream,
    client: NodeClient,
    ipc: Ipc,
    shutdown: CancellationToken,
) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let mut line = String::new();
    let read = reader.read_line(&mut line).await.context("failed to read control request")?;
    if read == 0 {
        return Ok(());
    }

    let response = handle_request(line.trim(), &client, &ipc, &shutdown).await;

    write_half.write_all(response.as_bytes()).await.context("failed to write control response")?;
    write_half.write_all(b"\n").await.context("failed to write control response")?;
    write_half.flush().await.context("failed to flush control response")?;

    Ok(())
}

async fn handle_request(line: &str, client: &NodeClient, ipc: &Ipc, shutdown: &CancellationToken) -> String {
    if line == "shutdown" {
        shutdown.cancel();
        return "ok".to_string();
    }

    if line == "ping" {
        return "pong".to_string();
    }

    if line == "getbase" {
        return match client.gen_gbtbase().await {
            Ok(template) => template.to_string(),
            Err(error) => serde_json::json!({ "error": error.to_string() }).to_string(),
        };
    }

    if line == "getbest" {
        return match client.get_bestblockhash().await {
            Ok(hash) => serde_json::json!({ "bestblockhash": hash }).to_string(),
            Err(error) => serde_json::json!({ "error": error.to_string() }).to_string(),
        };
    }

    if line == "getlast" {
        let height = match client.get_blockcount().await {
            Ok(height) => height,
            Err(error) => return serde_json::json!({ "error": error.to_string() }).to_string(),
        };
        return match client.get_blockhash(height).await {
            Ok(hash) => serde_json::json!({ "hash": hash }).to_string(),
            Err(error) => serde_json::json!({ "error": error.to_string() }).to_string(),
        };
    }

    if let Some(block_hex) = line.strip_prefix("submitblock:") {
        return match client.submit_block(block_hex).await {
            Ok(()) => {
                ipc.update().await;
                serde_json::json!({ "accepted": true }).to_string()
            }
            Err(error) => serde_json::json!({ "accepted": false, "error": error.to_string() }).to_string(),
        };
    }

    serde_json::json!({ "error": format!("unrecognized request `{line}`") }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ping_replies_pong() {
        let client = NodeClient::new(&NodeEndpoint {
            base_url: "http://127.0.0.1:0".into(),
            rpc_user: "u".into(),
            rpc_password: "p".into(),
        });
        let ipc = Ipc::disabled();
        let shutdown = CancellationToken::new();
        assert_eq!(handle_request("ping", &client, &ipc, &shutdown).await, "pong");
    }

    #[tokio::test]
    async fn shutdown_cancels_the_token() {
        let client = NodeClient::new(&NodeEndpoint {
            base_url: "http://127.0.0.1:0".into(),
            rpc_user: "u".into(),
            rpc_password: "p".into(),
        });
        let ipc = Ipc::disabled();
        let shutdown = CancellationToken::new();
        handle_request("shutdown", &client, &ipc, &shutdown).await;
        assert!(shutdown.is_cancelled());
    }

    #[tokio::test]
    async fn unrecognized_verb_is_an_error() {
        let client = NodeClient::new(&NodeEndpoint {
            base_url: "http://127.0.0.1:0".into(),
            rpc_user: "u".into(),
            rpc_password: "p".into(),
        });
        let ipc = Ipc::disabled();
        let shutdown = CancellationToken::new();
        let response = handle_request("nonsense", &client, &ipc, &shutdown).await;
        let value: serde_json::Value = serde_json::from_str(&response).unwrap();
        assert!(value.get("error").is_some());
    }
}
