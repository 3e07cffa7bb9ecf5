use {
    crate::{
        ipc::Ipc,
        session::UpstreamSession,
        NOTIFY_CACHE_MAX_AGE, NOTIFY_CACHE_RETENTION_FLOOR, SHARE_TRACKER_MAX_AGE,
    },
    anyhow::{bail, Context, Result},
    serde_json::Value,
    std::{sync::Arc, time::Duration, time::Instant},
    stratum::{JobId, LineEvent, Message, Notify, ReadHalf, SetDifficulty, WriteHalf},
    tokio::sync::Mutex,
};

/// [`WriteHalf`] shared between this loop (protocol replies such as
/// `client.get_version`) and the send loop (outbound `mining.submit`).
pub type SharedWriter = Arc<Mutex<WriteHalf>>;

/// The result of classifying one decoded line, independent of any I/O so
/// it can be tested directly against sample wire text.
#[derive(Debug, PartialEq)]
enum Classified {
    Notify(Value),
    SetDifficulty(Value),
    Reconnect,
    GetVersion { id: Value },
    ShowMessage(String),
    ShareResult {
        id: Value,
        result: Value,
        error: Option<Value>,
    },
    Ignored,
}

/// Classifies one line from the upstream by its top-level method name; a
/// line with neither a recognized method nor a `method` field at all is
/// assumed to be a response correlating to a previously submitted share.
fn classify(line: &str) -> Result<Classified> {
    let message = Message::decode(line).context("malformed line from upstream")?;

    Ok(match message {
        Message::Request { id, method, params } => match method.as_str() {
            "mining.notify" => Classified::Notify(params),
            "mining.set_difficulty" => Classified::SetDifficulty(params),
            "client.reconnect" => Classified::Reconnect,
            "client.get_version" => Classified::GetVersion {
                id: id.unwrap_or(Value::Null),
            },
            "client.show_message" => Classified::ShowMessage(params.to_string()),
            _ => Classified::Ignored,
        },
        Message::Response { id, result, error } => Classified::ShareResult { id, result, error },
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Null => false,
        Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Drains the upstream connection until it stalls or closes. Returning at
/// all is a signal to the caller to flush the notify cache and reconnect;
/// there is no internal retry here.
pub async fn run(
    mut read_half: ReadHalf,
    writer: SharedWriter,
    session: Arc<UpstreamSession>,
    ipc: Ipc,
    user_agent: String,
    read_timeout: Duration,
    max_idle_reads: u32,
) -> Result<()> {
    let mut idle_reads = 0u32;

    loop {
        {
            let now = Instant::now();
            session
                .notify_cache
                .lock()
                .await
                .age(now, NOTIFY_CACHE_MAX_AGE, NOTIFY_CACHE_RETENTION_FLOOR);
            session.share_tracker.lock().await.age(now, SHARE_TRACKER_MAX_AGE);
        }

        let line = match read_half.read_line(read_timeout).await? {
            LineEvent::Line(line) => {
                idle_reads = 0;
                line
            }
            LineEvent::Idle => {
                idle_reads += 1;
                if idle_reads >= max_idle_reads {
                    bail!("upstream stalled after {idle_reads} idle reads");
                }
                continue;
            }
            LineEvent::Closed => bail!("upstream closed the connection"),
        };

        let classified = match classify(&line) {
            Ok(classified) => classified,
            Err(error) => {
                tracing::warn!(%error, "dropping unparseable line from upstream");
                continue;
            }
        };

        match classified {
            Classified::Notify(params) => match serde_json::from_value::<Notify>(params) {
                Ok(notify) => {
                    session.notify_cache.lock().await.insert(notify, Instant::now());
                    ipc.notify().await;
                }
                Err(error) => tracing::warn!(%error, "malformed mining.notify from upstream"),
            },
            Classified::SetDifficulty(params) => match SetDifficulty::from_params(&params) {
                Ok(set) => {
                    let mut state = session.state.lock().await;
                    if state.difficulty != set.difficulty {
                        state.difficulty = set.difficulty;
                        drop(state);
                        ipc.diff().await;
                    }
                }
                Err(error) => tracing::warn!(%error, "malformed mining.set_difficulty from upstream"),
            },
            Classified::Reconnect => {
                tracing::info!("upstream requested client.reconnect, reconnecting");
                bail!("upstream requested client.reconnect");
            }
            Classified::GetVersion { id } => {
                let response = Message::Response {
                    id,
                    result: Value::String(user_agent.clone()),
                    error: None,
                };
                if let Ok(encoded) = response.encode() {
                    if let Err(error) = writer.lock().await.write_line(&encoded).await {
                        tracing::warn!(%error, "failed to reply to client.get_version");
                    }
                }
            }
            Classified::ShowMessage(message) => {
                tracing::info!(%message, "message from upstream");
            }
            Classified::ShareResult { id, result, error } => {
                let Some(local_id) = id.as_u64().map(JobId::new) else {
                    tracing::warn!(?id, "share response id is not a recognized job id");
                    continue;
                };

                let Some(in_flight) = session.share_tracker.lock().await.remove(local_id) else {
                    tracing::warn!(%local_id, "share response did not correlate to any in-flight submission");
                    continue;
                };

                let accepted = error.is_none() && is_truthy(&result);
                ipc.share_result(in_flight.client_id, in_flight.msg_id, accepted).await;
            }
            Classified::Ignored => {}
        }
    }
}
