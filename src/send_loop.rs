use {
    crate::{receive_loop::SharedWriter, session::UpstreamSession},
    anyhow::Result,
    serde_json::Value,
    std::sync::Arc,
    stratum::{JobId, Message, Username},
    tokio::sync::mpsc,
};

/// A share ready to forward upstream. `job_id` names the job it was mined
/// against (a notify-cache id, used to look up the upstream's own job id);
/// `correlation_id` is the share-tracker id the control server assigned
/// when it recorded the submitting client, used as the wire request id so
/// the receive loop can match the eventual response back to this share.
#[derive(Debug, Clone)]
pub struct OutboundShare {
    pub job_id: JobId,
    pub correlation_id: JobId,
    pub extranonce2: String,
    pub ntime: String,
    pub nonce: String,
}

pub type ShareSender = mpsc::Sender<OutboundShare>;
pub type ShareReceiver = mpsc::Receiver<OutboundShare>;

fn submit_params(username: &Username, upstream_job_id: &str, share: &OutboundShare) -> Value {
    serde_json::json!([
        username.as_str(),
        upstream_job_id,
        share.extranonce2,
        share.ntime,
        share.nonce,
    ])
}

/// Drains the outbound share queue, re-keying each share's notify-cache job
/// id to the upstream's own job id before transmitting `mining.submit`. A
/// share whose job id has already aged out of the notify cache (the
/// upstream moved on to a new block before this share reached us) is
/// logged and dropped rather than sent with a stale or wrong job id.
///
/// Takes the receiver by reference rather than by value: the queue and its
/// still-unsent contents outlive any single upstream connection, so a
/// reconnect calls this again with the same receiver instead of losing
/// whatever was left in flight.
pub async fn run(
    shares: &mut ShareReceiver,
    writer: SharedWriter,
    session: Arc<UpstreamSession>,
    username: Username,
) -> Result<()> {
    while let Some(share) = shares.recv().await {
        let upstream_job_id = {
            let cache = session.notify_cache.lock().await;
            cache.get(share.job_id).map(|entry| entry.upstream_job_id.clone())
        };

        let Some(upstream_job_id) = upstream_job_id else {
            tracing::warn!(
                job_id = %share.job_id,
                "dropping share for a job id no longer in the notify cache"
            );
            continue;
        };

        let message = Message::request(
            Some(Value::from(share.correlation_id.as_u64())),
            "mining.submit",
            submit_params(&username, &upstream_job_id, &share),
        );

        let encoded = match message.encode() {
            Ok(encoded) => encoded,
            Err(error) => {
                tracing::warn!(%error, "failed to encode mining.submit");
                continue;
            }
        };

        if let Err(error) = writer.lock().await.write_line(&encoded).await {
            tracing::warn!(%error, "failed to write mining.submit, closing connection");
            break;
        }
    }

    Ok(())
}
