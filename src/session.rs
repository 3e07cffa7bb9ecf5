use {
    crate::{notify_cache::NotifyCache, share_tracker::ShareTracker},
    anyhow::{bail, ensure, Context, Result},
    serde_json::Value,
    std::{
        net::SocketAddr,
        sync::atomic::{AtomicU64, Ordering},
        time::Duration,
    },
    stratum::{
        find_notify, Authorize, Connection, Difficulty, Extranonce, LineEvent, Message, Subscribe,
        SubscribeResponse, Username,
    },
    tokio::sync::Mutex,
};

/// Maximum binary length of extranonce1 implied by its hex encoding.
const MAX_ENONCE1_BYTES: usize = 15;

/// Allowed nonce2 length range, inclusive.
const NONCE2_LEN_RANGE: std::ops::RangeInclusive<usize> = 4..=8;

/// Which `mining.subscribe` parameter shape to try next, learned
/// negatively: a rejection at one tier moves to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeTier {
    /// `[client_tag, sessionid]`
    WithSessionId,
    /// `[client_tag]`
    ClientTagOnly,
    /// `[]`
    Empty,
}

impl SubscribeTier {
    fn next(self) -> Option<Self> {
        match self {
            SubscribeTier::WithSessionId => Some(SubscribeTier::ClientTagOnly),
            SubscribeTier::ClientTagOnly => Some(SubscribeTier::Empty),
            SubscribeTier::Empty => None,
        }
    }
}

/// Negotiated per-upstream state, all mutated together during subscribe
/// and reconnect, so it lives behind a single lock distinct from the
/// notify and share caches.
#[derive(Debug, Clone)]
pub struct NegotiatedState {
    pub session_id: Option<String>,
    pub enonce1: Extranonce,
    pub enonce2_size: usize,
    pub difficulty: Difficulty,
    pub no_sessionid: bool,
    pub no_params: bool,
}

impl Default for NegotiatedState {
    fn default() -> Self {
        Self {
            session_id: None,
            enonce1: Extranonce::from_bytes(&[]),
            enonce2_size: 4,
            difficulty: Difficulty::default(),
            no_sessionid: false,
            no_params: false,
        }
    }
}

impl NegotiatedState {
    fn tier(&self) -> SubscribeTier {
        if !self.no_sessionid && self.session_id.is_some() {
            SubscribeTier::WithSessionId
        } else if !self.no_params {
            SubscribeTier::ClientTagOnly
        } else {
            SubscribeTier::Empty
        }
    }

    /// Records that the current tier was rejected, moving capability
    /// flags one step further down the ladder. Returns `false` once the
    /// empty-params tier has also been exhausted.
    fn advance(&mut self) -> bool {
        match self.tier() {
            SubscribeTier::WithSessionId => {
                self.session_id = None;
                self.no_sessionid = true;
                true
            }
            SubscribeTier::ClientTagOnly => {
                self.no_params = true;
                true
            }
            SubscribeTier::Empty => false,
        }
    }
}

/// Per-upstream mutable state shared by the receive, send and control
/// tasks. The notify cache, share tracker and negotiated session state
/// each sit behind their own mutex; a critical section only ever mutates
/// its own table, never performs I/O.
pub struct UpstreamSession {
    pub username: Username,
    pub password: String,
    pub user_agent: String,
    pub state: Mutex<NegotiatedState>,
    next_request_id: AtomicU64,
    pub notify_cache: Mutex<NotifyCache>,
    pub share_tracker: Mutex<ShareTracker>,
}

impl UpstreamSession {
    pub fn new(username: Username, password: String, user_agent: String) -> Self {
        Self {
            username,
            password,
            user_agent,
            state: Mutex::new(NegotiatedState::default()),
            next_request_id: AtomicU64::new(1),
            notify_cache: Mutex::new(NotifyCache::new()),
            share_tracker: Mutex::new(ShareTracker::new()),
        }
    }

    pub fn next_request_id(&self) -> u64 {
        self.next_request_id.fetch_add(1, Ordering::Relaxed)
    }
}

fn subscribe_params(tier: SubscribeTier, user_agent: &str, session_id: Option<&str>) -> Value {
    match tier {
        SubscribeTier::WithSessionId => Subscribe::new(
            Some(user_agent.to_string()),
            session_id.map(str::to_string),
        )
        .to_params(),
        SubscribeTier::ClientTagOnly => {
            Subscribe::new(Some(user_agent.to_string()), None).to_params()
        }
        SubscribeTier::Empty => Subscribe::default().to_params(),
    }
}

/// Parsed, validated `mining.subscribe` result, ready to be applied to a
/// session's negotiated state.
struct ParsedSubscribe {
    session_id: Option<String>,
    enonce1: Extranonce,
    enonce2_size: usize,
}

fn parse_subscribe_result(tier: SubscribeTier, result: &Value) -> Result<ParsedSubscribe> {
    let response = SubscribeResponse::from_result(result).context("malformed subscribe result")?;

    ensure!(
        response.extranonce1.len() <= MAX_ENONCE1_BYTES,
        "extranonce1 is {} bytes, exceeding the {MAX_ENONCE1_BYTES} byte limit",
        response.extranonce1.len()
    );
    ensure!(
        NONCE2_LEN_RANGE.contains(&response.extranonce2_size),
        "nonce2 length {} is outside the accepted [{}, {}] range",
        response.extranonce2_size,
        NONCE2_LEN_RANGE.start(),
        NONCE2_LEN_RANGE.end()
    );

    let can_learn_session_id = tier == SubscribeTier::WithSessionId || tier == SubscribeTier::ClientTagOnly;
    let session_id = if can_learn_session_id {
        find_notify(result)
            .and_then(|tuple| tuple.get(1))
            .and_then(Value::as_str)
            .map(str::to_string)
    } else {
        None
    };

    Ok(ParsedSubscribe {
        session_id,
        enonce1: response.extranonce1,
        enonce2_size: response.extranonce2_size,
    })
}

async fn write_request(connection: &mut Connection, id: u64, method: &str, params: Value) -> Result<()> {
    let message = Message::request(Some(Value::from(id)), method, params);
    let line = message.encode().context("failed to encode outbound message")?;
    connection
        .write_line(&line)
        .await
        .context("failed to write to upstream")
}

/// Reads lines until the response matching `id` arrives, returning its
/// `result` on success or an error if the response carries a non-null
/// `error`. Any unsolicited push methods encountered along the way
/// (`mining.notify`, `mining.set_difficulty`, ...) are handed to `on_push`
/// so the caller can process them instead of dropping them on the floor,
/// matching the requirement to drain buffered pushes before an authorize
/// response.
async fn read_response<F>(
    connection: &mut Connection,
    id: u64,
    read_timeout: Duration,
    mut on_push: F,
) -> Result<Value>
where
    F: FnMut(Message),
{
    loop {
        match connection.read_line(read_timeout).await.context("read failed")? {
            LineEvent::Idle => bail!("timed out waiting for a response to request {id}"),
            LineEvent::Closed => bail!("connection closed while waiting for a response to request {id}"),
            LineEvent::Line(line) => {
                let message = Message::decode(&line).context("malformed line from upstream")?;
                match message {
                    Message::Response { id: response_id, result, error } => {
                        if response_id == Value::from(id) {
                            if let Some(error) = error {
                                bail!("upstream returned error for request {id}: {error}");
                            }
                            return Ok(result);
                        }
                        // A response for some other id; not expected on this
                        // connection before the handshake completes, ignore.
                    }
                    Message::Request { .. } => on_push(message),
                }
            }
        }
    }
}

/// Runs the three-tier subscribe/authorize handshake over a fresh
/// connection. On any subscribe rejection the capability flags advance
/// and the caller should reconnect and retry; `Ok(None)` from
/// [`advance_or_exhausted`] callers means the ladder is exhausted.
pub async fn handshake(
    connection: &mut Connection,
    session: &UpstreamSession,
    read_timeout: Duration,
) -> Result<HandshakeOutcome> {
    let tier = session.state.lock().await.tier();
    let session_id = session.state.lock().await.session_id.clone();

    let request_id = session.next_request_id();
    write_request(
        connection,
        request_id,
        "mining.subscribe",
        subscribe_params(tier, &session.user_agent, session_id.as_deref()),
    )
    .await?;

    let result = match read_response(connection, request_id, read_timeout, |_push| {}).await {
        Ok(result) => result,
        Err(error) => return Ok(reject(session, tier).await.map_or(HandshakeOutcome::Exhausted, |_| {
            tracing::warn!(%error, ?tier, "mining.subscribe rejected");
            HandshakeOutcome::Retry
        })),
    };

    let parsed = match parse_subscribe_result(tier, &result) {
        Ok(parsed) => parsed,
        Err(error) => {
            return Ok(reject(session, tier).await.map_or(HandshakeOutcome::Exhausted, |_| {
                tracing::warn!(%error, ?tier, "mining.subscribe result rejected");
                HandshakeOutcome::Retry
            }));
        }
    };

    {
        let mut state = session.state.lock().await;
        if let Some(session_id) = parsed.session_id {
            state.session_id = Some(session_id);
        }
        state.enonce1 = parsed.enonce1;
        state.enonce2_size = parsed.enonce2_size;
    }

    let auth_id = session.next_request_id();
    write_request(
        connection,
        auth_id,
        "mining.authorize",
        Authorize::new(session.username.clone(), session.password.clone()).to_params(),
    )
    .await?;

    let auth_result = read_response(connection, auth_id, read_timeout, |_push| {}).await?;
    ensure!(
        is_truthy(&auth_result),
        "mining.authorize was rejected by upstream"
    );

    Ok(HandshakeOutcome::Authorized)
}

#[derive(Debug, PartialEq, Eq)]
pub enum HandshakeOutcome {
    Authorized,
    /// This tier was rejected; reconnect and retry the (now-advanced)
    /// ladder.
    Retry,
    /// Every tier has been rejected; this is a fatal, non-retryable
    /// protocol-capability failure.
    Exhausted,
}

async fn reject(session: &UpstreamSession, _tier: SubscribeTier) -> Option<()> {
    let mut state = session.state.lock().await;
    if state.advance() {
        Some(())
    } else {
        None
    }
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

/// Repeatedly connects and runs the handshake, applying the three-tier
/// fallback across reconnects, until authorized or the ladder is
/// exhausted. Network-level failures retry indefinitely with a 5-second
/// backoff; ladder exhaustion is returned as an error for the caller to
/// treat as fatal.
pub async fn connect_and_handshake(
    addr: SocketAddr,
    session: &UpstreamSession,
    read_timeout: Duration,
) -> Result<Connection> {
    loop {
        let mut connection = match Connection::connect(addr, read_timeout).await {
            Ok(connection) => connection,
            Err(error) => {
                tracing::warn!(%error, "connect failed, retrying in 5s");
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        };

        match handshake(&mut connection, session, read_timeout).await {
            Ok(HandshakeOutcome::Authorized) => return Ok(connection),
            Ok(HandshakeOutcome::Retry) => {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            Ok(HandshakeOutcome::Exhausted) => {
                bail!("upstream rejected mining.subscribe in every parameter form")
            }
            Err(error) => {
                tracing::warn!(%error, "handshake failed, retrying in 5s");
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }
}
