use super::*;

/// Top-level CLI surface, parsed once in `main` and merged into an
/// immutable [`crate::settings::Settings`] before anything else runs.
#[derive(Debug, Parser)]
#[command(
    name = "ckgen",
    version,
    about = "Work-generator core for a Bitcoin mining pool daemon"
)]
pub struct Options {
    #[command(subcommand)]
    pub mode: ModeOptions,

    /// Filesystem path of the Unix-domain control socket this process
    /// listens on.
    #[arg(long, global = true, default_value = "/tmp/ckgen.sock")]
    pub control_socket: PathBuf,

    /// Unix datagram socket on which the adjacent stratifier process is
    /// listening for `subscribe`/`notify`/`diff`/`update`/`shutdown`
    /// notifications. If unset, notifications are logged and dropped.
    #[arg(long, global = true)]
    pub stratifier_socket: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum ModeOptions {
    /// Run as a Stratum client against one upstream pool, re-publishing
    /// its work to the local stratifier.
    Proxy(ProxyOptions),
    /// Run against local full-node daemons, serving block templates and
    /// submitting blocks on request.
    Server(ServerOptions),
}

#[derive(Debug, Parser)]
pub struct ProxyOptions {
    /// Upstream pool address, `host:port`.
    #[arg(long)]
    pub url: String,

    /// Username (commonly `address.workername`) sent with
    /// `mining.authorize`.
    #[arg(long)]
    pub username: String,

    #[arg(long, default_value = "")]
    pub password: String,

    /// Client tag sent as the first `mining.subscribe` parameter.
    #[arg(long, default_value = "ckgen/0.1.0")]
    pub user_agent: String,

    /// Idle read timeout per line, in seconds.
    #[arg(long, default_value_t = 5)]
    pub read_timeout_secs: u64,

    /// Consecutive idle reads tolerated before declaring the connection
    /// stalled and reconnecting.
    #[arg(long, default_value_t = 24)]
    pub max_idle_reads: u32,
}

#[derive(Debug, Parser)]
pub struct ServerOptions {
    /// Full-node RPC endpoints to probe at startup, `host:port`, tried in
    /// order; the first that survives the startup probe is served.
    #[arg(long = "node", required = true)]
    pub nodes: Vec<String>,

    #[arg(long)]
    pub rpc_user: String,

    #[arg(long)]
    pub rpc_password: String,

    /// Payout address validated against each node during the startup
    /// probe.
    #[arg(long)]
    pub payout_address: String,
}
