use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    options::{ModeOptions, Options, ProxyOptions, ServerOptions},
    settings::{ModeSettings, NodeEndpoint, ProxySettings, ServerSettings, Settings},
    std::{path::PathBuf, time::Duration},
    stratum::Username,
};

pub use anyhow::{anyhow, bail, ensure, Error};

pub type Result<T = (), E = Error> = std::result::Result<T, E>;

pub mod control;
pub mod fetcher;
pub mod ipc;
pub mod node_client;
pub mod notify_cache;
pub mod options;
pub mod proxy;
pub mod receive_loop;
pub mod send_loop;
pub mod server;
pub mod session;
pub mod settings;
pub mod share_tracker;

/// Bound on the per-upstream outbound share queue. Generous relative to
/// realistic in-flight share counts (tens to hundreds), so a healthy
/// upstream never backpressures the control server.
pub const SEND_QUEUE_CAPACITY: usize = 256;

/// Entries older than this are eligible for eviction once the cache holds
/// more than [`NOTIFY_CACHE_RETENTION_FLOOR`] entries.
pub const NOTIFY_CACHE_MAX_AGE: Duration = Duration::from_secs(600);

/// The cache never shrinks below this many entries regardless of age, so
/// work is always available even after a quiet period. Aging only removes
/// entries beyond this floor, oldest first.
pub const NOTIFY_CACHE_RETENTION_FLOOR: usize = 3;

/// Outstanding shares older than this are reaped unconditionally; no
/// correlation can succeed after this point.
pub const SHARE_TRACKER_MAX_AGE: Duration = Duration::from_secs(120);

pub async fn run(settings: Settings) -> Result<()> {
    match settings.mode.clone() {
        ModeSettings::Proxy(proxy) => proxy::run(settings.clone(), proxy).await,
        ModeSettings::Server(server) => server::run(settings.clone(), server).await,
    }
}
