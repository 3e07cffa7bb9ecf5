use {
    super::*,
    std::net::{SocketAddr, ToSocketAddrs},
};

/// The fully validated, immutable configuration the rest of the process
/// runs from. Built once from [`Options`] in `main` and then handed by
/// reference to every task; nothing below this point re-reads argv or the
/// environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub control_socket: PathBuf,
    pub stratifier_socket: Option<PathBuf>,
    pub mode: ModeSettings,
}

#[derive(Debug, Clone)]
pub enum ModeSettings {
    Proxy(ProxySettings),
    Server(ServerSettings),
}

#[derive(Debug, Clone)]
pub struct ProxySettings {
    pub addr: SocketAddr,
    pub username: Username,
    pub password: String,
    pub user_agent: String,
    pub read_timeout: Duration,
    pub max_idle_reads: u32,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub nodes: Vec<NodeEndpoint>,
    pub payout_address: String,
}

#[derive(Debug, Clone)]
pub struct NodeEndpoint {
    pub base_url: String,
    pub rpc_user: String,
    pub rpc_password: String,
}

impl Settings {
    pub fn from_options(options: Options) -> Result<Self> {
        let mode = match options.mode {
            ModeOptions::Proxy(proxy) => ModeSettings::Proxy(ProxySettings::try_from(proxy)?),
            ModeOptions::Server(server) => ModeSettings::Server(ServerSettings::try_from(server)?),
        };

        Ok(Self {
            control_socket: options.control_socket,
            stratifier_socket: options.stratifier_socket,
            mode,
        })
    }
}

impl TryFrom<ProxyOptions> for ProxySettings {
    type Error = Error;

    fn try_from(options: ProxyOptions) -> Result<Self> {
        let addr = options
            .url
            .to_socket_addrs()
            .with_context(|| format!("failed to resolve upstream address `{}`", options.url))?
            .next()
            .with_context(|| format!("upstream address `{}` resolved to no addresses", options.url))?;

        ensure!(
            options.max_idle_reads > 0,
            "max-idle-reads must be greater than zero"
        );

        Ok(Self {
            addr,
            username: options.username.parse().context("invalid username")?,
            password: options.password,
            user_agent: options.user_agent,
            read_timeout: Duration::from_secs(options.read_timeout_secs),
            max_idle_reads: options.max_idle_reads,
        })
    }
}

impl TryFrom<ServerOptions> for ServerSettings {
    type Error = Error;

    fn try_from(options: ServerOptions) -> Result<Self> {
        ensure!(!options.nodes.is_empty(), "at least one --node is required");

        let nodes = options
            .nodes
            .into_iter()
            .map(|node| NodeEndpoint {
                base_url: format!("http://{node}"),
                rpc_user: options.rpc_user.clone(),
                rpc_password: options.rpc_password.clone(),
            })
            .collect();

        Ok(Self {
            nodes,
            payout_address: options.payout_address,
        })
    }
}
