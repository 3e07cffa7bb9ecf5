use {
    ckgen::{ipc::Ipc, options::Options, settings::Settings},
    clap::Parser,
    std::process::ExitCode,
    tracing_subscriber::EnvFilter,
};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let options = Options::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            tracing::error!("failed to start async runtime: {error}");
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(run(options))
}

async fn run(options: Options) -> ExitCode {
    let stratifier_socket = options.stratifier_socket.clone();

    let settings = match Settings::from_options(options) {
        Ok(settings) => settings,
        Err(error) => {
            tracing::error!("{error:#}");
            fatal_exit(stratifier_socket).await;
            return ExitCode::FAILURE;
        }
    };

    match ckgen::run(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{error:#}");
            fatal_exit(stratifier_socket).await;
            ExitCode::FAILURE
        }
    }
}

async fn fatal_exit(stratifier_socket: Option<std::path::PathBuf>) {
    if let Some(path) = stratifier_socket {
        Ipc::new(path).shutdown().await;
    }
    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
}
