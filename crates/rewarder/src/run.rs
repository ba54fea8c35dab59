#[cfg(unix)]
use tokio::signal::unix::{self, SignalKind};
use {
    crate::{
        api,
        domain::{chain, reward, score},
        infra::{self, cli, config, keychain},
    },
    clap::Parser,
    std::{net::SocketAddr, sync::Arc},
    tokio::sync::oneshot,
};

pub async fn start(args: impl Iterator<Item = String>) {
    let args = cli::Args::parse_from(args);
    let obs_config = observe::Config::new(
        &args.log,
        Some(tracing::Level::ERROR),
        args.use_json_logs,
    );
    observe::tracing::initialize(&obs_config);
    infra::observe::metrics::init();
    tracing::info!("running rewarder with validated arguments:\n{args}");
    run(args, None).await;
}

/// Runs the service until a shutdown signal arrives. If `bind` is given the
/// bound address is sent to it once the server listens.
pub async fn run(args: cli::Args, bind: Option<oneshot::Sender<SocketAddr>>) {
    let config = config::file::load(&args.config).await;
    let rpc_url = cli::redact(&args.node_url);

    let owner = args.owner_private_key.as_deref().map(keychain::Owner::load);
    let identity = match &owner {
        None => {
            tracing::warn!("no owner private key configured, rewards can't be paid");
            reward::Identity::Missing
        }
        Some(Err(err)) => {
            tracing::error!(?err, "failed to load owner private key");
            reward::Identity::Invalid(err.to_string())
        }
        Some(Ok(owner)) => {
            tracing::info!(?owner, "loaded owner credential");
            reward::Identity::Loaded(owner.address())
        }
    };

    let eth = infra::Ethereum::connect(
        &args.node_url,
        config.contract,
        config.chain_id,
        owner.as_ref().and_then(|owner| owner.as_ref().ok()),
    )
    .await
    .unwrap_or_else(|err| panic!("failed to connect to node at {rpc_url}: {err}"));
    let engine = score::Engine::new(&config.rules)
        .unwrap_or_else(|err| panic!("invalid reward configuration: {err:#}"));

    api::Api {
        addr: args.addr,
        service: reward::Service::new(
            chain::Client::new(Arc::new(eth), config.policy),
            engine,
            identity,
        ),
        environment: api::Environment {
            contract: config.contract,
            rpc_url,
        },
    }
    .serve(bind, shutdown_signal())
    .await
    .unwrap_or_else(|err| panic!("failed to serve API: {err}"));
}

#[cfg(unix)]
async fn shutdown_signal() {
    // Kubernetes sends SIGTERM, locally SIGINT (ctrl-c) is most common.
    let (Ok(mut interrupt), Ok(mut terminate)) = (
        unix::signal(SignalKind::interrupt()),
        unix::signal(SignalKind::terminate()),
    ) else {
        tracing::error!("failed to install signal handlers, shutdown on signal disabled");
        return std::future::pending().await;
    };
    tokio::select! {
        _ = interrupt.recv() => (),
        _ = terminate.recv() => (),
    };
    tracing::info!("shutting down");
}

#[cfg(windows)]
async fn shutdown_signal() {
    // We don't support signal handling on Windows.
    std::future::pending().await
}
