//! Serve the reward API.

use {
    crate::domain::{eth, reward},
    std::{future::Future, net::SocketAddr, sync::Arc},
    tokio::sync::oneshot,
    tower_http::{cors::CorsLayer, trace::TraceLayer},
};

mod error;
mod routes;

pub struct Api {
    pub addr: SocketAddr,
    pub service: reward::Service,
    pub environment: Environment,
}

/// Deployment details reported by the health endpoint.
#[derive(Debug, Clone)]
pub struct Environment {
    pub contract: eth::Address,
    /// Node URL with credentials and API keys stripped.
    pub rpc_url: String,
}

impl Api {
    pub async fn serve(
        self,
        bind: Option<oneshot::Sender<SocketAddr>>,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        let app = router(self.service, self.environment);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "serving rewarder");
        if let Some(bind) = bind {
            let _ = bind.send(local_addr);
        }

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    }
}

fn router(service: reward::Service, environment: Environment) -> axum::Router {
    let state = State(Arc::new(Inner {
        service,
        environment,
    }));

    let app = axum::Router::new();
    let app = routes::reward(app);
    let app = routes::health(app);
    let app = app.with_state(state);
    let app = routes::healthz(app);

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    app.merge(observe::metrics::handle_metrics())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[derive(Clone)]
struct State(Arc<Inner>);

impl State {
    fn service(&self) -> &reward::Service {
        &self.0.service
    }

    fn environment(&self) -> &Environment {
        &self.0.environment
    }
}

struct Inner {
    service: reward::Service,
    environment: Environment,
}

/// RFC 3339 timestamp with millisecond precision.
fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
