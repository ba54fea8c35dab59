use {
    crate::{
        api::State,
        domain::{chain, reward::Identity},
    },
    serde::Serialize,
};

pub(in crate::api) fn health(router: axum::Router<State>) -> axum::Router<State> {
    router.route("/rewards/health", axum::routing::get(route))
}

async fn route(state: axum::extract::State<State>) -> axum::Json<Health> {
    let state = state.0;
    let identity = state.service().identity();
    let status = state.service().chain().status(identity.address()).await;
    axum::Json(Health::new(&state, identity, status))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Health {
    status: &'static str,
    environment: Environment,
    timestamp: String,
}

/// Never includes the credential itself.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Environment {
    has_owner_credential: bool,
    owner_address: String,
    network_status: String,
    owner_balance: String,
    contract_address: String,
    rpc_url: String,
    chain_id: Option<u64>,
}

impl Health {
    fn new(state: &State, identity: &Identity, status: chain::Status) -> Self {
        Self {
            status: "healthy",
            environment: Environment {
                has_owner_credential: matches!(identity, Identity::Loaded(_)),
                owner_address: identity
                    .address()
                    .map(|address| address.to_checksum(None))
                    .unwrap_or_else(|| "Not available".to_string()),
                network_status: match &status.network {
                    Ok(_) => "Connected".to_string(),
                    Err(err) => format!("Error: {err}"),
                },
                owner_balance: status
                    .balance
                    .map(|balance| format!("{} ETH", balance.to_decimal()))
                    .unwrap_or_else(|| "Not checked".to_string()),
                contract_address: state.environment().contract.to_checksum(None),
                rpc_url: state.environment().rpc_url.clone(),
                chain_id: status.network.ok().map(|chain| chain.0),
            },
            timestamp: crate::api::timestamp(),
        }
    }
}
