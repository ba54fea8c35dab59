use {
    crate::api::{State, error},
    tracing::Instrument,
};

mod dto;

pub(in crate::api) fn reward(router: axum::Router<State>) -> axum::Router<State> {
    router.route("/rewards", axum::routing::post(route))
}

async fn route(
    state: axum::extract::State<State>,
    body: axum::body::Bytes,
) -> Result<axum::Json<dto::Reward>, error::Failure> {
    let handle_request = async {
        let claim = serde_json::from_slice::<dto::Claim>(&body).map_err(|err| {
            tracing::debug!(?err, "malformed reward request");
            error::malformed(&err)
        })?;
        let reward = state.service().process(claim.into_domain()).await?;
        Ok::<_, error::Failure>(axum::Json(dto::Reward::new(&reward)))
    };

    handle_request
        .instrument(tracing::info_span!("/rewards"))
        .await
}
