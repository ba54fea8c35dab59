use axum::{http::StatusCode, response::IntoResponse};

pub(in crate::api) fn healthz(app: axum::Router) -> axum::Router {
    app.route("/healthz", axum::routing::get(route))
}

async fn route() -> impl IntoResponse {
    StatusCode::OK
}
