use axum::{extract::State, Json};
use rockfall_access::guard::navigation;
use rockfall_access::NavItem;
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct IndexResponse {
    pub provider: &'static str,
    pub authenticated: bool,
    pub navigation: Vec<NavItem>,
}

pub async fn index(State(state): State<AppState>) -> Json<IndexResponse> {
    let snapshot = state.session.snapshot();
    Json(IndexResponse {
        provider: state.session.provider_name(),
        authenticated: snapshot.is_authenticated(),
        navigation: navigation(snapshot.principal.as_ref()),
    })
}

pub async fn health_check() -> &'static str {
    "OK"
}
