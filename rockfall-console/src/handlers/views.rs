use axum::{
    extract::{Path, State},
    Extension, Json,
};
use rockfall_access::guard::{navigation, permitted_actions};
use rockfall_access::session::AuthSnapshot;
use rockfall_access::{Action, NavItem, View};
use serde::Serialize;

use crate::middleware::guard::MineScope;
use crate::AppState;

/// What a dashboard page may show for the current principal.
#[derive(Serialize)]
pub struct ViewDescriptor {
    pub view: View,
    pub title: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mine: Option<String>,
    pub actions: Vec<Action>,
    pub navigation: Vec<NavItem>,
}

/// Runs behind the view guard, which supplies the view, the mine scope and
/// the snapshot it authorized.
pub async fn dashboard_handler(
    Extension(view): Extension<View>,
    Extension(MineScope(mine)): Extension<MineScope>,
    Extension(snapshot): Extension<AuthSnapshot>,
) -> Json<ViewDescriptor> {
    let principal = snapshot.principal.as_ref();
    Json(ViewDescriptor {
        view,
        title: view.title(),
        mine,
        actions: permitted_actions(principal, view),
        navigation: navigation(principal),
    })
}

#[derive(Serialize)]
pub struct MineAccess {
    pub mine_id: String,
    pub allowed: bool,
}

pub async fn mine_access_handler(
    State(state): State<AppState>,
    Path(mine_id): Path<String>,
) -> Json<MineAccess> {
    let allowed = state.session.can_access_mine(&mine_id);
    Json(MineAccess { mine_id, allowed })
}
