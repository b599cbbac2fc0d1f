use axum::{
    extract::{Query, Request, State},
    middleware::Next,
    response::Response,
};
use rockfall_access::{AccessDenied, View};
use rockfall_core::error::AppError;
use serde::Deserialize;

use crate::services::metrics::record_access_denied;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct MineQuery {
    pub mine: Option<String>,
}

/// Mine a dashboard request was scoped to, after the site check passed.
#[derive(Debug, Clone)]
pub struct MineScope(pub Option<String>);

/// The single entry check for every `/dashboard` route: resolve the view
/// from the path, then apply its role requirement and the optional
/// `?mine=` site check against the current principal.
pub async fn view_guard(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let segment = request
        .uri()
        .path()
        .strip_prefix("/dashboard")
        .unwrap_or_default()
        .to_string();
    let view = View::from_segment(&segment)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("no dashboard view {:?}", segment)))?;

    let query = Query::<MineQuery>::try_from_uri(request.uri())
        .map(|Query(q)| q)
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!(e.body_text())))?;

    let snapshot = state.session.snapshot();
    let principal = snapshot.principal.as_ref();

    let decision = snapshot.authorize_view(view).and_then(|()| match &query.mine {
        Some(mine) if !snapshot.evaluator().can_access_mine(mine) => {
            Err(AccessDenied::Site(mine.clone()))
        }
        _ => Ok(()),
    });

    if let Err(denied) = decision {
        record_access_denied(view.as_str());
        tracing::warn!(
            view = view.title(),
            user_id = principal.map(|p| p.id.as_str()).unwrap_or("-"),
            reason = %denied,
            "Dashboard access denied"
        );
        return Err(denied.into());
    }

    request.extensions_mut().insert(view);
    request.extensions_mut().insert(MineScope(query.mine));
    request.extensions_mut().insert(snapshot);
    Ok(next.run(request).await)
}
