use axum::{middleware, routing::get, Router};

use crate::shared::metadata::urls::RouteTable;
use crate::shared::metadata::views::{self, AdminState};
use crate::system;
use crate::system::auth::middleware::require_auth;

/// All application routes: hand-written ones first, then one set of
/// admin routes per registered entity type
pub fn configure_routes(state: AdminState) -> Router {
    let keys = state.keys.clone();
    let generated = state.routes.clone();

    let table = RouteTable::new()
        .route("/health", get(|| async { "ok" }))
        .route(
            "/api/system/metadata",
            get(system::handlers::metadata::list)
                .route_layer(middleware::from_fn_with_state(keys.clone(), require_auth)),
        )
        .generated(&generated, |route| views::bind(route, keys.clone()));

    for name in table.skipped() {
        tracing::info!("Route {} not generated, a hand-written route owns its path", name);
    }

    table.into_router().with_state(state)
}
