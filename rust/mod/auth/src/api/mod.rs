mod auth;
mod middleware;
mod users;

use std::sync::Arc;

use axum::Router;

use crate::service::AuthService;

/// Shared application state.
pub type AppState = Arc<AuthService>;

/// Build the complete auth API router.
///
/// Paths are absolute. Routes under [`users::routes`] and the logout route
/// sit behind the bearer-token middleware; everything else is public.
pub fn build_router(svc: Arc<AuthService>) -> Router {
    let protected = Router::new()
        .merge(auth::protected_routes())
        .merge(users::routes())
        .route_layer(axum::middleware::from_fn_with_state(
            svc.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .merge(auth::routes())
        .merge(protected)
        .with_state(svc)
}
