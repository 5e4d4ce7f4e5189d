//! Router composition for the IIIF server.

use super::{handlers::serve_iiif, service::IiifService};
use axum::{Router, routing::get};
use std::sync::Arc;

/// Attach the IIIF endpoint under its base path (`{base}/{*path}`).
pub fn add_iiif_to_app(app: Router, service: Arc<IiifService>) -> Router {
	let route = service.base.path.join_as_string("{*path}");
	let iiif_app = Router::new().route(&route, get(serve_iiif)).with_state(service);
	app.merge(iiif_app)
}

/// Liveness probe at `/status`.
pub fn add_status_to_app(app: Router) -> Router {
	app.route("/status", get(|| async { "ready!" }))
}
