use axum::{Router, routing::get};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse};

pub mod error;
pub mod handlers;

pub type AppState = Arc<AppStateInner>;

/// Shared server state: the filesystem root under which every client's
/// namespace (`<root>/<key>/…`) lives.
pub struct AppStateInner {
    pub root: PathBuf,
}

pub fn create_app(root: PathBuf) -> Router {
    let state: AppState = Arc::new(AppStateInner { root });

    let middlewares = tower::ServiceBuilder::new().layer(
        tower_http::trace::TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new())
            .on_response(DefaultOnResponse::new().latency_unit(tower_http::LatencyUnit::Micros)),
    );

    Router::new()
        .route(
            "/files_description",
            get(handlers::files_description_handler),
        )
        .route("/meta", get(handlers::meta_handler))
        .route(
            "/files",
            get(handlers::get_file_handler)
                .post(handlers::post_file_handler)
                .patch(handlers::patch_file_handler)
                .delete(handlers::delete_file_handler),
        )
        .layer(middlewares)
        .with_state(state)
}
