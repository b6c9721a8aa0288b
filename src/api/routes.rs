use axum::http::HeaderValue;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers;
use crate::api::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let task_routes = Router::new()
        .route(
            "/",
            get(handlers::tasks::list_tasks).post(handlers::tasks::create_task),
        )
        .route(
            "/{id}",
            get(handlers::tasks::get_task)
                .put(handlers::tasks::update_task)
                .delete(handlers::tasks::delete_task),
        )
        .route("/{id}/move", post(handlers::tasks::move_task))
        .route("/{id}/reorder", post(handlers::tasks::reorder_task))
        .route("/{id}/top", post(handlers::tasks::move_task_to_top))
        .route("/{id}/bottom", post(handlers::tasks::move_task_to_bottom))
        .route("/{id}/comments", post(handlers::tasks::add_comment))
        .route(
            "/{id}/comments/{comment_id}",
            delete(handlers::tasks::delete_comment),
        );

    let column_routes = Router::new()
        .route(
            "/",
            get(handlers::columns::list_columns).post(handlers::columns::create_column),
        )
        .route("/order", put(handlers::columns::reorder_columns))
        .route(
            "/{id}",
            put(handlers::columns::update_column).delete(handlers::columns::delete_column),
        )
        .route("/{id}/move", post(handlers::columns::move_column));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/board", get(handlers::board::get_board))
        .route("/api/board/refresh", post(handlers::board::refresh_board))
        .route(
            "/api/theme",
            get(handlers::board::get_theme).put(handlers::board::set_theme),
        )
        .route("/api/theme/toggle", post(handlers::board::toggle_theme))
        .route("/api/export", get(handlers::board::export))
        .route("/api/import/validate", post(handlers::board::validate_import))
        .route("/api/import", post(handlers::board::import))
        .route("/api/events", get(handlers::sse::sse_handler))
        .nest("/api/tasks", task_routes)
        .nest("/api/columns", column_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
