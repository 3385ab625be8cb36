use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post, put},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/habits", get(handlers::list_habits).post(handlers::create_habit))
        .route(
            "/api/habits/:id",
            put(handlers::update_habit).delete(handlers::delete_habit),
        )
        .route("/api/habits/:id/archive", post(handlers::archive_habit))
        .route(
            "/api/records",
            get(handlers::list_records)
                .post(handlers::upsert_record)
                .delete(handlers::delete_record),
        )
        .route("/api/stats", get(handlers::month_stats))
        .route(
            "/api/settings/theme",
            get(handlers::get_theme).put(handlers::put_theme),
        )
        .route("/api/tasks", get(handlers::list_tasks).post(handlers::create_task))
        .route("/api/tasks/:id", delete(handlers::delete_task))
        .route("/api/tasks/:id/toggle", post(handlers::toggle_task))
        .route("/api/life", get(handlers::life_progress))
        .route(
            "/api/chat",
            get(handlers::list_messages).post(handlers::post_message),
        )
        .with_state(state)
}
