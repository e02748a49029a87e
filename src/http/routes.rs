use super::state::AppState;
use super::{admin, handlers};
use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Content catalogue
        .route("/speaking/tests", get(handlers::list_speaking_tests))
        .route("/speaking/tests/:test_id", get(handlers::get_speaking_test))
        .route(
            "/speaking/questions",
            get(handlers::list_speaking_questions),
        )
        .route("/writing/tasks", get(handlers::list_writing_tasks))
        .route("/writing/tasks/:task_id", get(handlers::get_writing_task))
        .route("/listening/tests", get(handlers::list_listening_tests))
        .route(
            "/listening/tests/:test_id",
            get(handlers::get_listening_test),
        )
        .route("/reading/tests", get(handlers::list_reading_tests))
        .route("/reading/tests/:test_id", get(handlers::get_reading_test))
        // Guided speaking sessions
        .route("/speaking/sessions", post(handlers::create_session))
        .route(
            "/speaking/sessions/:session_id",
            get(handlers::get_session).delete(handlers::close_session),
        )
        .route(
            "/speaking/sessions/:session_id/start",
            post(handlers::start_session),
        )
        .route(
            "/speaking/sessions/:session_id/prepare",
            post(handlers::begin_preparation),
        )
        .route(
            "/speaking/sessions/:session_id/record",
            post(handlers::begin_recording),
        )
        .route(
            "/speaking/sessions/:session_id/stop",
            post(handlers::stop_recording),
        )
        .route(
            "/speaking/sessions/:session_id/next",
            post(handlers::next_prompt),
        )
        .route(
            "/speaking/sessions/:session_id/discard",
            post(handlers::discard_recording),
        )
        .route(
            "/speaking/sessions/:session_id/speak",
            post(handlers::speak_prompt),
        )
        .route(
            "/speaking/sessions/:session_id/frames",
            post(handlers::push_frames),
        )
        .route(
            "/speaking/sessions/:session_id/slots/:index/audio",
            get(handlers::slot_audio),
        )
        .route(
            "/speaking/sessions/:session_id/slots/:index/submit",
            post(handlers::submit_session_answer),
        )
        // Submissions
        .route("/speaking/submissions", post(handlers::submit_speaking))
        .route("/writing/submissions", post(handlers::submit_essay))
        // Admin content management
        .route("/admin/speaking/tests", post(admin::create_speaking_test))
        .route(
            "/admin/speaking/tests/:id",
            delete(admin::delete_speaking_test),
        )
        .route(
            "/admin/speaking/questions",
            post(admin::create_speaking_question),
        )
        .route(
            "/admin/speaking/questions/:id",
            delete(admin::delete_speaking_question),
        )
        .route("/admin/writing/tasks", post(admin::create_writing_task))
        .route(
            "/admin/writing/tasks/:id",
            delete(admin::delete_writing_task),
        )
        .route("/admin/listening/tests", post(admin::create_listening_test))
        .route(
            "/admin/listening/tests/:id",
            delete(admin::delete_listening_test),
        )
        .route("/admin/reading/tests", post(admin::create_reading_test))
        .route(
            "/admin/reading/tests/:id",
            delete(admin::delete_reading_test),
        )
        .route("/admin/submissions", get(admin::list_submissions))
        // CORS for the browser frontend, tracing middleware for request logging
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
