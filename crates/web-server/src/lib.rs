use axum::{routing::get, Router};
use configuration::Pagination;
use database::AcademicStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AcademicStore>,
    pub pagination: Pagination,
}

impl AppState {
    pub fn new(store: Arc<dyn AcademicStore>, pagination: Pagination) -> Self {
        Self { store, pagination }
    }
}

/// Builds the full API router. Kept separate from `run_server` so tests can
/// drive it in-process.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/api", get(handlers::get_api_info))
        .route("/api/health", get(handlers::get_health))
        // --- Courses ---
        .route("/api/cursos", get(handlers::get_courses_page))
        .route("/api/cursos/buscar", get(handlers::search_courses))
        .route("/api/cursos/todos", get(handlers::get_all_courses))
        .route("/api/cursos/:id", get(handlers::get_course))
        .route("/api/cursos/codigo/:codigo", get(handlers::get_course_by_code))
        .route("/api/cursos/creditos/:creditos", get(handlers::get_courses_by_credits))
        .route(
            "/api/cursos/creditos-minimos/:creditos",
            get(handlers::get_courses_by_min_credits),
        )
        // --- Enrollments ---
        .route("/api/matriculas", get(handlers::get_enrollments_page))
        .route("/api/matriculas/:id", get(handlers::get_enrollment))
        .route("/api/matriculas/email", get(handlers::get_enrollments_by_email))
        .route(
            "/api/matriculas/email/completa",
            get(handlers::get_enrollment_details_by_email),
        )
        .route(
            "/api/matriculas/email/contar",
            get(handlers::count_active_enrollments_by_email),
        )
        .route(
            "/api/matriculas/email/paginado",
            get(handlers::get_enrollments_page_by_email),
        )
        .route(
            "/api/matriculas/codigo/:codigo",
            get(handlers::get_enrollments_by_student_code),
        )
        .route(
            "/api/matriculas/estado/:estado",
            get(handlers::get_enrollments_by_status),
        )
        .route("/api/matriculas/curso", get(handlers::get_enrollments_by_course_name))
        // --- Persons ---
        .route("/api/personas/:id", get(handlers::get_person))
        // --- Professors ---
        .route(
            "/api/profesores/codigo/:codigo",
            get(handlers::get_professor_by_code),
        )
        .with_state(Arc::new(state))
        .layer(cors)
        // Logs every incoming request.
        .layer(TraceLayer::new_for_http())
}

/// Binds `addr` and serves the API until the process is stopped.
pub async fn run_server(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
