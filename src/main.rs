use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use registrar_api::config::config;
use registrar_api::handlers::{auth, enrollments, grades, health, reports};
use registrar_api::middleware::auth::jwt_auth_middleware;
use registrar_api::middleware::rbac;
use registrar_api::state::AppState;
use registrar_api::store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = config();
    tracing::info!("Starting registrar API in {:?} mode", cfg.environment);

    let pool = store::connect(&cfg.database).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let state = AppState::new(pool);

    let bind_addr = format!("0.0.0.0:{}", cfg.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/health", get(health::health))
        .route("/api/v1/auth/login", post(auth::login))
        // Everything below requires a verified bearer token
        .merge(protected_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/auth/me", get(auth::me))
        .route("/api/v1/enrollments", get(enrollments::list))
        .route("/api/v1/enrollments/my", get(enrollments::my))
        .route("/api/v1/grades", get(grades::query))
        .route("/api/v1/grades/my", get(grades::my))
        .merge(enrollment_write_routes())
        .merge(grade_write_routes())
        .merge(report_routes())
        .layer(middleware::from_fn(jwt_auth_middleware))
}

fn enrollment_write_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/enrollments", post(enrollments::create))
        .route("/api/v1/enrollments/:id", delete(enrollments::remove))
        .route_layer(middleware::from_fn(rbac::require_enroll_writer))
}

fn grade_write_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/grades/by-course", put(grades::upsert_by_course))
        .route("/api/v1/grades/by-student", put(grades::upsert_by_student))
        .route_layer(middleware::from_fn(rbac::require_grade_writer))
}

fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/reports/grade-roster", get(reports::grade_roster))
        .route("/api/v1/reports/grade-report", get(reports::grade_report))
        .route_layer(middleware::from_fn(rbac::require_report_reader))
}
