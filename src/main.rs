use arborist_exam_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    middleware, routes, AppState,
};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    // Deadline sweeper: no session may outlive its duration, even if the
    // client never comes back for the result.
    {
        let state = app_state.clone();
        let interval = Duration::from_secs(config.session_sweep_interval_seconds.max(1));
        tokio::spawn(async move {
            loop {
                match state
                    .exam_service
                    .expire_overdue(arborist_exam_backend::utils::time::now())
                    .await
                {
                    Ok(0) => {}
                    Ok(settled) => {
                        info!("Session sweeper settled {} timed-out exams", settled);
                    }
                    Err(e) => {
                        tracing::error!(error = ?e, "Session sweeper error");
                    }
                }
                tokio::time::sleep(interval).await;
            }
        });
    }

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let public_api = Router::new()
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route(
            "/api/subscriptions/payment-webhook",
            post(routes::subscriptions::payment_webhook),
        )
        .layer(axum::middleware::from_fn_with_state(
            middleware::rate_limit::new_rps_state(config.student_rps),
            middleware::rate_limit::rps_middleware,
        ));

    let student_api = Router::new()
        .route("/api/exams/start", post(routes::exams::start_exam))
        .route("/api/exams/history", get(routes::exams::get_history))
        .route(
            "/api/exams/:exam_id/answer",
            patch(routes::exams::save_answer),
        )
        .route("/api/exams/:exam_id/flag", post(routes::exams::toggle_flag))
        .route("/api/exams/:exam_id/status", get(routes::exams::get_status))
        .route("/api/exams/:exam_id/submit", post(routes::exams::submit_exam))
        .route("/api/questions", get(routes::questions::list_questions))
        .route("/api/topics", get(routes::questions::list_topics))
        .route("/api/users/progress", get(routes::users::get_progress))
        .route("/api/users/language", patch(routes::users::update_language))
        .route(
            "/api/subscriptions/subscribe",
            post(routes::subscriptions::subscribe),
        )
        .route(
            "/api/subscriptions/status",
            get(routes::subscriptions::get_status),
        )
        .route(
            "/api/subscriptions/cancel",
            post(routes::subscriptions::cancel),
        )
        .route(
            "/api/subscriptions/create-payment",
            post(routes::subscriptions::create_payment),
        )
        .layer(axum::middleware::from_fn(
            middleware::auth::require_bearer_auth,
        ))
        .layer(axum::middleware::from_fn_with_state(
            middleware::rate_limit::new_rps_state(config.student_rps),
            middleware::rate_limit::rps_middleware,
        ));

    let admin_api = Router::new()
        .route(
            "/api/admin/users",
            get(routes::admin::list_users).post(routes::admin::create_user),
        )
        .route(
            "/api/admin/users/:user_id",
            axum::routing::delete(routes::admin::delete_user),
        )
        .route(
            "/api/admin/questions",
            get(routes::admin::list_questions).post(routes::admin::create_question),
        )
        .route(
            "/api/admin/questions/template",
            get(routes::admin::download_template),
        )
        .route(
            "/api/admin/questions/bulk-import",
            post(routes::admin::bulk_import_questions),
        )
        .route(
            "/api/admin/questions/export",
            get(routes::admin::export_questions),
        )
        .route(
            "/api/admin/questions/:question_id",
            axum::routing::put(routes::admin::update_question)
                .delete(routes::admin::delete_question),
        )
        .route("/api/admin/stats", get(routes::admin::get_stats))
        .layer(axum::middleware::from_fn(middleware::auth::require_admin))
        .layer(axum::middleware::from_fn_with_state(
            middleware::rate_limit::new_rps_state(config.admin_rps),
            middleware::rate_limit::rps_middleware,
        ));

    let app = base_routes
        .merge(public_api)
        .merge(student_api)
        .merge(admin_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
