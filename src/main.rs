mod collection;
mod handlers;
mod middleware;
mod models;
mod services;
mod store;
mod utils;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use std::env;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    handlers::{analytics, auth, errors_handoff, files, jobs, notifications, resumes, team},
    middleware::auth::auth_middleware,
    store::CollectionStore,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CollectionStore>,
    pub jwt_secret: String,
    pub upload_dir: String,
    pub linkedin_client_id: String,
    pub linkedin_redirect_uri: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resume_screening_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");
    let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "./storage/uploads".to_string());
    let linkedin_client_id =
        env::var("LINKEDIN_CLIENT_ID").unwrap_or_else(|_| "demo-client-id".to_string());
    let linkedin_redirect_uri = env::var("LINKEDIN_REDIRECT_URI")
        .unwrap_or_else(|_| "http://localhost:8000/auth/linkedin/callback".to_string());

    // Create upload directory if it doesn't exist
    if let Err(e) = std::fs::create_dir_all(&upload_dir) {
        tracing::warn!("Failed to create upload directory {}: {}", upload_dir, e);
    }

    // Everything lives in memory: the collections are rebuilt from the
    // demo seed on every start and discarded on shutdown.
    let store = Arc::new(CollectionStore::seeded());

    let state = AppState {
        store,
        jwt_secret,
        upload_dir,
        linkedin_client_id,
        linkedin_redirect_uri,
    };

    let cors_origin =
        env::var("CORS_ALLOWED_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

    let cors = if cors_origin == "*" {
        // Allow any origin for production flexibility
        CorsLayer::new()
            .allow_origin(axum::http::header::HeaderValue::from_static("*"))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::AUTHORIZATION,
            ])
    } else {
        // Specific origin
        CorsLayer::new()
            .allow_origin(cors_origin.parse::<HeaderValue>()?)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::AUTHORIZATION,
            ])
    };

    let protected_routes = Router::new()
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs", post(jobs::create_job))
        .route("/jobs/:id", get(jobs::get_job))
        .route("/jobs/:id", put(jobs::update_job))
        .route("/jobs/:id", axum::routing::delete(jobs::delete_job))
        .route("/jobs/:id/actions", post(jobs::dispatch_job_action))
        .route("/resumes", get(resumes::list_resumes))
        .route("/resumes/upload", post(resumes::upload_resumes))
        .route(
            "/resumes/uploads/:id/progress",
            get(resumes::upload_progress),
        )
        .route("/resumes/:id", get(resumes::get_resume))
        .route("/resumes/:id", put(resumes::update_resume))
        .route("/resumes/:id", axum::routing::delete(resumes::delete_resume))
        .route("/resumes/:id/actions", post(resumes::dispatch_resume_action))
        .route("/team", get(team::list_members))
        .route("/team/invite", post(team::invite_member))
        .route("/team/:id", get(team::get_member))
        .route("/team/:id", put(team::update_member))
        .route("/team/:id/actions", post(team::dispatch_member_action))
        .route("/admin/analytics", get(analytics::get_analytics))
        .route("/admin/activity", get(analytics::get_activity))
        .route(
            "/admin/notifications/trigger",
            post(notifications::trigger_notifications),
        )
        .route("/notifications/stale", get(notifications::get_stale_resumes))
        .route("/files/:filename", get(files::serve_file))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/linkedin", get(auth::linkedin_start))
        .route("/auth/linkedin/callback", get(auth::linkedin_callback))
        .route("/errors/handoff", post(errors_handoff::create_handoff))
        .route("/errors/handoff/:key", get(errors_handoff::consume_handoff))
        .route("/download/:filename", get(files::serve_file_with_token))
        .merge(protected_routes)
        .layer(cors)
        .layer(DefaultBodyLimit::max(
            env::var("MAX_REQUEST_BODY_MB")
                .unwrap_or_else(|_| "50".to_string())
                .parse::<usize>()
                .unwrap_or(50)
                * 1024
                * 1024,
        ))
        .with_state(state.clone());

    // Start background notification scheduler
    let notification_store = state.store.clone();
    tokio::spawn(async move {
        use crate::services::notification::NotificationService;
        use tokio_cron_scheduler::{Job, JobScheduler};

        let sched = JobScheduler::new()
            .await
            .expect("Failed to create scheduler");

        // Run notifications daily at 9 AM
        let job = Job::new_async("0 0 9 * * *", move |_uuid, _l| {
            let store = notification_store.clone();
            Box::pin(async move {
                let notification_service = NotificationService::new(store);
                if let Err(e) = notification_service.process_stale_notifications().await {
                    tracing::error!("Failed to process notifications: {}", e);
                } else {
                    tracing::info!("Daily notifications processed successfully");
                }
            })
        })
        .expect("Failed to create notification job");

        sched.add(job).await.expect("Failed to add job");
        sched.start().await.expect("Failed to start scheduler");

        tracing::info!("Notification scheduler started - running daily at 9 AM");

        // Keep the scheduler running
        loop {
            tokio::time::sleep(tokio::time::Duration::from_secs(3600)).await;
        }
    });

    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server running on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
