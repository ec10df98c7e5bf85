pub mod error;
pub mod handlers;
pub mod models;

use axum::{
    http::{header, Method},
    routing::{get, post},
    Router,
};
use std::{future::Future, net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use reviewflow_core::ReviewService;

/// Application state shared across handlers
pub struct AppState {
    pub service: ReviewService,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Reviewflow API",
        version = "0.1.0",
        description = "Reviewer assignment and pull request lifecycle service",
        contact(
            name = "Reviewflow Team",
            email = "team@reviewflow.dev"
        )
    ),
    paths(
        handlers::add_team,
        handlers::get_team,
        handlers::add_user,
        handlers::set_is_active,
        handlers::get_user_reviews,
        handlers::create_pull_request,
        handlers::merge_pull_request,
        handlers::reassign_reviewer,
        handlers::get_pull_request,
        handlers::health_check,
    ),
    components(
        schemas(
            models::PullRequestStatus,
            models::TeamMember,
            models::Team,
            models::User,
            models::PullRequest,
            models::PullRequestShort,
            models::TeamResponse,
            models::UpsertUserRequest,
            models::SetIsActiveRequest,
            models::UserResponse,
            models::UserReviewsResponse,
            models::CreatePullRequestRequest,
            models::MergePullRequestRequest,
            models::ReassignRequest,
            models::PullRequestResponse,
            models::ReassignResponse,
            models::HealthResponse,
            models::ErrorDetail,
            models::ErrorResponse,
        )
    ),
    tags(
        (name = "teams", description = "Team management endpoints"),
        (name = "users", description = "User activity and review queue endpoints"),
        (name = "pull-requests", description = "Pull request lifecycle endpoints"),
        (name = "system", description = "System health and info endpoints")
    )
)]
struct ApiDoc;

/// API server configuration
pub struct ApiServerConfig {
    /// Address to bind the API server
    pub bind_addr: SocketAddr,
    /// Enable permissive CORS
    pub enable_cors: bool,
    /// Upper bound on handling a single request
    pub request_timeout: Duration,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            enable_cors: true,
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// API Server
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: ApiServerConfig, service: ReviewService) -> Self {
        let state = Arc::new(AppState { service });
        Self { config, state }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let api_doc = ApiDoc::openapi();

        let api_router = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/team/add", post(handlers::add_team))
            .route("/team/get", get(handlers::get_team))
            .route("/users/add", post(handlers::add_user))
            .route("/users/setIsActive", post(handlers::set_is_active))
            .route("/users/getReview", get(handlers::get_user_reviews))
            .route("/pullRequest/create", post(handlers::create_pull_request))
            .route("/pullRequest/merge", post(handlers::merge_pull_request))
            .route("/pullRequest/reassign", post(handlers::reassign_reviewer))
            .route("/pullRequest/get", get(handlers::get_pull_request))
            .with_state(self.state.clone());

        // SwaggerUi serves the spec at /api/openapi.json
        let router = Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", api_doc))
            .merge(api_router);

        // Dropping a timed-out handler rolls back its open transaction
        let mut router = router
            .layer(TimeoutLayer::new(self.config.request_timeout))
            .layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE])
                .allow_origin(tower_http::cors::Any);
            router = router.layer(cors);
        }

        router
    }

    /// Start the API server and run until `shutdown` resolves
    pub async fn start<F>(self, shutdown: F) -> Result<(), anyhow::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();

        info!("Starting API server on {}", self.config.bind_addr);
        info!(
            "OpenAPI spec: http://{}/api/openapi.json",
            self.config.bind_addr
        );
        info!("Swagger UI: http://{}/swagger-ui", self.config.bind_addr);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        info!("API server stopped");
        Ok(())
    }
}
