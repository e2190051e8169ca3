//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use crate::application::services::{
    AnalyticsRecorder, ApplicationServiceImpl, DashboardServiceImpl, FeedbackServiceImpl,
    NotificationService, OpportunityServiceImpl, UserServiceImpl,
};
use crate::config::{AnalyticsBackend, EmailProvider, Settings, StorageBackend};
use crate::domain::{
    AnalyticsRepository, ApplicationRepository, FeedbackRepository, OpportunityRepository,
    UserRepository,
};
use crate::infrastructure::cache::{self, MemoryAnalyticsStore, RedisAnalyticsStore};
use crate::infrastructure::database;
use crate::infrastructure::email::{HttpMailer, Mailer, OutboxMailer};
use crate::infrastructure::repositories::{
    MemoryStore, PgApplicationRepository, PgFeedbackRepository, PgOpportunityRepository,
    PgUserRepository,
};
use crate::presentation::http::{handlers, routes};
use crate::presentation::middleware::{cors, logging};
use crate::shared::snowflake::SnowflakeGenerator;

pub type UserSvc = UserServiceImpl<dyn UserRepository>;
pub type OpportunitySvc = OpportunityServiceImpl<dyn OpportunityRepository, dyn UserRepository>;
pub type ApplicationSvc =
    ApplicationServiceImpl<dyn ApplicationRepository, dyn OpportunityRepository, dyn UserRepository>;
pub type FeedbackSvc =
    FeedbackServiceImpl<dyn FeedbackRepository, dyn ApplicationRepository, dyn OpportunityRepository>;
pub type DashboardSvc = DashboardServiceImpl<
    dyn UserRepository,
    dyn OpportunityRepository,
    dyn ApplicationRepository,
    dyn FeedbackRepository,
>;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub opportunities: Arc<dyn OpportunityRepository>,
    pub applications: Arc<dyn ApplicationRepository>,
    pub feedback: Arc<dyn FeedbackRepository>,
    pub analytics: Arc<dyn AnalyticsRepository>,
    pub mailer: Arc<dyn Mailer>,
    /// Present when the `log` email provider is active
    pub outbox: Option<Arc<OutboxMailer>>,
    pub snowflake: Arc<SnowflakeGenerator>,
    pub settings: Arc<Settings>,
    /// Present for the postgres backend
    pub db: Option<PgPool>,
    /// Present for the redis analytics backend
    pub redis: Option<ConnectionManager>,
}

impl AppState {
    /// Connect every backend selected in `settings`.
    pub async fn build(settings: Settings) -> Result<Self> {
        let store = connect_store(&settings).await?;
        let (analytics, redis) = connect_analytics(&settings).await?;

        let (mailer, outbox): (Arc<dyn Mailer>, Option<Arc<OutboxMailer>>) =
            match settings.email.provider {
                EmailProvider::Http => {
                    let mailer: Arc<dyn Mailer> = Arc::new(
                        HttpMailer::new(&settings.email).context("failed to build HTTP mailer")?,
                    );
                    (mailer, None)
                }
                EmailProvider::Log => {
                    let outbox = Arc::new(OutboxMailer::new());
                    let mailer: Arc<dyn Mailer> = outbox.clone();
                    (mailer, Some(outbox))
                }
            };

        Ok(Self {
            users: store.users,
            opportunities: store.opportunities,
            applications: store.applications,
            feedback: store.feedback,
            analytics,
            mailer,
            outbox,
            snowflake: Arc::new(SnowflakeGenerator::new(settings.snowflake.machine_id as u64)),
            settings: Arc::new(settings),
            db: store.db,
            redis,
        })
    }

    /// Fully in-process state: memory store, memory counters, outbox mailer.
    pub fn in_memory(settings: Settings) -> Self {
        let store = Arc::new(MemoryStore::new());
        let outbox = Arc::new(OutboxMailer::new());
        Self {
            users: store.clone(),
            opportunities: store.clone(),
            applications: store.clone(),
            feedback: store,
            analytics: Arc::new(MemoryAnalyticsStore::new()),
            mailer: outbox.clone(),
            outbox: Some(outbox),
            snowflake: Arc::new(SnowflakeGenerator::new(settings.snowflake.machine_id as u64)),
            settings: Arc::new(settings),
            db: None,
            redis: None,
        }
    }

    pub fn withdrawal_cutoff_hours(&self) -> i64 {
        self.settings.applications.withdrawal_cutoff_hours
    }

    fn notifications(&self) -> NotificationService {
        NotificationService::new(self.mailer.clone(), self.settings.email.app_url.as_str())
    }

    fn analytics_recorder(&self) -> AnalyticsRecorder {
        AnalyticsRecorder::new(self.analytics.clone())
    }

    pub fn user_service(&self) -> UserSvc {
        UserServiceImpl::new(
            self.users.clone(),
            self.notifications(),
            self.analytics_recorder(),
        )
    }

    pub fn opportunity_service(&self) -> OpportunitySvc {
        OpportunityServiceImpl::new(
            self.opportunities.clone(),
            self.users.clone(),
            self.analytics_recorder(),
            self.snowflake.clone(),
        )
    }

    pub fn application_service(&self) -> ApplicationSvc {
        ApplicationServiceImpl::new(
            self.applications.clone(),
            self.opportunities.clone(),
            self.users.clone(),
            self.notifications(),
            self.analytics_recorder(),
            self.withdrawal_cutoff_hours(),
        )
    }

    pub fn feedback_service(&self) -> FeedbackSvc {
        FeedbackServiceImpl::new(
            self.feedback.clone(),
            self.applications.clone(),
            self.opportunities.clone(),
        )
    }

    pub fn dashboard_service(&self) -> DashboardSvc {
        DashboardServiceImpl::new(
            self.users.clone(),
            self.opportunities.clone(),
            self.applications.clone(),
            self.feedback.clone(),
            self.analytics_recorder(),
        )
    }
}

/// Document repositories for the selected storage backend.
struct Store {
    users: Arc<dyn UserRepository>,
    opportunities: Arc<dyn OpportunityRepository>,
    applications: Arc<dyn ApplicationRepository>,
    feedback: Arc<dyn FeedbackRepository>,
    db: Option<PgPool>,
}

async fn connect_store(settings: &Settings) -> Result<Store> {
    match settings.database.backend {
        StorageBackend::Postgres => {
            let pool = database::create_pool(&settings.database)
                .await
                .context("failed to connect to PostgreSQL")?;
            if settings.database.run_migrations {
                database::run_migrations(&pool)
                    .await
                    .context("failed to run migrations")?;
                tracing::info!("Database migrations applied");
            }
            Ok(Store {
                users: Arc::new(PgUserRepository::new(pool.clone())),
                opportunities: Arc::new(PgOpportunityRepository::new(pool.clone())),
                applications: Arc::new(PgApplicationRepository::new(pool.clone())),
                feedback: Arc::new(PgFeedbackRepository::new(pool.clone())),
                db: Some(pool),
            })
        }
        StorageBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            let memory = Arc::new(MemoryStore::new());
            Ok(Store {
                users: memory.clone(),
                opportunities: memory.clone(),
                applications: memory.clone(),
                feedback: memory,
                db: None,
            })
        }
    }
}

async fn connect_analytics(
    settings: &Settings,
) -> Result<(Arc<dyn AnalyticsRepository>, Option<ConnectionManager>)> {
    match settings.analytics.backend {
        AnalyticsBackend::Redis => {
            let conn = cache::create_redis_client(&settings.redis)
                .await
                .context("failed to connect to Redis")?;
            let store: Arc<dyn AnalyticsRepository> = Arc::new(RedisAnalyticsStore::new(
                conn.clone(),
                settings.redis.key_prefix.clone(),
            ));
            Ok((store, Some(conn)))
        }
        AnalyticsBackend::Memory => {
            let store: Arc<dyn AnalyticsRepository> = Arc::new(MemoryAnalyticsStore::new());
            Ok((store, None))
        }
    }
}

/// Router with every middleware layer applied.
pub fn build_router(state: AppState) -> Router {
    let cors = cors::create_cors_layer(&state.settings.cors);
    routes::create_router(state)
        .layer(CompressionLayer::new())
        .layer(logging::create_trace_layer())
        .layer(cors)
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        let addr: SocketAddr = settings
            .server_addr()
            .parse()
            .context("invalid server address")?;

        let state = AppState::build(settings).await?;
        handlers::health::init_server_start();
        let router = build_router(state);

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", addr);

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
