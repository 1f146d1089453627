use anyhow::Context;
use sqlx::PgPool;

use registrar_config::{AcademicConfig, CorsConfig, DatabaseConfig, IdentityConfig};
use registrar_db::{init_db_pool, run_migrations};

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub identity_config: IdentityConfig,
    pub cors_config: CorsConfig,
    pub academic_config: AcademicConfig,
}

impl AppState {
    /// State over an existing pool with configuration read from the environment.
    pub fn from_env_with_pool(db: PgPool) -> Self {
        Self {
            db,
            identity_config: IdentityConfig::from_env(),
            cors_config: CorsConfig::from_env(),
            academic_config: AcademicConfig::from_env(),
        }
    }
}

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let db_config = DatabaseConfig::from_env();
    let db = init_db_pool(&db_config).await?;

    if db_config.run_migrations {
        run_migrations(&db)
            .await
            .context("Startup migrations failed")?;
    }

    Ok(AppState::from_env_with_pool(db))
}
