use pandizot_core::CoreError;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;
use tracing::{error, info};

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(connection_string: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&self.pool)
            .await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

/// Maps driver errors into the domain error. Unique violations come from the
/// active-rule index and surface as conflicts.
pub(crate) fn storage_error(err: sqlx::Error) -> CoreError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            let message = match db_err.constraint() {
                Some("pricing_rules_active_vehicle") => {
                    "an active pricing rule already exists for this vehicle".to_string()
                }
                Some(constraint) => format!("duplicate record ({})", constraint),
                None => "duplicate record".to_string(),
            };
            return CoreError::Conflict(message);
        }
    }

    error!("Database error: {}", err);
    CoreError::StorageError(err.to_string())
}
