//! Common test utilities

use membership_sync::{config::Config, db};
use sqlx::{Executor, PgPool};
use tokio::sync::OnceCell;
use uuid::Uuid;

static SCHEMA: OnceCell<()> = OnceCell::const_new();

/// Connect to `DATABASE_URL` and make sure the schema is in place
pub async fn setup_test_db() -> PgPool {
    let config = Config::from_dotenv().expect("DATABASE_URL must be set for tests");
    let pool = db::connect(&config).await.expect("Failed to connect to DB");

    SCHEMA
        .get_or_init(|| async {
            pool.execute(include_str!("../../migrations/0001_membership.sql"))
                .await
                .expect("Failed to apply schema");
        })
        .await;

    assert!(db::check_schema(&pool).await.unwrap());
    pool
}

/// Customer id no other test run will use
pub fn unique_customer() -> String {
    Uuid::new_v4().simple().to_string()
}
