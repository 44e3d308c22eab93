use ingest_rs::db;
use sqlx::PgPool;
use tokio::sync::OnceCell;

static TEST_POOL: OnceCell<PgPool> = OnceCell::const_new();

/// Shared pool for the whole test binary. Connection limits are capped via
/// env vars (rather than the production defaults in `db::init_pool`) so
/// many `#[tokio::test]` functions across many binaries don't exhaust the
/// test database's connection slots.
pub async fn get_test_pool() -> &'static PgPool {
    TEST_POOL
        .get_or_init(|| async {
            if std::env::var("DB_MAX_CONNECTIONS").is_err() {
                std::env::set_var("DB_MAX_CONNECTIONS", "2");
            }
            if std::env::var("DB_ACQUIRE_TIMEOUT_SECS").is_err() {
                std::env::set_var("DB_ACQUIRE_TIMEOUT_SECS", "10");
            }

            let database_url = std::env::var("DATABASE_URL")
                .expect("DATABASE_URL must be set for integration tests");

            let pool = db::init_pool(&database_url)
                .await
                .expect("failed to connect to test database");

            sqlx::migrate!("./db/migrations")
                .run(&pool)
                .await
                .expect("failed to run migrations against test database");

            pool
        })
        .await
}

/// Deletes every row touched by `tenant_id` across all four tables, in
/// child-to-parent order so foreign keys don't block the cleanup.
pub async fn cleanup_test_tenant(pool: &PgPool, tenant_id: &str) {
    sqlx::query("DELETE FROM audit_log WHERE object_id IN (SELECT exception_id::text FROM exceptions WHERE tenant_id = $1)")
        .bind(tenant_id)
        .execute(pool)
        .await
        .ok();
    sqlx::query("DELETE FROM exceptions WHERE tenant_id = $1")
        .bind(tenant_id)
        .execute(pool)
        .await
        .ok();
    sqlx::query("DELETE FROM events_processed WHERE tenant_id = $1")
        .bind(tenant_id)
        .execute(pool)
        .await
        .ok();
    sqlx::query("DELETE FROM events_raw WHERE tenant_id = $1")
        .bind(tenant_id)
        .execute(pool)
        .await
        .ok();
}

pub fn unique_tenant(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}
