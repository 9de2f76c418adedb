#![allow(dead_code)]

use autovault::{db, logging, migrate, new_uuid_v7};
use sqlx::SqlitePool;

/// Fresh in-memory database with the full schema applied. Also installs the
/// tracing subscriber so `RUST_LOG` works when debugging a failing test.
pub async fn memory_pool() -> SqlitePool {
    logging::init();
    let pool = db::connect_memory_pool().await.expect("memory pool");
    migrate::apply_migrations(&pool).await.expect("migrations");
    pool
}

/// Insert a user row directly so commands have an owner to reference.
pub async fn seed_user(pool: &SqlitePool, email: &str, role: &str) -> String {
    let id = new_uuid_v7();
    sqlx::query(
        "INSERT INTO users (id, email, role, first_name, last_name, avatar_url, blocked, created_at, updated_at) \
         VALUES (?, ?, ?, NULL, NULL, NULL, 0, 0, 0)",
    )
    .bind(&id)
    .bind(email)
    .bind(role)
    .execute(pool)
    .await
    .expect("seed user");
    id
}
