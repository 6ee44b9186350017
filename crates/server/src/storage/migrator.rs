use sqlx::PgPool;

// Applied in order. The tracking table is migration zero and its DDL is
// idempotent, so it runs unconditionally on every start.
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "000_migration_tracking.sql",
        include_str!("../../../../migrations/000_migration_tracking.sql"),
    ),
    (
        "001_create_cooldown_states.sql",
        include_str!("../../../../migrations/001_create_cooldown_states.sql"),
    ),
    (
        "002_create_dispatch_results.sql",
        include_str!("../../../../migrations/002_create_dispatch_results.sql"),
    ),
    (
        "003_create_notifications.sql",
        include_str!("../../../../migrations/003_create_notifications.sql"),
    ),
];

async fn applied_filenames(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::raw_sql(MIGRATIONS[0].1).execute(pool).await?;
    sqlx::query_scalar("SELECT filename FROM _migrations")
        .fetch_all(pool)
        .await
}

/// Applies every migration not yet recorded in `_migrations`, returning the
/// filenames applied on this run.
pub async fn run_migrations(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    let already = applied_filenames(pool).await?;

    let mut applied = Vec::new();
    for (filename, sql) in &MIGRATIONS[1..] {
        if already.iter().any(|name| name == filename) {
            continue;
        }
        sqlx::raw_sql(sql).execute(pool).await?;
        sqlx::query("INSERT INTO _migrations (filename) VALUES ($1)")
            .bind(filename)
            .execute(pool)
            .await?;
        applied.push(filename.to_string());
    }

    Ok(applied)
}
