use sqlx::PgPool;

/// Create the `nations`, `holdings` and `actions` tables, their indexes and
/// the `v_nation_holdings` view. Safe to run against an already provisioned
/// database.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(include_str!("../../sql/schema.sql"))
        .execute(pool)
        .await?;
    Ok(())
}
