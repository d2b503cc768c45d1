//! The `actions` table: one row per applied action, plus turn markers.
//!
//! The turn scheduler owns turn accounting; the referee only appends.

use sqlx::PgConnection;

use crate::action::ActionKind;

/// Append an entry for `player`. The nation reference is looked up by player
/// and stays NULL when the action eliminated them.
pub async fn record_action(
    conn: &mut PgConnection,
    player: &str,
    kind: ActionKind,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO actions (nation_id, action_type) \
         VALUES ((SELECT id FROM nations WHERE player = $1), $2)",
    )
    .bind(player)
    .bind(kind.as_str())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Mark the start of a new turn.
pub async fn record_turn_start(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO actions (action_type, is_new_turn) VALUES ('new_turn', true)")
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Actions `player` has taken since the most recent turn marker.
pub async fn actions_this_turn(conn: &mut PgConnection, player: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COUNT(*) FROM actions a \
         JOIN nations n ON n.id = a.nation_id \
         WHERE n.player = $1 \
           AND NOT a.is_new_turn \
           AND a.id > (SELECT COALESCE(MAX(id), 0) FROM actions WHERE is_new_turn)",
    )
    .bind(player)
    .fetch_one(&mut *conn)
    .await
}
