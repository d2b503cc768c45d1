//! Reads and writes of nations and holdings.
//!
//! Everything that changes an army size goes through [`set_army_size_in`],
//! which keeps two rules inside the caller's transaction: a holding whose
//! size reaches zero is deleted rather than stored, and (when asked) a nation
//! left without holdings is deleted along with it.
//!
//! The holding reads used before a write ([`holding_at`],
//! [`player_holding_at`], [`lock_holdings`]) take `FOR UPDATE` locks on the
//! holding and its nation. A concurrent action touching the same rows waits
//! for the first to commit and then sees its result, so army sizes are never
//! computed from a stale count and a nation's last two holdings cannot be
//! emptied by two transactions that each still see the other one.

use serde::Serialize;
use sqlx::{FromRow, PgConnection, PgPool};

use crate::error::{ActionError, translate_unique_violation};

/// A row of `v_nation_holdings`: one holding joined with its nation.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct NationHolding {
    pub holding_id: i32,
    pub nation_id: i32,
    pub territory: String,
    pub army_size: i32,
    pub color: String,
    pub country_name: String,
    pub player: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Nation {
    pub id: i32,
    pub country_name: String,
    pub player: String,
    pub color: String,
}

const LOCKED_HOLDINGS: &str = "SELECT h.id AS holding_id, n.id AS nation_id, h.territory, \
     h.army_size, n.color, n.country_name, n.player \
     FROM holdings h JOIN nations n ON n.id = h.nation_id";

/// Confirm `player` is non-empty and owns a nation.
pub async fn validate_player(conn: &mut PgConnection, player: &str) -> Result<Nation, ActionError> {
    if player.is_empty() {
        return Err(ActionError::MissingUser);
    }
    find_nation(conn, player)
        .await?
        .ok_or(ActionError::UserNotRegistered)
}

pub async fn find_nation(
    conn: &mut PgConnection,
    player: &str,
) -> Result<Option<Nation>, sqlx::Error> {
    sqlx::query_as::<_, Nation>(
        "SELECT id, country_name, player, color FROM nations WHERE player = $1",
    )
    .bind(player)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn nation_name_taken(
    conn: &mut PgConnection,
    country_name: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM nations WHERE country_name = $1)")
        .bind(country_name)
        .fetch_one(&mut *conn)
        .await
}

/// Whoever holds `territory`, with their army size. Locks the holding and
/// its nation until the transaction ends.
pub async fn holding_at(
    conn: &mut PgConnection,
    territory: &str,
) -> Result<Option<NationHolding>, sqlx::Error> {
    sqlx::query_as::<_, NationHolding>(&format!(
        "{LOCKED_HOLDINGS} WHERE h.territory = $1 FOR UPDATE"
    ))
    .bind(territory)
    .fetch_optional(&mut *conn)
    .await
}

/// `player`'s holding at `territory`, if they have one. Locks like
/// [`holding_at`].
pub async fn player_holding_at(
    conn: &mut PgConnection,
    territory: &str,
    player: &str,
) -> Result<Option<NationHolding>, sqlx::Error> {
    sqlx::query_as::<_, NationHolding>(&format!(
        "{LOCKED_HOLDINGS} WHERE h.territory = $1 AND n.player = $2 FOR UPDATE"
    ))
    .bind(territory)
    .bind(player)
    .fetch_optional(&mut *conn)
    .await
}

/// Lock the holdings in `territories` in territory order and return those
/// that exist. Actions touching two territories take both locks here so
/// that opposing actions acquire them in the same order.
pub async fn lock_holdings(
    conn: &mut PgConnection,
    territories: &[&str],
) -> Result<Vec<NationHolding>, sqlx::Error> {
    sqlx::query_as::<_, NationHolding>(&format!(
        "{LOCKED_HOLDINGS} WHERE h.territory = ANY($1) ORDER BY h.territory FOR UPDATE"
    ))
    .bind(territories)
    .fetch_all(&mut *conn)
    .await
}

/// Every holding on the map, ordered by territory.
pub async fn all_holdings(conn: &mut PgConnection) -> Result<Vec<NationHolding>, sqlx::Error> {
    sqlx::query_as::<_, NationHolding>(
        "SELECT holding_id, nation_id, territory, army_size, color, country_name, player \
         FROM v_nation_holdings ORDER BY territory",
    )
    .fetch_all(&mut *conn)
    .await
}

/// Number of territories `player` currently holds.
pub async fn holdings_count(conn: &mut PgConnection, player: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM v_nation_holdings WHERE player = $1")
        .bind(player)
        .fetch_one(&mut *conn)
        .await
}

pub async fn insert_nation(
    conn: &mut PgConnection,
    country_name: &str,
    player: &str,
    color: &str,
) -> Result<i32, ActionError> {
    sqlx::query_scalar(
        "INSERT INTO nations (country_name, player, color) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(country_name)
    .bind(player)
    .bind(color)
    .fetch_one(&mut *conn)
    .await
    .map_err(|err| {
        translate_unique_violation(err, |constraint| match constraint {
            "nations_player_key" => Some(ActionError::PlayerAlreadyJoined),
            "nations_country_name_key" => Some(ActionError::NationAlreadyJoined),
            "nations_color_key" => Some(ActionError::ColorInUse),
            _ => None,
        })
    })
}

/// Give `player`'s nation a new holding of `army_size` armies.
pub async fn insert_holding(
    conn: &mut PgConnection,
    player: &str,
    territory: &str,
    army_size: i32,
) -> Result<(), ActionError> {
    sqlx::query(
        "INSERT INTO holdings (nation_id, territory, army_size) \
         VALUES ((SELECT id FROM nations WHERE player = $1), $2, $3)",
    )
    .bind(player)
    .bind(territory)
    .bind(army_size)
    .execute(&mut *conn)
    .await
    .map_err(|err| {
        translate_unique_violation(err, |constraint| {
            (constraint == "holdings_territory_key")
                .then_some(ActionError::TerritoryAlreadyOccupied)
        })
    })?;
    Ok(())
}

pub async fn set_nation_color(
    conn: &mut PgConnection,
    player: &str,
    color: &str,
) -> Result<(), ActionError> {
    sqlx::query("UPDATE nations SET color = $1 WHERE player = $2")
        .bind(color)
        .bind(player)
        .execute(&mut *conn)
        .await
        .map_err(|err| {
            translate_unique_violation(err, |constraint| {
                (constraint == "nations_color_key").then_some(ActionError::ColorInUse)
            })
        })?;
    Ok(())
}

/// Set the army size in `territory`, deleting the holding at zero or below.
///
/// With `remove_empty_nation`, a deleted holding that was its nation's last
/// one also deletes the nation. Returns whether a nation was removed.
pub async fn set_army_size_in(
    conn: &mut PgConnection,
    territory: &str,
    army_size: i32,
    remove_empty_nation: bool,
) -> Result<bool, ActionError> {
    // the nation row stays locked until commit, so holdings_count below
    // cannot miss a sibling holding deleted by another transaction
    let owner = holding_at(conn, territory)
        .await?
        .ok_or_else(|| ActionError::NoDefendingNation {
            territory: territory.to_string(),
        })?
        .player;

    if army_size > 0 {
        sqlx::query("UPDATE holdings SET army_size = $1 WHERE territory = $2")
            .bind(army_size)
            .bind(territory)
            .execute(&mut *conn)
            .await?;
        tracing::debug!(territory, army_size, "holding army size updated");
        return Ok(false);
    }

    sqlx::query("DELETE FROM holdings WHERE territory = $1")
        .bind(territory)
        .execute(&mut *conn)
        .await?;
    tracing::debug!(territory, player = %owner, "holding abandoned");

    if !remove_empty_nation || holdings_count(conn, &owner).await? > 0 {
        return Ok(false);
    }

    sqlx::query("DELETE FROM nations WHERE player = $1")
        .bind(&owner)
        .execute(&mut *conn)
        .await?;
    tracing::info!(player = %owner, "player has no territories left, nation removed from play");
    Ok(true)
}

/// [`set_army_size_in`] in a transaction of its own.
pub async fn set_army_size(
    pool: &PgPool,
    territory: &str,
    army_size: i32,
    remove_empty_nation: bool,
) -> Result<bool, ActionError> {
    let mut tx = pool.begin().await?;
    let removed = set_army_size_in(&mut tx, territory, army_size, remove_empty_nation).await?;
    tx.commit().await?;
    Ok(removed)
}
