#![allow(dead_code)]

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use territories_referee::action::{AttackAction, ColorAction, JoinAction, MoveAction, RaiseAction};
use territories_referee::db::migrate;
use territories_referee::{Action, FixedRoll, GameConfig, Referee};
use testcontainers::ContainerAsync;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;

pub async fn setup() -> (PgPool, ContainerAsync<Postgres>) {
    let container = Postgres::default().start().await.unwrap();
    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(5432).await.unwrap();
    let pool = PgPoolOptions::new()
        .connect(&format!(
            "postgres://postgres:postgres@{}:{}/postgres",
            host, port
        ))
        .await
        .unwrap();
    migrate(&pool).await.unwrap();
    (pool, container)
}

/// West coast map, default numbers, the die pinned to `roll`.
pub fn referee(pool: &PgPool, roll: i32) -> Referee {
    Referee::with_dice(pool.clone(), GameConfig::west_coast(), FixedRoll(roll))
}

pub fn garrisoned_referee(pool: &PgPool, roll: i32) -> Referee {
    let config = GameConfig {
        unclaimed_territories_have_garrison: true,
        ..GameConfig::west_coast()
    };
    Referee::with_dice(pool.clone(), config, FixedRoll(roll))
}

pub fn join(player: &str, nation: &str, territory: &str) -> Action {
    JoinAction {
        player: player.to_string(),
        nation: Some(nation.to_string()),
        territory: territory.to_string(),
    }
    .into()
}

pub fn color(player: &str, color: &str) -> Action {
    ColorAction {
        player: player.to_string(),
        color: color.to_string(),
    }
    .into()
}

pub fn raise(player: &str, territory: &str) -> Action {
    RaiseAction {
        player: player.to_string(),
        territory: territory.to_string(),
    }
    .into()
}

pub fn move_all(player: &str, source: &str, destination: &str) -> Action {
    move_armies(player, 0, source, destination)
}

pub fn move_armies(player: &str, armies: i32, source: &str, destination: &str) -> Action {
    MoveAction {
        player: player.to_string(),
        source: source.to_string(),
        destination: destination.to_string(),
        armies,
    }
    .into()
}

pub fn attack(player: &str, attacking: &str, defending: &str) -> Action {
    AttackAction {
        player: player.to_string(),
        attacking: attacking.to_string(),
        defending: defending.to_string(),
    }
    .into()
}

pub async fn army_size(pool: &PgPool, territory: &str) -> Option<i32> {
    sqlx::query_scalar("SELECT army_size FROM v_nation_holdings WHERE territory = $1")
        .bind(territory)
        .fetch_optional(pool)
        .await
        .unwrap()
}

pub async fn owner(pool: &PgPool, territory: &str) -> Option<String> {
    sqlx::query_scalar("SELECT player FROM v_nation_holdings WHERE territory = $1")
        .bind(territory)
        .fetch_optional(pool)
        .await
        .unwrap()
}

pub async fn nation_count(pool: &PgPool, player: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM nations WHERE player = $1")
        .bind(player)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn nation_color(pool: &PgPool, player: &str) -> Option<String> {
    sqlx::query_scalar("SELECT color FROM nations WHERE player = $1")
        .bind(player)
        .fetch_optional(pool)
        .await
        .unwrap()
}
