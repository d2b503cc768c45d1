mod common;

use common::*;
use territories_referee::action::AttackResult;
use territories_referee::{ActionError, ActionResult, FixedRoll, GameConfig, Referee};

async fn two_nations(referee: &Referee) {
    referee.process(&join("Test User", "Nation 1", "CA")).await.unwrap();
    referee.process(&join("Test User 2", "Nation 2", "NV")).await.unwrap();
}

fn attack_result(result: ActionResult) -> AttackResult {
    match result {
        ActionResult::Attack(result) => result,
        other => panic!("expected an attack result, got {other:?}"),
    }
}

#[tokio::test]
#[ignore]
async fn rejected_attacks() {
    let (pool, _container) = setup().await;
    let referee = referee(&pool, 20);

    let err = referee.process(&attack("Test User", "CA", "NV")).await.unwrap_err();
    assert!(matches!(err, ActionError::UserNotRegistered), "{err}");

    referee.process(&join("Test User", "Nation 1", "CA")).await.unwrap();
    referee.process(&join("Test User 2", "Nation 2", "OR")).await.unwrap();

    let err = referee.process(&attack("Test User", "lol", "CA")).await.unwrap_err();
    assert!(err.to_string().contains("unrecognized abbreviation, name, or alias"));

    let err = referee.process(&attack("Test User", "CA", "CA")).await.unwrap_err();
    assert!(err.to_string().contains("friendly fire not allowed"));

    let err = referee.process(&attack("Test User", "CA", "NV")).await.unwrap_err();
    assert_eq!(err.to_string(), "no armies in Nevada");

    let err = referee.process(&attack("Test User", "UT", "NV")).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "no armies in Utah controlled by Test User to attack with"
    );

    let err = referee.process(&attack("Test User 2", "OR", "UT")).await.unwrap_err();
    assert!(matches!(err, ActionError::NotNeighboring { verb: "attack", .. }), "{err}");

    assert_eq!(army_size(&pool, "CA").await, Some(3));
    assert_eq!(army_size(&pool, "OR").await, Some(3));
}

#[tokio::test]
#[ignore]
async fn non_neighbors_cannot_attack() {
    let (pool, _container) = setup().await;
    let referee = referee(&pool, 20);

    referee.process(&join("Test User", "Nation 1", "AZ")).await.unwrap();
    referee.process(&join("Test User 2", "Nation 2", "OR")).await.unwrap();

    let err = referee.process(&attack("Test User", "AZ", "OR")).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot attack from Arizona to Oregon: not a neighboring territory"
    );
}

#[tokio::test]
#[ignore]
async fn successful_attack_costs_defender() {
    let (pool, _container) = setup().await;
    let referee = referee(&pool, 15);
    two_nations(&referee).await;

    let result = attack_result(referee.process(&attack("Test User", "CA", "NV")).await.unwrap());
    assert_eq!((result.die_roll, result.attacking, result.defending), (15, 3, 3));
    assert_eq!(result.loss, 2);
    assert_eq!(result.defending_player, "Test User 2");
    assert_eq!(result.nation_removed, None);
    assert_eq!(
        result.to_string(),
        "Test User attacked Nevada from California, \
         attack succeeded (rolled 15) and 2 defending armies were lost"
    );

    assert_eq!(army_size(&pool, "CA").await, Some(3));
    assert_eq!(army_size(&pool, "NV").await, Some(1));
    assert_eq!(owner(&pool, "NV").await.as_deref(), Some("Test User 2"));
}

#[tokio::test]
#[ignore]
async fn stalemate_changes_nothing() {
    let (pool, _container) = setup().await;
    let referee = referee(&pool, 10);
    two_nations(&referee).await;

    let result = attack_result(referee.process(&attack("Test User", "CA", "NV")).await.unwrap());
    assert_eq!(result.loss, 0);
    assert!(result.to_string().ends_with("attack failed (rolled 10) and no armies were lost"));
    assert_eq!(army_size(&pool, "CA").await, Some(3));
    assert_eq!(army_size(&pool, "NV").await, Some(3));
}

#[tokio::test]
#[ignore]
async fn critical_failure_costs_attacker() {
    let (pool, _container) = setup().await;
    let referee = referee(&pool, 1);
    two_nations(&referee).await;

    let result = attack_result(referee.process(&attack("Test User", "CA", "NV")).await.unwrap());
    assert_eq!(result.loss, -1);
    assert_eq!(army_size(&pool, "CA").await, Some(2));
    assert_eq!(army_size(&pool, "NV").await, Some(3));
}

#[tokio::test]
#[ignore]
async fn defender_with_no_territory_left_is_eliminated() {
    let (pool, _container) = setup().await;
    let referee = referee(&pool, 20);
    two_nations(&referee).await;
    referee.process(&raise("Test User", "CA")).await.unwrap();
    referee.process(&raise("Test User", "CA")).await.unwrap();

    let result = attack_result(referee.process(&attack("Test User", "CA", "NV")).await.unwrap());
    assert_eq!(result.loss, 3);
    assert_eq!(result.nation_removed.as_deref(), Some("Test User 2"));
    assert!(result.to_string().ends_with("; Test User 2 was eliminated"));

    assert_eq!(nation_count(&pool, "Test User").await, 1);
    assert_eq!(nation_count(&pool, "Test User 2").await, 0);
    assert_eq!(army_size(&pool, "NV").await, None);
}

#[tokio::test]
#[ignore]
async fn outnumbered_attacker_can_lose_everything() {
    let (pool, _container) = setup().await;
    let referee = referee(&pool, 12);
    two_nations(&referee).await;
    referee.process(&raise("Test User 2", "NV")).await.unwrap();
    referee.process(&raise("Test User 2", "NV")).await.unwrap();

    // 3 against 5 needs more than 14
    let result = attack_result(referee.process(&attack("Test User", "CA", "NV")).await.unwrap());
    assert_eq!(result.loss, -3);
    assert_eq!(result.nation_removed.as_deref(), Some("Test User"));
    assert_eq!(nation_count(&pool, "Test User").await, 0);
    assert_eq!(army_size(&pool, "NV").await, Some(5));
}

#[tokio::test]
#[ignore]
async fn counterattack_mode_is_not_available() {
    let (pool, _container) = setup().await;
    let config = GameConfig {
        do_counterattack: true,
        ..GameConfig::west_coast()
    };
    let referee = Referee::with_dice(pool.clone(), config, FixedRoll(20));
    two_nations(&referee).await;

    let err = referee.process(&attack("Test User", "CA", "NV")).await.unwrap_err();
    assert!(matches!(err, ActionError::CounterattackUnsupported), "{err}");
    assert_eq!(army_size(&pool, "NV").await, Some(3));
}

#[tokio::test]
#[ignore]
async fn attack_from_positional_arguments() {
    let (pool, _container) = setup().await;
    let referee = referee(&pool, 15);
    two_nations(&referee).await;

    let result = referee
        .process_args("attack", &["Test User", "California", "nv"])
        .await
        .unwrap();
    assert_eq!(result.player(), "Test User");
    assert_eq!(army_size(&pool, "NV").await, Some(1));
}
