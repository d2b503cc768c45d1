use std::sync::Mutex;

use rand::SeedableRng;
use rand::rngs::StdRng;
use sqlx::PgPool;

use crate::action::{Action, ActionContext, ActionResult};
use crate::combat::{RandomSource, RngSource};
use crate::config::{ConfigError, GameConfig};
use crate::db::{self, action_log, ledger};
use crate::error::ActionError;

/// Applies actions to the game stored in one Postgres database.
///
/// Every action runs in a single transaction: it either lands completely
/// (holding changes, eliminations and its log entry) or not at all.
pub struct Referee {
    pool: PgPool,
    config: GameConfig,
    dice: Mutex<Box<dyn RandomSource>>,
}

impl Referee {
    pub fn new(pool: PgPool, config: GameConfig) -> Self {
        Self::with_dice(pool, config, RngSource(StdRng::from_os_rng()))
    }

    /// A referee rolling `dice` instead of an OS-seeded generator.
    pub fn with_dice(pool: PgPool, config: GameConfig, dice: impl RandomSource + 'static) -> Self {
        Self {
            pool,
            config,
            dice: Mutex::new(Box::new(dice)),
        }
    }

    /// Connect to `config.database_url` and make sure the schema exists.
    pub async fn connect(config: GameConfig) -> Result<Self, ConfigError> {
        let url = config
            .database_url
            .clone()
            .ok_or(ConfigError::MissingDatabaseUrl)?;
        let pool = db::connect(&url).await?;
        db::migrate(&pool).await?;
        Ok(Self::new(pool, config))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Parse and process an action given as a kind token and arguments.
    pub async fn process_args(
        &self,
        kind: &str,
        args: &[&str],
    ) -> Result<ActionResult, ActionError> {
        let action = Action::parse(kind, args)?;
        self.process(&action).await
    }

    /// Apply `action`. Rows an action reads before writing are locked, so
    /// overlapping actions on the same territories run one after the other;
    /// one that deadlocks against another fails with
    /// [`ActionError::Conflict`] and changes nothing.
    pub async fn process(&self, action: &Action) -> Result<ActionResult, ActionError> {
        let result = self
            .apply(action)
            .await
            .map_err(ActionError::classify_conflict)
            .inspect_err(|err| {
                tracing::warn!(
                    action = %action.kind(),
                    player = %action.player(),
                    error = %err,
                    "action rejected"
                );
            })?;

        tracing::info!(action = %action.kind(), player = %action.player(), "{result}");
        Ok(result)
    }

    async fn apply(&self, action: &Action) -> Result<ActionResult, ActionError> {
        let mut tx = self.pool.begin().await?;
        let mut ctx = ActionContext {
            conn: &mut tx,
            config: &self.config,
            dice: &self.dice,
        };

        let result = match action {
            Action::Join(a) => ActionResult::Join(a.apply(&mut ctx).await?),
            Action::Color(a) => ActionResult::Color(a.apply(&mut ctx).await?),
            Action::Raise(a) => ActionResult::Raise(a.apply(&mut ctx).await?),
            Action::Move(a) => ActionResult::Move(a.apply(&mut ctx).await?),
            Action::Attack(a) => ActionResult::Attack(a.apply(&mut ctx).await?),
        };

        if self.config.record_actions {
            action_log::record_action(&mut tx, action.player(), action.kind()).await?;
        }
        tx.commit().await?;
        Ok(result)
    }

    /// Current holdings, ordered by territory.
    pub async fn holdings(&self) -> Result<Vec<ledger::NationHolding>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        ledger::all_holdings(&mut conn).await
    }

    /// Open a new turn in the action log.
    pub async fn start_turn(&self) -> Result<(), sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        action_log::record_turn_start(&mut conn).await
    }

    /// Actions `player` has taken since the current turn started.
    pub async fn actions_this_turn(&self, player: &str) -> Result<i64, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        action_log::actions_this_turn(&mut conn, player).await
    }
}
