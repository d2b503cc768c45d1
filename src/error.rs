use thiserror::Error;

use crate::config::UnknownTerritory;

/// Everything that can stop an action from being applied.
///
/// Validation failures are raised before anything is written. Store errors
/// that map onto a game rule (a unique violation on `holdings.territory`, for
/// instance) are translated to the matching variant; the rest pass through as
/// [`ActionError::Store`].
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("unset user string")]
    MissingUser,

    #[error("user is not registered in the game")]
    UserNotRegistered,

    #[error("missing target territory name or abbreviation")]
    NoTargetTerritory,

    #[error(transparent)]
    UnknownTerritory(#[from] UnknownTerritory),

    #[error("the player already joined")]
    PlayerAlreadyJoined,

    #[error("a nation with the given name already exists")]
    NationAlreadyJoined,

    #[error("the territory is already occupied")]
    TerritoryAlreadyOccupied,

    #[error("color already in use by another player")]
    ColorInUse,

    #[error("invalid color {expression:?}")]
    InvalidColor {
        expression: String,
        #[source]
        source: csscolorparser::ParseColorError,
    },

    #[error("no armies in {territory} controlled by {player} to raise")]
    NoArmiesToRaise { territory: String, player: String },

    #[error("no armies in {territory} controlled by {player} to move")]
    NoArmiesToMove { territory: String, player: String },

    #[error("cannot move from {territory}: no armies controlled by player")]
    SourceNotControlled { territory: String },

    #[error("cannot move {requested} armies from {territory}: only {available} available")]
    InsufficientArmies {
        requested: i32,
        territory: String,
        available: i32,
    },

    #[error("no armies in {territory} controlled by {player} to attack with")]
    NoAttackingArmies { territory: String, player: String },

    #[error("no armies in {territory}")]
    NoDefendingArmies { territory: String },

    #[error("cannot raise army size in {territory}: already at maximum of {max}")]
    MaxArmiesReached { territory: String, max: i32 },

    #[error("cannot move {armies} armies to {territory}: would exceed maximum of {max}")]
    ArmyCapExceeded {
        armies: i32,
        territory: String,
        max: i32,
    },

    #[error("cannot {verb} from {from} to {to}: not a neighboring territory")]
    NotNeighboring {
        verb: &'static str,
        from: String,
        to: String,
    },

    #[error("cannot attack {territory} from {territory}: friendly fire not allowed")]
    FriendlyFire { territory: String },

    #[error("invalid army sizes: attacking={attacking}, defending={defending}")]
    InvalidForceSize { attacking: i32, defending: i32 },

    #[error("no defending nation found for territory {territory}")]
    NoDefendingNation { territory: String },

    #[error("counterattack logic not implemented yet")]
    CounterattackUnsupported,

    #[error("unknown action {0:?}, expected join, color, raise, move, or attack")]
    UnknownAction(String),

    #[error("invalid {action} action: {reason}")]
    BadArguments { action: &'static str, reason: String },

    #[error("the action collided with a concurrent one and was not applied")]
    Conflict,

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}

/// Deadlocks and serialization failures reported by Postgres.
const CONFLICT_SQLSTATES: [&str; 2] = ["40001", "40P01"];

impl ActionError {
    /// Turn a store error caused by a concurrent transaction into
    /// [`ActionError::Conflict`]. Everything else is returned unchanged.
    pub(crate) fn classify_conflict(self) -> Self {
        let conflicted = matches!(&self, ActionError::Store(err) if is_conflict(err));
        if conflicted { ActionError::Conflict } else { self }
    }
}

fn is_conflict(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .is_some_and(|code| CONFLICT_SQLSTATES.contains(&code.as_ref()))
}

/// Turn a unique-constraint violation into the domain error `translate`
/// picks for the violated constraint's name. Anything else stays a store error.
pub(crate) fn translate_unique_violation(
    err: sqlx::Error,
    translate: impl FnOnce(&str) -> Option<ActionError>,
) -> ActionError {
    let translated = err
        .as_database_error()
        .filter(|db_err| db_err.is_unique_violation())
        .and_then(|db_err| db_err.constraint())
        .and_then(translate);
    translated.unwrap_or(ActionError::Store(err))
}
