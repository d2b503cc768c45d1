//! Player actions and their results.
//!
//! An [`Action`] is built either directly or from a kind token plus
//! positional arguments ([`Action::parse`]), then handed to
//! [`crate::Referee::process`], which applies it inside one transaction and
//! returns an [`ActionResult`].

mod attack;
mod color;
mod join;
mod movement;
mod raise;

use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use sqlx::PgConnection;

use crate::combat::{self, Battle, RandomSource};
use crate::config::GameConfig;
use crate::error::ActionError;

pub use attack::{AttackAction, AttackResult};
pub use color::{ColorAction, ColorResult, normalize_color, random_color};
pub use join::{JoinAction, JoinResult};
pub use movement::{MoveAction, MoveOutcome, MoveResult};
pub use raise::{RaiseAction, RaiseResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Join,
    Color,
    Raise,
    Move,
    Attack,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::Join,
        ActionKind::Color,
        ActionKind::Raise,
        ActionKind::Move,
        ActionKind::Attack,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Join => "join",
            ActionKind::Color => "color",
            ActionKind::Raise => "raise",
            ActionKind::Move => "move",
            ActionKind::Attack => "attack",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ActionError::UnknownAction(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Join(JoinAction),
    Color(ColorAction),
    Raise(RaiseAction),
    Move(MoveAction),
    Attack(AttackAction),
}

impl Action {
    /// Build an action from its kind token and positional arguments:
    ///
    /// | kind   | arguments                                         |
    /// |--------|---------------------------------------------------|
    /// | join   | `player, [nation,] territory`                     |
    /// | color  | `player[, color]`                                 |
    /// | raise  | `player, territory`                               |
    /// | move   | `player, [armies,] source, destination`           |
    /// | attack | `player, attacking, defending`                    |
    pub fn parse(kind: &str, args: &[&str]) -> Result<Self, ActionError> {
        let action = match kind.parse::<ActionKind>()? {
            ActionKind::Join => Action::Join(JoinAction::from_args(args)?),
            ActionKind::Color => Action::Color(ColorAction::from_args(args)?),
            ActionKind::Raise => Action::Raise(RaiseAction::from_args(args)?),
            ActionKind::Move => Action::Move(MoveAction::from_args(args)?),
            ActionKind::Attack => Action::Attack(AttackAction::from_args(args)?),
        };
        if action.player().is_empty() {
            return Err(ActionError::MissingUser);
        }
        Ok(action)
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Join(_) => ActionKind::Join,
            Action::Color(_) => ActionKind::Color,
            Action::Raise(_) => ActionKind::Raise,
            Action::Move(_) => ActionKind::Move,
            Action::Attack(_) => ActionKind::Attack,
        }
    }

    pub fn player(&self) -> &str {
        match self {
            Action::Join(a) => &a.player,
            Action::Color(a) => &a.player,
            Action::Raise(a) => &a.player,
            Action::Move(a) => &a.player,
            Action::Attack(a) => &a.player,
        }
    }
}

impl From<JoinAction> for Action {
    fn from(action: JoinAction) -> Self {
        Action::Join(action)
    }
}

impl From<ColorAction> for Action {
    fn from(action: ColorAction) -> Self {
        Action::Color(action)
    }
}

impl From<RaiseAction> for Action {
    fn from(action: RaiseAction) -> Self {
        Action::Raise(action)
    }
}

impl From<MoveAction> for Action {
    fn from(action: MoveAction) -> Self {
        Action::Move(action)
    }
}

impl From<AttackAction> for Action {
    fn from(action: AttackAction) -> Self {
        Action::Attack(action)
    }
}

/// What an applied action did. `Display` gives a one-line summary suitable
/// for a game channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionResult {
    Join(JoinResult),
    Color(ColorResult),
    Raise(RaiseResult),
    Move(MoveResult),
    Attack(AttackResult),
}

impl ActionResult {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionResult::Join(_) => ActionKind::Join,
            ActionResult::Color(_) => ActionKind::Color,
            ActionResult::Raise(_) => ActionKind::Raise,
            ActionResult::Move(_) => ActionKind::Move,
            ActionResult::Attack(_) => ActionKind::Attack,
        }
    }

    pub fn player(&self) -> &str {
        match self {
            ActionResult::Join(r) => &r.player,
            ActionResult::Color(r) => &r.player,
            ActionResult::Raise(r) => &r.player,
            ActionResult::Move(r) => &r.player,
            ActionResult::Attack(r) => &r.player,
        }
    }
}

impl fmt::Display for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionResult::Join(r) => fmt::Display::fmt(r, f),
            ActionResult::Color(r) => fmt::Display::fmt(r, f),
            ActionResult::Raise(r) => fmt::Display::fmt(r, f),
            ActionResult::Move(r) => fmt::Display::fmt(r, f),
            ActionResult::Attack(r) => fmt::Display::fmt(r, f),
        }
    }
}

/// State handed to each handler: the open transaction, the game config and
/// the die.
pub(crate) struct ActionContext<'a> {
    pub conn: &'a mut PgConnection,
    pub config: &'a GameConfig,
    pub dice: &'a Mutex<Box<dyn RandomSource>>,
}

impl ActionContext<'_> {
    pub fn battle(&self, attacking: i32, defending: i32) -> Result<Battle, ActionError> {
        let mut dice = self.dice.lock().unwrap_or_else(PoisonError::into_inner);
        combat::resolve(attacking, defending, &mut **dice)
    }
}

fn bad_arguments(action: ActionKind, reason: impl Into<String>) -> ActionError {
    ActionError::BadArguments {
        action: action.as_str(),
        reason: reason.into(),
    }
}
