use std::fmt;

use serde::Serialize;

use super::{ActionContext, ActionKind, bad_arguments};
use crate::db::ledger;
use crate::error::ActionError;

/// Move armies between two neighboring territories. Moving into unclaimed
/// land may have to fight off a garrison first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveAction {
    pub player: String,
    pub source: String,
    pub destination: String,
    /// Zero or less moves every army in `source`.
    pub armies: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveOutcome {
    Moved,
    /// The garrison destroyed the whole moving force.
    InvasionRepelled,
    /// As above, and the source was the mover's last territory.
    InvasionRepelledEliminated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveResult {
    pub player: String,
    pub source: String,
    pub destination: String,
    /// Armies that left the source.
    pub armies: i32,
    pub requested_all: bool,
    /// Armies that reached the destination.
    pub arrived: i32,
    /// Set when a garrison was fought.
    pub die_roll: Option<i32>,
    pub outcome: MoveOutcome,
}

impl fmt::Display for MoveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            MoveOutcome::Moved if self.requested_all => write!(
                f,
                "{} moved all armies from {} to {}",
                self.player, self.source, self.destination
            ),
            MoveOutcome::Moved => write!(
                f,
                "{} moved {} armies from {} to {}",
                self.player, self.armies, self.source, self.destination
            ),
            MoveOutcome::InvasionRepelled | MoveOutcome::InvasionRepelledEliminated => {
                write!(
                    f,
                    "{} tried to move {} armies from {} to {}, but the invasion failed (rolled {})",
                    self.player,
                    self.armies,
                    self.source,
                    self.destination,
                    self.die_roll.unwrap_or_default()
                )?;
                if self.outcome == MoveOutcome::InvasionRepelledEliminated {
                    write!(f, "; {} was eliminated", self.player)?;
                }
                Ok(())
            }
        }
    }
}

impl MoveAction {
    pub(super) fn from_args(args: &[&str]) -> Result<Self, ActionError> {
        let (player, armies, source, destination) = match *args {
            [player, source, destination] => (player, 0, source, destination),
            [player, armies, source, destination] => {
                let armies = armies.trim().parse::<i32>().map_err(|_| {
                    bad_arguments(
                        ActionKind::Move,
                        format!("invalid number of armies: {armies}"),
                    )
                })?;
                (player, armies, source, destination)
            }
            _ => return Err(bad_arguments(ActionKind::Move, "expected 3 or 4 arguments")),
        };
        Ok(Self {
            player: player.to_string(),
            source: source.to_string(),
            destination: destination.to_string(),
            armies,
        })
    }

    pub(crate) async fn apply(
        &self,
        ctx: &mut ActionContext<'_>,
    ) -> Result<MoveResult, ActionError> {
        ledger::validate_player(ctx.conn, &self.player).await?;
        if self.destination.is_empty() || self.source == self.destination {
            return Err(ActionError::NoTargetTerritory);
        }

        let config = ctx.config;
        let source = config.resolve_territory(&self.source)?;
        let destination = config.resolve_territory(&self.destination)?;
        if source.abbreviation == destination.abbreviation {
            return Err(ActionError::NoTargetTerritory);
        }
        if !config.is_neighboring(source, destination) {
            return Err(ActionError::NotNeighboring {
                verb: "move",
                from: source.name.clone(),
                to: destination.name.clone(),
            });
        }

        let territories = [source.abbreviation.as_str(), destination.abbreviation.as_str()];
        let (mut from, mut to) = (None, None);
        for holding in ledger::lock_holdings(ctx.conn, &territories).await? {
            if holding.territory == source.abbreviation {
                from = Some(holding);
            } else {
                to = Some(holding);
            }
        }

        let from = from.ok_or_else(|| ActionError::NoArmiesToMove {
            territory: source.name.clone(),
            player: self.player.clone(),
        })?;
        if from.player != self.player {
            return Err(ActionError::SourceNotControlled {
                territory: source.name.clone(),
            });
        }
        if self.armies > from.army_size {
            return Err(ActionError::InsufficientArmies {
                requested: self.armies,
                territory: source.name.clone(),
                available: from.army_size,
            });
        }
        let requested_all = self.armies <= 0;
        let moving = if requested_all { from.army_size } else { self.armies };

        if to.as_ref().is_some_and(|h| h.player != self.player) {
            return Err(ActionError::TerritoryAlreadyOccupied);
        }
        let already_there = to.as_ref().map_or(0, |h| h.army_size);
        let max = config.max_armies_per_territory;
        if already_there + moving > max {
            return Err(ActionError::ArmyCapExceeded {
                armies: moving,
                territory: destination.name.clone(),
                max,
            });
        }

        // destination first, so a mover emptying their only territory into a
        // new one is never counted as holding nothing
        let mut die_roll = None;
        let arrived = match to {
            Some(holding) => {
                ledger::set_army_size_in(
                    ctx.conn,
                    &destination.abbreviation,
                    holding.army_size + moving,
                    false,
                )
                .await?;
                moving
            }
            None if config.unclaimed_territories_have_garrison => {
                let battle = ctx.battle(moving, 1)?;
                die_roll = Some(battle.die_roll);
                let arrived = moving - battle.attacker_losses();
                tracing::debug!(
                    player = %self.player,
                    territory = %destination.abbreviation,
                    die_roll = battle.die_roll,
                    moving,
                    arrived,
                    "invaded garrisoned territory"
                );
                if arrived > 0 {
                    ledger::insert_holding(
                        ctx.conn,
                        &self.player,
                        &destination.abbreviation,
                        arrived,
                    )
                    .await?;
                }
                arrived.max(0)
            }
            None => {
                ledger::insert_holding(ctx.conn, &self.player, &destination.abbreviation, moving)
                    .await?;
                moving
            }
        };

        let eliminated =
            ledger::set_army_size_in(ctx.conn, &source.abbreviation, from.army_size - moving, true)
                .await?;

        let outcome = match (arrived > 0, eliminated) {
            (true, _) => MoveOutcome::Moved,
            (false, false) => MoveOutcome::InvasionRepelled,
            (false, true) => MoveOutcome::InvasionRepelledEliminated,
        };
        tracing::info!(
            player = %self.player,
            source = %source.abbreviation,
            destination = %destination.abbreviation,
            moving,
            arrived,
            ?outcome,
            "move applied"
        );
        Ok(MoveResult {
            player: self.player.clone(),
            source: source.name.clone(),
            destination: destination.name.clone(),
            armies: moving,
            requested_all,
            arrived,
            die_roll,
            outcome,
        })
    }
}
