use std::fmt;

use serde::Serialize;

use super::{ActionContext, ActionKind, bad_arguments};
use crate::db::ledger;
use crate::error::ActionError;

/// Attack a neighboring territory. Only army counts change; the defending
/// territory keeps its owner even when its last army falls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttackAction {
    pub player: String,
    pub attacking: String,
    pub defending: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttackResult {
    pub player: String,
    pub attacking_territory: String,
    pub defending_territory: String,
    pub defending_player: String,
    pub die_roll: i32,
    /// Army sizes before the battle.
    pub attacking: i32,
    pub defending: i32,
    /// Positive: defending armies lost. Negative: attacking armies lost.
    pub loss: i32,
    /// Whoever lost their last territory in this attack.
    pub nation_removed: Option<String>,
}

impl fmt::Display for AttackResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} attacked {} from {}, ",
            self.player, self.defending_territory, self.attacking_territory
        )?;
        match self.loss {
            0 => write!(f, "attack failed (rolled {}) and no armies were lost", self.die_roll)?,
            loss if loss > 0 => write!(
                f,
                "attack succeeded (rolled {}) and {} defending armies were lost",
                self.die_roll, loss
            )?,
            loss => write!(
                f,
                "attack failed (rolled {}) and {} attacking armies were lost",
                self.die_roll, -loss
            )?,
        }
        if let Some(removed) = &self.nation_removed {
            write!(f, "; {removed} was eliminated")?;
        }
        Ok(())
    }
}

impl AttackAction {
    pub(super) fn from_args(args: &[&str]) -> Result<Self, ActionError> {
        match *args {
            [player, attacking, defending] => Ok(Self {
                player: player.to_string(),
                attacking: attacking.to_string(),
                defending: defending.to_string(),
            }),
            _ => Err(bad_arguments(
                ActionKind::Attack,
                "expected player, attacking territory and defending territory",
            )),
        }
    }

    pub(crate) async fn apply(
        &self,
        ctx: &mut ActionContext<'_>,
    ) -> Result<AttackResult, ActionError> {
        ledger::validate_player(ctx.conn, &self.player).await?;

        let config = ctx.config;
        let attacking = config.resolve_territory(&self.attacking)?;
        let defending = config.resolve_territory(&self.defending)?;
        if attacking.abbreviation == defending.abbreviation {
            return Err(ActionError::FriendlyFire {
                territory: defending.name.clone(),
            });
        }
        if !config.is_neighboring(attacking, defending) {
            return Err(ActionError::NotNeighboring {
                verb: "attack",
                from: attacking.name.clone(),
                to: defending.name.clone(),
            });
        }
        if config.do_counterattack {
            return Err(ActionError::CounterattackUnsupported);
        }

        let territories = [attacking.abbreviation.as_str(), defending.abbreviation.as_str()];
        let (mut attacker, mut defender) = (None, None);
        for holding in ledger::lock_holdings(ctx.conn, &territories).await? {
            if holding.territory == attacking.abbreviation {
                attacker = Some(holding);
            } else {
                defender = Some(holding);
            }
        }
        let attacker = attacker
            .filter(|h| h.player == self.player)
            .ok_or_else(|| ActionError::NoAttackingArmies {
                territory: attacking.name.clone(),
                player: self.player.clone(),
            })?;
        let defender = defender.ok_or_else(|| ActionError::NoDefendingArmies {
            territory: defending.name.clone(),
        })?;

        let battle = ctx.battle(attacker.army_size, defender.army_size)?;
        tracing::debug!(
            player = %self.player,
            attacking = attacker.army_size,
            defending = defender.army_size,
            die_roll = battle.die_roll,
            loss = battle.loss,
            "battle resolved"
        );

        let mut nation_removed = None;
        if battle.defender_losses() > 0 {
            let removed = ledger::set_army_size_in(
                ctx.conn,
                &defending.abbreviation,
                defender.army_size - battle.defender_losses(),
                true,
            )
            .await?;
            nation_removed = removed.then(|| defender.player.clone());
        } else if battle.attacker_losses() > 0 {
            let removed = ledger::set_army_size_in(
                ctx.conn,
                &attacking.abbreviation,
                attacker.army_size - battle.attacker_losses(),
                true,
            )
            .await?;
            nation_removed = removed.then(|| self.player.clone());
        }

        tracing::info!(
            player = %self.player,
            attacking = %attacking.abbreviation,
            defending = %defending.abbreviation,
            die_roll = battle.die_roll,
            loss = battle.loss,
            eliminated = nation_removed.as_deref(),
            "attack applied"
        );
        Ok(AttackResult {
            player: self.player.clone(),
            attacking_territory: attacking.name.clone(),
            defending_territory: defending.name.clone(),
            defending_player: defender.player,
            die_roll: battle.die_roll,
            attacking: attacker.army_size,
            defending: defender.army_size,
            loss: battle.loss,
            nation_removed,
        })
    }
}
