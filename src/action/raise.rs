use std::fmt;

use serde::Serialize;

use super::{ActionContext, ActionKind, bad_arguments};
use crate::db::ledger;
use crate::error::ActionError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RaiseAction {
    pub player: String,
    pub territory: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RaiseResult {
    pub player: String,
    pub territory: String,
    /// Size of the holding after the raise.
    pub army_size: i32,
}

impl fmt::Display for RaiseResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} raised an army in {}", self.player, self.territory)
    }
}

impl RaiseAction {
    pub(super) fn from_args(args: &[&str]) -> Result<Self, ActionError> {
        match *args {
            [player, territory] => Ok(Self {
                player: player.to_string(),
                territory: territory.to_string(),
            }),
            _ => Err(bad_arguments(ActionKind::Raise, "expected player and territory")),
        }
    }

    pub(crate) async fn apply(
        &self,
        ctx: &mut ActionContext<'_>,
    ) -> Result<RaiseResult, ActionError> {
        ledger::validate_player(ctx.conn, &self.player).await?;
        if self.territory.is_empty() {
            return Err(ActionError::NoTargetTerritory);
        }
        let config = ctx.config;
        let territory = config.resolve_territory(&self.territory)?;

        let holding = ledger::player_holding_at(ctx.conn, &territory.abbreviation, &self.player)
            .await?
            .ok_or_else(|| ActionError::NoArmiesToRaise {
                territory: territory.name.clone(),
                player: self.player.clone(),
            })?;

        let max = config.max_armies_per_territory;
        if holding.army_size >= max {
            return Err(ActionError::MaxArmiesReached {
                territory: territory.name.clone(),
                max,
            });
        }

        let army_size = holding.army_size + 1;
        ledger::set_army_size_in(ctx.conn, &territory.abbreviation, army_size, false).await?;

        tracing::info!(
            player = %self.player,
            territory = %territory.abbreviation,
            army_size,
            "army raised"
        );
        Ok(RaiseResult {
            player: self.player.clone(),
            territory: territory.name.clone(),
            army_size,
        })
    }
}
