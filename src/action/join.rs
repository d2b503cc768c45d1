use std::fmt;

use serde::Serialize;

use super::{ActionContext, ActionKind, bad_arguments, random_color};
use crate::db::ledger;
use crate::error::ActionError;

/// A new player founding a nation in one territory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinAction {
    pub player: String,
    /// Defaults to "<player>'s Nation".
    pub nation: Option<String>,
    pub territory: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinResult {
    pub player: String,
    pub nation: String,
    pub territory: String,
    pub color: String,
    pub army_size: i32,
}

impl fmt::Display for JoinResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} founded by {} in {}",
            self.nation, self.player, self.territory
        )
    }
}

impl JoinAction {
    pub(super) fn from_args(args: &[&str]) -> Result<Self, ActionError> {
        let (player, nation, territory) = match *args {
            [player, territory] => (player, "", territory),
            [player, nation, territory] => (player, nation, territory),
            _ => {
                return Err(bad_arguments(
                    ActionKind::Join,
                    "expected player, nation and territory",
                ));
            }
        };
        Ok(Self {
            player: player.to_string(),
            nation: (!nation.is_empty()).then(|| nation.to_string()),
            territory: territory.to_string(),
        })
    }

    pub fn nation_name(&self) -> String {
        match &self.nation {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("{}'s Nation", self.player),
        }
    }

    pub(crate) async fn apply(
        &self,
        ctx: &mut ActionContext<'_>,
    ) -> Result<JoinResult, ActionError> {
        if self.player.is_empty() {
            return Err(ActionError::MissingUser);
        }
        if self.territory.is_empty() {
            return Err(ActionError::NoTargetTerritory);
        }
        let config = ctx.config;
        let territory = config.resolve_territory(&self.territory)?;
        let nation = self.nation_name();

        if ledger::find_nation(ctx.conn, &self.player).await?.is_some() {
            return Err(ActionError::PlayerAlreadyJoined);
        }
        if ledger::nation_name_taken(ctx.conn, &nation).await? {
            return Err(ActionError::NationAlreadyJoined);
        }

        let color = random_color();
        ledger::insert_nation(ctx.conn, &nation, &self.player, &color).await?;
        ledger::insert_holding(
            ctx.conn,
            &self.player,
            &territory.abbreviation,
            config.initial_armies,
        )
        .await?;

        tracing::info!(
            player = %self.player,
            nation = %nation,
            territory = %territory.abbreviation,
            "nation founded"
        );
        Ok(JoinResult {
            player: self.player.clone(),
            nation,
            territory: territory.name.clone(),
            color,
            army_size: config.initial_armies,
        })
    }
}
