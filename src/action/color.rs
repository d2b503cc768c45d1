use std::fmt;

use rand::Rng;
use serde::Serialize;

use super::{ActionContext, ActionKind, bad_arguments};
use crate::db::ledger;
use crate::error::ActionError;

/// Change the map color of the player's nation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColorAction {
    pub player: String,
    /// Any CSS color expression. Empty picks a random color.
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColorResult {
    pub player: String,
    /// Six lowercase hex digits, no leading `#`.
    pub color: String,
}

impl fmt::Display for ColorResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} changed their nation's color to #{}", self.player, self.color)
    }
}

/// A random `rrggbb` color.
pub fn random_color() -> String {
    let mut rng = rand::rng();
    let [r, g, b]: [u8; 3] = rng.random();
    format!("{r:02x}{g:02x}{b:02x}")
}

/// Parse a CSS color expression into opaque `rrggbb` form.
///
/// Bare hex digits without a leading `#` are accepted too.
pub fn normalize_color(expression: &str) -> Result<String, ActionError> {
    let expression = expression.trim();
    let parsed = csscolorparser::parse(expression).or_else(|err| {
        let bare_hex = matches!(expression.len(), 3 | 4 | 6 | 8)
            && expression.chars().all(|c| c.is_ascii_hexdigit());
        if bare_hex {
            csscolorparser::parse(&format!("#{expression}"))
        } else {
            Err(err)
        }
    });
    let color = parsed.map_err(|source| ActionError::InvalidColor {
        expression: expression.to_string(),
        source,
    })?;

    // alpha is dropped: nations are always drawn fully opaque
    let [r, g, b, _] = color.to_rgba8();
    Ok(format!("{r:02x}{g:02x}{b:02x}"))
}

impl ColorAction {
    pub(super) fn from_args(args: &[&str]) -> Result<Self, ActionError> {
        match *args {
            [player] => Ok(Self {
                player: player.to_string(),
                color: String::new(),
            }),
            [player, color] => Ok(Self {
                player: player.to_string(),
                color: color.to_string(),
            }),
            _ => Err(bad_arguments(ActionKind::Color, "expected player and color")),
        }
    }

    pub(crate) async fn apply(
        &self,
        ctx: &mut ActionContext<'_>,
    ) -> Result<ColorResult, ActionError> {
        ledger::validate_player(ctx.conn, &self.player).await?;

        let color = if self.color.trim().is_empty() {
            random_color()
        } else {
            normalize_color(&self.color)?
        };
        ledger::set_nation_color(ctx.conn, &self.player, &color).await?;

        tracing::info!(player = %self.player, color = %color, "updated player color");
        Ok(ColorResult {
            player: self.player.clone(),
            color,
        })
    }
}
