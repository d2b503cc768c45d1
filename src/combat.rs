//! Die-roll combat between two army counts.
//!
//! A single d20 decides the fight. The attack succeeds when the roll beats
//! `(defending - attacking) * 2 + 10`:
//!
//! | roll  | succeeds when                              |
//! |-------|--------------------------------------------|
//! | 19-20 | always                                     |
//! | 13+   | defenders outnumber attackers by one       |
//! | 11+   | forces are equal                           |
//! | 9+    | attackers outnumber defenders by one       |
//!
//! Casualties scale with the roll and the force difference, and a roll of 1
//! always costs the attacker at least one army.

use rand::{Rng, RngCore};

use crate::error::ActionError;

pub const DIE_SIDES: i32 = 20;

/// Source of uniformly distributed integers. Injected into the referee so
/// tests can pin the die.
pub trait RandomSource: Send {
    /// A value in `low..=high`.
    fn uniform(&mut self, low: i32, high: i32) -> i32;
}

/// Adapts any `rand` generator.
#[derive(Debug)]
pub struct RngSource<R>(pub R);

impl<R: RngCore + Send> RandomSource for RngSource<R> {
    fn uniform(&mut self, low: i32, high: i32) -> i32 {
        self.0.random_range(low..=high)
    }
}

/// Always produces the same value, clamped into the requested range.
#[derive(Debug, Clone, Copy)]
pub struct FixedRoll(pub i32);

impl RandomSource for FixedRoll {
    fn uniform(&mut self, low: i32, high: i32) -> i32 {
        self.0.clamp(low, high)
    }
}

/// Outcome of one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Battle {
    pub die_roll: i32,
    /// Positive: defending armies destroyed. Negative: attacking armies
    /// destroyed. Zero: stalemate.
    pub loss: i32,
}

impl Battle {
    pub fn succeeded(&self) -> bool {
        self.loss > 0
    }

    pub fn defender_losses(&self) -> i32 {
        self.loss.max(0)
    }

    pub fn attacker_losses(&self) -> i32 {
        (-self.loss).max(0)
    }
}

pub fn attack_succeeds(die_roll: i32, attacking: i32, defending: i32) -> bool {
    die_roll > (defending - attacking) * 2 + 10
}

/// Roll the die and work out casualties for `attacking` against `defending`.
pub fn resolve(
    attacking: i32,
    defending: i32,
    dice: &mut dyn RandomSource,
) -> Result<Battle, ActionError> {
    if attacking <= 0 || defending <= 0 {
        return Err(ActionError::InvalidForceSize {
            attacking,
            defending,
        });
    }

    let die_roll = dice.uniform(1, DIE_SIDES);
    Ok(Battle {
        die_roll,
        loss: casualties(die_roll, attacking, defending),
    })
}

/// Signed casualties for a known roll. Both forces must be positive.
///
/// A failed roll never costs the defender: when the failure formula comes out
/// positive (a large attacker that rolled low), the result is clamped to a
/// stalemate of 0 rather than counted as defending losses. A roll of 1 that
/// would otherwise be a stalemate costs the attacker one army.
pub fn casualties(die_roll: i32, attacking: i32, defending: i32) -> i32 {
    let half_roll = f64::from(die_roll) * 0.5;

    if attack_succeeds(die_roll, attacking, defending) {
        let loss = (half_roll + f64::from(attacking - defending - 5)).floor() as i32;
        // a successful attack always destroys something
        loss.max(1).min(defending)
    } else {
        let loss = -((half_roll + f64::from(defending - attacking - 5)).floor() as i32);
        if die_roll == 1 && loss >= 0 {
            -1
        } else {
            // a failed attack never costs the defender anything
            loss.min(0).max(-attacking)
        }
    }
}
