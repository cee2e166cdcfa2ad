//! Player gold, health, and score.

use lane_defence_core::CommandError;

/// Resources owned by the player during a run.
///
/// Gold and health saturate at zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Economy {
    pub(crate) gold: u32,
    pub(crate) health: u32,
    pub(crate) score: u64,
}

impl Economy {
    pub(crate) fn new(gold: u32, health: u32) -> Self {
        Self {
            gold,
            health,
            score: 0,
        }
    }

    /// Fails unless the player holds at least `cost` gold.
    pub(crate) fn ensure(&self, cost: u32) -> Result<(), CommandError> {
        if self.gold < cost {
            return Err(CommandError::InsufficientGold {
                required: cost,
                available: self.gold,
            });
        }
        Ok(())
    }

    /// Deducts `cost` after checking affordability.
    pub(crate) fn spend(&mut self, cost: u32) -> Result<(), CommandError> {
        self.ensure(cost)?;
        self.gold -= cost;
        Ok(())
    }

    pub(crate) fn earn(&mut self, gold: u32) {
        self.gold = self.gold.saturating_add(gold);
    }

    pub(crate) fn add_score(&mut self, score: u32) {
        self.score = self.score.saturating_add(u64::from(score));
    }

    pub(crate) fn take_damage(&mut self, damage: u32) {
        self.health = self.health.saturating_sub(damage);
    }

    /// Restores up to `amount` health without exceeding `ceiling`, returning what was restored.
    pub(crate) fn heal(&mut self, amount: u32, ceiling: u32) -> u32 {
        let healed = self.health.saturating_add(amount).min(ceiling).max(self.health);
        let restored = healed - self.health;
        self.health = healed;
        restored
    }

    pub(crate) fn is_defeated(&self) -> bool {
        self.health == 0
    }
}
