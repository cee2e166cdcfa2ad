//! Per-stat upgrade pricing and application.

use lane_defence_core::{
    tower::MAX_UPGRADES_PER_STAT, TowerProgress, UpgradeError, UpgradeStat,
};

/// Price multiplier applied per purchased level of the same stat.
pub const UPGRADE_COST_GROWTH: f64 = 1.5;

/// Fraction of the kind's base attack interval removed by each speed upgrade.
pub const SPEED_UPGRADE_FRACTION: f64 = 0.1;

/// Splash radius added by each splash upgrade.
pub const SPLASH_UPGRADE_STEP: f32 = 10.0;

/// Price of the next purchase of `stat`, or the reason it cannot be bought.
pub fn quote_upgrade(progress: &TowerProgress, stat: UpgradeStat) -> Result<u32, UpgradeError> {
    let profile = progress.kind().profile();
    if stat == UpgradeStat::Splash && profile.splash_radius <= 0.0 {
        return Err(UpgradeError::NotApplicable { stat });
    }

    let purchased = progress.upgrades.get(stat);
    if purchased >= MAX_UPGRADES_PER_STAT {
        return Err(UpgradeError::MaxLevel { stat });
    }

    let price = f64::from(profile.upgrade_cost) * UPGRADE_COST_GROWTH.powi(i32::from(purchased));
    Ok(price.floor() as u32)
}

/// Buys one level of `stat`, returning the price paid.
///
/// Gold is not handled here; callers check affordability against the quote
/// first. On error `progress` is left untouched.
pub fn apply_upgrade(progress: &mut TowerProgress, stat: UpgradeStat) -> Result<u32, UpgradeError> {
    let cost = quote_upgrade(progress, stat)?;
    let profile = progress.kind().profile();
    let stats = &mut progress.stats;

    match stat {
        UpgradeStat::Damage => stats.damage += profile.upgrade_damage,
        UpgradeStat::Range => stats.range += profile.upgrade_range,
        UpgradeStat::Speed => {
            let step = profile.attack_interval.mul_f64(SPEED_UPGRADE_FRACTION);
            stats.attack_interval = stats.attack_interval.saturating_sub(step);
        }
        UpgradeStat::Splash => stats.splash_radius += SPLASH_UPGRADE_STEP,
    }
    stats.normalize();

    progress.upgrades.increment(stat);
    progress.invested = progress.invested.saturating_add(cost);
    Ok(cost)
}
