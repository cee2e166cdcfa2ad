//! Per-wave difficulty scaling of enemy statistics.

use lane_defence_core::{EnemyProfile, WaveConfig};

/// Health multiplier compounded per wave after the first.
pub const HEALTH_MULTIPLIER_PER_WAVE: f64 = 1.12;

/// Speed multiplier compounded per wave after the first.
pub const SPEED_MULTIPLIER_PER_WAVE: f64 = 1.05;

/// Waves past this number deal extra damage to the player.
pub const DAMAGE_SCALING_THRESHOLD: u32 = 5;

/// Extra player damage fraction per wave past the threshold.
pub const DAMAGE_STEP_PER_WAVE: f64 = 0.2;

/// Waves past this number award less gold per kill.
pub const GOLD_SCALING_THRESHOLD: u32 = 3;

/// Gold reward fraction removed per wave past the threshold.
pub const GOLD_STEP_PER_WAVE: f64 = 0.05;

/// Lowest gold reward multiplier a wave can apply.
pub const MIN_GOLD_FACTOR: f64 = 0.6;

/// Scales a base profile to the wave it is spawned in.
///
/// Health and score follow the wave's difficulty scalar, health and speed
/// compound per wave, and player damage and gold reward change only past
/// their thresholds. Health and gold never drop below one.
#[must_use]
pub fn scale_profile(base: EnemyProfile, wave: &WaveConfig) -> EnemyProfile {
    let number = wave.number.max(1);
    let steps = i32::try_from(number - 1).unwrap_or(i32::MAX);
    let difficulty = if wave.difficulty.is_finite() && wave.difficulty > 0.0 {
        f64::from(wave.difficulty)
    } else {
        1.0
    };

    let mut scaled = base;

    let health =
        f64::from(base.max_health) * difficulty * HEALTH_MULTIPLIER_PER_WAVE.powi(steps);
    scaled.max_health = saturate(health).max(1);

    scaled.speed = (f64::from(base.speed) * SPEED_MULTIPLIER_PER_WAVE.powi(steps)) as f32;

    if number > DAMAGE_SCALING_THRESHOLD {
        let factor = 1.0 + f64::from(number - DAMAGE_SCALING_THRESHOLD) * DAMAGE_STEP_PER_WAVE;
        scaled.damage = saturate(f64::from(base.damage) * factor);
    }

    if number > GOLD_SCALING_THRESHOLD {
        let factor = (1.0 - f64::from(number - GOLD_SCALING_THRESHOLD) * GOLD_STEP_PER_WAVE)
            .max(MIN_GOLD_FACTOR);
        scaled.gold_reward = saturate(f64::from(base.gold_reward) * factor).max(1);
    }

    scaled.score_value = saturate(f64::from(base.score_value) * difficulty);
    scaled
}

fn saturate(value: f64) -> u32 {
    if value.is_finite() {
        value.floor().clamp(0.0, f64::from(u32::MAX)) as u32
    } else {
        0
    }
}
