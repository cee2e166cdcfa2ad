#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Combat resolution rules shared by projectiles, chain towers, and spells.
//!
//! Every function in this crate is generic over the capability traits from
//! `lane-defence-core`, so the world can drive them with its own entity
//! types while tests use lightweight stand-ins. Nothing here destroys
//! entities: a lethal hit only marks its target dead, leaving removal to the
//! cleanup phase of the tick.

use glam::Vec2;
use lane_defence_core::{
    ChainProfile, DamageType, Damageable, EnemyId, StatusEffect, Targetable,
};

/// Fraction of the primary hit dealt to enemies caught in a splash.
pub const SPLASH_DAMAGE_FRACTION: f32 = 0.7;

/// Result of a single damage application.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DamageOutcome {
    /// Damage after resistances, zero when the hit was ignored.
    pub actual: u32,
    /// Whether this hit transitioned the target into its dead state.
    pub killed: bool,
}

/// Damage dealt to a single enemy by an area or splash application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageReport {
    /// Enemy that was hit.
    pub enemy: EnemyId,
    /// Outcome of the hit.
    pub outcome: DamageOutcome,
}

/// One link of a resolved chain attack.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChainLink {
    /// Enemy struck by the link.
    pub enemy: EnemyId,
    /// Position of the enemy when the chain resolved.
    pub position: Vec2,
    /// Damage owed to the enemy before resistances.
    pub damage: f32,
}

/// Applies typed damage to `target`.
///
/// Dead targets, immune targets, and non-positive amounts take no damage.
/// Otherwise the target loses `max(1, floor(amount * (1 - resistance)))`
/// health, saturating at zero, and is marked dead when nothing remains.
pub fn apply_damage<T>(target: &mut T, amount: f32, damage_type: DamageType) -> DamageOutcome
where
    T: Damageable + ?Sized,
{
    if !target.is_alive() || target.is_immune_to(damage_type) {
        return DamageOutcome::default();
    }
    if !amount.is_finite() || amount <= 0.0 {
        return DamageOutcome::default();
    }

    let resistance = target.resistance(damage_type).clamp(0.0, 1.0);
    let scaled = (amount * (1.0 - resistance)).floor();
    let actual = if scaled >= u32::MAX as f32 {
        u32::MAX
    } else {
        (scaled as u32).max(1)
    };

    let remaining = target.health().saturating_sub(actual);
    target.set_health(remaining);

    let killed = remaining == 0;
    if killed {
        target.mark_dead();
    }

    DamageOutcome { actual, killed }
}

/// Restores up to `amount` health on a live target, never exceeding its maximum.
///
/// Returns the health actually restored.
pub fn apply_healing<T>(target: &mut T, amount: u32) -> u32
where
    T: Damageable + ?Sized,
{
    if !target.is_alive() || amount == 0 {
        return 0;
    }

    let before = target.health();
    let healed = before.saturating_add(amount).min(target.max_health());
    target.set_health(healed);
    healed.saturating_sub(before)
}

/// Damages every live target within `radius` of `origin` for the full amount.
///
/// `exclude` names a target that was already hit and must be skipped.
/// Reports for targets that took damage are appended to `out` in iteration
/// order.
pub fn apply_area<'a, T, I>(
    targets: I,
    origin: Vec2,
    radius: f32,
    damage: f32,
    damage_type: DamageType,
    exclude: Option<EnemyId>,
    out: &mut Vec<DamageReport>,
) where
    T: Damageable + Targetable + 'a,
    I: IntoIterator<Item = &'a mut T>,
{
    if radius.is_nan() || radius <= 0.0 {
        return;
    }

    for target in targets {
        if Some(target.target_id()) == exclude || !target.is_alive() {
            continue;
        }
        if target.position().distance(origin) > radius {
            continue;
        }

        let outcome = apply_damage(&mut *target, damage, damage_type);
        if outcome.actual > 0 {
            out.push(DamageReport {
                enemy: target.target_id(),
                outcome,
            });
        }
    }
}

/// Applies secondary splash damage around a primary impact.
///
/// `primary_damage` is the damage of the hit that caused the splash; each
/// enemy in the area receives [`SPLASH_DAMAGE_FRACTION`] of it. The primary
/// target is passed as `exclude` so it is never hit twice.
pub fn apply_splash<'a, T, I>(
    targets: I,
    origin: Vec2,
    radius: f32,
    primary_damage: f32,
    damage_type: DamageType,
    exclude: Option<EnemyId>,
    out: &mut Vec<DamageReport>,
) where
    T: Damageable + Targetable + 'a,
    I: IntoIterator<Item = &'a mut T>,
{
    apply_area(
        targets,
        origin,
        radius,
        primary_damage * SPLASH_DAMAGE_FRACTION,
        damage_type,
        exclude,
        out,
    );
}

/// Resolves the links of a chain attack starting at `first`.
///
/// The chain greedily jumps to the nearest targetable candidate that has not
/// been struck yet and lies within `tower_range * range_fraction` of the
/// current link; equal distances resolve to the smaller identifier. At most
/// `profile.max_targets()` links are produced and link `i` owes
/// `base_damage * damage_decay^i`. The output buffer is cleared first and
/// stays empty when `first` is not a targetable candidate.
pub fn resolve_chain<C>(
    candidates: &[C],
    first: EnemyId,
    base_damage: f32,
    tower_range: f32,
    profile: ChainProfile,
    out: &mut Vec<ChainLink>,
) where
    C: Targetable,
{
    out.clear();

    let Some(start) = candidates
        .iter()
        .find(|candidate| candidate.target_id() == first && candidate.is_targetable())
    else {
        return;
    };

    let max_targets = profile.max_targets() as usize;
    let jump_range = tower_range * profile.range_fraction;
    let mut damage = base_damage;
    let mut current = start.position();

    out.push(ChainLink {
        enemy: first,
        position: current,
        damage,
    });

    while out.len() < max_targets {
        let mut best: Option<(f32, EnemyId, Vec2)> = None;

        for candidate in candidates {
            let id = candidate.target_id();
            if !candidate.is_targetable() || out.iter().any(|link| link.enemy == id) {
                continue;
            }

            let distance = candidate.position().distance(current);
            if distance > jump_range {
                continue;
            }

            let closer = match best {
                Some((best_distance, best_id, _)) => {
                    distance < best_distance || (distance == best_distance && id < best_id)
                }
                None => true,
            };
            if closer {
                best = Some((distance, id, candidate.position()));
            }
        }

        let Some((_, enemy, position)) = best else {
            break;
        };

        damage *= profile.damage_decay;
        current = position;
        out.push(ChainLink {
            enemy,
            position,
            damage,
        });
    }
}

/// Attaches `effect` to a live target unless the target rejects its kind.
///
/// An existing effect of the same kind is replaced. Returns whether the
/// effect took hold.
pub fn add_status_effect<T>(target: &mut T, effect: StatusEffect) -> bool
where
    T: Damageable + ?Sized,
{
    if !target.is_alive() || target.rejects_effect(effect.kind()) {
        return false;
    }

    let age = target.age();
    let _ = target.status_effects_mut().insert(effect, age);
    true
}
