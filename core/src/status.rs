//! Timed status effects attached to enemies.
//!
//! Every enemy owns a [`StatusEffectTable`] holding at most one live effect
//! per [`EffectKind`]. Applying an effect of a kind that is already present
//! replaces the previous instance outright; durations and magnitudes never
//! stack. Periodic effects fire against the owning enemy's age clock, so a
//! paused simulation also pauses their ticking.

use std::{collections::BTreeMap, time::Duration};

use serde::{Deserialize, Serialize};

use crate::catalog::DamageType;

/// Categories of timed effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EffectKind {
    /// Reduces movement speed.
    Slow,
    /// Halts or heavily reduces movement speed.
    Freeze,
    /// Deals poison damage at a fixed interval.
    Poison,
    /// Deals fire damage at a fixed interval.
    Burn,
}

impl EffectKind {
    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Slow => 0,
            Self::Freeze => 1,
            Self::Poison => 2,
            Self::Burn => 3,
        }
    }

    /// Reports whether the kind modifies movement speed.
    #[must_use]
    pub const fn affects_speed(self) -> bool {
        matches!(self, Self::Slow | Self::Freeze)
    }

    /// Damage type dealt by periodic ticks of this kind, if it ticks at all.
    #[must_use]
    pub const fn periodic_damage_type(self) -> Option<DamageType> {
        match self {
            Self::Poison => Some(DamageType::Poison),
            Self::Burn => Some(DamageType::Fire),
            Self::Slow | Self::Freeze => None,
        }
    }
}

/// Kind-specific parameters of a status effect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EffectPayload {
    /// Multiplies the owner's base speed while active.
    SpeedFactor(f32),
    /// Deals `damage` every `interval` of the owner's age.
    Periodic {
        /// Damage dealt per tick.
        damage: f32,
        /// Age interval between ticks.
        interval: Duration,
    },
}

/// A single timed effect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatusEffect {
    kind: EffectKind,
    remaining: Duration,
    payload: EffectPayload,
    last_tick: Duration,
}

impl StatusEffect {
    /// Creates a slow effect multiplying speed by `factor`.
    #[must_use]
    pub fn slow(factor: f32, duration: Duration) -> Self {
        Self::with_payload(
            EffectKind::Slow,
            duration,
            EffectPayload::SpeedFactor(factor.clamp(0.0, 1.0)),
        )
    }

    /// Creates a freeze effect multiplying speed by `factor`.
    #[must_use]
    pub fn freeze(factor: f32, duration: Duration) -> Self {
        Self::with_payload(
            EffectKind::Freeze,
            duration,
            EffectPayload::SpeedFactor(factor.clamp(0.0, 1.0)),
        )
    }

    /// Creates a poison effect dealing `damage` every `interval`.
    #[must_use]
    pub fn poison(damage: f32, interval: Duration, duration: Duration) -> Self {
        Self::with_payload(
            EffectKind::Poison,
            duration,
            EffectPayload::Periodic { damage, interval },
        )
    }

    /// Creates a burn effect dealing `damage` every `interval`.
    #[must_use]
    pub fn burn(damage: f32, interval: Duration, duration: Duration) -> Self {
        Self::with_payload(
            EffectKind::Burn,
            duration,
            EffectPayload::Periodic { damage, interval },
        )
    }

    fn with_payload(kind: EffectKind, remaining: Duration, payload: EffectPayload) -> Self {
        Self {
            kind,
            remaining,
            payload,
            last_tick: Duration::ZERO,
        }
    }

    /// Kind of the effect.
    #[must_use]
    pub const fn kind(&self) -> EffectKind {
        self.kind
    }

    /// Time left before the effect expires.
    #[must_use]
    pub const fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Kind-specific parameters.
    #[must_use]
    pub const fn payload(&self) -> EffectPayload {
        self.payload
    }

    /// Owner age at which the effect last ticked or was applied.
    #[must_use]
    pub const fn last_tick(&self) -> Duration {
        self.last_tick
    }

    fn speed_factor(&self) -> f32 {
        match self.payload {
            EffectPayload::SpeedFactor(factor) if self.kind.affects_speed() => factor,
            _ => 1.0,
        }
    }
}

/// Damage owed to an enemy by a periodic effect that fired this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeriodicTick {
    /// Effect that fired.
    pub kind: EffectKind,
    /// Damage to apply.
    pub damage: f32,
    /// Damage type to apply.
    pub damage_type: DamageType,
}

/// Per-entity map of active effects keyed by kind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusEffectTable {
    effects: BTreeMap<EffectKind, StatusEffect>,
}

impl StatusEffectTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `effect`, replacing any live effect of the same kind.
    ///
    /// `owner_age` anchors the tick clock of periodic effects. Returns the
    /// replaced effect, if one was present.
    pub fn insert(&mut self, mut effect: StatusEffect, owner_age: Duration) -> Option<StatusEffect> {
        effect.last_tick = owner_age;
        self.effects.insert(effect.kind, effect)
    }

    /// Removes the effect of the provided kind.
    pub fn remove(&mut self, kind: EffectKind) -> Option<StatusEffect> {
        self.effects.remove(&kind)
    }

    /// Live effect of the provided kind.
    #[must_use]
    pub fn get(&self, kind: EffectKind) -> Option<&StatusEffect> {
        self.effects.get(&kind)
    }

    /// Reports whether an effect of the provided kind is live.
    #[must_use]
    pub fn contains(&self, kind: EffectKind) -> bool {
        self.effects.contains_key(&kind)
    }

    /// Number of live effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Reports whether no effects are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Iterator over live effects ordered by kind.
    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.effects.values()
    }

    /// Kinds of the live effects ordered by kind.
    #[must_use]
    pub fn kinds(&self) -> Vec<EffectKind> {
        self.effects.keys().copied().collect()
    }

    /// Removes every effect.
    pub fn clear(&mut self) {
        self.effects.clear();
    }

    /// Product of the speed factors of every speed-affecting effect.
    #[must_use]
    pub fn speed_multiplier(&self) -> f32 {
        self.effects.values().map(StatusEffect::speed_factor).product()
    }

    /// Advances every effect by `dt` given the owner's updated age.
    ///
    /// Periodic effects push one [`PeriodicTick`] into `out` for every whole
    /// interval elapsed since their last tick, up to their expiry age. The
    /// tick clock advances by the interval, so frame length never drops
    /// ticks. Effects whose remaining duration reaches zero fire their final
    /// tick first and are then removed.
    pub fn tick(&mut self, dt: Duration, owner_age: Duration, out: &mut Vec<PeriodicTick>) {
        self.effects.retain(|kind, effect| {
            let expires_at = owner_age.saturating_sub(dt).saturating_add(effect.remaining);
            effect.remaining = effect.remaining.saturating_sub(dt);

            if let EffectPayload::Periodic { damage, interval } = effect.payload {
                if let Some(damage_type) = kind.periodic_damage_type() {
                    let horizon = owner_age.min(expires_at);
                    let tick = PeriodicTick {
                        kind: *kind,
                        damage,
                        damage_type,
                    };
                    if interval.is_zero() {
                        out.push(tick);
                        effect.last_tick = owner_age;
                    } else {
                        while effect.last_tick.saturating_add(interval) <= horizon {
                            out.push(tick);
                            effect.last_tick = effect.last_tick.saturating_add(interval);
                        }
                    }
                }
            }

            !effect.remaining.is_zero()
        });
    }
}
