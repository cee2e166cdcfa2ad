//! Spell cooldowns and the world commands each spell resolves to.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec2;
use lane_defence_core::{
    Command, CommandError, DamageType, EffectCue, EnemyId, SpellKind, StatusEffect,
};

/// Speed multiplier applied by the freeze spell.
pub(crate) const FREEZE_SPEED_FACTOR: f32 = 0.0;

/// What casting a spell does once it has been paid for.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum SpellEffect {
    /// Mutates the world.
    World(Command),
    /// Restores player health.
    Heal(u32),
}

/// Remaining cooldown per spell, measured on the simulation clock.
#[derive(Debug, Default)]
pub(crate) struct SpellBook {
    cooldowns: BTreeMap<SpellKind, Duration>,
}

impl SpellBook {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn remaining(&self, spell: SpellKind) -> Duration {
        self.cooldowns.get(&spell).copied().unwrap_or(Duration::ZERO)
    }

    pub(crate) fn ensure_ready(&self, spell: SpellKind) -> Result<(), CommandError> {
        let remaining = self.remaining(spell);
        if remaining.is_zero() {
            Ok(())
        } else {
            Err(CommandError::SpellOnCooldown { spell, remaining })
        }
    }

    pub(crate) fn trigger(&mut self, spell: SpellKind) {
        let _ = self.cooldowns.insert(spell, spell.profile().cooldown);
    }

    pub(crate) fn advance(&mut self, dt: Duration) {
        for remaining in self.cooldowns.values_mut() {
            *remaining = remaining.saturating_sub(dt);
        }
        self.cooldowns.retain(|_, remaining| !remaining.is_zero());
    }

    pub(crate) fn reset(&mut self) {
        self.cooldowns.clear();
    }

    /// Cooldowns of every spell in declaration order.
    pub(crate) fn snapshot(&self) -> Vec<(SpellKind, Duration)> {
        SpellKind::ALL
            .into_iter()
            .map(|spell| (spell, self.remaining(spell)))
            .collect()
    }
}

/// Resolves a spell into its effect and cosmetic cue.
///
/// `live` lists targetable enemies with their positions, in identifier order.
pub(crate) fn resolve(
    spell: SpellKind,
    target: Option<Vec2>,
    arena_center: Vec2,
    live: &[(EnemyId, Vec2)],
) -> Result<(SpellEffect, Option<EffectCue>), CommandError> {
    let profile = spell.profile();
    let resolved = match spell {
        SpellKind::Fireball => {
            let origin = target.ok_or(CommandError::MissingSpellTarget(spell))?;
            (
                SpellEffect::World(Command::DamageArea {
                    origin,
                    radius: profile.radius,
                    damage: profile.damage,
                    damage_type: DamageType::Fire,
                }),
                Some(EffectCue::Explosion {
                    position: origin,
                    radius: profile.radius,
                }),
            )
        }
        SpellKind::Freeze => (
            SpellEffect::World(Command::AfflictAll {
                effect: StatusEffect::freeze(FREEZE_SPEED_FACTOR, profile.duration),
            }),
            Some(EffectCue::FreezeWave {
                center: arena_center,
                duration: profile.duration,
            }),
        ),
        SpellKind::LightningStorm => {
            let struck: Vec<(EnemyId, Vec2)> =
                live.iter().take(profile.targets).copied().collect();
            let cue = (!struck.is_empty()).then(|| EffectCue::Lightning {
                points: struck.iter().map(|(_, position)| *position).collect(),
            });
            (
                SpellEffect::World(Command::DamageEnemies {
                    enemies: struck.into_iter().map(|(id, _)| id).collect(),
                    damage: profile.damage,
                    damage_type: DamageType::Lightning,
                }),
                cue,
            )
        }
        SpellKind::Heal => (SpellEffect::Heal(profile.healing), None),
    };
    Ok(resolved)
}
