// Picking gameplay: which prop a ray hits and what picking it does.

use bevy_ecs::prelude::*;
use glam::Vec3;

use crate::engine::components::{ActiveTween, BounceStyle, PickShape, Prop, PropKind, Transform};
use crate::engine::picking::{Ray, pick_nearest};
use crate::engine::systems::TweenSignals;
use crate::engine::tween::{Channel, Ease, Timeline};

use super::audio::{AudioMixer, SoundCue};
use super::modal::ModalState;

/// Seconds per bounce unit. Every bounce segment is a fraction of this.
const BOUNCE_UNIT: f32 = 0.5;
const BOUNCE_RISE: f32 = 2.0;

/// Only one creature bounces at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BounceGate {
    #[default]
    Idle,
    Animating(Entity),
}

impl BounceGate {
    pub fn is_idle(&self) -> bool {
        *self == BounceGate::Idle
    }

    /// Claim the gate for `entity`. False if another bounce holds it.
    pub fn try_begin(&mut self, entity: Entity) -> bool {
        if !self.is_idle() {
            return false;
        }
        *self = BounceGate::Animating(entity);
        true
    }

    /// Free the gate if `entity` holds it.
    pub fn release(&mut self, entity: Entity) -> bool {
        if *self == BounceGate::Animating(entity) {
            *self = BounceGate::Idle;
            true
        } else {
            false
        }
    }
}

/// Hop-and-squash animation for a creature starting from `current`.
///
/// The landing segment carries the release signal; the absolute style then
/// springs its scale back to one.
pub fn bounce_timeline(style: BounceStyle, current: &Transform) -> Timeline {
    let d = BOUNCE_UNIT;
    let y0 = current.position.y;
    let base = match style {
        BounceStyle::Absolute => Vec3::ONE,
        BounceStyle::Relative => current.scale,
    };

    let timeline = Timeline::new()
        .then(Channel::Scale(base * Vec3::new(1.2, 0.8, 1.2)), d * 0.2, Ease::Power2Out)
        .then(Channel::Scale(base * Vec3::new(0.8, 1.3, 0.8)), d * 0.3, Ease::Power2Out)
        .with_previous(Channel::PositionY(y0 + BOUNCE_RISE), d * 0.5, Ease::Power2Out)
        .then(Channel::Scale(base), d * 0.3, Ease::Power1InOut)
        .after_previous(Channel::PositionY(y0), d * 0.5, Ease::BounceOut)
        .releasing();

    match style {
        BounceStyle::Absolute => timeline.then(
            Channel::Scale(Vec3::ONE),
            d * 0.2,
            Ease::ElasticOut { amplitude: 1.0, period: 0.3 },
        ),
        BounceStyle::Relative => timeline,
    }
}

/// Nearest prop hit by `ray`, evaluated in each prop's current transform.
pub fn resolve_interaction(world: &mut World, ray: &Ray) -> Option<(Entity, String)> {
    let mut query = world.query::<(Entity, &Prop, &PickShape, &Transform)>();
    let props: Vec<_> = query.iter(world).collect();

    let candidates = props
        .iter()
        .map(|(_, _, shape, transform)| (*shape, shape.parent_world * transform.matrix()));
    let (idx, _) = pick_nearest(ray, candidates)?;
    let (entity, prop, _, _) = props[idx];
    Some((entity, prop.name.clone()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionOutcome {
    /// The ray hit nothing pickable.
    Nothing,
    /// A modal is open; picking is disabled.
    Suppressed,
    /// A creature started bouncing.
    Bounced(Entity),
    /// A creature was hit while another bounce holds the gate.
    Busy(Entity),
    OpenedModal(String),
    /// An info prop with no catalog entry.
    NoContent(String),
}

/// Gameplay state a pick can touch.
pub struct InteractionContext<'a> {
    pub gate: &'a mut BounceGate,
    pub modal: &'a mut ModalState,
    pub audio: &'a mut AudioMixer,
}

/// Act on a resolved pick.
pub fn dispatch(
    world: &mut World,
    hit: Option<(Entity, String)>,
    ctx: InteractionContext<'_>,
) -> InteractionOutcome {
    if ctx.modal.is_open() {
        return InteractionOutcome::Suppressed;
    }
    let Some((entity, name)) = hit else {
        return InteractionOutcome::Nothing;
    };
    let Some(kind) = world.get::<Prop>(entity).map(|p| p.kind) else {
        return InteractionOutcome::Nothing;
    };

    match kind {
        PropKind::Creature(style) => {
            if !ctx.gate.try_begin(entity) {
                log::debug!("{name} ignored, a bounce is still running");
                return InteractionOutcome::Busy(entity);
            }
            ctx.audio.play(SoundCue::Creature);
            let Some(transform) = world.get::<Transform>(entity).copied() else {
                ctx.gate.release(entity);
                return InteractionOutcome::Nothing;
            };
            world.entity_mut(entity).insert(ActiveTween {
                timeline: bounce_timeline(style, &transform),
            });
            log::debug!("{name} bounces");
            InteractionOutcome::Bounced(entity)
        }
        PropKind::Info => {
            let opened = ctx.modal.show(&name);
            ctx.audio.play(SoundCue::Projects);
            if opened {
                log::debug!("opened modal for {name}");
                InteractionOutcome::OpenedModal(name)
            } else {
                log::warn!("no modal content registered for {name}");
                InteractionOutcome::NoContent(name)
            }
        }
    }
}

/// Drain tween release signals into the gate.
pub fn apply_release_signals(world: &mut World, gate: &mut BounceGate) {
    let Some(mut signals) = world.get_resource_mut::<TweenSignals>() else {
        return;
    };
    for signal in signals.released.drain(..) {
        if gate.release(signal.entity) {
            log::debug!("bounce gate released by {:?}", signal.entity);
        }
    }
}
