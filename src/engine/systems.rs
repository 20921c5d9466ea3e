// ECS systems for updating scene state
// Systems operate on entities with specific component combinations

use bevy_ecs::prelude::*;

use super::components::*;

/// Wall-clock seconds since the previous presented frame.
/// Animations run on real time; player physics runs on its own fixed step.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct FrameTime {
    pub dt: f32,
}

/// Emitted by `tween_system` when a timeline reaches a release-flagged segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TweenReleased {
    pub entity: Entity,
}

/// Release signals produced this frame. Drained by the owner of the world.
#[derive(Resource, Debug, Default)]
pub struct TweenSignals {
    pub released: Vec<TweenReleased>,
}

/// Advance every running timeline and drop the ones that finished
pub fn tween_system(
    mut commands: Commands,
    time: Res<FrameTime>,
    mut signals: ResMut<TweenSignals>,
    mut query: Query<(Entity, &mut Transform, &mut ActiveTween)>,
) {
    for (entity, mut transform, mut tween) in query.iter_mut() {
        let progress = tween.timeline.advance(time.dt, &mut transform);
        if progress.released {
            signals.released.push(TweenReleased { entity });
        }
        if progress.finished {
            commands.entity(entity).remove::<ActiveTween>();
        }
    }
}

/// Single-threaded schedule holding the per-frame animation systems.
pub fn animation_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(bevy_ecs::schedule::ExecutorKind::SingleThreaded);
    schedule.add_systems(tween_system);
    schedule
}
