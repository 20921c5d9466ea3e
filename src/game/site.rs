// The running island: ECS world, character, props and the per-frame sequence.
//
// Frame order:
//   respawn request -> physics ticks -> hop input -> animations -> lighting
//   -> view follow -> pick gestures -> hover

use bevy_ecs::prelude::*;
use glam::{Mat4, Vec3};

use crate::engine::camera::{FollowCamera, HeadsetView, PresentationMode, ViewProvider};
use crate::engine::collision::{Aabb, Octree};
use crate::engine::components::{
    ActiveTween, BounceStyle, Character, PickShape, Prop, PropKind, SceneNodeRef, Transform,
};
use crate::engine::input::InputState;
use crate::engine::systems::{FrameTime, TweenSignals, animation_schedule};

use super::audio::{AudioMixer, SoundCue, SoundSink};
use super::clock::SimClock;
use super::config::SiteConfig;
use super::interaction::{
    BounceGate, InteractionContext, InteractionOutcome, apply_release_signals, dispatch,
    resolve_interaction,
};
use super::modal::{ModalEntry, ModalState};
use super::player::{PlayerController, TickOutcome, hop_timeline};
use super::scene::{SceneError, SceneGraph};
use super::theme::{Lighting, Theme, ThemeController};

/// What happened during one frame.
#[derive(Debug, Default)]
pub struct FrameReport {
    pub ticks: u32,
    pub respawned: bool,
    pub hopped: bool,
    /// The pointer is over a pickable prop.
    pub hovering: bool,
    pub interactions: Vec<InteractionOutcome>,
}

pub struct Site {
    world: World,
    schedule: Schedule,
    scene: SceneGraph,
    character: Entity,
    octree: Octree,
    player: PlayerController,
    clock: SimClock,
    gate: BounceGate,
    modal: ModalState,
    audio: AudioMixer,
    theme: ThemeController,
    view: Box<dyn ViewProvider>,
    config: SiteConfig,
}

impl Site {
    /// Bind gameplay to a loaded scene.
    ///
    /// Fails if the character or collider node is missing.
    pub fn from_scene(
        mut scene: SceneGraph,
        config: SiteConfig,
        sink: Box<dyn SoundSink>,
    ) -> Result<Self, SceneError> {
        let character_node = scene.require(&config.scene.character_node)?;
        let collider_node = scene.require(&config.scene.collider_node)?;

        let octree = Octree::from_triangles(scene.subtree_triangles(collider_node, false));
        scene.hide_subtree(collider_node);
        log::info!(
            "collider {:?}: {} triangles",
            config.scene.collider_node,
            octree.triangle_count()
        );

        let mut world = World::new();
        world.insert_resource(FrameTime::default());
        world.insert_resource(TweenSignals::default());

        let character_world = Transform::from_matrix(scene.world_matrix(character_node));
        let spawn = character_world.position;
        let character = world
            .spawn((Character, character_world, SceneNodeRef(character_node)))
            .id();

        let props = register_props(&mut world, &scene, &config);
        log::info!("registered {props} interactive props");

        let mut view: Box<dyn ViewProvider> = Box::new(FollowCamera::new(
            spawn,
            config.camera.offset,
            config.camera.fov_degrees,
        ));
        view.on_interaction_frame(spawn);

        Ok(Self {
            world,
            schedule: animation_schedule(),
            scene,
            character,
            octree,
            player: PlayerController::new(spawn, config.physics.clone()),
            clock: SimClock::new(config.physics.tick),
            gate: BounceGate::Idle,
            modal: ModalState::new(config.modal_catalog()),
            audio: AudioMixer::new(sink),
            theme: ThemeController::new(),
            view,
            config,
        })
    }

    // ------------------------------------------------------------------
    // Frame
    // ------------------------------------------------------------------

    /// Run one presented frame of `dt` wall-clock seconds.
    pub fn frame(&mut self, dt: f32, input: &mut InputState, aspect: f32) -> FrameReport {
        let mut report = FrameReport::default();
        let steers = self.view.steers_character();

        // The request is drained either way; headset mode ignores the key.
        if input.take_respawn_request() && steers {
            let mut visual = self.character_transform();
            self.player.respawn(&mut visual);
            self.set_character_transform(visual);
            report.respawned = true;
        }

        let mut visual = self.character_transform();
        report.ticks = self.clock.ticks_for_frame(dt);
        for _ in 0..report.ticks {
            if self.player.step(&self.octree, &mut visual, steers) == TickOutcome::Respawned {
                report.respawned = true;
            }
        }
        self.set_character_transform(visual);

        if steers && self.player.apply_movement_input(input.directions()) {
            self.audio.play(SoundCue::Jump);
            self.world
                .entity_mut(self.character)
                .insert(ActiveTween { timeline: hop_timeline() });
            report.hopped = true;
        }

        self.world.resource_mut::<FrameTime>().dt = dt;
        self.schedule.run(&mut self.world);
        apply_release_signals(&mut self.world, &mut self.gate);

        self.theme.advance(dt);

        let character_position = self.character_transform().position;
        self.view.on_interaction_frame(character_position);

        for gesture in input.take_gestures() {
            let Some(ray) = self.view.pointer_ray(gesture, aspect) else {
                continue;
            };
            let hit = resolve_interaction(&mut self.world, &ray);
            let outcome = dispatch(
                &mut self.world,
                hit,
                InteractionContext {
                    gate: &mut self.gate,
                    modal: &mut self.modal,
                    audio: &mut self.audio,
                },
            );
            report.interactions.push(outcome);
        }

        report.hovering = self
            .view
            .hover_ray(input.pointer_ndc(), aspect)
            .is_some_and(|ray| resolve_interaction(&mut self.world, &ray).is_some());

        report
    }

    /// Write ECS transforms back into the scene graph for rendering.
    pub fn sync_scene(&mut self) {
        let mut query = self.world.query::<(&Transform, &SceneNodeRef, Option<&Character>)>();
        let updates: Vec<(usize, Transform, bool)> = query
            .iter(&self.world)
            .map(|(t, node, character)| (node.0, *t, character.is_some()))
            .collect();

        for (node, transform, is_character) in updates {
            let local = if is_character {
                // Character transforms are kept in world space.
                let parent = self.scene.parent_world(node);
                Transform::from_matrix(parent.inverse() * transform.matrix())
            } else {
                transform
            };
            self.scene.set_local(node, local);
        }
    }

    // ------------------------------------------------------------------
    // UI actions
    // ------------------------------------------------------------------

    /// The user pressed Enter on the start screen.
    pub fn enter(&mut self) {
        self.audio.enter();
    }

    pub fn dismiss_modal(&mut self) {
        self.modal.dismiss();
        self.audio.play(SoundCue::Projects);
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.audio.play(SoundCue::Projects);
        self.theme.toggle()
    }

    pub fn toggle_audio(&mut self) -> bool {
        self.audio.toggle()
    }

    pub fn set_presentation(&mut self, mode: PresentationMode) {
        if mode == self.view.mode() {
            return;
        }
        let camera = &self.config.camera;
        let spawn = self.player.spawn();
        let mut view: Box<dyn ViewProvider> = match mode {
            PresentationMode::Desktop => {
                Box::new(FollowCamera::new(spawn, camera.offset, camera.fov_degrees))
            }
            PresentationMode::Headset => Box::new(HeadsetView::new(
                camera.headset_eye_height,
                camera.headset_fov_degrees,
            )),
        };
        view.on_interaction_frame(self.character_transform().position);
        self.view = view;
        log::info!("presentation mode -> {:?}", mode);
    }

    pub fn toggle_presentation(&mut self) -> PresentationMode {
        let next = match self.view.mode() {
            PresentationMode::Desktop => PresentationMode::Headset,
            PresentationMode::Headset => PresentationMode::Desktop,
        };
        self.set_presentation(next);
        next
    }

    /// Turn the head by a tracked or emulated delta.
    pub fn look(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.view.look_by(yaw_delta, pitch_delta);
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn view(&self) -> &dyn ViewProvider {
        self.view.as_ref()
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.view.view_projection(aspect)
    }

    pub fn player(&self) -> &PlayerController {
        &self.player
    }

    pub fn modal(&self) -> Option<&ModalEntry> {
        self.modal.current()
    }

    pub fn lighting(&self) -> Lighting {
        self.theme.lighting()
    }

    pub fn theme(&self) -> Theme {
        self.theme.theme()
    }

    pub fn is_muted(&self) -> bool {
        self.audio.is_muted()
    }

    pub fn entity_count(&self) -> usize {
        self.world.entities().len() as usize
    }

    pub fn character_transform(&self) -> Transform {
        self.world
            .get::<Transform>(self.character)
            .copied()
            .unwrap_or_default()
    }

    fn set_character_transform(&mut self, transform: Transform) {
        if let Some(mut t) = self.world.get_mut::<Transform>(self.character) {
            // Only the controller's channels; scale belongs to the hop animation.
            t.position = transform.position;
            t.rotation = transform.rotation;
        }
    }
}

/// Spawn a prop entity for every allow-listed node, in traversal order.
fn register_props(world: &mut World, scene: &SceneGraph, config: &SiteConfig) -> usize {
    let mut count = 0;
    for (idx, node) in scene.nodes().iter().enumerate() {
        if !config.scene.interactive.iter().any(|n| *n == node.name) {
            continue;
        }
        let kind = if config.is_creature(&node.name) {
            let style = if config.bounces_relative(&node.name) {
                BounceStyle::Relative
            } else {
                BounceStyle::Absolute
            };
            PropKind::Creature(style)
        } else {
            PropKind::Info
        };

        let triangles = scene.subtree_triangles(idx, true);
        let bounds = Aabb::from_points(triangles.iter().flat_map(|t| [t.a, t.b, t.c]));
        world.spawn((
            Prop { name: node.name.clone(), kind },
            PickShape {
                parent_world: scene.parent_world(idx),
                triangles,
                bounds,
            },
            node.local,
            SceneNodeRef(idx),
        ));
        count += 1;
    }

    for name in &config.scene.interactive {
        if scene.find(name).is_none() {
            log::warn!("interactive node {name:?} not found in scene");
        }
    }
    count
}
