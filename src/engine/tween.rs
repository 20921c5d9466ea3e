// Keyframed transform animation.
//
// A Timeline is a list of segments placed on a shared clock. Each segment
// drives one channel (scale or vertical position) from whatever value the
// channel holds when the segment starts to a fixed target. Segments are
// positioned like a sequencer: appended after everything so far, started
// together with the previous segment, or started when the previous one ends.
//
// A segment may be flagged to emit a release signal when it completes, which
// lets gameplay unlock before trailing cosmetic segments finish.

use std::f32::consts::PI;

use glam::Vec3;

use super::components::Transform;

/// Easing curves, named after their usual animation-library names.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ease {
    Linear,
    /// Quadratic in-out.
    Power1InOut,
    /// Cubic out.
    Power2Out,
    /// Cubic in-out.
    Power2InOut,
    BounceOut,
    ElasticOut { amplitude: f32, period: f32 },
}

impl Ease {
    /// Map linear progress in [0, 1] to eased progress. Endpoints are exact.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match self {
            Ease::Linear => t,
            Ease::Power1InOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Ease::Power2Out => 1.0 - (1.0 - t).powi(3),
            Ease::Power2InOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Ease::BounceOut => bounce_out(t),
            Ease::ElasticOut { amplitude, period } => {
                let a = amplitude.max(1.0);
                let s = period / (2.0 * PI) * (1.0 / a).asin();
                a * 2f32.powf(-10.0 * t) * ((t - s) * 2.0 * PI / period).sin() + 1.0
            }
        }
    }
}

fn bounce_out(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;
    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

/// Which part of the transform a segment animates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Channel {
    Scale(Vec3),
    PositionY(f32),
}

#[derive(Debug, Clone)]
struct Segment {
    start: f32,
    duration: f32,
    target: Channel,
    ease: Ease,
    from: Option<Channel>,
    done: bool,
    releases: bool,
}

impl Segment {
    fn end(&self) -> f32 {
        self.start + self.duration
    }
}

/// Result of advancing a timeline by one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimelineProgress {
    /// A release-flagged segment completed during this advance.
    pub released: bool,
    /// Every segment has completed.
    pub finished: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Timeline {
    segments: Vec<Segment>,
    elapsed: f32,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// End time of the latest-ending segment.
    pub fn duration(&self) -> f32 {
        self.segments.iter().map(Segment::end).fold(0.0, f32::max)
    }

    fn push(mut self, start: f32, target: Channel, duration: f32, ease: Ease) -> Self {
        self.segments.push(Segment {
            start,
            duration: duration.max(0.0),
            target,
            ease,
            from: None,
            done: false,
            releases: false,
        });
        self
    }

    /// Append after every segment so far.
    pub fn then(self, target: Channel, duration: f32, ease: Ease) -> Self {
        let start = self.duration();
        self.push(start, target, duration, ease)
    }

    /// Start together with the previously added segment.
    pub fn with_previous(self, target: Channel, duration: f32, ease: Ease) -> Self {
        let start = self.segments.last().map_or(0.0, |s| s.start);
        self.push(start, target, duration, ease)
    }

    /// Start when the previously added segment ends.
    pub fn after_previous(self, target: Channel, duration: f32, ease: Ease) -> Self {
        let start = self.segments.last().map_or(0.0, Segment::end);
        self.push(start, target, duration, ease)
    }

    /// Flag the most recently added segment to emit a release signal on completion.
    pub fn releasing(mut self) -> Self {
        if let Some(last) = self.segments.last_mut() {
            last.releases = true;
        }
        self
    }

    pub fn is_finished(&self) -> bool {
        self.segments.iter().all(|s| s.done)
    }

    /// Advance the clock by `dt` seconds and write channel values into `transform`.
    pub fn advance(&mut self, dt: f32, transform: &mut Transform) -> TimelineProgress {
        self.elapsed += dt.max(0.0);
        let mut progress = TimelineProgress::default();

        for seg in &mut self.segments {
            if seg.done || self.elapsed < seg.start {
                continue;
            }
            let target = seg.target;
            let from = *seg.from.get_or_insert_with(|| capture(target, transform));

            let linear = if seg.duration > 0.0 {
                (self.elapsed - seg.start) / seg.duration
            } else {
                1.0
            };
            // Land exactly on the target once the segment completes.
            let k = if linear >= 1.0 { 1.0 } else { seg.ease.apply(linear) };

            match (from, target) {
                (_, Channel::Scale(b)) if k == 1.0 => transform.scale = b,
                (_, Channel::PositionY(b)) if k == 1.0 => transform.position.y = b,
                (Channel::Scale(a), Channel::Scale(b)) => transform.scale = a + (b - a) * k,
                (Channel::PositionY(a), Channel::PositionY(b)) => {
                    transform.position.y = a + (b - a) * k
                }
                _ => {}
            }

            if linear >= 1.0 {
                seg.done = true;
                progress.released |= seg.releases;
            }
        }

        progress.finished = self.is_finished();
        progress
    }
}

fn capture(target: Channel, transform: &Transform) -> Channel {
    match target {
        Channel::Scale(_) => Channel::Scale(transform.scale),
        Channel::PositionY(_) => Channel::PositionY(transform.position.y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const ALL: [Ease; 6] = [
        Ease::Linear,
        Ease::Power1InOut,
        Ease::Power2Out,
        Ease::Power2InOut,
        Ease::BounceOut,
        Ease::ElasticOut { amplitude: 1.0, period: 0.3 },
    ];

    #[test]
    fn eases_hit_endpoints() {
        for ease in ALL {
            assert_eq!(ease.apply(0.0), 0.0, "{ease:?}");
            assert_eq!(ease.apply(1.0), 1.0, "{ease:?}");
        }
    }

    #[test]
    fn in_out_curves_are_symmetric_at_half() {
        assert_abs_diff_eq!(Ease::Power1InOut.apply(0.5), 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(Ease::Power2InOut.apply(0.5), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn elastic_overshoots_before_settling() {
        let e = Ease::ElasticOut { amplitude: 1.0, period: 0.3 };
        let peak = (1..100).map(|i| e.apply(i as f32 / 100.0)).fold(0.0, f32::max);
        assert!(peak > 1.0);
    }

    #[test]
    fn sequential_segments_capture_from_values_lazily() {
        let mut t = Transform::default();
        let mut tl = Timeline::new()
            .then(Channel::Scale(Vec3::splat(2.0)), 1.0, Ease::Linear)
            .then(Channel::Scale(Vec3::splat(4.0)), 1.0, Ease::Linear);

        tl.advance(0.5, &mut t);
        assert_abs_diff_eq!(t.scale.x, 1.5, epsilon = 1e-6);
        tl.advance(1.0, &mut t);
        // First segment completed at 2.0, second is halfway from 2.0 to 4.0.
        assert_abs_diff_eq!(t.scale.x, 3.0, epsilon = 1e-6);
        let p = tl.advance(1.0, &mut t);
        assert!(p.finished);
        assert_abs_diff_eq!(t.scale.x, 4.0, epsilon = 1e-6);
    }

    #[test]
    fn placement_modes() {
        let tl = Timeline::new()
            .then(Channel::Scale(Vec3::ONE), 0.1, Ease::Linear)
            .then(Channel::Scale(Vec3::ONE), 0.15, Ease::Linear)
            .with_previous(Channel::PositionY(2.0), 0.25, Ease::Linear)
            .then(Channel::Scale(Vec3::ONE), 0.15, Ease::Linear)
            .after_previous(Channel::PositionY(0.0), 0.25, Ease::Linear);
        // 0.1 + 0.25 (rise ends last) + 0.15 + 0.25
        assert_abs_diff_eq!(tl.duration(), 0.75, epsilon = 1e-6);
    }

    #[test]
    fn release_fires_once_before_finish() {
        let mut t = Transform::default();
        let mut tl = Timeline::new()
            .then(Channel::PositionY(1.0), 0.5, Ease::Linear)
            .releasing()
            .then(Channel::Scale(Vec3::splat(2.0)), 0.5, Ease::Linear);

        let p = tl.advance(0.6, &mut t);
        assert!(p.released);
        assert!(!p.finished);
        let p = tl.advance(0.6, &mut t);
        assert!(!p.released);
        assert!(p.finished);
    }

    #[test]
    fn channels_are_independent() {
        let mut t = Transform::from_position(Vec3::new(3.0, 1.0, -2.0));
        let mut tl = Timeline::new()
            .then(Channel::Scale(Vec3::splat(2.0)), 1.0, Ease::Linear)
            .with_previous(Channel::PositionY(3.0), 1.0, Ease::Linear);
        tl.advance(1.0, &mut t);
        assert_eq!(t.scale, Vec3::splat(2.0));
        assert_eq!(t.position, Vec3::new(3.0, 3.0, -2.0));
    }
}
