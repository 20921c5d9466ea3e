// Light/dark theme and the lighting transition between them.

use glam::Vec3;

use crate::engine::tween::Ease;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub color: Vec3,
    pub intensity: f32,
}

impl Light {
    pub const fn new(color: Vec3, intensity: f32) -> Self {
        Self { color, intensity }
    }

    /// Color premultiplied by intensity, as the shader consumes it.
    pub fn radiance(&self) -> Vec3 {
        self.color * self.intensity
    }

    fn lerp(&self, to: &Light, k: f32) -> Light {
        Light {
            color: self.color.lerp(to.color, k),
            intensity: self.intensity + (to.intensity - self.intensity) * k,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub ambient: Light,
    pub sun: Light,
}

impl Lighting {
    /// Lighting the scene opens with. The first toggle fades away from it.
    pub const INITIAL: Lighting = Lighting {
        ambient: Light::new(Vec3::splat(0x40 as f32 / 255.0), 2.7),
        sun: Light::new(Vec3::ONE, 1.0),
    };

    /// Clear color behind the island.
    pub const BACKGROUND: Vec3 = Vec3::new(0xae as f32 / 255.0, 0xc9 as f32 / 255.0, 0x72 as f32 / 255.0);

    pub fn target(theme: Theme) -> Lighting {
        match theme {
            Theme::Dark => Lighting {
                ambient: Light::new(Vec3::new(0.25, 0.31, 0.78), 0.9),
                sun: Light::new(Vec3::new(0.25, 0.41, 0.88), 0.8),
            },
            Theme::Light => Lighting {
                ambient: Light::new(Vec3::ONE, 0.8),
                sun: Light::new(Vec3::ONE, 1.0),
            },
        }
    }

    fn lerp(&self, to: &Lighting, k: f32) -> Lighting {
        Lighting {
            ambient: self.ambient.lerp(&to.ambient, k),
            sun: self.sun.lerp(&to.sun, k),
        }
    }
}

struct Transition {
    from: Lighting,
    to: Lighting,
    elapsed: f32,
}

pub struct ThemeController {
    theme: Theme,
    current: Lighting,
    transition: Option<Transition>,
}

impl Default for ThemeController {
    fn default() -> Self {
        Self::new()
    }
}

impl ThemeController {
    pub const TRANSITION_SECS: f32 = 1.0;
    const EASE: Ease = Ease::Power2InOut;

    pub fn new() -> Self {
        Self {
            theme: Theme::Light,
            current: Lighting::INITIAL,
            transition: None,
        }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn lighting(&self) -> Lighting {
        self.current
    }

    /// Flip the theme and start fading from the current lighting.
    pub fn toggle(&mut self) -> Theme {
        self.theme = match self.theme {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        };
        self.transition = Some(Transition {
            from: self.current,
            to: Lighting::target(self.theme),
            elapsed: 0.0,
        });
        log::info!("theme -> {:?}", self.theme);
        self.theme
    }

    pub fn advance(&mut self, dt: f32) {
        let Some(t) = &mut self.transition else {
            return;
        };
        t.elapsed += dt.max(0.0);
        if t.elapsed >= Self::TRANSITION_SECS {
            self.current = t.to;
            self.transition = None;
        } else {
            let k = Self::EASE.apply(t.elapsed / Self::TRANSITION_SECS);
            self.current = t.from.lerp(&t.to, k);
        }
    }
}
