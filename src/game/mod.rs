// Portfolio island gameplay on top of the engine layer.

pub mod audio;
pub mod clock;
pub mod config;
pub mod interaction;
pub mod modal;
pub mod player;
pub mod scene;
pub mod site;
pub mod startup;
pub mod theme;
