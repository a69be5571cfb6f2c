use std::time::Instant;

use crate::constants::*;
use crate::sidecar::Sidecar;

/// Fade-in and slow zoom of the photo on screen. Both advance a fixed
/// step per tick, so their apparent speed follows the tick rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    pub zoom: f32,
    pub opacity: f32,
    pub loaded_at: Instant,
    enabled: bool,
}

impl AnimationState {
    pub fn new(loaded_at: Instant, enabled: bool) -> Self {
        Self {
            zoom: 1.0,
            opacity: if enabled { 0.0 } else { 1.0 },
            loaded_at,
            enabled,
        }
    }

    pub fn update(&mut self) {
        if !self.enabled {
            return;
        }
        if self.opacity < 1.0 {
            self.opacity = (self.opacity + FADE_STEP).min(1.0);
        }
        self.zoom += ZOOM_SPEED;
    }

    #[cfg(test)]
    pub fn is_fading(&self) -> bool {
        self.opacity < 1.0
    }
}

/// Scale that fits `image` inside `screen` keeping its aspect ratio.
pub fn fit_scale(screen: (f32, f32), image: (f32, f32)) -> f32 {
    if image.0 <= 0.0 || image.1 <= 0.0 {
        return 1.0;
    }
    (screen.0 / image.0).min(screen.1 / image.1)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

/// A decoded photo plus everything needed to draw it.
pub struct PhotoSlide<P> {
    pub picture: P,
    pub width: f32,
    pub height: f32,
    pub base_scale: f32,
    pub sidecar: Sidecar,
    pub captured: Option<String>,
    pub animation: AnimationState,
}

impl<P> PhotoSlide<P> {
    pub fn update(&mut self) {
        self.animation.update();
    }

    pub fn dest_rect(&self, screen: (f32, f32)) -> Rect {
        let scale = self.base_scale * self.animation.zoom;
        let scaled_width = self.width * scale;
        let scaled_height = self.height * scale;
        Rect::new(
            (screen.0 - scaled_width) * 0.5,
            (screen.1 - scaled_height) * 0.5,
            scaled_width,
            scaled_height,
        )
    }

    /// The info line: sidecar info, else the EXIF capture date.
    pub fn info_line(&self) -> &str {
        if self.sidecar.info.is_empty() {
            self.captured.as_deref().unwrap_or("")
        } else {
            &self.sidecar.info
        }
    }
}
