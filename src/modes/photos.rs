use log::{debug, warn};

use crate::constants::*;
use crate::engine::{Engine, TickContext, View};
use crate::player::Launcher;
use crate::render::{Canvas, Rgba, draw_centered_text, draw_shadowed_text};
use crate::sidecar::Sidecar;
use crate::slide::{AnimationState, PhotoSlide, fit_scale};
use crate::texture_loader::PictureLoader;

/// Shows one photo at a time with fade-in and slow zoom, advancing when the
/// display interval runs out.
pub struct PhotosHandler<P> {
    slide: Option<PhotoSlide<P>>,
}

impl<P> PhotosHandler<P> {
    pub fn new() -> Self {
        Self { slide: None }
    }

    pub fn slide(&self) -> Option<&PhotoSlide<P>> {
        self.slide.as_ref()
    }
}

impl<P> Default for PhotosHandler<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Engine<P> for PhotosHandler<P> {
    fn on_enter(&mut self) {
        self.slide = None;
    }

    fn tick<L, D>(&mut self, ctx: &mut TickContext<'_, L>, loader: &mut D)
    where
        L: Launcher,
        D: PictureLoader<Picture = P>,
    {
        if let Some(slide) = self.slide.as_mut() {
            slide.update();
            let shown_for = ctx.now.saturating_duration_since(slide.animation.loaded_at);
            if shown_for >= ctx.settings.interval() {
                ctx.playlist.advance(1);
            }
        }

        // One decode attempt per tick; a failure moves on and retries next tick.
        if !ctx.playlist.take_reload() {
            return;
        }
        let Some(path) = ctx.playlist.current().map(|path| path.to_path_buf()) else {
            self.slide = None;
            return;
        };
        match loader.load(&path) {
            Ok(loaded) => {
                debug!("Showing {}", path.display());
                self.slide = Some(PhotoSlide {
                    base_scale: fit_scale(ctx.screen, (loaded.width, loaded.height)),
                    width: loaded.width,
                    height: loaded.height,
                    picture: loaded.picture,
                    sidecar: Sidecar::read(&path),
                    captured: loaded.captured,
                    animation: AnimationState::new(ctx.now, ctx.animate),
                });
            }
            Err(e) => {
                warn!("Skipping {}: {:#}", path.display(), e);
                self.slide = None;
                ctx.playlist.advance(1);
            }
        }
    }

    fn render<C: Canvas<Picture = P>>(&self, canvas: &mut C, view: &View<'_>) {
        canvas.clear();
        if view.player_running {
            return;
        }
        let Some(slide) = self.slide.as_ref() else {
            if view.playlist.no_content() {
                draw_centered_text(canvas, "No photos", view.screen.1 * 0.5, 40.0, Rgba::GREY);
            }
            return;
        };

        canvas.draw_picture(
            &slide.picture,
            (slide.width, slide.height),
            slide.dest_rect(view.screen),
            slide.animation.opacity,
        );

        let label = &slide.sidecar.label;
        if !label.is_empty() {
            let size = view.screen.1 * 0.05;
            let width = canvas.text_width(label, size);
            let x = view.screen.0 - width - LABEL_MARGIN;
            let y = view.screen.1 - size - LABEL_MARGIN;
            draw_shadowed_text(canvas, label, x, y, size, Rgba::WHITE.with_opacity(slide.animation.opacity));
        }
    }

    fn is_animating(&self) -> bool {
        self.slide.is_some()
    }
}
