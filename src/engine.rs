use std::time::Instant;

use crate::player::{Launcher, Supervisor};
use crate::playlist::Playlist;
use crate::render::Canvas;
use crate::settings::Settings;
use crate::state::ContentMode;
use crate::texture_loader::PictureLoader;

/// The slice of the session a mode handler may touch during one tick.
pub struct TickContext<'a, L: Launcher> {
    pub now: Instant,
    pub mode: ContentMode,
    pub playlist: &'a mut Playlist,
    pub supervisor: &'a mut Supervisor<L>,
    pub settings: &'a Settings,
    pub screen: (f32, f32),
    pub animate: bool,
    pub audio_output: &'a str,
}

pub struct View<'a> {
    pub screen: (f32, f32),
    pub mode: ContentMode,
    pub playlist: &'a Playlist,
    pub player_running: bool,
}

/// Per-content-mode behaviour: what happens on entry, every tick, and how
/// the primary content is drawn. Overlays are not part of it.
pub trait Engine<P> {
    fn on_enter(&mut self);

    // The user moved through the playlist.
    fn on_navigate(&mut self) {}

    fn tick<L, D>(&mut self, ctx: &mut TickContext<'_, L>, loader: &mut D)
    where
        L: Launcher,
        D: PictureLoader<Picture = P>;

    fn render<C: Canvas<Picture = P>>(&self, canvas: &mut C, view: &View<'_>);

    /// Whether the next ticks need the animating frame rate.
    fn is_animating(&self) -> bool;
}
