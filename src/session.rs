use std::time::Instant;

use log::{info, warn};
use rand::rngs::StdRng;

use crate::catalog::ContentCatalog;
use crate::constants::*;
use crate::engine::{Engine, TickContext, View};
use crate::input::{Action, ButtonMap};
use crate::modes::Handler;
use crate::overlay::{CycleTimer, OverlayKind, OverlayScheduler};
use crate::player::{Launcher, Supervisor};
use crate::playlist::Playlist;
use crate::render::{Canvas, draw_overlay};
use crate::settings::{Settings, SettingsStore};
use crate::state::{ContentMode, ModeMachine, PlaybackMode};
use crate::texture_loader::PictureLoader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub animate: bool,
    pub audio_output: String,
}

pub struct Session<P, L: Launcher> {
    settings: Settings,
    store: SettingsStore,
    modes: ModeMachine,
    playlist: Playlist,
    overlays: OverlayScheduler,
    cycle: CycleTimer,
    supervisor: Supervisor<L>,
    handler: Handler<P>,
    catalog: Box<dyn ContentCatalog>,
    rng: StdRng,
    options: SessionOptions,
}

impl<P, L: Launcher> Session<P, L> {
    pub fn new(
        settings: Settings,
        store: SettingsStore,
        catalog: Box<dyn ContentCatalog>,
        launcher: L,
        rng: StdRng,
        options: SessionOptions,
    ) -> Self {
        let modes = ModeMachine::new(settings.active_mode);
        Self {
            settings,
            store,
            playlist: Playlist::new(modes.active()),
            handler: Handler::for_mode(modes.active()),
            modes,
            overlays: OverlayScheduler::new(),
            cycle: CycleTimer::new(CYCLE_INTERVAL),
            supervisor: Supervisor::new(launcher),
            catalog,
            rng,
            options,
        }
    }

    // Enters the persisted mode without writing it back.
    pub fn start(&mut self, now: Instant) {
        self.enter(now, false);
    }

    pub fn buttons(&self) -> ButtonMap {
        ButtonMap {
            info: self.settings.info_button_code,
            mode: self.settings.mode_button_code,
        }
    }

    pub fn tick<D>(&mut self, actions: &[Action], now: Instant, loader: &mut D, screen: (f32, f32)) -> Flow
    where
        D: PictureLoader<Picture = P>,
    {
        for &action in actions {
            if self.apply(action, now) == Flow::Exit {
                return Flow::Exit;
            }
        }

        if self.cycle.fire(now) && self.modes.advance_auto().is_some() {
            self.supervisor.terminate();
            self.switch_content();
            self.overlays.show(OverlayKind::ModeIndicator, now);
        }

        let mut ctx = TickContext {
            now,
            mode: self.modes.active(),
            playlist: &mut self.playlist,
            supervisor: &mut self.supervisor,
            settings: &self.settings,
            screen,
            animate: self.options.animate,
            audio_output: &self.options.audio_output,
        };
        self.handler.tick(&mut ctx, loader);
        Flow::Continue
    }

    fn apply(&mut self, action: Action, now: Instant) -> Flow {
        match action {
            Action::Exit => {
                info!("Exit requested");
                self.supervisor.terminate();
                return Flow::Exit;
            }
            Action::Next | Action::Prev => {
                self.supervisor.terminate();
                self.playlist.advance(if action == Action::Next { 1 } else { -1 });
                self.handler.on_navigate();
            }
            Action::SpeedUp | Action::SpeedDown => {
                if self.settings.step_interval(action == Action::SpeedUp) {
                    info!("Display interval -> {} s", self.settings.display_interval_seconds);
                    self.persist();
                }
                self.overlays.show(OverlayKind::SpeedIndicator, now);
            }
            Action::ToggleInfoOrMute if self.modes.active() == ContentMode::Photos => {
                if self.overlays.is_active(OverlayKind::InfoPanel, now) {
                    self.overlays.dismiss(OverlayKind::InfoPanel);
                } else {
                    self.overlays.show(OverlayKind::InfoPanel, now);
                }
            }
            Action::ToggleInfoOrMute => {
                self.settings.muted = !self.settings.muted;
                info!("Muted -> {}", self.settings.muted);
                self.persist();
                self.overlays.show(OverlayKind::MuteIndicator, now);
                // The player cannot change volume live: restart the same item.
                if self.supervisor.is_running() {
                    self.supervisor.terminate();
                    self.playlist.request_reload();
                }
            }
            Action::CycleMode => {
                self.modes.cycle();
                self.enter(now, true);
            }
            Action::None => {}
        }
        Flow::Continue
    }

    /// Mode entry: stop the player, rebuild content, show the mode, persist.
    fn enter(&mut self, now: Instant, persist: bool) {
        self.supervisor.terminate();
        self.switch_content();
        self.overlays.show(OverlayKind::ModeIndicator, now);

        let playback = self.modes.playback();
        if playback == PlaybackMode::AutoCycle {
            self.cycle.arm(now);
        } else {
            self.cycle.disarm();
        }
        if persist {
            self.settings.active_mode = playback;
            self.persist();
        }
    }

    fn switch_content(&mut self) {
        let mode = self.modes.active();
        self.playlist.rebuild(mode, self.catalog.as_ref(), &mut self.rng);
        self.handler = Handler::for_mode(mode);
        self.handler.on_enter();
        if mode.is_video() {
            self.overlays.dismiss(OverlayKind::InfoPanel);
        }
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(&self.settings) {
            warn!("Settings not saved: {}", e);
        }
    }

    pub fn target_fps(&self) -> u32 {
        if self.options.animate && self.handler.is_animating() && !self.supervisor.is_running() {
            FPS_ANIMATING
        } else {
            FPS_IDLE
        }
    }

    pub fn shutdown(&mut self) {
        self.supervisor.terminate();
    }

    pub fn render<C: Canvas<Picture = P>>(&self, canvas: &mut C, now: Instant) {
        let view = View {
            screen: canvas.screen_size(),
            mode: self.modes.active(),
            playlist: &self.playlist,
            player_running: self.supervisor.is_running(),
        };
        self.handler.render(canvas, &view);
        for kind in self.overlays.active(now) {
            draw_overlay(canvas, kind, &self.overlay_lines(kind));
        }
    }

    pub fn overlay_lines(&self, kind: OverlayKind) -> Vec<String> {
        match kind {
            OverlayKind::InfoPanel => {
                let Some(slide) = self.handler.slide() else {
                    return Vec::new();
                };
                let mut lines: Vec<String> = [slide.sidecar.label.as_str(), slide.info_line(), slide.sidecar.source.as_str()]
                    .into_iter()
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect();
                lines.push(format!("{}/{}", self.playlist.cursor() + 1, self.playlist.len()));
                lines.push(format!("Interval: {} s", self.settings.display_interval_seconds));
                lines.push(format!("Mode: {}", self.mode_label()));
                lines
            }
            OverlayKind::SpeedIndicator => {
                vec![format!("Interval: {} s", self.settings.display_interval_seconds)]
            }
            OverlayKind::ModeIndicator => vec![self.mode_label()],
            OverlayKind::MuteIndicator => {
                vec![if self.settings.muted { "Sound off" } else { "Sound on" }.to_string()]
            }
        }
    }

    fn mode_label(&self) -> String {
        match self.modes.playback() {
            PlaybackMode::AutoCycle => format!("{}: {}", PlaybackMode::AutoCycle.label(), self.modes.active().label()),
            playback => playback.label().to_string(),
        }
    }

    #[cfg(test)]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[cfg(test)]
    pub fn modes(&self) -> &ModeMachine {
        &self.modes
    }

    #[cfg(test)]
    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    #[cfg(test)]
    pub fn overlays(&self) -> &OverlayScheduler {
        &self.overlays
    }

    #[cfg(test)]
    pub fn supervisor(&self) -> &Supervisor<L> {
        &self.supervisor
    }

    #[cfg(test)]
    pub fn handler(&self) -> &Handler<P> {
        &self.handler
    }
}
