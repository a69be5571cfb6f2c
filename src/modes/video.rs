use std::time::Instant;

use log::{info, warn};

use crate::constants::*;
use crate::engine::{Engine, TickContext, View};
use crate::player::{Invocation, Launcher, PollOutcome};
use crate::render::{Canvas, Rgba, draw_centered_text};
use crate::sidecar::Sidecar;
use crate::slide::Rect;
use crate::state::ContentMode;
use crate::texture_loader::PictureLoader;

// Everything below the label band.
pub fn letterbox_window(screen: (f32, f32)) -> Rect {
    let band = screen.1 * LETTERBOX_RATIO;
    Rect::new(0.0, band, screen.0, screen.1 - band)
}

/// Hands each playlist entry to the external player and follows it until it
/// ends. Never decodes anything itself.
#[derive(Debug, Default)]
pub struct VideoHandler {
    sidecar: Sidecar,
    hold_until: Option<Instant>,
}

impl VideoHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_holding(&self, now: Instant) -> bool {
        self.hold_until.is_some_and(|until| now < until)
    }

    fn fail(&mut self, now: Instant) {
        self.hold_until = Some(now + FAILED_PLAY_BACKOFF);
    }
}

impl<P> Engine<P> for VideoHandler {
    fn on_enter(&mut self) {
        self.sidecar = Sidecar::default();
        self.hold_until = None;
    }

    // A user skip is not held back by an earlier failure.
    fn on_navigate(&mut self) {
        self.hold_until = None;
    }

    fn tick<L, D>(&mut self, ctx: &mut TickContext<'_, L>, _loader: &mut D)
    where
        L: Launcher,
        D: PictureLoader<Picture = P>,
    {
        match ctx.supervisor.poll(ctx.now) {
            PollOutcome::Running => return,
            PollOutcome::Ended { premature } => {
                if premature {
                    warn!("Player exited right after launch, holding back for {:?}", FAILED_PLAY_BACKOFF);
                    self.fail(ctx.now);
                }
                ctx.playlist.advance(1);
            }
            PollOutcome::Idle => {}
        }

        if self.is_holding(ctx.now) || !ctx.playlist.take_reload() {
            return;
        }
        let Some(path) = ctx.playlist.current().map(|path| path.to_path_buf()) else {
            return;
        };

        self.sidecar = Sidecar::read(&path);
        let invocation = Invocation {
            path,
            muted: ctx.settings.muted,
            audio_output: ctx.audio_output.to_string(),
            window: (ctx.mode == ContentMode::GameVideos).then(|| letterbox_window(ctx.screen)),
        };
        if let Err(e) = ctx.supervisor.spawn(&invocation, ctx.now) {
            warn!("{}", e);
            self.fail(ctx.now);
            ctx.playlist.advance(1);
        } else {
            info!(
                "Video {}/{} ({})",
                ctx.playlist.cursor() + 1,
                ctx.playlist.len(),
                if invocation.muted { "muted" } else { "sound on" }
            );
        }
    }

    fn render<C: Canvas<Picture = P>>(&self, canvas: &mut C, view: &View<'_>) {
        canvas.clear();
        if view.playlist.no_content() {
            draw_centered_text(canvas, "No videos", view.screen.1 * 0.5, 40.0, Rgba::GREY);
            return;
        }
        if view.mode == ContentMode::GameVideos && !self.sidecar.label.is_empty() {
            let band = view.screen.1 * LETTERBOX_RATIO;
            let size = band * 0.5;
            draw_centered_text(canvas, &self.sidecar.label, (band - size) * 0.5, size, Rgba::WHITE);
        }
    }

    fn is_animating(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::testing::*;
    use std::time::Duration;

    #[test]
    fn letterbox_keeps_the_top_band_free() {
        let window = letterbox_window((1920.0, 1080.0));
        assert_eq!(window.x, 0.0);
        assert!((window.y - 129.6).abs() < 1e-3);
        assert!((window.y + window.height - 1080.0).abs() < 1e-3);
    }

    #[test]
    fn spawns_then_advances_when_the_clip_ends() {
        let mut rig = Rig::new(ContentMode::PersonalVideos, &["a.mp4", "b.mp4"]);
        let mut handler = VideoHandler::new();
        let t0 = Instant::now();

        rig.tick_video(&mut handler, t0);
        let launches = rig.launcher.launches();
        assert_eq!(launches.len(), 1);
        assert_eq!(Some(launches[0].path.as_path()), rig.playlist.entries().get(rig.playlist.order()[0]).map(|p| p.as_path()));
        assert_eq!(launches[0].window, None);

        rig.tick_video(&mut handler, t0 + Duration::from_secs(10));
        assert_eq!(rig.launcher.launches().len(), 1);

        rig.launcher.finish_current();
        rig.tick_video(&mut handler, t0 + Duration::from_secs(40));
        assert_eq!(rig.playlist.cursor(), 1);
        assert_eq!(rig.launcher.launches().len(), 2);
        assert_eq!(rig.launcher.terminations(), 0);
    }

    #[test]
    fn game_clips_get_the_letterboxed_window() {
        let mut rig = Rig::new(ContentMode::GameVideos, &["a.mp4"]);
        let mut handler = VideoHandler::new();
        rig.tick_video(&mut handler, Instant::now());
        assert!(rig.launcher.launches()[0].window.is_some());
    }

    #[test]
    fn empty_game_clips_never_spawn() {
        let mut rig = Rig::new(ContentMode::GameVideos, &[]);
        let mut handler = VideoHandler::new();
        let t0 = Instant::now();
        rig.tick_video(&mut handler, t0);
        rig.tick_video(&mut handler, t0 + Duration::from_secs(1));
        assert!(rig.launcher.launches().is_empty());
        assert!(rig.playlist.no_content());

        let mut canvas = FakeCanvas::default();
        Engine::<FakePicture>::render(&handler, &mut canvas, &rig.view(false));
        assert!(canvas.texts().iter().any(|t| t == "No videos"));
    }

    #[test]
    fn instant_exit_holds_the_next_spawn_back() {
        let mut rig = Rig::new(ContentMode::PersonalVideos, &["a.mp4", "b.mp4"]);
        let mut handler = VideoHandler::new();
        let t0 = Instant::now();

        rig.tick_video(&mut handler, t0);
        rig.launcher.finish_current();
        rig.tick_video(&mut handler, t0 + Duration::from_millis(500));
        assert_eq!(rig.playlist.cursor(), 1);
        assert_eq!(rig.launcher.launches().len(), 1);

        rig.tick_video(&mut handler, t0 + Duration::from_secs(2));
        assert_eq!(rig.launcher.launches().len(), 1);

        rig.tick_video(&mut handler, t0 + Duration::from_secs(4));
        assert_eq!(rig.launcher.launches().len(), 2);
    }

    #[test]
    fn spawn_failure_advances_and_backs_off() {
        let mut rig = Rig::new(ContentMode::PersonalVideos, &["a.mp4", "b.mp4"]);
        rig.launcher.journal.borrow_mut().fail_next_launch = true;
        let mut handler = VideoHandler::new();
        let t0 = Instant::now();

        rig.tick_video(&mut handler, t0);
        assert_eq!(rig.playlist.cursor(), 1);
        assert!(handler.is_holding(t0 + Duration::from_secs(1)));
        assert!(!handler.is_holding(t0 + FAILED_PLAY_BACKOFF));
    }

    #[test]
    fn navigation_clears_the_hold() {
        let mut rig = Rig::new(ContentMode::PersonalVideos, &["a.mp4", "b.mp4", "c.mp4"]);
        let mut handler = VideoHandler::new();
        let t0 = Instant::now();

        rig.tick_video(&mut handler, t0);
        rig.launcher.finish_current();
        rig.tick_video(&mut handler, t0 + Duration::from_millis(500));
        assert!(handler.is_holding(t0 + Duration::from_secs(1)));
        assert_eq!(rig.launcher.launches().len(), 1);

        rig.playlist.advance(1);
        Engine::<FakePicture>::on_navigate(&mut handler);
        rig.tick_video(&mut handler, t0 + Duration::from_secs(1));
        assert!(!handler.is_holding(t0 + Duration::from_secs(1)));
        assert_eq!(rig.launcher.launches().len(), 2);
        assert_eq!(rig.playlist.cursor(), 2);
    }
}
