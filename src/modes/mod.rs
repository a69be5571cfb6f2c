// AutoCycle has no handler of its own: the session swaps in the handler of
// whichever content mode is active.

pub mod photos;
pub mod video;

use crate::engine::{Engine, TickContext, View};
use crate::player::Launcher;
use crate::render::Canvas;
use crate::slide::PhotoSlide;
use crate::state::ContentMode;
use crate::texture_loader::PictureLoader;

pub use photos::PhotosHandler;
pub use video::VideoHandler;

pub enum Handler<P> {
    Photos(PhotosHandler<P>),
    Video(VideoHandler),
}

impl<P> Handler<P> {
    pub fn for_mode(mode: ContentMode) -> Self {
        if mode.is_video() {
            Handler::Video(VideoHandler::new())
        } else {
            Handler::Photos(PhotosHandler::new())
        }
    }

    pub fn slide(&self) -> Option<&PhotoSlide<P>> {
        match self {
            Handler::Photos(handler) => handler.slide(),
            Handler::Video(_) => None,
        }
    }
}

impl<P> Engine<P> for Handler<P> {
    fn on_enter(&mut self) {
        match self {
            Handler::Photos(handler) => handler.on_enter(),
            Handler::Video(handler) => Engine::<P>::on_enter(handler),
        }
    }

    fn on_navigate(&mut self) {
        match self {
            Handler::Photos(handler) => handler.on_navigate(),
            Handler::Video(handler) => Engine::<P>::on_navigate(handler),
        }
    }

    fn tick<L, D>(&mut self, ctx: &mut TickContext<'_, L>, loader: &mut D)
    where
        L: Launcher,
        D: PictureLoader<Picture = P>,
    {
        match self {
            Handler::Photos(handler) => handler.tick(ctx, loader),
            Handler::Video(handler) => Engine::<P>::tick(handler, ctx, loader),
        }
    }

    fn render<C: Canvas<Picture = P>>(&self, canvas: &mut C, view: &View<'_>) {
        match self {
            Handler::Photos(handler) => handler.render(canvas, view),
            Handler::Video(handler) => Engine::<P>::render(handler, canvas, view),
        }
    }

    fn is_animating(&self) -> bool {
        match self {
            Handler::Photos(handler) => handler.is_animating(),
            Handler::Video(handler) => Engine::<P>::is_animating(handler),
        }
    }
}

#[cfg(test)]
pub mod testing {
    //! Display, decoding and content fakes for handler and session tests.

    use std::path::{Path, PathBuf};
    use std::time::Instant;

    use anyhow::bail;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::catalog::ContentCatalog;
    use crate::player::Supervisor;
    use crate::player::testing::FakeLauncher;
    use crate::playlist::Playlist;
    use crate::render::Rgba;
    use crate::settings::Settings;
    use crate::slide::Rect;
    use crate::texture_loader::LoadedPicture;

    pub const SCREEN: (f32, f32) = (1920.0, 1080.0);

    pub type FakePicture = PathBuf;

    /// Fixed file lists per content mode.
    #[derive(Debug, Clone, Default)]
    pub struct FakeCatalog {
        pub photos: Vec<PathBuf>,
        pub personal_videos: Vec<PathBuf>,
        pub game_videos: Vec<PathBuf>,
    }

    impl FakeCatalog {
        pub fn with(mode: ContentMode, names: &[&str]) -> Self {
            let mut catalog = Self::default();
            *catalog.slot(mode) = names.iter().map(PathBuf::from).collect();
            catalog
        }

        pub fn slot(&mut self, mode: ContentMode) -> &mut Vec<PathBuf> {
            match mode {
                ContentMode::Photos => &mut self.photos,
                ContentMode::PersonalVideos => &mut self.personal_videos,
                ContentMode::GameVideos => &mut self.game_videos,
            }
        }
    }

    impl ContentCatalog for FakeCatalog {
        fn enumerate(&self, mode: ContentMode) -> Vec<PathBuf> {
            match mode {
                ContentMode::Photos => self.photos.clone(),
                ContentMode::PersonalVideos => self.personal_videos.clone(),
                ContentMode::GameVideos => self.game_videos.clone(),
            }
        }
    }

    /// "Decodes" a path into itself, 4000x3000.
    #[derive(Debug, Default)]
    pub struct FakeLoader {
        pub loaded: Vec<PathBuf>,
        pub broken: Vec<PathBuf>,
    }

    impl PictureLoader for FakeLoader {
        type Picture = FakePicture;

        fn load(&mut self, path: &Path) -> anyhow::Result<LoadedPicture<FakePicture>> {
            if self.broken.iter().any(|broken| broken == path) {
                bail!("corrupt image {}", path.display());
            }
            self.loaded.push(path.to_path_buf());
            Ok(LoadedPicture {
                picture: path.to_path_buf(),
                width: 4000.0,
                height: 3000.0,
                captured: None,
            })
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum Op {
        Clear,
        Picture(PathBuf, Rect, f32),
        Fill(Rect),
        Text(String),
    }

    #[derive(Debug, Default)]
    pub struct FakeCanvas {
        pub ops: Vec<Op>,
        pub pictures: Vec<PathBuf>,
    }

    impl FakeCanvas {
        pub fn texts(&self) -> Vec<String> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    Op::Text(text) => Some(text.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    impl Canvas for FakeCanvas {
        type Picture = FakePicture;

        fn screen_size(&self) -> (f32, f32) {
            SCREEN
        }

        fn clear(&mut self) {
            self.ops.push(Op::Clear);
        }

        fn draw_picture(&mut self, picture: &FakePicture, _source: (f32, f32), dest: Rect, opacity: f32) {
            self.pictures.push(picture.clone());
            self.ops.push(Op::Picture(picture.clone(), dest, opacity));
        }

        fn fill_rect(&mut self, rect: Rect, _color: Rgba) {
            self.ops.push(Op::Fill(rect));
        }

        fn draw_text(&mut self, text: &str, _x: f32, _y: f32, _size: f32, _color: Rgba) {
            self.ops.push(Op::Text(text.to_string()));
        }

        fn text_width(&self, text: &str, size: f32) -> f32 {
            text.chars().count() as f32 * size * 0.5
        }
    }

    /// One content mode's worth of session state, for driving a handler alone.
    pub struct Rig {
        pub mode: ContentMode,
        pub playlist: Playlist,
        pub launcher: FakeLauncher,
        pub supervisor: Supervisor<FakeLauncher>,
        pub settings: Settings,
    }

    impl Rig {
        pub fn new(mode: ContentMode, names: &[&str]) -> Self {
            let catalog = FakeCatalog::with(mode, names);
            let mut playlist = Playlist::new(mode);
            playlist.rebuild(mode, &catalog, &mut StdRng::seed_from_u64(7));
            let launcher = FakeLauncher::default();
            Self {
                mode,
                playlist,
                supervisor: Supervisor::new(launcher.clone()),
                launcher,
                settings: Settings::default(),
            }
        }

        fn context(&mut self, now: Instant) -> TickContext<'_, FakeLauncher> {
            TickContext {
                now,
                mode: self.mode,
                playlist: &mut self.playlist,
                supervisor: &mut self.supervisor,
                settings: &self.settings,
                screen: SCREEN,
                animate: true,
                audio_output: "hdmi",
            }
        }

        pub fn tick(&mut self, handler: &mut PhotosHandler<FakePicture>, loader: &mut FakeLoader, now: Instant) {
            let mut ctx = self.context(now);
            handler.tick(&mut ctx, loader);
        }

        pub fn tick_video(&mut self, handler: &mut VideoHandler, now: Instant) {
            let mut ctx = self.context(now);
            Engine::<FakePicture>::tick(handler, &mut ctx, &mut FakeLoader::default());
        }

        pub fn view(&self, player_running: bool) -> View<'_> {
            View {
                screen: SCREEN,
                mode: self.mode,
                playlist: &self.playlist,
                player_running,
            }
        }
    }
}
