use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use raylib::prelude::*;

mod catalog;
mod constants;
mod engine;
mod error;
mod input;
mod modes;
mod overlay;
mod player;
mod playlist;
mod render;
mod session;
mod settings;
mod sidecar;
mod slide;
mod state;
mod texture_loader;

use crate::catalog::DirectoryCatalog;
use crate::constants::*;
use crate::input::{HighLevelInput, InputMultiplexer, RawInput, discover_devices, read_pad};
use crate::player::CommandLauncher;
use crate::render::RaylibCanvas;
use crate::session::{Flow, Session, SessionOptions};
use crate::settings::SettingsStore;
use crate::texture_loader::TextureLoader;

#[derive(Parser, Debug)]
#[command(name = "kiosk_show")]
#[command(version)]
#[command(about = "Fullscreen photo and video show driven by a game controller")]
struct Args {
    /// Disable the photo zoom and fade-in
    #[arg(long)]
    no_animation: bool,

    /// Settings file, created on the first change
    #[arg(long, default_value = "settings.json")]
    settings: PathBuf,

    #[arg(long, default_value = "photos")]
    photos: PathBuf,

    #[arg(long, default_value = "videos/personal")]
    personal_videos: PathBuf,

    #[arg(long, default_value = "videos/games")]
    game_videos: PathBuf,

    /// External video player binary
    #[arg(long, default_value = "omxplayer")]
    player: PathBuf,

    #[arg(long, default_value = "hdmi")]
    audio_output: String,

    /// Raw input device, repeatable. Defaults to every /dev/input/event*
    #[arg(long = "input-device")]
    input_devices: Vec<PathBuf>,

    /// Run in a window instead of fullscreen
    #[arg(long)]
    windowed: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let store = SettingsStore::new(&args.settings);
    let settings = store.load();

    let mut builder = raylib::init();
    builder.title("Kiosk Show").vsync();
    if args.windowed {
        builder.size(WINDOWED_WIDTH, WINDOWED_HEIGHT);
    } else {
        // 0x0 picks the monitor's native mode
        builder.size(0, 0).fullscreen();
    }
    let (mut rl, thread) = builder.build();
    rl.set_trace_log(TraceLogLevel::LOG_ERROR);
    rl.set_exit_key(None);
    rl.hide_cursor();
    rl.set_target_fps(FPS_ANIMATING);

    let device_paths = if args.input_devices.is_empty() {
        discover_devices(Path::new("/dev/input"))
    } else {
        args.input_devices.clone()
    };
    let mut input = InputMultiplexer::new(RawInput::open_all(&device_paths), HighLevelInput::default());

    let catalog = DirectoryCatalog {
        photos: args.photos.clone(),
        personal_videos: args.personal_videos.clone(),
        game_videos: args.game_videos.clone(),
    };
    let mut session = Session::new(
        settings,
        store,
        Box::new(catalog),
        CommandLauncher::new(&args.player),
        StdRng::from_os_rng(),
        SessionOptions {
            animate: !args.no_animation,
            audio_output: args.audio_output.clone(),
        },
    );
    session.start(Instant::now());

    // --- Main Loop ---
    loop {
        let now = Instant::now();
        let pad = read_pad(&mut rl);
        let actions = input.collect(&session.buttons(), &pad, now);

        let screen = (rl.get_screen_width() as f32, rl.get_screen_height() as f32);
        let mut loader = TextureLoader {
            rl: &mut rl,
            thread: &thread,
        };
        if session.tick(&actions, now, &mut loader, screen) == Flow::Exit {
            break;
        }

        rl.set_target_fps(session.target_fps());
        let mut canvas = RaylibCanvas::new(rl.begin_drawing(&thread));
        session.render(&mut canvas, now);
    }

    session.shutdown();
    info!("Show stopped");
    Ok(())
}
