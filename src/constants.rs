use std::time::Duration;

pub const WINDOWED_WIDTH: i32 = 1280;         // Window size when not running fullscreen
pub const WINDOWED_HEIGHT: i32 = 720;
pub const FPS_ANIMATING: u32 = 30;            // Tick rate while a photo is on screen
pub const FPS_IDLE: u32 = 10;                 // Tick rate while a player owns the screen

pub const ZOOM_SPEED: f32 = 0.0002;           // Zoom factor increment per tick
pub const FADE_STEP: f32 = 10.0 / 255.0;      // Opacity increment per tick

pub const DEFAULT_INTERVAL_SECS: f32 = 15.0;  // Time each photo stays on screen
pub const MIN_INTERVAL_SECS: f32 = 3.0;
pub const MAX_INTERVAL_SECS: f32 = 120.0;
pub const INTERVAL_STEP_SECS: f32 = 1.0;

pub const DEFAULT_INFO_BUTTON: u16 = 304;     // BTN_SOUTH
pub const DEFAULT_MODE_BUTTON: u16 = 305;     // BTN_EAST

pub const CYCLE_INTERVAL: Duration = Duration::from_secs(60);

pub const NAV_DEBOUNCE: Duration = Duration::from_millis(350);
pub const SPEED_DEBOUNCE: Duration = Duration::from_millis(150);
pub const AXIS_THRESHOLD: f32 = 0.5;

pub const INFO_PANEL_DURATION: Duration = Duration::from_secs(10);
pub const SPEED_INDICATOR_DURATION: Duration = Duration::from_secs(2);
pub const MODE_INDICATOR_DURATION: Duration = Duration::from_secs(3);
pub const MUTE_INDICATOR_DURATION: Duration = Duration::from_secs(2);

pub const PLAYER_TERMINATE_GRACE: Duration = Duration::from_secs(2);
pub const MIN_PLAYER_RUNTIME: Duration = Duration::from_secs(2);
pub const FAILED_PLAY_BACKOFF: Duration = Duration::from_secs(3);
pub const MUTED_VOLUME_MILLIBELS: i32 = -6000;

pub const LETTERBOX_RATIO: f32 = 0.12;        // Share of the screen height kept for the label band
pub const LABEL_MARGIN: f32 = 30.0;
