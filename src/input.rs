//! Input multiplexer.
//!
//! Two channels feed one ordered action list per tick: raw evdev button
//! records read straight from `/dev/input/event*`, then high-level
//! directional state sampled from the display backend. Nothing here mutates
//! show state.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{debug, info, trace, warn};
use nix::fcntl::OFlag;
use raylib::prelude::*;

use crate::constants::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Next,
    Prev,
    SpeedUp,
    SpeedDown,
    ToggleInfoOrMute,
    CycleMode,
    Exit,
    None,
}

// linux/input-event-codes.h
pub const EV_KEY: u16 = 0x01;
pub const KEY_PRESS: i32 = 1;

// `struct input_event`: timeval (two native words), type, code, value.
pub const EVENT_SIZE: usize = 2 * size_of::<usize>() + 8;

// Keyboard arrows and BTN_DPAD_*: already read as directions through raylib.
const DIRECTION_CODES: [u16; 8] = [103, 105, 106, 108, 0x220, 0x221, 0x222, 0x223];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: u16,
    pub code: u16,
    pub value: i32,
}

impl RawEvent {
    pub fn parse(record: &[u8]) -> Option<Self> {
        if record.len() < EVENT_SIZE {
            return None;
        }
        // The timestamp is not used.
        let tail = 2 * size_of::<usize>();
        Some(Self {
            kind: u16::from_ne_bytes([record[tail], record[tail + 1]]),
            code: u16::from_ne_bytes([record[tail + 2], record[tail + 3]]),
            value: i32::from_ne_bytes([record[tail + 4], record[tail + 5], record[tail + 6], record[tail + 7]]),
        })
    }

    /// Only key-down edges matter; releases and autorepeat are ignored.
    pub fn is_press(&self) -> bool {
        self.kind == EV_KEY && self.value == KEY_PRESS
    }
}

// The two meaningful buttons. Directions are left to the high-level
// channel; any other pressed button means "leave".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonMap {
    pub info: u16,
    pub mode: u16,
}

impl ButtonMap {
    pub fn action_for(&self, code: u16) -> Action {
        if code == self.info {
            Action::ToggleInfoOrMute
        } else if code == self.mode {
            Action::CycleMode
        } else if DIRECTION_CODES.contains(&code) {
            Action::None
        } else {
            Action::Exit
        }
    }
}

/// One event device, read without blocking. Partial records are kept
/// until the rest arrives.
pub struct RawDevice<R = File> {
    path: PathBuf,
    reader: R,
    pending: Vec<u8>,
}

impl RawDevice<File> {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(OFlag::O_NONBLOCK.bits())
            .open(path)?;
        Ok(Self::from_reader(path, file))
    }
}

impl<R: Read> RawDevice<R> {
    pub fn from_reader(path: &Path, reader: R) -> Self {
        Self {
            path: path.to_path_buf(),
            reader,
            pending: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads everything available right now.
    pub fn drain(&mut self, out: &mut Vec<RawEvent>) -> io::Result<()> {
        let mut buf = [0u8; EVENT_SIZE * 16];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    self.pending.extend_from_slice(&buf[..n]);
                    let whole = self.pending.len() - self.pending.len() % EVENT_SIZE;
                    out.extend(self.pending[..whole].chunks_exact(EVENT_SIZE).filter_map(RawEvent::parse));
                    self.pending.drain(..whole);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

/// All usable raw devices. A device that fails is dropped for good.
pub struct RawInput<R = File> {
    devices: Vec<RawDevice<R>>,
}

impl RawInput<File> {
    pub fn open_all(paths: &[PathBuf]) -> Self {
        let mut devices = Vec::new();
        for path in paths {
            match RawDevice::open(path) {
                Ok(device) => {
                    info!("Listening to input device {}", path.display());
                    devices.push(device);
                }
                Err(e) => warn!("Skipping input device {}: {}", path.display(), e),
            }
        }
        if devices.is_empty() {
            warn!("No raw input device available, using high-level input only");
        }
        Self { devices }
    }
}

impl<R: Read> RawInput<R> {
    #[cfg(test)]
    pub fn from_devices(devices: Vec<RawDevice<R>>) -> Self {
        Self { devices }
    }

    #[cfg(test)]
    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn poll(&mut self, buttons: &ButtonMap, out: &mut Vec<Action>) {
        let mut events = Vec::new();
        self.devices.retain_mut(|device| match device.drain(&mut events) {
            Ok(()) => true,
            Err(e) => {
                warn!("Dropping input device {}: {}", device.path().display(), e);
                false
            }
        });
        for event in events.iter().filter(|event| event.is_press()) {
            let action = buttons.action_for(event.code);
            debug!("Button {} -> {:?}", event.code, action);
            if action != Action::None {
                out.push(action);
            }
        }
    }
}

/// Every `/dev/input/event*` node, sorted.
pub fn discover_devices(dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with("event"))
            })
            .collect(),
        Err(e) => {
            warn!("Cannot list {}: {}", dir.display(), e);
            Vec::new()
        }
    };
    paths.sort();
    paths
}

/// Minimum re-trigger interval for a held control.
#[derive(Debug, Clone)]
pub struct Debouncer {
    min_interval: Duration,
    last: Option<Instant>,
}

impl Debouncer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    pub fn fire(&mut self, now: Instant) -> bool {
        let ready = self
            .last
            .is_none_or(|last| now.saturating_duration_since(last) >= self.min_interval);
        if ready {
            self.last = Some(now);
        }
        ready
    }
}

/// Directional and window state sampled once per tick. Axes are in -1..=1,
/// negative is left/up.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PadState {
    pub horizontal: f32,
    pub vertical: f32,
    pub close_requested: bool,
    pub other_key: bool,
}

/// High-level channel: axes to navigation/speed, each debounced apart.
#[derive(Debug, Clone)]
pub struct HighLevelInput {
    nav: Debouncer,
    speed: Debouncer,
}

impl Default for HighLevelInput {
    fn default() -> Self {
        Self::new(NAV_DEBOUNCE, SPEED_DEBOUNCE)
    }
}

impl HighLevelInput {
    pub fn new(nav: Duration, speed: Duration) -> Self {
        Self {
            nav: Debouncer::new(nav),
            speed: Debouncer::new(speed),
        }
    }

    pub fn translate(&mut self, pad: &PadState, now: Instant, out: &mut Vec<Action>) {
        if pad.close_requested || pad.other_key {
            out.push(Action::Exit);
        }
        if pad.horizontal.abs() >= AXIS_THRESHOLD && self.nav.fire(now) {
            out.push(if pad.horizontal > 0.0 { Action::Next } else { Action::Prev });
        }
        if pad.vertical.abs() >= AXIS_THRESHOLD && self.speed.fire(now) {
            out.push(if pad.vertical < 0.0 { Action::SpeedUp } else { Action::SpeedDown });
        }
    }
}

pub struct InputMultiplexer<R = File> {
    raw: RawInput<R>,
    high: HighLevelInput,
}

impl<R: Read> InputMultiplexer<R> {
    pub fn new(raw: RawInput<R>, high: HighLevelInput) -> Self {
        Self { raw, high }
    }

    /// Raw button actions first, then high-level ones.
    pub fn collect(&mut self, buttons: &ButtonMap, pad: &PadState, now: Instant) -> Vec<Action> {
        let mut actions = Vec::new();
        self.raw.poll(buttons, &mut actions);
        self.high.translate(pad, now, &mut actions);
        if !actions.is_empty() {
            trace!("Tick actions: {:?}", actions);
        }
        actions
    }
}

/// Samples gamepad 0, arrow keys and the window close request.
pub fn read_pad(rl: &mut RaylibHandle) -> PadState {
    let mut pad = PadState::default();

    if rl.is_gamepad_available(0) {
        pad.horizontal = rl.get_gamepad_axis_movement(0, GamepadAxis::GAMEPAD_AXIS_LEFT_X);
        pad.vertical = rl.get_gamepad_axis_movement(0, GamepadAxis::GAMEPAD_AXIS_LEFT_Y);
        if rl.is_gamepad_button_down(0, GamepadButton::GAMEPAD_BUTTON_LEFT_FACE_LEFT) {
            pad.horizontal = -1.0;
        }
        if rl.is_gamepad_button_down(0, GamepadButton::GAMEPAD_BUTTON_LEFT_FACE_RIGHT) {
            pad.horizontal = 1.0;
        }
        if rl.is_gamepad_button_down(0, GamepadButton::GAMEPAD_BUTTON_LEFT_FACE_UP) {
            pad.vertical = -1.0;
        }
        if rl.is_gamepad_button_down(0, GamepadButton::GAMEPAD_BUTTON_LEFT_FACE_DOWN) {
            pad.vertical = 1.0;
        }
    }

    if rl.is_key_down(KeyboardKey::KEY_LEFT) {
        pad.horizontal = -1.0;
    }
    if rl.is_key_down(KeyboardKey::KEY_RIGHT) {
        pad.horizontal = 1.0;
    }
    if rl.is_key_down(KeyboardKey::KEY_UP) {
        pad.vertical = -1.0;
    }
    if rl.is_key_down(KeyboardKey::KEY_DOWN) {
        pad.vertical = 1.0;
    }

    while let Some(key) = rl.get_key_pressed() {
        let arrow = matches!(
            key,
            KeyboardKey::KEY_LEFT | KeyboardKey::KEY_RIGHT | KeyboardKey::KEY_UP | KeyboardKey::KEY_DOWN
        );
        if !arrow {
            pad.other_key = true;
        }
    }

    pad.close_requested = rl.window_should_close();
    pad
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn record(kind: u16, code: u16, value: i32) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(EVENT_SIZE);
        bytes.extend_from_slice(&1_700_000_000usize.to_ne_bytes());
        bytes.extend_from_slice(&250_000usize.to_ne_bytes());
        bytes.extend_from_slice(&kind.to_ne_bytes());
        bytes.extend_from_slice(&code.to_ne_bytes());
        bytes.extend_from_slice(&value.to_ne_bytes());
        bytes
    }

    /// Hands out prepared chunks, then reports "would block" forever.
    struct Chunks(VecDeque<Vec<u8>>);

    impl Read for Chunks {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.0.pop_front() {
                Some(chunk) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                None => Err(io::ErrorKind::WouldBlock.into()),
            }
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::from_raw_os_error(19)) // ENODEV
        }
    }

    const BUTTONS: ButtonMap = ButtonMap { info: 304, mode: 305 };

    fn device(chunks: Vec<Vec<u8>>) -> RawDevice<Chunks> {
        RawDevice::from_reader(Path::new("/dev/input/event0"), Chunks(chunks.into()))
    }

    #[test]
    fn parses_a_key_press_record() {
        let event = RawEvent::parse(&record(EV_KEY, 305, 1)).unwrap();
        assert_eq!(event.code, 305);
        assert!(event.is_press());

        assert!(!RawEvent::parse(&record(EV_KEY, 305, 0)).unwrap().is_press());
        assert!(!RawEvent::parse(&record(EV_KEY, 305, 2)).unwrap().is_press());
        assert!(!RawEvent::parse(&record(0x03, 0, 1)).unwrap().is_press());
        assert_eq!(RawEvent::parse(&[0u8; 4]), None);
    }

    #[test]
    fn drain_reassembles_split_records() {
        let bytes = [record(EV_KEY, 304, 1), record(EV_KEY, 304, 0)].concat();
        let (head, tail) = bytes.split_at(EVENT_SIZE + 5);
        let mut dev = device(vec![head.to_vec(), tail.to_vec()]);

        let mut events = Vec::new();
        dev.drain(&mut events).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].value, 0);
    }

    #[test]
    fn presses_map_to_actions_and_unknown_buttons_exit() {
        let bytes = [
            record(EV_KEY, 304, 1),
            record(EV_KEY, 304, 0),
            record(EV_KEY, 305, 1),
            record(EV_KEY, 316, 1),
        ]
        .concat();
        let mut raw = RawInput::from_devices(vec![device(vec![bytes])]);

        let mut actions = Vec::new();
        raw.poll(&BUTTONS, &mut actions);
        assert_eq!(actions, vec![Action::ToggleInfoOrMute, Action::CycleMode, Action::Exit]);
    }

    #[test]
    fn raw_arrow_and_dpad_presses_do_not_exit() {
        let bytes = [
            record(EV_KEY, 103, 1),
            record(EV_KEY, 106, 1),
            record(EV_KEY, 0x222, 1),
            record(EV_KEY, 304, 1),
        ]
        .concat();
        let mut raw = RawInput::from_devices(vec![device(vec![bytes])]);

        let mut actions = Vec::new();
        raw.poll(&BUTTONS, &mut actions);
        assert_eq!(actions, vec![Action::ToggleInfoOrMute]);
        assert_eq!(BUTTONS.action_for(108), Action::None);
    }

    #[test]
    fn failing_device_is_excluded() {
        let mut raw = RawInput::from_devices(vec![RawDevice::from_reader(Path::new("/dev/input/event9"), Broken)]);
        let mut actions = Vec::new();
        raw.poll(&BUTTONS, &mut actions);
        assert!(actions.is_empty());
        assert_eq!(raw.device_count(), 0);
    }

    #[test]
    fn held_stick_is_debounced_per_axis() {
        let t0 = Instant::now();
        let mut high = HighLevelInput::new(Duration::from_millis(300), Duration::from_millis(100));
        let pad = PadState {
            horizontal: 1.0,
            vertical: -0.9,
            ..PadState::default()
        };

        let mut actions = Vec::new();
        high.translate(&pad, t0, &mut actions);
        assert_eq!(actions, vec![Action::Next, Action::SpeedUp]);

        actions.clear();
        high.translate(&pad, t0 + Duration::from_millis(150), &mut actions);
        assert_eq!(actions, vec![Action::SpeedUp]);

        actions.clear();
        high.translate(&pad, t0 + Duration::from_millis(310), &mut actions);
        assert_eq!(actions, vec![Action::Next, Action::SpeedUp]);
    }

    #[test]
    fn small_deflection_is_ignored() {
        let mut high = HighLevelInput::default();
        let pad = PadState {
            horizontal: -0.3,
            vertical: 0.2,
            ..PadState::default()
        };
        let mut actions = Vec::new();
        high.translate(&pad, Instant::now(), &mut actions);
        assert!(actions.is_empty());
    }

    #[test]
    fn raw_buttons_come_before_axis_actions() {
        let raw = RawInput::from_devices(vec![device(vec![record(EV_KEY, 305, 1)])]);
        let mut mux = InputMultiplexer::new(raw, HighLevelInput::default());
        let pad = PadState {
            horizontal: -1.0,
            close_requested: true,
            ..PadState::default()
        };
        assert_eq!(
            mux.collect(&BUTTONS, &pad, Instant::now()),
            vec![Action::CycleMode, Action::Exit, Action::Prev]
        );
    }

    #[test]
    fn discovers_event_nodes_only() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["event3", "event0", "mice", "js0"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        let found = discover_devices(dir.path());
        assert_eq!(found, vec![dir.path().join("event0"), dir.path().join("event3")]);
    }

    #[test]
    fn regular_file_devices_read_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("event0");
        fs::write(&path, [record(EV_KEY, 999, 1), record(EV_KEY, 304, 1)].concat()).unwrap();

        let mut raw = RawInput::open_all(&[path, dir.path().join("event7")]);
        assert_eq!(raw.device_count(), 1);
        let mut actions = Vec::new();
        raw.poll(&BUTTONS, &mut actions);
        assert_eq!(actions, vec![Action::Exit, Action::ToggleInfoOrMute]);
    }
}
