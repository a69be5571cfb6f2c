use log::info;
use serde::{Deserialize, Serialize};

use crate::error::InvalidMode;

/// What the show is asked to play. Persisted as 1..=4.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PlaybackMode {
    Photos,         // 1
    PersonalVideos, // 2
    GameVideos,     // 3
    AutoCycle,      // 4, rotates through the three content modes
}

impl PlaybackMode {
    pub fn next(self) -> Self {
        match self {
            PlaybackMode::Photos => PlaybackMode::PersonalVideos,
            PlaybackMode::PersonalVideos => PlaybackMode::GameVideos,
            PlaybackMode::GameVideos => PlaybackMode::AutoCycle,
            PlaybackMode::AutoCycle => PlaybackMode::Photos,
        }
    }

    /// The content mode this playback mode pins, `None` for `AutoCycle`.
    pub fn content(self) -> Option<ContentMode> {
        match self {
            PlaybackMode::Photos => Some(ContentMode::Photos),
            PlaybackMode::PersonalVideos => Some(ContentMode::PersonalVideos),
            PlaybackMode::GameVideos => Some(ContentMode::GameVideos),
            PlaybackMode::AutoCycle => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlaybackMode::Photos => "Photos",
            PlaybackMode::PersonalVideos => "Videos",
            PlaybackMode::GameVideos => "Game clips",
            PlaybackMode::AutoCycle => "Auto cycle",
        }
    }
}

impl From<PlaybackMode> for u8 {
    fn from(mode: PlaybackMode) -> u8 {
        match mode {
            PlaybackMode::Photos => 1,
            PlaybackMode::PersonalVideos => 2,
            PlaybackMode::GameVideos => 3,
            PlaybackMode::AutoCycle => 4,
        }
    }
}

impl TryFrom<u8> for PlaybackMode {
    type Error = InvalidMode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PlaybackMode::Photos),
            2 => Ok(PlaybackMode::PersonalVideos),
            3 => Ok(PlaybackMode::GameVideos),
            4 => Ok(PlaybackMode::AutoCycle),
            other => Err(InvalidMode(other)),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ContentMode {
    Photos,
    PersonalVideos,
    GameVideos,
}

impl ContentMode {
    pub fn next(self) -> Self {
        match self {
            ContentMode::Photos => ContentMode::PersonalVideos,
            ContentMode::PersonalVideos => ContentMode::GameVideos,
            ContentMode::GameVideos => ContentMode::Photos,
        }
    }

    pub fn is_video(self) -> bool {
        !matches!(self, ContentMode::Photos)
    }

    pub fn label(self) -> &'static str {
        match self {
            ContentMode::Photos => "Photos",
            ContentMode::PersonalVideos => "Videos",
            ContentMode::GameVideos => "Game clips",
        }
    }
}

// `AutoCycle` keeps an internal content mode that the cycle timer advances;
// every other mode pins it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeMachine {
    playback: PlaybackMode,
    active: ContentMode,
}

impl ModeMachine {
    pub fn new(playback: PlaybackMode) -> Self {
        Self {
            playback,
            active: playback.content().unwrap_or(ContentMode::Photos),
        }
    }

    pub fn playback(&self) -> PlaybackMode {
        self.playback
    }

    pub fn active(&self) -> ContentMode {
        self.active
    }

    // The only way to change `playback`.
    pub fn cycle(&mut self) -> PlaybackMode {
        *self = ModeMachine::new(self.playback.next());
        info!("Playback mode -> {:?} (showing {:?})", self.playback, self.active);
        self.playback
    }

    pub fn advance_auto(&mut self) -> Option<ContentMode> {
        if self.playback != PlaybackMode::AutoCycle {
            return None;
        }
        self.active = self.active.next();
        info!("Auto cycle -> {:?}", self.active);
        Some(self.active)
    }
}
