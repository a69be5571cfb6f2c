use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("settings JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("failed to spawn player for {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to signal player group {pgid}: {source}")]
    Signal {
        pgid: i32,
        #[source]
        source: nix::Error,
    },

    #[error("failed to reap player: {0}")]
    Wait(#[from] std::io::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid playback mode {0}, expected 1..=4")]
pub struct InvalidMode(pub u8);
