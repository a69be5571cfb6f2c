use std::fs;
use std::path::{Path, PathBuf};

use log::trace;

/// Display labels from the optional `name.txt` next to `name.ext`.
/// Missing file or lines read as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sidecar {
    pub label: String,
    pub info: String,
    pub source: String,
}

impl Sidecar {
    pub fn path_for(content: &Path) -> PathBuf {
        content.with_extension("txt")
    }

    pub fn read(content: &Path) -> Self {
        let path = Self::path_for(content);
        match fs::read(&path) {
            Ok(bytes) => Self::parse(&bytes),
            Err(e) => {
                trace!("No sidecar at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    // Best effort: UTF-16 with a BOM, otherwise lossy UTF-8. Control
    // characters never reach the display.
    pub fn parse(bytes: &[u8]) -> Self {
        let decoded = decode(bytes);
        let text = decoded.strip_prefix('\u{feff}').unwrap_or(decoded.as_str());
        let mut lines = text
            .lines()
            .map(|line| line.chars().filter(|c| !c.is_control()).collect::<String>().trim().to_string());
        Self {
            label: lines.next().unwrap_or_default(),
            info: lines.next().unwrap_or_default(),
            source: lines.next().unwrap_or_default(),
        }
    }
}

fn decode(bytes: &[u8]) -> String {
    let units = |from: fn([u8; 2]) -> u16| {
        bytes[2..].chunks_exact(2).map(|pair| from([pair[0], pair[1]])).collect::<Vec<u16>>()
    };
    match bytes {
        [0xFF, 0xFE, ..] => String::from_utf16_lossy(&units(u16::from_le_bytes)),
        [0xFE, 0xFF, ..] => String::from_utf16_lossy(&units(u16::from_be_bytes)),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}
