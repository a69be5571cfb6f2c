use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::state::ContentMode;

pub const PHOTO_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov"];

/// Source of content paths per mode.
pub trait ContentCatalog {
    /// Content for `mode`, sorted by file name. Empty on any failure.
    fn enumerate(&self, mode: ContentMode) -> Vec<PathBuf>;
}

#[derive(Debug, Clone)]
pub struct DirectoryCatalog {
    pub photos: PathBuf,
    pub personal_videos: PathBuf,
    pub game_videos: PathBuf,
}

impl DirectoryCatalog {
    fn dir_for(&self, mode: ContentMode) -> &Path {
        match mode {
            ContentMode::Photos => &self.photos,
            ContentMode::PersonalVideos => &self.personal_videos,
            ContentMode::GameVideos => &self.game_videos,
        }
    }
}

impl ContentCatalog for DirectoryCatalog {
    fn enumerate(&self, mode: ContentMode) -> Vec<PathBuf> {
        let extensions = if mode.is_video() { VIDEO_EXTENSIONS } else { PHOTO_EXTENSIONS };
        let dir = self.dir_for(mode);
        match list_sorted(dir, extensions) {
            Ok(paths) => {
                debug!("{} {:?} item(s) in {}", paths.len(), mode, dir.display());
                paths
            }
            Err(e) => {
                warn!("Cannot list {:?} content in {}: {}", mode, dir.display(), e);
                Vec::new()
            }
        }
    }
}

/// Files in `dir` whose extension is in `extensions` (case-insensitive),
/// stable-sorted by file name.
pub fn list_sorted(dir: &Path, extensions: &[&str]) -> io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let wanted = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| extensions.contains(&ext.to_lowercase().as_str()));
        if wanted {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}
