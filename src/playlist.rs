use std::path::{Path, PathBuf};

use log::{debug, info};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::catalog::ContentCatalog;
use crate::state::ContentMode;

#[derive(Debug)]
pub struct Playlist {
    mode: ContentMode,
    entries: Vec<PathBuf>,
    order: Vec<usize>,
    cursor: usize,
    needs_reload: bool,
    no_content: bool,
}

impl Playlist {
    pub fn new(mode: ContentMode) -> Self {
        Self {
            mode,
            entries: Vec::new(),
            order: Vec::new(),
            cursor: 0,
            needs_reload: false,
            no_content: true,
        }
    }

    /// Re-enumerates `mode`, reshuffles and rewinds.
    pub fn rebuild<R: Rng + ?Sized>(&mut self, mode: ContentMode, catalog: &dyn ContentCatalog, rng: &mut R) {
        self.mode = mode;
        self.entries = catalog.enumerate(mode);
        self.order = (0..self.entries.len()).collect();
        self.order.shuffle(rng);
        self.cursor = 0;
        self.no_content = self.entries.is_empty();
        self.needs_reload = !self.no_content;
        info!("Playlist rebuilt for {:?}: {} item(s)", mode, self.entries.len());
    }

    /// Moves the cursor by `step`, wrapping. On an empty playlist only the
    /// "no content" flag is raised.
    pub fn advance(&mut self, step: isize) {
        if self.order.is_empty() {
            self.no_content = true;
            return;
        }
        let len = self.order.len() as isize;
        self.cursor = (self.cursor as isize + step).rem_euclid(len) as usize;
        self.needs_reload = true;
        debug!("Playlist cursor -> {}/{}", self.cursor + 1, len);
    }

    pub fn current(&self) -> Option<&Path> {
        self.order
            .get(self.cursor)
            .map(|&index| self.entries[index].as_path())
    }

    pub fn request_reload(&mut self) {
        if !self.order.is_empty() {
            self.needs_reload = true;
        }
    }

    #[cfg(test)]
    pub fn needs_reload(&self) -> bool {
        self.needs_reload
    }

    pub fn take_reload(&mut self) -> bool {
        std::mem::take(&mut self.needs_reload)
    }

    pub fn mode(&self) -> ContentMode {
        self.mode
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[cfg(test)]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn no_content(&self) -> bool {
        self.no_content
    }
}
