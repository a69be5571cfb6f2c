use std::fs;
use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use exif::{DateTime, Exif, In, Reader, Tag, Value};
use log::{debug, warn};
use raylib::prelude::*;

pub struct LoadedPicture<P> {
    pub picture: P,
    pub width: f32,
    pub height: f32,
    pub captured: Option<String>,
}

/// Synchronous photo decoding into whatever the display backend draws.
pub trait PictureLoader {
    type Picture;

    fn load(&mut self, path: &Path) -> Result<LoadedPicture<Self::Picture>>;
}

/// Decodes into GPU textures, honouring EXIF orientation.
pub struct TextureLoader<'a> {
    pub rl: &'a mut RaylibHandle,
    pub thread: &'a RaylibThread,
}

impl PictureLoader for TextureLoader<'_> {
    type Picture = Texture2D;

    fn load(&mut self, path: &Path) -> Result<LoadedPicture<Texture2D>> {
        let file_bytes = fs::read(path).with_context(|| format!("Failed to read file {:?}", path))?;

        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        // EXIF only works reliably for JPEG
        let exif = if extension == "jpg" || extension == "jpeg" {
            match Reader::new().read_from_container(&mut Cursor::new(&file_bytes)) {
                Ok(exif) => Some(exif),
                Err(e) => {
                    debug!("No EXIF data for {:?}: {}", path, e);
                    None
                }
            }
        } else {
            None
        };
        let orientation = exif.as_ref().map_or(1, exif_orientation);
        let captured = exif.as_ref().and_then(capture_date);

        let mut image = Image::load_image_from_mem(&format!(".{}", extension), &file_bytes)
            .map_err(|e| anyhow::anyhow!("Failed to decode {:?}: {}", path, e))?;
        if image.width() <= 0 || image.height() <= 0 {
            anyhow::bail!("Decoded {:?} to an empty image", path);
        }

        // 1 = normal, 3 = 180 deg, 6 = 90 deg CW, 8 = 90 deg CCW; flips are ignored
        match orientation {
            3 => {
                image.rotate_cw();
                image.rotate_cw();
            }
            6 => image.rotate_cw(),
            8 => image.rotate_ccw(),
            _ => {}
        }

        let texture = self
            .rl
            .load_texture_from_image(self.thread, &image)
            .map_err(|e| anyhow::anyhow!("Failed to create texture for {:?}: {}", path, e))?;

        Ok(LoadedPicture {
            width: texture.width() as f32,
            height: texture.height() as f32,
            picture: texture,
            captured,
        })
    }
}

fn exif_orientation(exif: &Exif) -> u16 {
    match exif.get_field(Tag::Orientation, In::PRIMARY).map(|field| &field.value) {
        Some(Value::Short(values)) if !values.is_empty() => values[0],
        _ => 1,
    }
}

fn capture_date(exif: &Exif) -> Option<String> {
    let field = exif.get_field(Tag::DateTimeOriginal, In::PRIMARY)?;
    match &field.value {
        Value::Ascii(lines) => lines.first().and_then(|raw| format_capture_date(raw)),
        _ => None,
    }
}

/// `2024:03:21 14:30:05` -> `21/03/2024 14:30`.
pub fn format_capture_date(raw: &[u8]) -> Option<String> {
    match DateTime::from_ascii(raw) {
        Ok(dt) if dt.year > 0 && (1..=12).contains(&dt.month) => Some(format!(
            "{:02}/{:02}/{} {:02}:{:02}",
            dt.day, dt.month, dt.year, dt.hour, dt.minute
        )),
        Ok(_) => None,
        Err(e) => {
            warn!("Unreadable EXIF capture date {:?}: {}", String::from_utf8_lossy(raw), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_exif_capture_dates() {
        assert_eq!(
            format_capture_date(b"2024:03:21 14:30:05").as_deref(),
            Some("21/03/2024 14:30")
        );
    }

    #[test]
    fn rejects_blank_or_malformed_capture_dates() {
        assert_eq!(format_capture_date(b"    :  :     :  :  "), None);
        assert_eq!(format_capture_date(b"yesterday"), None);
    }
}
