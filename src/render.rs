use std::borrow::Cow;

use raylib::prelude::*;

use crate::overlay::OverlayKind;
use crate::slide::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba(pub u8, pub u8, pub u8, pub u8);

impl Rgba {
    pub const WHITE: Rgba = Rgba(255, 255, 255, 255);
    pub const BLACK: Rgba = Rgba(0, 0, 0, 255);
    pub const GREY: Rgba = Rgba(160, 160, 160, 255);
    pub const PANEL: Rgba = Rgba(0, 0, 0, 170);
    pub const ACCENT: Rgba = Rgba(255, 200, 60, 255);

    pub fn with_opacity(self, opacity: f32) -> Rgba {
        let alpha = (self.3 as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
        Rgba(self.0, self.1, self.2, alpha)
    }
}

/// What the session needs from a display backend.
pub trait Canvas {
    type Picture;

    fn screen_size(&self) -> (f32, f32);
    fn clear(&mut self);
    /// Draws the whole picture (`source` is its pixel size) into `dest`.
    fn draw_picture(&mut self, picture: &Self::Picture, source: (f32, f32), dest: Rect, opacity: f32);
    fn fill_rect(&mut self, rect: Rect, color: Rgba);
    fn draw_text(&mut self, text: &str, x: f32, y: f32, size: f32, color: Rgba);
    fn text_width(&self, text: &str, size: f32) -> f32;
}

pub fn draw_shadowed_text<C: Canvas + ?Sized>(canvas: &mut C, text: &str, x: f32, y: f32, size: f32, color: Rgba) {
    canvas.draw_text(text, x + 2.0, y + 2.0, size, Rgba::BLACK.with_opacity(color.3 as f32 / 255.0));
    canvas.draw_text(text, x, y, size, color);
}

pub fn draw_centered_text<C: Canvas + ?Sized>(canvas: &mut C, text: &str, y: f32, size: f32, color: Rgba) {
    let (screen_width, _) = canvas.screen_size();
    let x = (screen_width - canvas.text_width(text, size)) * 0.5;
    draw_shadowed_text(canvas, text, x, y, size, color);
}

/// Draws `lines` in a translucent box anchored where `kind` lives on screen.
pub fn draw_overlay<C: Canvas + ?Sized>(canvas: &mut C, kind: OverlayKind, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    let (screen_width, screen_height) = canvas.screen_size();
    let size = (screen_height * 0.035).max(12.0);
    let padding = size * 0.6;
    let line_height = size * 1.3;
    let width = lines
        .iter()
        .map(|line| canvas.text_width(line, size))
        .fold(0.0, f32::max)
        + padding * 2.0;
    let height = line_height * lines.len() as f32 + padding * 2.0 - (line_height - size);
    let margin = screen_height * 0.03;

    let (x, y) = match kind {
        OverlayKind::InfoPanel => (margin, screen_height - height - margin),
        OverlayKind::SpeedIndicator => (screen_width - width - margin, margin),
        OverlayKind::ModeIndicator => ((screen_width - width) * 0.5, margin),
        OverlayKind::MuteIndicator => (margin, margin),
    };

    canvas.fill_rect(Rect::new(x, y, width, height), Rgba::PANEL);
    for (i, line) in lines.iter().enumerate() {
        let color = if i == 0 { Rgba::ACCENT } else { Rgba::WHITE };
        canvas.draw_text(line, x + padding, y + padding + line_height * i as f32, size, color);
    }
}

// raylib hands text to C as a NUL-terminated string.
fn drawable(text: &str) -> Cow<'_, str> {
    if text.contains('\0') {
        Cow::Owned(text.replace('\0', ""))
    } else {
        Cow::Borrowed(text)
    }
}

/// raylib backend for a single frame.
pub struct RaylibCanvas<'a> {
    d: RaylibDrawHandle<'a>,
}

impl<'a> RaylibCanvas<'a> {
    pub fn new(d: RaylibDrawHandle<'a>) -> Self {
        Self { d }
    }
}

fn color(rgba: Rgba) -> Color {
    Color::new(rgba.0, rgba.1, rgba.2, rgba.3)
}

impl Canvas for RaylibCanvas<'_> {
    type Picture = Texture2D;

    fn screen_size(&self) -> (f32, f32) {
        (self.d.get_screen_width() as f32, self.d.get_screen_height() as f32)
    }

    fn clear(&mut self) {
        self.d.clear_background(Color::BLACK);
    }

    fn draw_picture(&mut self, picture: &Texture2D, source: (f32, f32), dest: Rect, opacity: f32) {
        self.d.draw_texture_pro(
            picture,
            Rectangle::new(0.0, 0.0, source.0, source.1),
            Rectangle::new(dest.x, dest.y, dest.width, dest.height),
            Vector2::new(0.0, 0.0),
            0.0,
            color(Rgba::WHITE.with_opacity(opacity)),
        );
    }

    fn fill_rect(&mut self, rect: Rect, rgba: Rgba) {
        self.d.draw_rectangle_rec(Rectangle::new(rect.x, rect.y, rect.width, rect.height), color(rgba));
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, size: f32, rgba: Rgba) {
        self.d.draw_text(&drawable(text), x.round() as i32, y.round() as i32, size.round() as i32, color(rgba));
    }

    fn text_width(&self, text: &str, size: f32) -> f32 {
        self.d.measure_text(&drawable(text), size.round() as i32) as f32
    }
}
