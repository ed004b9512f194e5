//! Title card rendering.
//!
//! Draws the text in white, wrapped in typographic quotes, centred on a black
//! frame, in the style of an episode title card.

use std::sync::Arc;

use ab_glyph::{Font, FontVec, PxScale};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use tracing::{info, instrument};

use crate::base::{config::Config, types::Res};

use super::{GenericImageGenerator, ImageGenerator};

const BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);
const FOREGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Line advance as a multiple of the font size.
const LINE_SPACING: f32 = 1.25;

// Errors.

/// Reasons a title card cannot be rendered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TitleCardError {
    #[error("title text is empty")]
    EmptyText,
    #[error("the font has no glyph for {0:?}")]
    UnsupportedCharacter(char),
    #[error("title text does not fit on the card")]
    TooLong,
}

// Extra methods on `ImageGenerator` applied by the title card implementation.

impl ImageGenerator {
    /// Creates a title card generator, loading the configured font.
    pub fn title_card(config: &Config) -> Res<Self> {
        let generator = TitleCardGenerator::new(config)?;
        Ok(Self { inner: Arc::new(generator) })
    }
}

// Structs.

/// Title card generator.
pub struct TitleCardGenerator {
    font: FontVec,
    scale: PxScale,
    width: u32,
    height: u32,
}

impl TitleCardGenerator {
    /// Load the font and card geometry from the configuration.
    #[instrument(name = "TitleCardGenerator::new", skip_all)]
    pub fn new(config: &Config) -> Res<Self> {
        let data = std::fs::read(&config.font_path).map_err(|e| anyhow::anyhow!("Failed to read font at {}: {}", config.font_path, e))?;
        let font = FontVec::try_from_vec(data).map_err(|e| anyhow::anyhow!("Failed to parse font at {}: {}", config.font_path, e))?;

        info!("Found font at {}", config.font_path);

        Ok(Self {
            font,
            scale: PxScale::from(config.title_card_font_size),
            width: config.title_card_width,
            height: config.title_card_height,
        })
    }

    /// Render the card for `text`.
    pub fn render(&self, text: &str) -> Result<RgbImage, TitleCardError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(TitleCardError::EmptyText);
        }

        // Glyph 0 is `.notdef`, which renders as a box.
        if let Some(c) = text.chars().find(|c| !c.is_whitespace() && self.font.glyph_id(*c).0 == 0) {
            return Err(TitleCardError::UnsupportedCharacter(c));
        }

        let quoted = format!("\u{201c}{text}\u{201d}");
        let lines = wrap_lines(&quoted, self.width * 4 / 5, |line| text_size(self.scale, &self.font, line).0)?;

        let line_height = (self.scale.y * LINE_SPACING).ceil() as u32;
        let block_height = line_height * lines.len() as u32;
        if block_height > self.height * 4 / 5 {
            return Err(TitleCardError::TooLong);
        }

        let mut canvas = RgbImage::from_pixel(self.width, self.height, BACKGROUND);

        let mut y = (self.height - block_height) / 2;
        for line in &lines {
            let (line_width, _) = text_size(self.scale, &self.font, line);
            let x = self.width.saturating_sub(line_width) / 2;

            draw_text_mut(&mut canvas, FOREGROUND, x as i32, y as i32, self.scale, &self.font, line);

            y += line_height;
        }

        Ok(canvas)
    }
}

impl GenericImageGenerator for TitleCardGenerator {
    fn generate(&self, text: &str) -> Res<DynamicImage> {
        Ok(DynamicImage::ImageRgb8(self.render(text)?))
    }
}

// Helpers.

/// Greedily word-wrap `text` so every line measures at most `max_width`.
///
/// Whitespace runs collapse to single spaces. A single word wider than the
/// limit cannot be placed and fails the whole card.
fn wrap_lines<F>(text: &str, max_width: u32, measure: F) -> Result<Vec<String>, TitleCardError>
where
    F: Fn(&str) -> u32,
{
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if measure(word) > max_width {
            return Err(TitleCardError::TooLong);
        }

        let candidate = if current.is_empty() { word.to_string() } else { format!("{current} {word}") };

        if measure(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    Ok(lines)
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::config::ConfigInner;
    use std::io::Write;

    fn char_width(line: &str) -> u32 {
        line.chars().count() as u32
    }

    const FIXTURE_FONT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/DejaVuSansMono.ttf");

    fn create_test_config(font_path: &str) -> Config {
        create_sized_config(font_path, 1920, 1080, 96.0)
    }

    fn create_sized_config(font_path: &str, width: u32, height: u32, font_size: f32) -> Config {
        Config {
            inner: Arc::new(ConfigInner {
                font_path: font_path.to_string(),
                title_card_width: width,
                title_card_height: height,
                title_card_font_size: font_size,
                ..Default::default()
            }),
        }
    }

    fn fixture_generator() -> TitleCardGenerator {
        TitleCardGenerator::new(&create_test_config(FIXTURE_FONT)).unwrap()
    }

    #[test]
    fn test_wrap_fits_on_one_line() {
        let lines = wrap_lines("the gang opens a bar", 40, char_width).unwrap();

        assert_eq!(lines, vec!["the gang opens a bar"]);
    }

    #[test]
    fn test_wrap_breaks_between_words() {
        let lines = wrap_lines("the gang   gets\nwhacked", 9, char_width).unwrap();

        assert_eq!(lines, vec!["the gang", "gets", "whacked"]);
    }

    #[test]
    fn test_wrap_rejects_oversized_word() {
        assert_eq!(wrap_lines("wildcard", 4, char_width), Err(TitleCardError::TooLong));
    }

    #[test]
    fn test_wrap_empty_text_has_no_lines() {
        assert!(wrap_lines("   ", 10, char_width).unwrap().is_empty());
    }

    #[test]
    fn test_new_fails_for_missing_font() {
        let config = create_test_config("/definitely/not/a/font.ttf");

        assert!(TitleCardGenerator::new(&config).is_err());
    }

    #[test]
    fn test_new_fails_for_invalid_font() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"this is not a font").unwrap();
        let config = create_test_config(file.path().to_str().unwrap());

        assert!(TitleCardGenerator::new(&config).is_err());
    }

    #[test]
    fn test_render_fills_configured_frame() {
        let card = fixture_generator().render("the gang opens a bar").unwrap();

        assert_eq!(card.dimensions(), (1920, 1080));
        assert!(card.pixels().any(|p| *p != BACKGROUND), "Text should be drawn on the card");
    }

    #[test]
    fn test_render_centres_text() {
        let card = fixture_generator().render("mac").unwrap();

        let lit_rows: Vec<u32> = (0..card.height()).filter(|&y| (0..card.width()).any(|x| *card.get_pixel(x, y) != BACKGROUND)).collect();
        let top = *lit_rows.first().unwrap();
        let bottom = *lit_rows.last().unwrap();

        assert!(top > 1080 / 3 && bottom < 1080 * 2 / 3, "Text rows {top}..{bottom} should sit in the middle third");
    }

    #[test]
    fn test_render_rejects_blank_text() {
        assert_eq!(fixture_generator().render("  \n "), Err(TitleCardError::EmptyText));
    }

    #[test]
    fn test_render_rejects_missing_glyph() {
        assert_eq!(fixture_generator().render("rum \u{10FFFD} ham"), Err(TitleCardError::UnsupportedCharacter('\u{10FFFD}')));
    }

    #[test]
    fn test_render_rejects_text_taller_than_card() {
        let generator = TitleCardGenerator::new(&create_sized_config(FIXTURE_FONT, 200, 100, 16.0)).unwrap();

        assert_eq!(generator.render(&"dee ".repeat(60)), Err(TitleCardError::TooLong));
    }

    #[test]
    fn test_generate_wraps_render_errors() {
        let err = fixture_generator().generate("").unwrap_err();

        assert_eq!(err.downcast_ref::<TitleCardError>(), Some(&TitleCardError::EmptyText));
    }
}
