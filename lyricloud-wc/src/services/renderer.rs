//! Word-cloud artifact renderer
//!
//! Turns normalized lyrics into an in-memory raster:
//! frequency table → layout → glyph rasterization.
//!
//! Rendering is CPU-bound and synchronous; async callers should run it on
//! `tokio::task::spawn_blocking`.

use ab_glyph::{point, Font, FontArc, Glyph, PxScale, ScaleFont};
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use lyricloud_common::config::RenderConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Cursor;
use thiserror::Error;

use super::fonts;
use super::layout::{layout_words, LayoutOptions, Orientation, PlacedWord, TextMeasurer};
use super::word_frequency::{word_frequencies, Stopwords, WordFrequency};
use crate::models::NormalizedText;

/// Word colours, sampled from the viridis colour map
const PALETTE: &[[u8; 3]] = &[
    [0x44, 0x01, 0x54],
    [0x48, 0x28, 0x78],
    [0x3e, 0x49, 0x89],
    [0x31, 0x68, 0x8e],
    [0x26, 0x82, 0x8e],
    [0x1f, 0x9e, 0x89],
    [0x35, 0xb7, 0x79],
    [0x6e, 0xce, 0x58],
    [0xb5, 0xde, 0x2b],
    [0xfd, 0xe7, 0x25],
];

/// Renderer errors
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Cannot render empty text")]
    EmptyText,

    #[error("Text contains no renderable words")]
    NoWords,

    #[error("Font unavailable: {0}")]
    FontUnavailable(String),

    #[error("Invalid font: {0}")]
    Font(String),

    #[error("Invalid render option: {0}")]
    InvalidOption(String),

    #[error("Image encoding failed: {0}")]
    Encode(String),
}

/// Canvas and layout parameters for one render
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub background: Rgba<u8>,
    pub max_words: usize,
    pub min_font_size: f32,
    pub max_font_size: Option<f32>,
    pub relative_scaling: f32,
    pub prefer_horizontal: f32,
    pub seed: Option<u64>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
            background: Rgba([255, 255, 255, 255]),
            max_words: 200,
            min_font_size: 4.0,
            max_font_size: None,
            relative_scaling: 0.5,
            prefer_horizontal: 0.9,
            seed: None,
        }
    }
}

impl RenderOptions {
    pub fn from_config(config: &RenderConfig) -> Result<Self, RenderError> {
        let background = parse_color(&config.background).ok_or_else(|| {
            RenderError::InvalidOption(format!("unknown background colour '{}'", config.background))
        })?;

        Ok(Self {
            width: config.width,
            height: config.height,
            background,
            max_words: config.max_words,
            min_font_size: config.min_font_size,
            max_font_size: config.max_font_size,
            relative_scaling: config.relative_scaling,
            prefer_horizontal: config.prefer_horizontal,
            seed: config.seed,
        })
    }
}

/// Parse `#rgb`, `#rrggbb`, `#rrggbbaa` or a basic colour name
pub fn parse_color(value: &str) -> Option<Rgba<u8>> {
    let value = value.trim().to_lowercase();

    let named = match value.as_str() {
        "white" => Some([255, 255, 255, 255]),
        "black" => Some([0, 0, 0, 255]),
        "transparent" => Some([0, 0, 0, 0]),
        "gray" | "grey" => Some([128, 128, 128, 255]),
        "red" => Some([255, 0, 0, 255]),
        "green" => Some([0, 128, 0, 255]),
        "blue" => Some([0, 0, 255, 255]),
        "yellow" => Some([255, 255, 0, 255]),
        "navy" => Some([0, 0, 128, 255]),
        "ivory" => Some([255, 255, 240, 255]),
        _ => None,
    };
    if let Some(rgba) = named {
        return Some(Rgba(rgba));
    }

    let hex = value.strip_prefix('#')?;
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        3 => {
            let mut rgba = [255u8; 4];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                rgba[i] = v * 17;
            }
            Some(Rgba(rgba))
        }
        6 => Some(Rgba([channel(0)?, channel(2)?, channel(4)?, 255])),
        8 => Some(Rgba([channel(0)?, channel(2)?, channel(4)?, channel(6)?])),
        _ => None,
    }
}

/// A rendered word cloud
#[derive(Debug, Clone)]
pub struct Artifact {
    pub image: RgbaImage,
    pub background: Rgba<u8>,
    pub words_placed: usize,
}

impl Artifact {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Draw the canvas into a larger display frame
    ///
    /// The canvas is scaled bilinearly to the largest size that fits while
    /// keeping its aspect ratio, and centred on the background colour.
    pub fn framed(&self, frame_width: u32, frame_height: u32) -> RgbaImage {
        let frame_width = frame_width.max(1);
        let frame_height = frame_height.max(1);
        let scale = (frame_width as f32 / self.width() as f32)
            .min(frame_height as f32 / self.height() as f32);
        let scaled_width = ((self.width() as f32 * scale).round() as u32).clamp(1, frame_width);
        let scaled_height = ((self.height() as f32 * scale).round() as u32).clamp(1, frame_height);

        let scaled = imageops::resize(&self.image, scaled_width, scaled_height, FilterType::Triangle);

        let mut frame = RgbaImage::from_pixel(frame_width, frame_height, self.background);
        let x = (frame_width - scaled_width) / 2;
        let y = (frame_height - scaled_height) / 2;
        imageops::overlay(&mut frame, &scaled, x as i64, y as i64);
        frame
    }
}

/// Encode an image as PNG bytes
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, RenderError> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(bytes)
}

/// Produces an artifact from normalized text
pub trait ArtifactRenderer: Send + Sync {
    fn render(&self, text: &NormalizedText, options: &RenderOptions) -> Result<Artifact, RenderError>;
}

/// Frequency-based word-cloud renderer
pub struct WordCloudRenderer {
    font: FontArc,
    stopwords: Stopwords,
}

impl WordCloudRenderer {
    pub fn new(font: FontArc, stopwords: Stopwords) -> Self {
        Self { font, stopwords }
    }

    /// Load the font and stopwords named by the config
    pub fn from_config(config: &RenderConfig) -> Result<Self, RenderError> {
        let font = fonts::load_font(config.font_path.as_deref())?;
        let stopwords = Stopwords::english().with_extra(&config.extra_stopwords);
        Ok(Self::new(font, stopwords))
    }

    fn draw_word(&self, canvas: &mut RgbaImage, placed: &PlacedWord, color: Rgba<u8>) {
        // unrotated text box: text_w x text_h
        let text_w = match placed.orientation {
            Orientation::Horizontal => placed.width,
            Orientation::Vertical => placed.height,
        } as i32;

        for glyph in layout_glyphs(&self.font, &placed.word, placed.font_size) {
            let Some(outlined) = self.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();

            outlined.draw(|gx, gy, coverage| {
                let lx = bounds.min.x as i32 + gx as i32;
                let ly = bounds.min.y as i32 + gy as i32;
                let (cx, cy) = match placed.orientation {
                    Orientation::Horizontal => (placed.x as i32 + lx, placed.y as i32 + ly),
                    Orientation::Vertical => {
                        (placed.x as i32 + ly, placed.y as i32 + (text_w - 1 - lx))
                    }
                };
                if cx < 0 || cy < 0 || cx >= canvas.width() as i32 || cy >= canvas.height() as i32 {
                    return;
                }
                let pixel = canvas.get_pixel_mut(cx as u32, cy as u32);
                blend(pixel, color, coverage);
            });
        }
    }
}

/// Weighted words to lay out, or the reason there is nothing to draw
fn candidate_words(
    text: &NormalizedText,
    options: &RenderOptions,
    stopwords: &Stopwords,
) -> Result<Vec<WordFrequency>, RenderError> {
    if text.is_blank() {
        return Err(RenderError::EmptyText);
    }
    if options.width == 0 || options.height == 0 {
        return Err(RenderError::InvalidOption(format!(
            "canvas must be non-empty, got {}x{}",
            options.width, options.height
        )));
    }

    let words = word_frequencies(text.as_str(), stopwords, options.max_words);
    if words.is_empty() {
        return Err(RenderError::NoWords);
    }
    Ok(words)
}

impl ArtifactRenderer for WordCloudRenderer {
    fn render(&self, text: &NormalizedText, options: &RenderOptions) -> Result<Artifact, RenderError> {
        let words = candidate_words(text, options, &self.stopwords)?;

        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let layout_options = LayoutOptions {
            width: options.width,
            height: options.height,
            max_font_size: options.max_font_size.unwrap_or(options.height as f32),
            min_font_size: options.min_font_size,
            font_step: 2.0,
            relative_scaling: options.relative_scaling,
            prefer_horizontal: options.prefer_horizontal,
            margin: 2,
        };

        let measurer = FontMeasurer(&self.font);
        let placed = layout_words(&words, &measurer, &layout_options, &mut rng);
        if placed.is_empty() {
            return Err(RenderError::NoWords);
        }

        let mut canvas = RgbaImage::from_pixel(options.width, options.height, options.background);
        for word in &placed {
            let [r, g, b] = PALETTE[rng.gen_range(0..PALETTE.len())];
            self.draw_word(&mut canvas, word, Rgba([r, g, b, 255]));
        }

        tracing::debug!(
            candidates = words.len(),
            placed = placed.len(),
            width = options.width,
            height = options.height,
            "Rendered word cloud"
        );

        Ok(Artifact {
            image: canvas,
            background: options.background,
            words_placed: placed.len(),
        })
    }
}

/// Measures words with the loaded font
struct FontMeasurer<'a>(&'a FontArc);

impl TextMeasurer for FontMeasurer<'_> {
    fn measure(&self, word: &str, font_size: f32) -> (u32, u32) {
        let scaled = self.0.as_scaled(PxScale::from(font_size));
        let width = advance_width(self.0, word, font_size);
        let height = scaled.ascent() - scaled.descent();
        (width.ceil() as u32, height.ceil() as u32)
    }
}

/// Position glyphs on a baseline at `ascent`, starting at x = 0
fn layout_glyphs(font: &FontArc, word: &str, font_size: f32) -> Vec<Glyph> {
    let scaled = font.as_scaled(PxScale::from(font_size));
    let mut glyphs = Vec::with_capacity(word.len());
    let mut caret = 0.0;
    let mut previous = None;

    for c in word.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, id);
        }
        glyphs.push(id.with_scale_and_position(font_size, point(caret, scaled.ascent())));
        caret += scaled.h_advance(id);
        previous = Some(id);
    }

    glyphs
}

fn advance_width(font: &FontArc, word: &str, font_size: f32) -> f32 {
    let scaled = font.as_scaled(PxScale::from(font_size));
    let mut width = 0.0;
    let mut previous = None;
    for c in word.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = previous {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        previous = Some(id);
    }
    width
}

fn blend(pixel: &mut Rgba<u8>, color: Rgba<u8>, coverage: f32) {
    let coverage = coverage.clamp(0.0, 1.0);
    for i in 0..3 {
        let base = pixel.0[i] as f32;
        let top = color.0[i] as f32;
        pixel.0[i] = (base + (top - base) * coverage).round() as u8;
    }
    let alpha = pixel.0[3] as f32;
    pixel.0[3] = (alpha + (255.0 - alpha) * coverage).round() as u8;
}
