//! Word-cloud placement
//!
//! Words are placed largest first. Each word gets a font size derived from
//! the previous word's size and the frequency ratio (`relative_scaling`),
//! then candidate centres are walked along an elliptical Archimedean spiral
//! from a random start until the word's bounding box fits in free space.
//! A word that fits nowhere is retried in the other orientation, then
//! shrunk by `font_step` until `min_font_size`, and finally skipped.
//!
//! Free space is tracked per pixel with a summed-area table so each
//! candidate costs O(1).

use rand::Rng;

use super::word_frequency::WordFrequency;

/// Stop after this many words in a row could not be placed at all
const MAX_CONSECUTIVE_MISSES: usize = 10;

/// Measures text set horizontally
pub trait TextMeasurer {
    /// Width and height in pixels of `word` at `font_size`
    fn measure(&self, word: &str, font_size: f32) -> (u32, u32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    /// Rotated 90° counter-clockwise (reads bottom to top)
    Vertical,
}

impl Orientation {
    fn flipped(self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

/// A word with its final position on the canvas
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedWord {
    pub word: String,
    pub font_size: f32,
    pub orientation: Orientation,
    /// Top-left corner of the bounding box on the canvas
    pub x: u32,
    pub y: u32,
    /// Bounding box size on the canvas (already rotated)
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct LayoutOptions {
    pub width: u32,
    pub height: u32,
    pub max_font_size: f32,
    pub min_font_size: f32,
    pub font_step: f32,
    pub relative_scaling: f32,
    pub prefer_horizontal: f32,
    /// Empty pixels kept around each word
    pub margin: u32,
}

/// Pixel occupancy with a summed-area table for O(1) rectangle queries
struct OccupancyGrid {
    width: u32,
    height: u32,
    cells: Vec<bool>,
    // (width + 1) * (height + 1), row-major
    integral: Vec<u32>,
}

impl OccupancyGrid {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![false; (width * height) as usize],
            integral: vec![0; ((width + 1) * (height + 1)) as usize],
        }
    }

    fn is_free(&self, x: u32, y: u32, w: u32, h: u32) -> bool {
        if x + w > self.width || y + h > self.height {
            return false;
        }
        let stride = self.width + 1;
        let at = |cx: u32, cy: u32| self.integral[(cy * stride + cx) as usize] as i64;
        let sum = at(x + w, y + h) - at(x, y + h) - at(x + w, y) + at(x, y);
        sum == 0
    }

    fn occupy(&mut self, x: u32, y: u32, w: u32, h: u32) {
        let x_end = (x + w).min(self.width);
        let y_end = (y + h).min(self.height);
        for cy in y..y_end {
            for cx in x..x_end {
                self.cells[(cy * self.width + cx) as usize] = true;
            }
        }
        self.rebuild_from_row(y);
    }

    fn rebuild_from_row(&mut self, first_row: u32) {
        let stride = self.width + 1;
        for cy in first_row..self.height {
            let mut row_sum = 0u32;
            for cx in 0..self.width {
                if self.cells[(cy * self.width + cx) as usize] {
                    row_sum += 1;
                }
                let above = self.integral[(cy * stride + cx + 1) as usize];
                self.integral[((cy + 1) * stride + cx + 1) as usize] = above + row_sum;
            }
        }
    }
}

/// Lay out `words` (most frequent first) on the canvas
pub fn layout_words<R: Rng>(
    words: &[WordFrequency],
    measurer: &dyn TextMeasurer,
    options: &LayoutOptions,
    rng: &mut R,
) -> Vec<PlacedWord> {
    let mut grid = OccupancyGrid::new(options.width, options.height);
    let mut placed = Vec::with_capacity(words.len());

    let min_size = options.min_font_size.max(1.0);
    let step = options.font_step.max(1.0);
    let mut font_size = options.max_font_size.max(min_size);
    let mut last_weight: Option<f32> = None;
    let mut misses = 0;

    for word in words {
        if let Some(last) = last_weight {
            let rs = options.relative_scaling;
            if rs != 0.0 && last > 0.0 {
                font_size = ((rs * (word.weight / last) + (1.0 - rs)) * font_size).round();
            }
        }

        let preferred = if rng.gen::<f32>() < options.prefer_horizontal {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };

        let mut size = font_size;
        let mut result = None;
        while size >= min_size {
            result = try_place(&word.word, size, preferred, &grid, measurer, options, rng);
            if result.is_none() && options.prefer_horizontal < 1.0 {
                result = try_place(&word.word, size, preferred.flipped(), &grid, measurer, options, rng);
            }
            if result.is_some() {
                break;
            }
            size -= step;
        }

        match result {
            Some(word_box) => {
                grid.occupy(
                    word_box.x.saturating_sub(options.margin),
                    word_box.y.saturating_sub(options.margin),
                    word_box.width + 2 * options.margin,
                    word_box.height + 2 * options.margin,
                );
                font_size = word_box.font_size;
                placed.push(word_box);
                misses = 0;
            }
            None => {
                tracing::trace!(word = %word.word, "No room for word");
                misses += 1;
                if misses >= MAX_CONSECUTIVE_MISSES {
                    break;
                }
            }
        }

        last_weight = Some(word.weight);
    }

    placed
}

fn try_place<R: Rng>(
    word: &str,
    font_size: f32,
    orientation: Orientation,
    grid: &OccupancyGrid,
    measurer: &dyn TextMeasurer,
    options: &LayoutOptions,
    rng: &mut R,
) -> Option<PlacedWord> {
    let (text_w, text_h) = measurer.measure(word, font_size);
    if text_w == 0 || text_h == 0 {
        return None;
    }
    let (w, h) = match orientation {
        Orientation::Horizontal => (text_w, text_h),
        Orientation::Vertical => (text_h, text_w),
    };
    if w > options.width || h > options.height {
        return None;
    }

    let (x, y) = spiral_search(w, h, grid, options, rng)?;

    Some(PlacedWord {
        word: word.to_string(),
        font_size,
        orientation,
        x,
        y,
        width: w,
        height: h,
    })
}

/// Walk an elliptical spiral from a random start near the centre
fn spiral_search<R: Rng>(
    w: u32,
    h: u32,
    grid: &OccupancyGrid,
    options: &LayoutOptions,
    rng: &mut R,
) -> Option<(u32, u32)> {
    let canvas_w = options.width as f32;
    let canvas_h = options.height as f32;
    let ratio = canvas_w / canvas_h;

    let start_x = canvas_w * rng.gen_range(0.35..0.65);
    let start_y = canvas_h * rng.gen_range(0.35..0.65);

    let mut theta: f32 = 0.0;
    loop {
        let radius = theta;
        // the ellipse now covers the whole canvas from any start
        if radius > canvas_h && ratio * radius > canvas_w {
            return None;
        }

        let cx = start_x + ratio * radius * theta.cos();
        let cy = start_y + radius * theta.sin();
        let left = cx - w as f32 / 2.0;
        let top = cy - h as f32 / 2.0;

        if left >= 0.0 && top >= 0.0 {
            let (x, y) = (left as u32, top as u32);
            if grid.is_free(x, y, w, h) {
                return Some((x, y));
            }
        }

        // about 2px of arc per step
        theta += 2.0 / radius.max(1.0);
    }
}
