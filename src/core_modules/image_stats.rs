// THEORY:
// The `image_stats` module is the analysis half of the narrative generator.
// It makes a single deterministic pass over the frame and produces three
// independent statistics:
//
// 1.  **Dominant colors**: every pixel's channels are folded into 32-wide
//     buckets and the three most frequent buckets win. Ties break by
//     ascending (r, g, b) so the top-3 list is stable.
// 2.  **Mean brightness**, classified dark / medium / bright.
// 3.  **Edge density**: the fraction of pixels whose brightness differs from
//     a 4-neighbor by more than a fixed threshold. Each right/bottom pair is
//     examined once, so every neighbor relation is visited exactly once.
//
// Classification is all fixed constants, first-match-wins. The randomness of
// the story lives entirely in the word choice downstream; everything here is
// reproducible from the pixels alone.

use crate::core_modules::frame::ImageFrame;
use crate::core_modules::pixel::pixel::{Brightness, Channel};
use serde::Serialize;
use std::collections::HashMap;

/// Brightness below this is "dark".
pub const DARK_BRIGHTNESS_MAX: Brightness = 85.0;
/// Brightness above this is "bright".
pub const BRIGHT_BRIGHTNESS_MIN: Brightness = 170.0;

/// A neighbor brightness difference above this marks an edge pixel.
pub const EDGE_THRESHOLD: Brightness = 30.0;
/// Edge density at or below this is "low".
pub const LOW_EDGE_DENSITY_MAX: f64 = 0.05;
/// Edge density at or below this (and above low) is "medium".
pub const MEDIUM_EDGE_DENSITY_MAX: f64 = 0.15;

/// How many dominant colors the stats report.
pub const DOMINANT_COLOR_COUNT: usize = 3;

/// Overall tone of the image, by mean brightness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BrightnessClass {
    Dark,
    Medium,
    Bright,
}

impl BrightnessClass {
    pub fn from_brightness(brightness: Brightness) -> Self {
        if brightness < DARK_BRIGHTNESS_MAX {
            Self::Dark
        } else if brightness > BRIGHT_BRIGHTNESS_MIN {
            Self::Bright
        } else {
            Self::Medium
        }
    }
}

/// Visual busyness of the image, by edge density.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EdgeDensityClass {
    Low,
    Medium,
    High,
}

impl EdgeDensityClass {
    pub fn from_density(density: f64) -> Self {
        if density <= LOW_EDGE_DENSITY_MAX {
            Self::Low
        } else if density <= MEDIUM_EDGE_DENSITY_MAX {
            Self::Medium
        } else {
            Self::High
        }
    }
}

/// Named color family of a dominant bucket. First matching rule wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColorClass {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    Black,
    White,
    Mystical,
}

impl ColorClass {
    /// Ordered channel-dominance rules: red > others, blue > others,
    /// green > others, then the threshold rules for yellow, purple,
    /// black and white. Anything left is mystical.
    pub fn classify(red: Channel, green: Channel, blue: Channel) -> Self {
        if red > green && red > blue {
            Self::Red
        } else if blue > red && blue > green {
            Self::Blue
        } else if green > red && green > blue {
            Self::Green
        } else if red > 150 && green > 150 && blue < 100 {
            Self::Yellow
        } else if red > 100 && blue > 100 && green < 100 {
            Self::Purple
        } else if red < 50 && green < 50 && blue < 50 {
            Self::Black
        } else if red > 200 && green > 200 && blue > 200 {
            Self::White
        } else {
            Self::Mystical
        }
    }
}

/// One quantized color bucket that made the top-3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DominantColor {
    /// Bucket base values per channel (multiples of 32).
    pub red: Channel,
    pub green: Channel,
    pub blue: Channel,
    /// How many pixels fell into this bucket.
    pub pixel_count: usize,
    /// The bucket's color family.
    pub class: ColorClass,
}

/// The full statistics package for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageStats {
    /// Up to three dominant buckets, most frequent first.
    pub dominant_colors: Vec<DominantColor>,
    /// Mean brightness over every pixel, in [0, 255].
    pub mean_brightness: Brightness,
    /// Fraction of pixels that sit on an edge, in [0, 1].
    pub edge_density: f64,
    pub brightness_class: BrightnessClass,
    pub edge_density_class: EdgeDensityClass,
}

/// Analyze a frame in one pass per statistic.
pub fn analyze(frame: &ImageFrame<'_>) -> ImageStats {
    let mean_brightness = mean_brightness(frame);
    let edge_density = edge_density(frame);
    ImageStats {
        dominant_colors: dominant_colors(frame),
        mean_brightness,
        edge_density,
        brightness_class: BrightnessClass::from_brightness(mean_brightness),
        edge_density_class: EdgeDensityClass::from_density(edge_density),
    }
}

fn mean_brightness(frame: &ImageFrame<'_>) -> Brightness {
    let mut sum = 0.0;
    for y in 0..frame.height() {
        for x in 0..frame.width() {
            sum += frame.brightness_at(x, y);
        }
    }
    sum / frame.pixel_count() as Brightness
}

fn dominant_colors(frame: &ImageFrame<'_>) -> Vec<DominantColor> {
    let mut buckets: HashMap<(Channel, Channel, Channel), usize> = HashMap::new();
    for y in 0..frame.height() {
        for x in 0..frame.width() {
            *buckets.entry(frame.pixel(x, y).quantized()).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<_> = buckets.into_iter().collect();
    // Most frequent first; ties break by ascending channel values.
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(DOMINANT_COLOR_COUNT)
        .map(|((red, green, blue), pixel_count)| DominantColor {
            red,
            green,
            blue,
            pixel_count,
            class: ColorClass::classify(red, green, blue),
        })
        .collect()
}

fn edge_density(frame: &ImageFrame<'_>) -> f64 {
    let mut edge_pixels = 0usize;
    for y in 0..frame.height() {
        for x in 0..frame.width() {
            let brightness = frame.brightness_at(x, y);
            let right_edge = x + 1 < frame.width()
                && (brightness - frame.brightness_at(x + 1, y)).abs() > EDGE_THRESHOLD;
            let down_edge = y + 1 < frame.height()
                && (brightness - frame.brightness_at(x, y + 1)).abs() > EDGE_THRESHOLD;
            if right_edge || down_edge {
                edge_pixels += 1;
            }
        }
    }
    edge_pixels as f64 / frame.pixel_count() as f64
}
