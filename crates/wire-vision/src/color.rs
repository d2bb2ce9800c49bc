//! Color sampling and perceptual reconciliation.
//!
//! All similarity decisions go through [`perceptual_distance`], a CIE76 delta E
//! computed in CIE Lab (D65).

use anyhow::{bail, Context, Result};
use image::{Rgba, RgbaImage};
use palette::{white_point::D65, FromColor, Lab, Srgb};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use wire_data::Thresholds;

use crate::projection::ink_mask;

/// An opaque sRGB color, displayed as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HexColor(pub [u8; 3]);

impl HexColor {
    pub const BLACK: HexColor = HexColor([0, 0, 0]);
    pub const WHITE: HexColor = HexColor([255, 255, 255]);

    pub fn from_rgba(px: &Rgba<u8>) -> Self {
        HexColor([px[0], px[1], px[2]])
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        let [r, g, b] = self.0;
        Rgba([r, g, b, 255])
    }

    fn lab(self) -> Lab<D65, f32> {
        let [r, g, b] = self.0;
        let srgb = Srgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
        Lab::from_color(srgb)
    }

    fn from_lab(lab: Lab<D65, f32>) -> Self {
        let rgb: Srgb<u8> = Srgb::from_color(lab).into_format();
        HexColor([rgb.red, rgb.green, rgb.blue])
    }
}

impl fmt::Display for HexColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{:02x}{:02x}{:02x}", r, g, b)
    }
}

impl FromStr for HexColor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            bail!("Invalid hex color '{}'", s);
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .with_context(|| format!("Invalid hex color '{}'", s))
        };
        Ok(HexColor([channel(0)?, channel(2)?, channel(4)?]))
    }
}

impl Serialize for HexColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for HexColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Approximate the local background fill by the top-left pixel.
pub fn sample_background(region: &RgbaImage) -> HexColor {
    if region.width() == 0 || region.height() == 0 {
        return HexColor::WHITE;
    }
    HexColor::from_rgba(region.get_pixel(0, 0))
}

/// Most common of the four corner pixels. Without a clear winner
/// (no repeat, or a 2-2 split) the top-left corner is used.
pub fn corner_majority(region: &RgbaImage) -> HexColor {
    let (w, h) = region.dimensions();
    if w == 0 || h == 0 {
        return HexColor::WHITE;
    }
    let corners = [
        HexColor::from_rgba(region.get_pixel(0, 0)),
        HexColor::from_rgba(region.get_pixel(w - 1, 0)),
        HexColor::from_rgba(region.get_pixel(0, h - 1)),
        HexColor::from_rgba(region.get_pixel(w - 1, h - 1)),
    ];

    let mut counts: Vec<(HexColor, usize)> = Vec::new();
    for c in corners {
        match counts.iter_mut().find(|(k, _)| *k == c) {
            Some((_, n)) => *n += 1,
            None => counts.push((c, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let best = counts[0];
    let contested = counts.get(1).is_some_and(|second| second.1 == best.1);
    if best.1 >= 2 && !contested {
        best.0
    } else {
        corners[0]
    }
}

/// The `k`-th most frequent color of a region (0 = dominant).
///
/// Small regions are too sparse for an exact histogram to be meaningful, so
/// below `cluster_population` pixels the colors are first grouped into
/// `cluster_bin`-wide buckets and each bucket reports its mean color.
pub fn dominant_color(region: &RgbaImage, k: usize, thresholds: &Thresholds) -> HexColor {
    let population = region.width() as usize * region.height() as usize;
    if population == 0 {
        return HexColor::WHITE;
    }

    let mut ranked: Vec<(usize, HexColor)> = if population < thresholds.cluster_population {
        let bin = thresholds.cluster_bin.max(1);
        let mut clusters: HashMap<[u8; 3], (usize, [u64; 3])> = HashMap::new();
        for px in region.pixels() {
            let key = [px[0] / bin, px[1] / bin, px[2] / bin];
            let entry = clusters.entry(key).or_insert((0, [0; 3]));
            entry.0 += 1;
            for c in 0..3 {
                entry.1[c] += px[c] as u64;
            }
        }
        clusters
            .into_values()
            .map(|(n, sums)| {
                let mean = |c: usize| (sums[c] as f64 / n as f64).round() as u8;
                (n, HexColor([mean(0), mean(1), mean(2)]))
            })
            .collect()
    } else {
        let mut histogram: HashMap<HexColor, usize> = HashMap::new();
        for px in region.pixels() {
            *histogram.entry(HexColor::from_rgba(px)).or_insert(0) += 1;
        }
        histogram.into_iter().map(|(c, n)| (n, c)).collect()
    };

    ranked.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    ranked[k.min(ranked.len() - 1)].1
}

/// Color of the glyph strokes in a text region.
///
/// Ink pixels come from an Otsu binarization. The second ink pixel in scan
/// order is preferred over the first, which tends to be an anti-aliased edge.
/// Falls back to black when the region holds no ink at all.
pub fn text_ink_color(region: &RgbaImage) -> HexColor {
    let mask = ink_mask(region);
    let mut found = mask
        .enumerate_pixels()
        .filter(|(_, _, p)| p[0] > 0)
        .map(|(x, y, _)| (x, y));

    let first = found.next();
    let second = found.next();
    match second.or(first) {
        Some((x, y)) => HexColor::from_rgba(region.get_pixel(x, y)),
        None => HexColor::BLACK,
    }
}

/// CIE76 delta E between two colors.
pub fn perceptual_distance(c1: HexColor, c2: HexColor) -> f64 {
    let (a, b) = (c1.lab(), c2.lab());
    let dl = (a.l - b.l) as f64;
    let da = (a.a - b.a) as f64;
    let db = (a.b - b.b) as f64;
    (dl * dl + da * da + db * db).sqrt()
}

/// Collapse two near-identical colors onto the first one.
pub fn liken(c1: HexColor, c2: HexColor, threshold: f64) -> (HexColor, HexColor) {
    if perceptual_distance(c1, c2) < threshold {
        (c1, c1)
    } else {
        (c1, c2)
    }
}

/// Push `c2` away from `c1` when the two are too close to read against each other.
///
/// The lightness of `c2` moves away from `c1` (darker if it already is darker,
/// lighter otherwise) until the gap reaches `differentiate_margin`. If the
/// lightness range runs out the other direction is tried, and as a last resort
/// black or white is returned, whichever is farther from `c1`.
pub fn differentiate(c1: HexColor, c2: HexColor, thresholds: &Thresholds) -> (HexColor, HexColor) {
    if perceptual_distance(c1, c2) >= thresholds.differentiate_threshold {
        return (c1, c2);
    }

    let margin = thresholds.differentiate_margin;
    let step = thresholds.lightness_step.max(0.5) as f32;
    let start = c2.lab();
    let first = if start.l <= c1.lab().l { -1.0 } else { 1.0 };

    for direction in [first, -first] {
        let mut lab = start;
        loop {
            lab.l += direction * step;
            if !(0.0..=100.0).contains(&lab.l) {
                break;
            }
            let candidate = HexColor::from_lab(lab);
            if perceptual_distance(c1, candidate) >= margin {
                return (c1, candidate);
            }
        }
    }

    if perceptual_distance(c1, HexColor::BLACK) >= perceptual_distance(c1, HexColor::WHITE) {
        (c1, HexColor::BLACK)
    } else {
        (c1, HexColor::WHITE)
    }
}
