//! Typeface JSON fonts.
//!
//! The format stores every glyph outline as a compact command string: `m x y`
//! (move), `l x y` (line), `q x y cx cy` (quadratic curve, end point first) and
//! `b x y c1x c1y c2x c2y` (cubic curve, end point first), all in font units.

use std::collections::HashMap;

use anyhow::{Context as _, bail};
use lyon_tessellation::{
    geom::{CubicBezierSegment, QuadraticBezierSegment},
    math::point,
};
use serde::Deserialize;

use crate::resources::load_string;

#[derive(Clone, Debug, Deserialize)]
pub struct Glyph {
    /// Horizontal advance.
    pub ha: f32,
    #[serde(default)]
    pub x_min: f32,
    #[serde(default)]
    pub x_max: f32,
    /// Outline commands, missing for blank glyphs such as space.
    #[serde(default)]
    pub o: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Font {
    pub glyphs: HashMap<String, Glyph>,
    #[serde(default)]
    pub family_name: String,
    pub resolution: f32,
    #[serde(default)]
    pub bounding_box: BoundingBox,
    #[serde(default)]
    pub underline_thickness: f32,
}

/// Closed outline polygons of one glyph, already scaled and offset into text space.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlyphOutline {
    pub contours: Vec<Vec<[f32; 2]>>,
}

pub async fn load_font(path: &str) -> anyhow::Result<Font> {
    let json = load_string(path).await?;
    Font::from_json(&json).with_context(|| format!("Font {} could not be parsed", path))
}

impl Font {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let font: Font = serde_json::from_str(json)?;
        if font.resolution <= 0.0 {
            bail!("Font resolution must be positive, got {}", font.resolution);
        }
        Ok(font)
    }

    pub fn glyph(&self, c: char) -> Option<&Glyph> {
        let mut key = [0; 4];
        self.glyphs.get(&*c.encode_utf8(&mut key))
    }

    pub fn line_height(&self, size: f32) -> f32 {
        let bounds = self.bounding_box;
        (bounds.y_max - bounds.y_min + self.underline_thickness) * size / self.resolution
    }

    /// Lays out `text` starting at the origin. Characters without a glyph fall back
    /// to `?`, or are skipped with a warning if that is missing too.
    pub fn generate_outlines(&self, text: &str, size: f32, curve_segments: u32) -> Vec<GlyphOutline> {
        let scale = size / self.resolution;
        let line_height = self.line_height(size);
        let mut offset = [0.0, 0.0];
        let mut outlines = Vec::new();
        for c in text.chars() {
            if c == '\n' {
                offset = [0.0, offset[1] - line_height];
                continue;
            }
            let Some(glyph) = self.glyph(c).or_else(|| self.glyph('?')) else {
                log::warn!("Character {:?} does not exist in font family {}", c, self.family_name);
                continue;
            };
            match glyph_outline(glyph, scale, offset, curve_segments.max(1)) {
                Ok(outline) => outlines.push(outline),
                Err(e) => log::warn!("Glyph {:?} skipped: {}", c, e),
            }
            offset[0] += glyph.ha * scale;
        }
        outlines
    }
}

fn glyph_outline(
    glyph: &Glyph,
    scale: f32,
    offset: [f32; 2],
    curve_segments: u32,
) -> anyhow::Result<GlyphOutline> {
    let Some(commands) = &glyph.o else {
        return Ok(GlyphOutline::default());
    };
    let mut tokens = Tokens {
        inner: commands.split_whitespace(),
        scale,
        offset,
    };

    let mut contours: Vec<Vec<[f32; 2]>> = Vec::new();
    let mut current: Vec<[f32; 2]> = Vec::new();
    while let Some(command) = tokens.inner.next() {
        match command {
            "m" => {
                close_contour(&mut contours, std::mem::take(&mut current));
                current.push(tokens.point(command)?);
            }
            "l" => current.push(tokens.point(command)?),
            "q" => {
                let to = tokens.point(command)?;
                let ctrl = tokens.point(command)?;
                let from = *current.last().context("Curve without a start point")?;
                let segment = QuadraticBezierSegment {
                    from: point(from[0], from[1]),
                    ctrl: point(ctrl[0], ctrl[1]),
                    to: point(to[0], to[1]),
                };
                current.extend(
                    (1..=curve_segments)
                        .map(|i| segment.sample(i as f32 / curve_segments as f32).to_array()),
                );
            }
            "b" => {
                let to = tokens.point(command)?;
                let ctrl1 = tokens.point(command)?;
                let ctrl2 = tokens.point(command)?;
                let from = *current.last().context("Curve without a start point")?;
                let segment = CubicBezierSegment {
                    from: point(from[0], from[1]),
                    ctrl1: point(ctrl1[0], ctrl1[1]),
                    ctrl2: point(ctrl2[0], ctrl2[1]),
                    to: point(to[0], to[1]),
                };
                current.extend(
                    (1..=curve_segments)
                        .map(|i| segment.sample(i as f32 / curve_segments as f32).to_array()),
                );
            }
            "z" => close_contour(&mut contours, std::mem::take(&mut current)),
            other => bail!("Unknown outline command {:?}", other),
        }
    }
    close_contour(&mut contours, current);
    Ok(GlyphOutline { contours })
}

struct Tokens<'a> {
    inner: std::str::SplitWhitespace<'a>,
    scale: f32,
    offset: [f32; 2],
}

impl Tokens<'_> {
    /// Reads one `x y` pair and maps it into text space.
    fn point(&mut self, command: &str) -> anyhow::Result<[f32; 2]> {
        let mut coordinate = || -> anyhow::Result<f32> {
            self.inner
                .next()
                .with_context(|| format!("Command {} is missing coordinates", command))?
                .parse::<f32>()
                .with_context(|| format!("Command {} has a malformed coordinate", command))
        };
        let x = coordinate()?;
        let y = coordinate()?;
        Ok([
            x * self.scale + self.offset[0],
            y * self.scale + self.offset[1],
        ])
    }
}

/// Drops the duplicated closing point and keeps only real polygons.
fn close_contour(contours: &mut Vec<Vec<[f32; 2]>>, mut contour: Vec<[f32; 2]>) {
    contour.dedup_by(|a, b| (a[0] - b[0]).abs() < 1e-6 && (a[1] - b[1]).abs() < 1e-6);
    if contour.len() > 1 {
        let (first, last) = (contour[0], contour[contour.len() - 1]);
        if (first[0] - last[0]).abs() < 1e-6 && (first[1] - last[1]).abs() < 1e-6 {
            contour.pop();
        }
    }
    if contour.len() >= 3 {
        contours.push(contour);
    }
}
