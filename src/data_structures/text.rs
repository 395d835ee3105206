//! Extruded 3D text geometry.
//!
//! Each glyph outline becomes a closed solid: the filled outline is tessellated
//! into a back cap at `z = 0` and a front cap at `z = depth`, and every outline
//! edge contributes one side quad. Vertices are not shared between faces so every
//! face keeps a flat normal.

use anyhow::anyhow;
use lyon_tessellation::{
    BuffersBuilder, FillOptions, FillRule, FillTessellator, FillVertex, VertexBuffers, math::point,
    path::Path,
};

use crate::{
    config::TitleConfig,
    data_structures::model::{Mesh, ModelVertex},
    resources::font::{Font, GlyphOutline},
};

/// Builds the extruded mesh of `settings.text` set in `font`. The mesh uses
/// material slot 0.
pub fn build_text_mesh(font: &Font, settings: &TitleConfig) -> anyhow::Result<Mesh> {
    let glyphs = font.generate_outlines(&settings.text, settings.size, settings.curve_segments);
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    for glyph in glyphs.iter() {
        extrude_glyph(glyph, settings.depth, &mut vertices, &mut indices)?;
    }
    Ok(Mesh::new(&settings.text, vertices, indices, 0))
}

/// Appends the solid of one glyph to `vertices`/`indices`.
pub fn extrude_glyph(
    glyph: &GlyphOutline,
    depth: f32,
    vertices: &mut Vec<ModelVertex>,
    indices: &mut Vec<u32>,
) -> anyhow::Result<()> {
    let contours: Vec<&Vec<[f32; 2]>> = glyph
        .contours
        .iter()
        .filter(|contour| contour.len() >= 3)
        .collect();
    if contours.is_empty() {
        return Ok(());
    }

    let mut builder = Path::builder();
    for contour in contours.iter() {
        builder.begin(point(contour[0][0], contour[0][1]));
        for p in contour.iter().skip(1) {
            builder.line_to(point(p[0], p[1]));
        }
        builder.end(true);
    }
    let path = builder.build();

    let mut cap: VertexBuffers<[f32; 2], u32> = VertexBuffers::new();
    FillTessellator::new()
        .tessellate_path(
            &path,
            &FillOptions::tolerance(0.001).with_fill_rule(FillRule::EvenOdd),
            &mut BuffersBuilder::new(&mut cap, |vertex: FillVertex| vertex.position().to_array()),
        )
        .map_err(|e| anyhow!("Glyph tessellation failed: {:?}", e))?;

    // back cap, facing -z
    let back = vertices.len() as u32;
    vertices.extend(cap.vertices.iter().map(|&[x, y]| ModelVertex {
        position: [x, y, 0.0],
        tex_coords: [x, y],
        normal: [0.0, 0.0, -1.0],
    }));
    for tri in cap.indices.chunks_exact(3) {
        indices.extend([back + tri[0], back + tri[2], back + tri[1]]);
    }

    // front cap, facing +z
    let front = vertices.len() as u32;
    vertices.extend(cap.vertices.iter().map(|&[x, y]| ModelVertex {
        position: [x, y, depth],
        tex_coords: [x, y],
        normal: [0.0, 0.0, 1.0],
    }));
    indices.extend(cap.indices.iter().map(|i| front + i));

    for contour in contours.iter() {
        for (i, from) in contour.iter().enumerate() {
            let to = &contour[(i + 1) % contour.len()];
            add_side(&contours, *from, *to, depth, vertices, indices);
        }
    }
    Ok(())
}

fn add_side(
    contours: &[&Vec<[f32; 2]>],
    from: [f32; 2],
    to: [f32; 2],
    depth: f32,
    vertices: &mut Vec<ModelVertex>,
    indices: &mut Vec<u32>,
) {
    let dx = to[0] - from[0];
    let dy = to[1] - from[1];
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1e-6 {
        return;
    }
    let mut normal = [dy / len, -dx / len];
    // the normal has to leave the filled area
    let probe = [
        (from[0] + to[0]) * 0.5 + normal[0] * len * 1e-3,
        (from[1] + to[1]) * 0.5 + normal[1] * len * 1e-3,
    ];
    if is_inside(contours, probe) {
        normal = [-normal[0], -normal[1]];
    }
    let normal = [normal[0], normal[1], 0.0];

    let base = vertices.len() as u32;
    vertices.extend([
        ModelVertex {
            position: [from[0], from[1], 0.0],
            tex_coords: [0.0, 0.0],
            normal,
        },
        ModelVertex {
            position: [to[0], to[1], 0.0],
            tex_coords: [len, 0.0],
            normal,
        },
        ModelVertex {
            position: [to[0], to[1], depth],
            tex_coords: [len, depth],
            normal,
        },
        ModelVertex {
            position: [from[0], from[1], depth],
            tex_coords: [0.0, depth],
            normal,
        },
    ]);
    indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
}

/// Even-odd point in polygon test over all contours of a glyph.
fn is_inside(contours: &[&Vec<[f32; 2]>], p: [f32; 2]) -> bool {
    let mut inside = false;
    for contour in contours {
        let n = contour.len();
        for i in 0..n {
            let a = contour[i];
            let b = contour[(i + n - 1) % n];
            if (a[1] > p[1]) != (b[1] > p[1])
                && p[0] < (b[0] - a[0]) * (p[1] - a[1]) / (b[1] - a[1]) + a[0]
            {
                inside = !inside;
            }
        }
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> GlyphOutline {
        GlyphOutline {
            contours: vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]],
        }
    }

    #[test]
    fn square_extrudes_into_a_closed_box() {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        extrude_glyph(&square(), 0.2, &mut vertices, &mut indices).unwrap();

        // two caps of two triangles, four sides of two triangles
        assert_eq!(indices.len(), (2 * 2 + 4 * 2) * 3);
        assert!(vertices.iter().all(|v| v.position[2] == 0.0 || v.position[2] == 0.2));
    }

    #[test]
    fn side_normals_point_outwards() {
        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        extrude_glyph(&square(), 0.2, &mut vertices, &mut indices).unwrap();

        for v in vertices.iter().filter(|v| v.normal[2] == 0.0) {
            let [x, y, _] = v.position;
            let [nx, ny, _] = v.normal;
            // the centre of the square lies behind every side
            assert!((0.5 - x) * nx + (0.5 - y) * ny < 0.0);
        }
    }
}
