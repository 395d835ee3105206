use food_art_scene::{
    config::TitleConfig,
    data_structures::text::build_text_mesh,
    resources::font::{Font, load_font},
};

use crate::common::test_utils::{SQUARE_FONT, approx_eq, capture_logs, square_font};

mod common;

#[test]
fn font_metadata_is_parsed() {
    let font = square_font();
    assert_eq!(font.family_name, "Square");
    assert_eq!(font.resolution, 100.0);
    assert!(font.glyph('a').is_some());
    assert!(font.glyph('z').is_none());
    // (yMax - yMin + underline) * size / resolution
    assert!(approx_eq(font.line_height(1.0), 1.2));
}

#[test]
fn invalid_fonts_are_rejected() {
    assert!(Font::from_json("{").is_err());
    assert!(Font::from_json(&SQUARE_FONT.replace("\"resolution\": 100", "\"resolution\": 0")).is_err());
}

#[test]
fn glyphs_advance_by_their_width() {
    let font = square_font();
    let outlines = font.generate_outlines("aa", 1.0, 12);

    assert_eq!(outlines.len(), 2);
    let first = &outlines[0].contours[0];
    let second = &outlines[1].contours[0];
    assert_eq!(first.len(), 4);
    for (a, b) in first.iter().zip(second.iter()) {
        assert!(approx_eq(b[0] - a[0], 1.2));
        assert!(approx_eq(b[1], a[1]));
    }
}

#[test]
fn newline_moves_down_one_line() {
    let font = square_font();
    let outlines = font.generate_outlines("a\na", 2.0, 12);

    assert_eq!(outlines.len(), 2);
    let first = outlines[0].contours[0][0];
    let second = outlines[1].contours[0][0];
    assert!(approx_eq(second[0], first[0]));
    assert!(approx_eq(second[1], first[1] - font.line_height(2.0)));
}

#[test]
fn missing_glyphs_fall_back_to_question_mark() {
    let font = square_font();
    let outlines = font.generate_outlines("z", 1.0, 12);
    assert_eq!(outlines.len(), 1);
    // the fallback glyph is half the size of `a`
    let max_x = outlines[0].contours[0].iter().map(|p| p[0]).fold(0.0, f32::max);
    assert!(approx_eq(max_x, 0.5));
}

#[test]
fn missing_glyphs_without_fallback_are_skipped() {
    let logs = capture_logs();
    let json = SQUARE_FONT.replace("\"?\"", "\"!\"");
    let font = Font::from_json(&json).expect("font is valid");

    let outlines = font.generate_outlines("aza", 1.0, 12);

    assert_eq!(outlines.len(), 2);
    assert_eq!(logs.count(log::Level::Warn), 1);
}

#[test]
fn curves_are_sampled_with_the_requested_segments() {
    let json = SQUARE_FONT.replace(
        "m 0 0 l 100 0 l 100 100 l 0 100 z",
        "m 0 0 l 100 0 l 100 100 q 0 0 0 100 z",
    );
    let font = Font::from_json(&json).expect("font is valid");

    let outlines = font.generate_outlines("a", 1.0, 5);
    // three corners plus five curve samples, the last one closes the contour
    assert_eq!(outlines[0].contours[0].len(), 3 + 5 - 1);
}

#[test]
fn text_mesh_is_extruded_to_the_requested_depth() {
    let settings = TitleConfig {
        text: "a a".to_string(),
        ..Default::default()
    };
    let mesh = build_text_mesh(&square_font(), &settings).expect("mesh built");

    let (min, max) = mesh.bounds().expect("mesh has vertices");
    assert!(approx_eq(min[2], 0.0));
    assert!(approx_eq(max[2], settings.depth));
    assert!(approx_eq(min[0], 0.0));
    // a, space, a: 1.2 + 0.6 + 1.0
    assert!(approx_eq(max[0], 2.8));
    assert!(approx_eq(max[1], 1.0));
    assert_eq!(mesh.indices.len() % 3, 0);
    assert!(mesh.indices.iter().all(|i| (*i as usize) < mesh.vertices.len()));
    assert_eq!(mesh.material, 0);
}

#[tokio::test]
async fn fonts_load_from_disk() {
    let font = load_font("../tests/fixtures/square.typeface.json")
        .await
        .expect("fixture font loads");
    assert_eq!(font.family_name, "Square");

    assert!(load_font("../tests/fixtures/missing.typeface.json").await.is_err());
}
