use std::io::Cursor;

use food_art_scene::{
    data_structures::{
        environment::{EnvironmentMap, IRRADIANCE_SIZE, Mapping, decode_rgbe_pixel},
        scene_graph::SceneNode,
    },
    resources::{environment::load_environment, load_model_gltf, texture::decode_image},
};
use image::{DynamicImage, ImageFormat, Rgb32FImage, RgbImage};

use crate::common::test_utils::approx_eq;

mod common;

fn hdr_bytes(width: u32, height: u32) -> Vec<u8> {
    let panorama = Rgb32FImage::from_fn(width, height, |x, _| {
        // a bright sun on the left half
        if x < width / 2 {
            image::Rgb([8.0, 6.0, 4.0])
        } else {
            image::Rgb([0.25, 0.5, 1.0])
        }
    });
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb32F(panorama)
        .write_to(&mut bytes, ImageFormat::Hdr)
        .expect("hdr encodes");
    bytes.into_inner()
}

#[test]
fn hdr_panorama_is_decoded_into_radiance_and_irradiance() {
    let environment = EnvironmentMap::from_hdr_bytes(&hdr_bytes(64, 32)).expect("valid hdr");

    assert_eq!(environment.mapping, Mapping::EquirectangularReflection);
    assert_eq!(environment.dimensions(), (64, 32));
    assert_eq!(environment.irradiance.dimensions(), (IRRADIANCE_SIZE[0], IRRADIANCE_SIZE[1]));

    let [r, g, b] = decode_rgbe_pixel(environment.radiance.get_pixel(0, 0).0);
    assert!((r - 8.0).abs() < 0.1);
    assert!((g - 6.0).abs() < 0.1);
    assert!((b - 4.0).abs() < 0.1);
    let [r, _, b] = decode_rgbe_pixel(environment.radiance.get_pixel(63, 31).0);
    assert!((r - 0.25).abs() < 0.01);
    assert!((b - 1.0).abs() < 0.01);
}

#[test]
fn garbage_is_not_an_environment() {
    assert!(EnvironmentMap::from_hdr_bytes(b"not an image").is_err());
}

#[tokio::test]
async fn missing_environment_fails() {
    assert!(load_environment("../tests/fixtures/missing.hdr").await.is_err());
}

#[tokio::test]
async fn gltf_with_external_buffer_is_imported() {
    let root = load_model_gltf("../tests/fixtures/triangle.gltf")
        .await
        .expect("fixture model loads");

    // root -> parent -> triangle
    assert_eq!(root.subtree_len(), 3);
    assert_eq!(root.vertex_count(), 6);

    let parent = &root.children()[0];
    assert!(approx_eq(parent.local_transform().position.x, 1.0));
    let model = parent.children()[0].model().expect("triangle has a model");
    assert_eq!(model.meshes.len(), 2);
    assert_eq!(model.meshes[0].indices, vec![0, 1, 2]);

    // the red material plus the default used by the second primitive
    assert_eq!(model.materials.len(), 2);
    assert_eq!(model.materials[0].base_colour, [1.0, 0.0, 0.0, 1.0]);
    assert!(approx_eq(model.materials[0].metallic, 0.5));
    assert!(approx_eq(model.materials[0].roughness, 0.25));
    assert_eq!(model.meshes[0].material, 0);
    assert_eq!(model.meshes[1].material, 1);
}

#[tokio::test]
async fn missing_model_is_an_error() {
    assert!(load_model_gltf("../tests/fixtures/missing.glb").await.is_err());
}

#[test]
fn base_colour_textures_decode_with_and_without_a_mime_type() {
    let mut png = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 3, image::Rgb([10, 20, 30])))
        .write_to(&mut png, ImageFormat::Png)
        .expect("png encodes");
    let png = png.into_inner();

    for mime_type in [Some("image/png"), None] {
        let image = decode_image(&png, mime_type).expect("png decodes");
        assert_eq!(image.dimensions(), (2, 3));
        assert_eq!(image.get_pixel(1, 2).0, [10, 20, 30, 255]);
    }
    assert!(decode_image(&png, Some("image/jpeg")).is_err());
}
