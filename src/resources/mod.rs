//! Loading of external assets.
//!
//! Relative paths are resolved against `<origin>/assets/` in the browser and
//! `./assets/` natively; absolute `http(s)` URLs are fetched over the network on
//! both. Everything here is CPU-side only, so loads can run off the event loop.

use std::{
    io::{BufReader, Cursor},
    sync::Arc,
};

use anyhow::{Context as _, bail};

use crate::data_structures::{
    model,
    scene_graph::{ContainerNode, SceneNode, to_scene_node},
};

pub mod environment;
pub mod font;
pub mod texture;

fn is_remote(file_name: &str) -> bool {
    file_name.starts_with("http://") || file_name.starts_with("https://")
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().context("No browser window")?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow::anyhow!("No page origin: {:?}", e))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

async fn fetch(url: &str) -> anyhow::Result<Vec<u8>> {
    let response = reqwest::get(url).await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    if is_remote(file_name) {
        return fetch(file_name).await;
    }
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        fetch(url.as_str()).await?
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new("./").join("assets").join(file_name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Could not read {}", path.display()))?
    };

    Ok(data)
}

pub async fn load_string(file_name: &str) -> anyhow::Result<String> {
    let data = load_binary(file_name).await?;
    String::from_utf8(data).with_context(|| format!("{} is not valid UTF-8", file_name))
}

/// Resolves `uri` relative to the directory of `base`.
fn relative_to(base: &str, uri: &str) -> String {
    if is_remote(uri) {
        return uri.to_string();
    }
    match base.rfind('/') {
        Some(idx) => format!("{}/{}", &base[..idx], uri),
        None => uri.to_string(),
    }
}

/// Loads a binary (`.glb`) or JSON (`.gltf`) model with all nodes of its default
/// scene attached to one root container.
pub async fn load_model_gltf(file_name: &str) -> anyhow::Result<ContainerNode> {
    let gltf_bytes = load_binary(file_name).await?;
    let gltf_cursor = Cursor::new(gltf_bytes);
    let gltf_reader = BufReader::new(gltf_cursor);
    let gltf = gltf::Gltf::from_reader(gltf_reader)
        .with_context(|| format!("{} is not a valid glTF model", file_name))?;

    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let blob = gltf
                    .blob
                    .as_deref()
                    .context("Binary buffer referenced but the model has no BIN chunk")?;
                buffer_data.push(blob.to_vec());
            }
            gltf::buffer::Source::Uri(uri) => {
                if uri.starts_with("data:") {
                    bail!("Embedded data URIs are not supported ({})", file_name);
                }
                buffer_data.push(load_binary(&relative_to(file_name, uri)).await?);
            }
        }
    }

    let mut materials = Vec::new();
    for material in gltf.materials() {
        let pbr = material.pbr_metallic_roughness();
        let name = material.name().unwrap_or("unnamed material");
        let mut parsed = model::Material::new(name, pbr.base_color_factor());
        parsed.metallic = pbr.metallic_factor();
        parsed.roughness = pbr.roughness_factor();
        if let Some(info) = pbr.base_color_texture() {
            let image = match info.texture().source().source() {
                gltf::image::Source::View { view, mime_type } => {
                    let buffer = buffer_data
                        .get(view.buffer().index())
                        .context("Image references a missing buffer")?;
                    let bytes = buffer
                        .get(view.offset()..view.offset() + view.length())
                        .context("Image view exceeds its buffer")?;
                    texture::decode_image(bytes, Some(mime_type))
                }
                gltf::image::Source::Uri { uri, mime_type } => {
                    let bytes = load_binary(&relative_to(file_name, uri)).await?;
                    texture::decode_image(&bytes, mime_type)
                }
            };
            match image {
                Ok(image) => parsed.diffuse = Some(image),
                Err(e) => log::warn!("Base colour texture of {} ignored: {}", name, e),
            }
        }
        materials.push(parsed);
    }
    // used by primitives without a material
    materials.push(model::Material::new("default", [1.0, 1.0, 1.0, 1.0]));
    let materials: Arc<[model::Material]> = materials.into();

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .context("The model contains no scene")?;
    let mut root = ContainerNode::new();
    for node in scene.nodes() {
        root.add_child(to_scene_node(node, &buffer_data, &materials));
    }

    Ok(root)
}
