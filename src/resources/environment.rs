use anyhow::Context as _;

use crate::{data_structures::environment::EnvironmentMap, resources::load_binary};

/// Fetches and decodes a Radiance HDR panorama.
pub async fn load_environment(path: &str) -> anyhow::Result<EnvironmentMap> {
    let bytes = load_binary(path).await?;
    EnvironmentMap::from_hdr_bytes(&bytes).with_context(|| format!("Environment {}", path))
}
