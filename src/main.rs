use food_art_scene::{SceneConfig, showcase};

fn main() -> anyhow::Result<()> {
    showcase::run(SceneConfig::default())
}
