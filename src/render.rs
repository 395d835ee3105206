//! Drawing the scene.
//!
//! Scene nodes describe themselves as a list of [`Instanced`] draws; [`draw_scene`]
//! replays them with the standard pipeline and the shared camera, light and
//! environment bind groups.

use crate::{context::Context, data_structures::model::{DrawModel, Model}};

/// A model together with the instance buffer holding its world transform.
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub model: &'a Model,
    pub amount: usize,
}

pub fn draw_scene<'a>(ctx: &'a Context, render_pass: &mut wgpu::RenderPass<'a>) {
    render_pass.set_pipeline(&ctx.pipeline);
    for instanced in ctx.scene.get_render() {
        if instanced.amount == 0 || instanced.instance.size() == 0 {
            log::warn!("you attempted to render something with zero instances");
            continue;
        }
        render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
        render_pass.draw_model_instanced(
            instanced.model,
            0..instanced.amount as u32,
            &ctx.camera.bind_group,
            &ctx.light.bind_group,
            &ctx.environment.bind_group,
        );
    }
}
