//! Background music started by the first click.

use futures::FutureExt;
use instant::Duration;
use winit::event::WindowEvent;

use crate::{
    audio::{AudioPlayer, AudioTrigger, default_player},
    context::Context,
    flow::{GraphicsFlow, Out, flow_future},
    showcase::{ShowcaseEvent, is_click},
};

#[derive(Default)]
pub struct MusicFlow {
    trigger: Option<AudioTrigger<Box<dyn AudioPlayer>>>,
}

impl MusicFlow {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GraphicsFlow<ShowcaseEvent> for MusicFlow {
    fn on_init(&mut self, ctx: &mut Context) -> Out<ShowcaseEvent> {
        match default_player(&ctx.settings.assets.music) {
            Ok(player) => self.trigger = Some(AudioTrigger::new(player)),
            Err(e) => log::error!("Audio is unavailable: {:#}", e),
        }
        Out::Empty
    }

    fn on_update(&mut self, _ctx: &mut Context, _dt: Duration) -> Out<ShowcaseEvent> {
        Out::Empty
    }

    fn on_window_events(&mut self, _ctx: &mut Context, event: &WindowEvent) -> Out<ShowcaseEvent> {
        if !is_click(event) {
            return Out::Empty;
        }
        match self.trigger.as_mut().and_then(AudioTrigger::on_click) {
            Some(started) => Out::single(flow_future(started.map(|_| None))),
            None => Out::Empty,
        }
    }

    fn on_custom_events(&mut self, _ctx: &mut Context, event: ShowcaseEvent) -> Option<ShowcaseEvent> {
        Some(event)
    }
}
