//! Background music.
//!
//! Browsers only allow audio to start from a user gesture, so playback is started
//! by [`AudioTrigger::on_click`] from inside the window event handler. Native
//! builds play through rodio when the `native-audio` feature is enabled.

use crate::flow::{FlowFuture, flow_future};

/// Something that can start looped playback.
pub trait AudioPlayer {
    fn is_paused(&self) -> bool;

    /// Starts playback. The request is issued immediately; the returned future
    /// reports whether it succeeded.
    fn play(&mut self) -> FlowFuture<anyhow::Result<()>>;
}

/// Starts the player on click unless it is already playing.
pub struct AudioTrigger<P> {
    player: P,
}

impl<P: AudioPlayer> AudioTrigger<P> {
    pub fn new(player: P) -> Self {
        Self { player }
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    /// Returns the pending start request, or `None` when the player is already
    /// running. A failed start is logged; the next click tries again.
    pub fn on_click(&mut self) -> Option<FlowFuture<()>> {
        if !self.player.is_paused() {
            return None;
        }
        let started = self.player.play();
        Some(flow_future(async move {
            if let Err(e) = started.await {
                log::error!("Audio playback failed: {:#}", e);
            }
        }))
    }
}

/// Plays through an `HTMLAudioElement` with `loop` set.
#[cfg(target_arch = "wasm32")]
pub struct MediaElementPlayer {
    element: web_sys::HtmlAudioElement,
}

#[cfg(target_arch = "wasm32")]
impl MediaElementPlayer {
    pub fn new(src: &str) -> anyhow::Result<Self> {
        let element = web_sys::HtmlAudioElement::new_with_src(src)
            .map_err(|e| anyhow::anyhow!("Cannot create an audio element: {:?}", e))?;
        element.set_loop(true);
        Ok(Self { element })
    }
}

#[cfg(target_arch = "wasm32")]
impl AudioPlayer for MediaElementPlayer {
    fn is_paused(&self) -> bool {
        self.element.paused()
    }

    fn play(&mut self) -> FlowFuture<anyhow::Result<()>> {
        // must run synchronously inside the click handler to count as a user gesture
        let promise = self.element.play();
        flow_future(async move {
            let promise = promise.map_err(|e| anyhow::anyhow!("{:?}", e))?;
            wasm_bindgen_futures::JsFuture::from(promise)
                .await
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
            Ok(())
        })
    }
}

/// Loops a decoded track through the default output device.
///
/// The sink starts paused and empty. The first `play` resumes it right away and
/// fetches and decodes the track in the returned future; a failed load pauses the
/// sink again so the next click retries.
#[cfg(all(not(target_arch = "wasm32"), feature = "native-audio"))]
pub struct StreamPlayer {
    _stream: rodio::OutputStream,
    sink: std::sync::Arc<rodio::Sink>,
    src: String,
}

#[cfg(all(not(target_arch = "wasm32"), feature = "native-audio"))]
impl StreamPlayer {
    pub fn new(src: &str) -> anyhow::Result<Self> {
        let mut stream = rodio::OutputStreamBuilder::open_default_stream()?;
        stream.log_on_drop(false);
        let sink = rodio::Sink::connect_new(stream.mixer());
        sink.pause();
        Ok(Self {
            _stream: stream,
            sink: std::sync::Arc::new(sink),
            src: src.to_string(),
        })
    }
}

#[cfg(all(not(target_arch = "wasm32"), feature = "native-audio"))]
impl AudioPlayer for StreamPlayer {
    fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }

    fn play(&mut self) -> FlowFuture<anyhow::Result<()>> {
        use rodio::Source;

        self.sink.play();
        let sink = self.sink.clone();
        let src = self.src.clone();
        flow_future(async move {
            if !sink.empty() {
                return Ok(());
            }
            let decoded = match crate::resources::load_binary(&src).await {
                Ok(bytes) => rodio::Decoder::new(std::io::Cursor::new(bytes)).map_err(anyhow::Error::from),
                Err(e) => Err(e),
            };
            match decoded {
                Ok(track) => {
                    sink.append(track.repeat_infinite());
                    Ok(())
                }
                Err(e) => {
                    sink.pause();
                    Err(e.context(format!("Cannot play {}", src)))
                }
            }
        })
    }
}

/// Stand-in for platforms without an audio backend. Every start request fails.
pub struct UnsupportedPlayer {
    src: String,
}

impl UnsupportedPlayer {
    pub fn new(src: &str) -> Self {
        Self {
            src: src.to_string(),
        }
    }
}

impl AudioPlayer for UnsupportedPlayer {
    fn is_paused(&self) -> bool {
        true
    }

    fn play(&mut self) -> FlowFuture<anyhow::Result<()>> {
        let src = self.src.clone();
        flow_future(async move { Err(anyhow::anyhow!("No audio backend available to play {}", src)) })
    }
}

/// The player the page uses on the current platform.
#[cfg(target_arch = "wasm32")]
pub fn default_player(src: &str) -> anyhow::Result<Box<dyn AudioPlayer>> {
    Ok(Box::new(MediaElementPlayer::new(src)?))
}

#[cfg(all(not(target_arch = "wasm32"), feature = "native-audio"))]
pub fn default_player(src: &str) -> anyhow::Result<Box<dyn AudioPlayer>> {
    Ok(Box::new(StreamPlayer::new(src)?))
}

#[cfg(all(not(target_arch = "wasm32"), not(feature = "native-audio")))]
pub fn default_player(src: &str) -> anyhow::Result<Box<dyn AudioPlayer>> {
    log::warn!("Built without the native-audio feature, {} will not play", src);
    Ok(Box::new(UnsupportedPlayer::new(src)))
}

impl AudioPlayer for Box<dyn AudioPlayer> {
    fn is_paused(&self) -> bool {
        self.as_ref().is_paused()
    }

    fn play(&mut self) -> FlowFuture<anyhow::Result<()>> {
        self.as_mut().play()
    }
}
