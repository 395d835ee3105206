use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use food_art_scene::{
    audio::{AudioPlayer, AudioTrigger, UnsupportedPlayer},
    flow::{FlowFuture, flow_future},
};
use futures::executor::block_on;

use crate::common::test_utils::capture_logs;

mod common;

/// Behaves like a media element: `play` flips `paused` right away and a rejected
/// start flips it back.
#[derive(Clone, Default)]
struct FakePlayer {
    playing: Arc<AtomicBool>,
    reject: Arc<AtomicBool>,
    starts: Arc<AtomicUsize>,
}

impl AudioPlayer for FakePlayer {
    fn is_paused(&self) -> bool {
        !self.playing.load(Ordering::SeqCst)
    }

    fn play(&mut self) -> FlowFuture<anyhow::Result<()>> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.playing.store(true, Ordering::SeqCst);
        let playing = self.playing.clone();
        let reject = self.reject.load(Ordering::SeqCst);
        flow_future(async move {
            if reject {
                playing.store(false, Ordering::SeqCst);
                Err(anyhow::anyhow!("play() can only be initiated by a user gesture"))
            } else {
                Ok(())
            }
        })
    }
}

#[test]
fn first_click_starts_playback() {
    let player = FakePlayer::default();
    let mut trigger = AudioTrigger::new(player.clone());

    let started = trigger.on_click().expect("paused player is started");
    block_on(started);

    assert_eq!(player.starts.load(Ordering::SeqCst), 1);
    assert!(!trigger.player().is_paused());
}

#[test]
fn clicks_while_playing_are_ignored() {
    let player = FakePlayer::default();
    let mut trigger = AudioTrigger::new(player.clone());
    block_on(trigger.on_click().expect("started"));

    assert!(trigger.on_click().is_none());
    assert!(trigger.on_click().is_none());
    assert_eq!(player.starts.load(Ordering::SeqCst), 1);
}

#[test]
fn failed_start_is_logged_and_retried_on_next_click() {
    let logs = capture_logs();
    let player = FakePlayer::default();
    player.reject.store(true, Ordering::SeqCst);
    let mut trigger = AudioTrigger::new(player.clone());

    block_on(trigger.on_click().expect("started"));
    assert_eq!(logs.count(log::Level::Error), 1);
    assert!(trigger.player().is_paused());

    player.reject.store(false, Ordering::SeqCst);
    block_on(trigger.on_click().expect("retried"));
    assert_eq!(player.starts.load(Ordering::SeqCst), 2);
    assert!(!trigger.player().is_paused());
    assert_eq!(logs.count(log::Level::Error), 1);
}

#[test]
fn unsupported_player_reports_through_the_log() {
    let logs = capture_logs();
    let mut trigger = AudioTrigger::new(UnsupportedPlayer::new("./under_your_spell.mp3"));

    block_on(trigger.on_click().expect("always paused"));
    block_on(trigger.on_click().expect("always paused"));

    let errors: Vec<_> = logs
        .records()
        .into_iter()
        .filter(|(level, _)| *level == log::Level::Error)
        .collect();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].1.contains("under_your_spell.mp3"));
}

// needs an output device, like the windowed GPU tests
#[cfg(feature = "native-audio")]
#[tokio::test]
async fn missing_track_pauses_the_stream_again() {
    use food_art_scene::audio::StreamPlayer;

    let mut player = StreamPlayer::new("../tests/fixtures/missing.ogg").expect("default output device");
    assert!(player.is_paused());

    let started = player.play();
    assert!(!player.is_paused());
    assert!(started.await.is_err());
    assert!(player.is_paused());
}
