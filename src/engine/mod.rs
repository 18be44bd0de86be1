//! Playback engine - one audio resource, one ordered state stream.
//!
//! The engine task owns a [`MediaBackend`] and folds transport commands and
//! native media events, in arrival order, into [`PlaybackState`] snapshots.
//! Commands are fire-and-forget; outcomes surface on the state stream.
//! Resource failures become state, never errors thrown at callers.

mod backend;
mod output;

pub use backend::{EventSink, MediaBackend, MediaEvent};
pub use output::RodioBackend;

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};

use crate::model::{PlaybackError, PlaybackEvent, PlaybackState};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug)]
enum EngineCommand {
    Load { url: Option<String> },
    Play,
    Pause,
    Stop,
    SeekTo { seconds: f64 },
    SetVolume { level: f32 },
    Shutdown,
}

/// Handle to the playback engine task.
///
/// Cloneable; all clones drive the same underlying resource.
#[derive(Clone)]
pub struct PlaybackEngine {
    commands: mpsc::UnboundedSender<EngineCommand>,
    state: watch::Receiver<PlaybackState>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl PlaybackEngine {
    /// Spawn the engine task around `backend`.
    pub fn spawn(backend: impl MediaBackend) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(PlaybackState::default());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (media_tx, media_rx) = mpsc::unbounded_channel();

        let task = EngineTask::new(Box::new(backend), media_tx, state_tx, events.clone());
        tokio::spawn(task.run(command_rx, media_rx));

        Self {
            commands,
            state,
            events,
        }
    }

    /// Load a new source, tearing down the current one first. `None` (an
    /// item without a locator) transitions straight to an error state.
    pub fn load(&self, url: Option<&str>) {
        self.send(EngineCommand::Load {
            url: url.map(str::to_owned),
        });
    }

    /// Start playback. No-op if nothing is loaded or already playing; if the
    /// source is still loading the request is queued and honored once ready.
    pub fn play(&self) {
        self.send(EngineCommand::Play);
    }

    /// No-op if not playing.
    pub fn pause(&self) {
        self.send(EngineCommand::Pause);
    }

    /// Unload the source and reset the transport. Always succeeds, even with
    /// nothing loaded; cancels any in-flight load.
    pub fn stop(&self) {
        self.send(EngineCommand::Stop);
    }

    /// Seek to `seconds`, clamped to `[0, duration]`. Ignored while the
    /// duration is unknown.
    pub fn seek_to(&self, seconds: f64) {
        self.send(EngineCommand::SeekTo { seconds });
    }

    /// Output level, clamped to `[0.0, 1.0]`.
    pub fn set_volume(&self, level: f32) {
        self.send(EngineCommand::SetVolume { level });
    }

    /// Latest-snapshot stream. Never completes on its own; closes only on
    /// [`PlaybackEngine::shutdown`].
    pub fn state(&self) -> watch::Receiver<PlaybackState> {
        self.state.clone()
    }

    /// The snapshot as of the engine's last processed event.
    pub fn current_state(&self) -> PlaybackState {
        self.state.borrow().clone()
    }

    /// One-shot lifecycle notifications ([`PlaybackEvent::Ended`] and
    /// friends).
    pub fn events(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    /// Dispose of the engine. The state stream completes and the backend is
    /// dropped.
    pub fn shutdown(&self) {
        self.send(EngineCommand::Shutdown);
    }

    fn send(&self, command: EngineCommand) {
        if self.commands.send(command).is_err() {
            tracing::warn!("playback engine task is gone, command dropped");
        }
    }
}

struct EngineTask {
    backend: Box<dyn MediaBackend>,
    media_tx: mpsc::UnboundedSender<(u64, MediaEvent)>,
    state: PlaybackState,
    state_tx: watch::Sender<PlaybackState>,
    events: broadcast::Sender<PlaybackEvent>,
    /// Monotonically increasing load generation; bumped on `load` and `stop`
    /// so late events from a superseded source are identifiable.
    generation: u64,
    /// A source has been handed to the backend.
    loaded: bool,
    /// `play()` arrived before the source became ready.
    pending_play: bool,
}

impl EngineTask {
    fn new(
        backend: Box<dyn MediaBackend>,
        media_tx: mpsc::UnboundedSender<(u64, MediaEvent)>,
        state_tx: watch::Sender<PlaybackState>,
        events: broadcast::Sender<PlaybackEvent>,
    ) -> Self {
        Self {
            backend,
            media_tx,
            state: PlaybackState::default(),
            state_tx,
            events,
            generation: 0,
            loaded: false,
            pending_play: false,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<EngineCommand>,
        mut media: mpsc::UnboundedReceiver<(u64, MediaEvent)>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(EngineCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some((generation, event)) = media.recv() => {
                    if generation != self.generation {
                        tracing::trace!(
                            generation,
                            current = self.generation,
                            ?event,
                            "dropping event from superseded load"
                        );
                        continue;
                    }
                    self.handle_media_event(event);
                }
            }
        }
        tracing::debug!("playback engine task stopped");
    }

    fn handle_command(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::Load { url } => self.handle_load(url),
            EngineCommand::Play => self.handle_play(),
            EngineCommand::Pause => {
                if self.state.playing {
                    self.backend.pause();
                }
            }
            EngineCommand::Stop => self.handle_stop(),
            EngineCommand::SeekTo { seconds } => self.handle_seek(seconds),
            EngineCommand::SetVolume { level } => {
                self.backend.set_volume(level.clamp(0.0, 1.0));
            }
            // Handled by the run loop before dispatch.
            EngineCommand::Shutdown => {}
        }
    }

    fn handle_load(&mut self, url: Option<String>) {
        // A new load supersedes whatever was in flight.
        self.generation += 1;
        self.pending_play = false;
        self.loaded = false;
        self.backend.stop();

        let Some(url) = url else {
            self.publish(PlaybackState {
                error: Some(PlaybackError::Unplayable {
                    reason: "no stream locator".into(),
                }),
                ..PlaybackState::default()
            });
            return;
        };

        tracing::debug!(%url, generation = self.generation, "loading stream");
        self.publish(PlaybackState {
            loading: true,
            ..PlaybackState::default()
        });
        self.loaded = true;
        let sink = EventSink::new(self.generation, self.media_tx.clone());
        self.backend.load(&url, sink);
    }

    fn handle_play(&mut self) {
        if !self.loaded {
            tracing::debug!("play requested with no source loaded");
            return;
        }
        if self.state.playing {
            return;
        }
        if self.state.can_play {
            self.backend.play();
        } else {
            // Honored on CanPlay: never dropped, never double-started.
            self.pending_play = true;
        }
    }

    fn handle_stop(&mut self) {
        // Cancels any in-flight load as well.
        self.generation += 1;
        self.pending_play = false;
        self.loaded = false;
        self.backend.stop();
        self.publish(PlaybackState::default());
    }

    fn handle_seek(&mut self, seconds: f64) {
        if !seconds.is_finite() {
            return;
        }
        if self.state.duration_secs <= 0.0 {
            tracing::debug!("seek ignored while duration is unknown");
            return;
        }
        let target = seconds.clamp(0.0, self.state.duration_secs);
        self.backend.seek_to(Duration::from_secs_f64(target));
    }

    fn handle_media_event(&mut self, event: MediaEvent) {
        tracing::trace!(?event, "media event");
        let mut next = self.state.clone();
        match event {
            MediaEvent::MetadataLoaded { duration } => {
                next.duration_secs = duration.as_secs_f64();
            }
            MediaEvent::CanPlay => {
                next.can_play = true;
                next.loading = false;
                if self.pending_play {
                    self.pending_play = false;
                    self.backend.play();
                }
            }
            MediaEvent::Playing => {
                next.playing = true;
                next.loading = false;
            }
            MediaEvent::Paused => {
                next.playing = false;
            }
            MediaEvent::TimeUpdate { position } => {
                next.position_secs = position.as_secs_f64();
            }
            MediaEvent::Ended => {
                next.playing = false;
                if next.duration_secs > 0.0 {
                    next.position_secs = next.duration_secs;
                }
                let _ = self.events.send(PlaybackEvent::Ended);
            }
            MediaEvent::Error { message } => {
                tracing::warn!(%message, "stream error");
                next.playing = false;
                next.loading = false;
                next.can_play = false;
                next.error = Some(PlaybackError::ResourceLoad { reason: message });
                let _ = self.events.send(PlaybackEvent::Failed);
            }
        }
        self.publish(next);
    }

    fn publish(&mut self, next: PlaybackState) {
        self.state = next;
        let _ = self.state_tx.send(self.state.clone());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Default)]
    struct RecordingBackend {
        calls: Arc<Mutex<Vec<String>>>,
        sinks: Arc<Mutex<Vec<EventSink>>>,
    }

    impl RecordingBackend {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn count(&self, call: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
        }
    }

    impl MediaBackend for RecordingBackend {
        fn load(&mut self, url: &str, events: EventSink) {
            self.calls.lock().unwrap().push(format!("load {url}"));
            self.sinks.lock().unwrap().push(events);
        }

        fn play(&mut self) {
            self.calls.lock().unwrap().push("play".into());
        }

        fn pause(&mut self) {
            self.calls.lock().unwrap().push("pause".into());
        }

        fn stop(&mut self) {
            self.calls.lock().unwrap().push("stop".into());
        }

        fn seek_to(&mut self, position: Duration) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("seek {}", position.as_secs_f64()));
        }

        fn set_volume(&mut self, level: f32) {
            self.calls.lock().unwrap().push(format!("volume {level}"));
        }
    }

    fn task_with_backend() -> (EngineTask, RecordingBackend) {
        let backend = RecordingBackend::default();
        let (media_tx, _media_rx) = mpsc::unbounded_channel();
        let (state_tx, _state_rx) = watch::channel(PlaybackState::default());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let task = EngineTask::new(Box::new(backend.clone()), media_tx, state_tx, events);
        (task, backend)
    }

    #[test]
    fn events_merge_onto_the_previous_snapshot() {
        let (mut task, _backend) = task_with_backend();
        task.handle_command(EngineCommand::Load {
            url: Some("https://audio.example/a.m4a".into()),
        });
        assert!(task.state.loading);

        task.handle_media_event(MediaEvent::MetadataLoaded {
            duration: Duration::from_secs(30),
        });
        assert_eq!(task.state.duration_secs, 30.0);
        assert!(task.state.loading, "metadata alone does not end loading");

        task.handle_media_event(MediaEvent::CanPlay);
        assert!(task.state.can_play);
        assert!(!task.state.loading);
        assert_eq!(task.state.duration_secs, 30.0, "untouched fields carry over");
    }

    #[test]
    fn play_before_ready_is_queued_and_started_once() {
        let (mut task, backend) = task_with_backend();
        task.handle_command(EngineCommand::Load {
            url: Some("https://audio.example/a.m4a".into()),
        });
        task.handle_command(EngineCommand::Play);
        task.handle_command(EngineCommand::Play);
        assert_eq!(backend.count("play"), 0, "not ready yet");

        task.handle_media_event(MediaEvent::CanPlay);
        assert_eq!(backend.count("play"), 1);

        task.handle_media_event(MediaEvent::CanPlay);
        assert_eq!(backend.count("play"), 1, "request is honored exactly once");
    }

    #[test]
    fn play_without_a_source_is_a_noop() {
        let (mut task, backend) = task_with_backend();
        task.handle_command(EngineCommand::Play);
        assert_eq!(backend.count("play"), 0);
        assert!(!task.state.playing);
    }

    #[test]
    fn pause_when_not_playing_is_a_noop() {
        let (mut task, backend) = task_with_backend();
        task.handle_command(EngineCommand::Pause);
        task.handle_command(EngineCommand::Pause);
        assert_eq!(backend.count("pause"), 0);
        assert!(!task.state.playing);
    }

    #[test]
    fn seek_is_ignored_while_duration_is_unknown() {
        let (mut task, backend) = task_with_backend();
        task.handle_command(EngineCommand::Load {
            url: Some("https://audio.example/a.m4a".into()),
        });
        task.handle_command(EngineCommand::SeekTo { seconds: 10.0 });
        assert!(backend.calls().iter().all(|c| !c.starts_with("seek")));
    }

    #[test]
    fn seek_clamps_to_duration() {
        let (mut task, backend) = task_with_backend();
        task.handle_command(EngineCommand::Load {
            url: Some("https://audio.example/a.m4a".into()),
        });
        task.handle_media_event(MediaEvent::MetadataLoaded {
            duration: Duration::from_secs(30),
        });
        task.handle_command(EngineCommand::SeekTo { seconds: 99.0 });
        task.handle_command(EngineCommand::SeekTo { seconds: -5.0 });
        let seeks: Vec<_> = backend
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("seek"))
            .collect();
        assert_eq!(seeks, vec!["seek 30", "seek 0"]);
    }

    #[test]
    fn load_without_a_locator_reports_unplayable() {
        let (mut task, _backend) = task_with_backend();
        task.handle_command(EngineCommand::Load { url: None });
        assert!(matches!(
            task.state.error,
            Some(PlaybackError::Unplayable { .. })
        ));
        assert!(!task.state.playing);
    }

    #[test]
    fn resource_error_becomes_state_and_a_failed_event() {
        let (mut task, _backend) = task_with_backend();
        let mut events = task.events.subscribe();
        task.handle_command(EngineCommand::Load {
            url: Some("https://audio.example/broken".into()),
        });
        task.handle_media_event(MediaEvent::Error {
            message: "decode failed".into(),
        });
        assert!(matches!(
            task.state.error,
            Some(PlaybackError::ResourceLoad { .. })
        ));
        assert!(!task.state.playing);
        assert!(!task.state.loading);
        assert!(matches!(events.try_recv(), Ok(PlaybackEvent::Failed)));
    }

    #[test]
    fn stop_resets_the_transport() {
        let (mut task, backend) = task_with_backend();
        task.handle_command(EngineCommand::Load {
            url: Some("https://audio.example/a.m4a".into()),
        });
        task.handle_media_event(MediaEvent::MetadataLoaded {
            duration: Duration::from_secs(30),
        });
        task.handle_media_event(MediaEvent::CanPlay);
        task.handle_media_event(MediaEvent::Playing);
        task.handle_media_event(MediaEvent::TimeUpdate {
            position: Duration::from_secs(12),
        });
        assert!(task.state.playing);

        task.handle_command(EngineCommand::Stop);
        assert_eq!(task.state, PlaybackState::default());
        assert!(backend.count("stop") >= 1);
    }

    #[test]
    fn ended_pins_position_to_duration_and_broadcasts() {
        let (mut task, _backend) = task_with_backend();
        let mut events = task.events.subscribe();
        task.handle_command(EngineCommand::Load {
            url: Some("https://audio.example/a.m4a".into()),
        });
        task.handle_media_event(MediaEvent::MetadataLoaded {
            duration: Duration::from_secs(30),
        });
        task.handle_media_event(MediaEvent::Playing);
        task.handle_media_event(MediaEvent::Ended);
        assert!(!task.state.playing);
        assert_eq!(task.state.position_secs, 30.0);
        assert!(matches!(events.try_recv(), Ok(PlaybackEvent::Ended)));
    }

    #[test]
    fn load_bumps_the_generation() {
        let (mut task, _backend) = task_with_backend();
        task.handle_command(EngineCommand::Load {
            url: Some("https://audio.example/x".into()),
        });
        let first = task.generation;
        task.handle_command(EngineCommand::Load {
            url: Some("https://audio.example/y".into()),
        });
        assert!(task.generation > first);
        task.handle_command(EngineCommand::Stop);
        assert!(task.generation > first + 1, "stop also cancels in-flight loads");
    }
}
