//! Message-passing boundary to the native audio resource

use std::time::Duration;

use tokio::sync::mpsc;

/// Native events a backend reports while a source is loaded.
///
/// The media-element vocabulary: metadata, readiness, transport transitions,
/// progress ticks, completion, failure.
#[derive(Clone, Debug, PartialEq)]
pub enum MediaEvent {
    MetadataLoaded { duration: Duration },
    CanPlay,
    Playing,
    Paused,
    TimeUpdate { position: Duration },
    Ended,
    Error { message: String },
}

/// Outbound event channel handed to a backend at `load` time.
///
/// Each sink is stamped with the generation of the load that created it. The
/// engine drops events whose generation has been superseded, so a backend may
/// keep emitting through an old sink without corrupting state.
#[derive(Clone, Debug)]
pub struct EventSink {
    generation: u64,
    tx: mpsc::UnboundedSender<(u64, MediaEvent)>,
}

impl EventSink {
    pub(crate) fn new(generation: u64, tx: mpsc::UnboundedSender<(u64, MediaEvent)>) -> Self {
        Self { generation, tx }
    }

    /// Report a native event. Silently discarded once the engine is gone.
    pub fn emit(&self, event: MediaEvent) {
        let _ = self.tx.send((self.generation, event));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(MediaEvent::Error {
            message: message.into(),
        });
    }
}

/// One underlying audio decode/output resource.
///
/// All load outcomes (metadata, readiness, failure) are reported through
/// the [`EventSink`], never returned: playback failures are expected and must
/// not unwind into the control flow. At most one source is active; `load` and
/// `stop` tear down whatever came before.
pub trait MediaBackend: Send + 'static {
    /// Begin resolving and decoding `url`, reporting progress on `events`.
    fn load(&mut self, url: &str, events: EventSink);

    /// Start or resume output. No-op without a ready source.
    fn play(&mut self);

    /// Suspend output, keeping the source loaded.
    fn pause(&mut self);

    /// Tear down the loaded source.
    fn stop(&mut self);

    fn seek_to(&mut self, position: Duration);

    /// Output level in `[0.0, 1.0]`.
    fn set_volume(&mut self, level: f32);
}
