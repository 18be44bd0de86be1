//! Scripted media backend for driving the engine without an audio device.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chartplay::{EventSink, MediaBackend, MediaEvent, PlaybackState};
use tokio::sync::watch;

#[derive(Default)]
struct Inner {
    calls: Vec<String>,
    sinks: Vec<EventSink>,
}

/// Backend half handed to the engine. Records every command; `play`/`pause`
/// report the transition through the most recent load's sink, the way a
/// well-behaved media element would.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    inner: Arc<Mutex<Inner>>,
}

impl ScriptedBackend {
    pub fn new() -> (Self, Script) {
        let backend = Self::default();
        let script = Script {
            inner: backend.inner.clone(),
        };
        (backend, script)
    }
}

impl MediaBackend for ScriptedBackend {
    fn load(&mut self, url: &str, events: EventSink) {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(format!("load {url}"));
        inner.sinks.push(events);
    }

    fn play(&mut self) {
        let inner = &mut *self.inner.lock().unwrap();
        inner.calls.push("play".into());
        if let Some(sink) = inner.sinks.last() {
            sink.emit(MediaEvent::Playing);
        }
    }

    fn pause(&mut self) {
        let inner = &mut *self.inner.lock().unwrap();
        inner.calls.push("pause".into());
        if let Some(sink) = inner.sinks.last() {
            sink.emit(MediaEvent::Paused);
        }
    }

    fn stop(&mut self) {
        self.inner.lock().unwrap().calls.push("stop".into());
    }

    fn seek_to(&mut self, position: Duration) {
        let inner = &mut *self.inner.lock().unwrap();
        inner.calls.push(format!("seek {}", position.as_secs_f64()));
        if let Some(sink) = inner.sinks.last() {
            sink.emit(MediaEvent::TimeUpdate { position });
        }
    }

    fn set_volume(&mut self, level: f32) {
        self.inner
            .lock()
            .unwrap()
            .calls
            .push(format!("volume {level:.2}"));
    }
}

/// Test-side handle: inspect recorded commands and emit native events for
/// any load, current or superseded.
pub struct Script {
    inner: Arc<Mutex<Inner>>,
}

impl Script {
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| *c == call)
            .count()
    }

    /// URLs handed to `load`, in order.
    pub fn loads(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter_map(|c| c.strip_prefix("load ").map(str::to_owned))
            .collect()
    }

    pub fn load_count(&self) -> usize {
        self.inner.lock().unwrap().sinks.len()
    }

    /// Sink of load `index` (0-based, in load order).
    pub fn sink(&self, index: usize) -> EventSink {
        self.inner.lock().unwrap().sinks[index].clone()
    }

    /// Wait until `count` loads have been issued; returns the latest sink.
    pub async fn wait_for_load(&self, count: usize) -> EventSink {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            {
                let inner = self.inner.lock().unwrap();
                if inner.sinks.len() >= count {
                    return inner.sinks[count - 1].clone();
                }
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for load #{count}"
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Wait until `call` has been recorded at least `count` times.
    pub async fn wait_for_call(&self, call: &str, count: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while self.count(call) < count {
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {count}x {call:?}"
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Emit the ready sequence (metadata, then can-play) for load `index`.
    pub fn ready(&self, index: usize, duration_secs: u64) {
        let sink = self.sink(index);
        sink.emit(MediaEvent::MetadataLoaded {
            duration: Duration::from_secs(duration_secs),
        });
        sink.emit(MediaEvent::CanPlay);
    }

    /// Emit end-of-source for load `index`.
    pub fn finish(&self, index: usize) {
        self.sink(index).emit(MediaEvent::Ended);
    }
}

/// Await a state snapshot satisfying `predicate`.
pub async fn wait_for_state(
    rx: &mut watch::Receiver<PlaybackState>,
    predicate: impl FnMut(&PlaybackState) -> bool,
) -> PlaybackState {
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for playback state")
        .expect("engine state stream closed")
        .clone()
}
