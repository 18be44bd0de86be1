//! rodio-backed media resource

use std::io::Cursor;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};

use super::backend::{EventSink, MediaBackend, MediaEvent};

const TICK_INTERVAL: Duration = Duration::from_millis(250);

enum OutputCommand {
    Load { url: String, events: EventSink },
    Play,
    Pause,
    Stop,
    SeekTo { position: Duration },
    SetVolume { level: f32 },
}

/// [`MediaBackend`] over a rodio output stream.
///
/// The device stream is not `Send`, so it lives on a dedicated audio thread;
/// this handle forwards commands and the worker reports native events through
/// the [`EventSink`] of the load that produced them.
pub struct RodioBackend {
    commands: mpsc::Sender<OutputCommand>,
}

impl RodioBackend {
    pub fn new() -> Result<Self> {
        let (commands, command_rx) = mpsc::channel();
        thread::Builder::new()
            .name("chartplay-audio".into())
            .spawn(move || OutputWorker::run(command_rx))
            .context("failed to start the audio output thread")?;
        Ok(Self { commands })
    }

    fn send(&self, command: OutputCommand) {
        if self.commands.send(command).is_err() {
            tracing::warn!("audio output thread is gone, command dropped");
        }
    }
}

impl MediaBackend for RodioBackend {
    fn load(&mut self, url: &str, events: EventSink) {
        self.send(OutputCommand::Load {
            url: url.to_owned(),
            events,
        });
    }

    fn play(&mut self) {
        self.send(OutputCommand::Play);
    }

    fn pause(&mut self) {
        self.send(OutputCommand::Pause);
    }

    fn stop(&mut self) {
        self.send(OutputCommand::Stop);
    }

    fn seek_to(&mut self, position: Duration) {
        self.send(OutputCommand::SeekTo { position });
    }

    fn set_volume(&mut self, level: f32) {
        self.send(OutputCommand::SetVolume { level });
    }
}

struct OutputWorker {
    stream: Option<OutputStream>,
    sink: Option<Sink>,
    events: Option<EventSink>,
    duration: Option<Duration>,
    finished: bool,
    volume: f32,
}

impl OutputWorker {
    fn run(commands: mpsc::Receiver<OutputCommand>) {
        let mut worker = OutputWorker {
            stream: None,
            sink: None,
            events: None,
            duration: None,
            finished: true,
            volume: 1.0,
        };
        loop {
            match commands.recv_timeout(TICK_INTERVAL) {
                Ok(command) => worker.handle(command),
                Err(mpsc::RecvTimeoutError::Timeout) => worker.tick(),
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }
        tracing::debug!("audio output thread stopped");
    }

    fn handle(&mut self, command: OutputCommand) {
        match command {
            OutputCommand::Load { url, events } => self.load(url, events),
            OutputCommand::Play => {
                if let Some(sink) = &self.sink {
                    sink.play();
                    self.emit(MediaEvent::Playing);
                }
            }
            OutputCommand::Pause => {
                if let Some(sink) = &self.sink {
                    sink.pause();
                    self.emit(MediaEvent::Paused);
                }
            }
            OutputCommand::Stop => self.teardown(),
            OutputCommand::SeekTo { position } => {
                if let Some(sink) = &self.sink {
                    match sink.try_seek(position) {
                        Ok(()) => self.emit(MediaEvent::TimeUpdate { position }),
                        Err(err) => tracing::warn!(error = %err, "seek failed"),
                    }
                }
            }
            OutputCommand::SetVolume { level } => {
                self.volume = level;
                if let Some(sink) = &self.sink {
                    sink.set_volume(level);
                }
            }
        }
    }

    fn load(&mut self, url: String, events: EventSink) {
        self.teardown();
        self.events = Some(events);

        let bytes = match fetch_source(&url) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.fail(format!("failed to fetch {url}: {err:#}"));
                return;
            }
        };
        let source = match Decoder::new(Cursor::new(bytes)) {
            Ok(source) => source,
            Err(err) => {
                self.fail(format!("failed to decode {url}: {err}"));
                return;
            }
        };
        let duration = source.total_duration();

        if self.stream.is_none() {
            match open_output_stream() {
                Ok(stream) => self.stream = Some(stream),
                Err(err) => {
                    self.fail(format!("no audio output available: {err:#}"));
                    return;
                }
            }
        }
        let Some(stream) = self.stream.as_ref() else {
            return;
        };

        let sink = Sink::connect_new(stream.mixer());
        sink.pause();
        sink.set_volume(self.volume);
        sink.append(source);

        self.sink = Some(sink);
        self.duration = duration;
        self.finished = false;
        tracing::debug!(%url, ?duration, "source ready");

        if let Some(duration) = duration {
            self.emit(MediaEvent::MetadataLoaded { duration });
        }
        self.emit(MediaEvent::CanPlay);
    }

    fn tick(&mut self) {
        let Some(sink) = &self.sink else {
            return;
        };
        if sink.is_paused() {
            return;
        }
        if sink.empty() {
            if !self.finished {
                self.finished = true;
                if let Some(duration) = self.duration {
                    self.emit(MediaEvent::TimeUpdate { position: duration });
                }
                self.emit(MediaEvent::Ended);
            }
            return;
        }
        self.emit(MediaEvent::TimeUpdate {
            position: sink.get_pos(),
        });
    }

    fn emit(&self, event: MediaEvent) {
        if let Some(events) = &self.events {
            events.emit(event);
        }
    }

    fn fail(&mut self, message: String) {
        tracing::warn!(%message, "audio output failure");
        if let Some(events) = &self.events {
            events.error(message);
        }
    }

    fn teardown(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.events = None;
        self.duration = None;
        self.finished = true;
    }
}

fn open_output_stream() -> Result<OutputStream> {
    OutputStreamBuilder::from_default_device()
        .context("failed to open default output device")?
        .with_error_callback(|_| {})
        .open_stream_or_fallback()
        .context("failed to start output stream")
}

/// Resolve a stream locator into decodable bytes. Locators are opaque; http
/// and https go over the network, anything else is treated as a local path.
fn fetch_source(url: &str) -> Result<Vec<u8>> {
    if url.starts_with("http://") || url.starts_with("https://") {
        let response = reqwest::blocking::get(url)
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("stream request failed: {url}"))?;
        let bytes = response
            .bytes()
            .with_context(|| format!("stream body could not be read: {url}"))?;
        Ok(bytes.to_vec())
    } else {
        std::fs::read(url).with_context(|| format!("stream file could not be read: {url}"))
    }
}
