//! Camera capture loop.
//!
//! Samples frames from an acquired frame source and hands every decoded QR
//! payload to a [`ScanHandler`], one at a time. The loop is frame-driven:
//! it only runs as fast as the source yields frames, and a decoded payload
//! is followed by a short cooldown so a code still held in front of the
//! camera is not re-processed every frame.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;

/// One still frame, raw RGB (3 bytes per pixel).
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraFacing {
    /// Rear camera; what a gate station points at attendees' phones.
    Environment,
    User,
}

#[derive(Debug, Clone)]
pub struct CaptureConstraints {
    pub facing: CameraFacing,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            facing: CameraFacing::Environment,
        }
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    /// Camera permission denied or hardware failure. The session cannot
    /// proceed; a retry means a fresh `run`.
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    /// Waiting on camera acquisition (permission grant, device open).
    Requesting,
    Scanning,
    /// Terminal for the session. The frame source has been released.
    Stopped,
}

/// Camera collaborator: acquires a frame stream under the given constraints.
pub trait FrameSource: Send {
    type Stream: FrameStream;

    fn start(
        &mut self,
        constraints: &CaptureConstraints,
    ) -> impl Future<Output = Result<Self::Stream, CaptureError>> + Send;
}

/// A live frame stream. `next_frame` resolves when the next frame is ready
/// (never sooner — this is what bounds the sampling rate) and yields `None`
/// once the source ends on its own.
pub trait FrameStream: Send {
    fn next_frame(&mut self) -> impl Future<Output = Option<Frame>> + Send;

    /// Releases the camera. Must be awaited before the session is Stopped.
    fn stop(&mut self) -> impl Future<Output = ()> + Send;
}

/// QR decode collaborator. Finding nothing in a frame is the normal
/// per-frame outcome, not an error.
pub trait QrDetect: Send + Sync {
    fn detect(&self, frame: &Frame) -> Option<String>;
}

/// Downstream consumer of decoded payloads (the gate station). The loop
/// awaits each call before sampling again, so a handler never sees two
/// scans in flight.
pub trait ScanHandler: Send {
    fn handle_scan(&mut self, payload: &str) -> impl Future<Output = ()> + Send;
}

/// How long to ignore detections after a payload was handled.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(1500);

pub struct StopHandle {
    tx: watch::Sender<bool>,
}

pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

/// Linked stop handle/signal pair for one capture session.
pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx }, StopSignal { rx })
}

impl StopHandle {
    pub fn stop(&self) {
        let _ = self.tx.send(true);
    }
}

impl StopSignal {
    async fn stopped(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            // A dropped handle counts as a stop: nobody is left to keep the
            // camera claimed.
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

pub struct CaptureLoop<F, D, H> {
    source: F,
    detector: D,
    handler: H,
    cooldown: Duration,
    state: CaptureState,
}

impl<F, D, H> CaptureLoop<F, D, H>
where
    F: FrameSource,
    D: QrDetect,
    H: ScanHandler,
{
    pub fn new(source: F, detector: D, handler: H) -> Self {
        Self {
            source,
            detector,
            handler,
            cooldown: DEFAULT_COOLDOWN,
            state: CaptureState::Idle,
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Runs one capture session to completion.
    ///
    /// Returns when the stop signal fires, the frame stream ends, or camera
    /// acquisition fails. In every case the frame source has been released
    /// by the time this returns, and the state reads `Stopped`. An
    /// in-flight `handle_scan` is allowed to finish — stop prevents new
    /// work, not already-dispatched work. A later `run` call starts a fresh
    /// session back through `Requesting`.
    pub async fn run(
        &mut self,
        constraints: CaptureConstraints,
        mut stop: StopSignal,
    ) -> Result<(), CaptureError> {
        self.state = CaptureState::Requesting;
        let mut stream = match self.source.start(&constraints).await {
            Ok(stream) => stream,
            Err(err) => {
                self.state = CaptureState::Stopped;
                tracing::error!(error = %err, "Camera acquisition failed");
                return Err(err);
            }
        };

        self.state = CaptureState::Scanning;
        tracing::info!("Scanner started");

        let mut cooldown_until: Option<Instant> = None;
        loop {
            let frame = tokio::select! {
                biased;
                _ = stop.stopped() => break,
                frame = stream.next_frame() => frame,
            };
            let Some(frame) = frame else { break };

            if let Some(until) = cooldown_until {
                if Instant::now() < until {
                    continue;
                }
                cooldown_until = None;
            }

            let Some(payload) = self.detector.detect(&frame) else {
                continue;
            };

            tracing::debug!(payload = %payload, "QR payload decoded");
            self.handler.handle_scan(&payload).await;
            cooldown_until = Some(Instant::now() + self.cooldown);
        }

        stream.stop().await;
        self.state = CaptureState::Stopped;
        tracing::info!("Scanner stopped");
        Ok(())
    }
}
