//! Hand landmark providers and the background detector loop.
//!
//! A [`LandmarkProvider`] wraps whatever produces hand landmarks (a camera
//! with a landmark model, a recorded file, a fixed script). [`spawn_detector`]
//! runs one on its own thread: it opens the provider once, then polls it at
//! the provider's frame interval and classifies each detection. The render
//! loop only ever sees [`DetectorEvent`]s on a channel, so detection never
//! blocks a frame and the two sides share nothing but the channel.
//!
//! ```ignore
//! let detector = spawn_detector(Box::new(ReplayProvider::new("hands.jsonl")));
//! // each frame:
//! for event in detector.events() {
//!     // DetectorEvent::Ready / Unavailable / Signal
//! }
//! ```

use crate::error::ProviderError;
use crate::gesture::{classify, InteractionSignal};
use crate::landmarks::LandmarkSet;
use std::any::Any;
use std::io::BufRead;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryIter};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Default polling interval, roughly one display frame.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Anything that can deliver hand landmarks.
pub trait LandmarkProvider: Send + 'static {
    /// Acquire the underlying device or data. Called once, on the detector
    /// thread, before any detection. May block.
    fn open(&mut self) -> Result<(), ProviderError>;

    /// Detect the first hand at `timestamp_ms` (milliseconds since the
    /// detector started). `None` when no hand is visible.
    fn detect(&mut self, timestamp_ms: u64) -> Option<LandmarkSet>;

    /// Release the device. Called once when the detector stops.
    fn close(&mut self) {}

    /// Time between detections.
    fn frame_interval(&self) -> Duration {
        DEFAULT_FRAME_INTERVAL
    }

    /// Short name for log messages.
    fn name(&self) -> &str {
        "landmarks"
    }
}

/// Messages from the detector thread.
#[derive(Debug)]
pub enum DetectorEvent {
    /// The provider opened and detections will follow.
    Ready,
    /// The provider failed to open, or the detector died. No further
    /// events follow.
    Unavailable(ProviderError),
    /// The classified signal changed.
    Signal(InteractionSignal),
}

/// Handle to a running detector thread.
///
/// Stopping (explicitly or on drop) ends the polling loop and waits for the
/// provider to be closed. A detector still blocked in
/// [`open`](LandmarkProvider::open) is detached instead; its thread closes the
/// provider once `open` returns.
pub struct Detector {
    events: Receiver<DetectorEvent>,
    stop: Arc<AtomicBool>,
    opened: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Detector {
    /// Events received since the last call. Never blocks.
    pub fn events(&self) -> TryIter<'_, DetectorEvent> {
        self.events.try_iter()
    }

    /// Whether the detector thread is still running.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop polling and wait for the provider to close.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        let Some(handle) = self.handle.take() else {
            return;
        };
        if !self.opened.load(Ordering::Acquire) && !handle.is_finished() {
            log::debug!("Detaching landmark detector that is still opening");
            return;
        }
        if handle.join().is_err() {
            log::error!("Landmark detector thread panicked");
        }
    }
}

impl Drop for Detector {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Run `provider` on a background thread.
pub fn spawn_detector(provider: Box<dyn LandmarkProvider>) -> Detector {
    let (tx, rx) = mpsc::channel();
    let stop = Arc::new(AtomicBool::new(false));
    let opened = Arc::new(AtomicBool::new(false));
    let thread_stop = Arc::clone(&stop);
    let thread_opened = Arc::clone(&opened);

    let handle = thread::Builder::new()
        .name("tinsel-detector".into())
        .spawn(move || run_detector(provider, tx, thread_stop, thread_opened));

    let handle = match handle {
        Ok(handle) => Some(handle),
        Err(e) => {
            // Nothing will ever arrive; report the provider as unavailable.
            let (tx, rx) = mpsc::channel();
            let _ = tx.send(DetectorEvent::Unavailable(ProviderError::CameraUnavailable(
                format!("failed to start detector thread: {}", e),
            )));
            return Detector { events: rx, stop, opened, handle: None };
        }
    };

    Detector { events: rx, stop, opened, handle }
}

fn run_detector(
    mut provider: Box<dyn LandmarkProvider>,
    tx: Sender<DetectorEvent>,
    stop: Arc<AtomicBool>,
    opened: Arc<AtomicBool>,
) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        detect_loop(provider.as_mut(), &tx, &stop, &opened)
    }));
    if let Err(payload) = outcome {
        let reason = panic_message(payload.as_ref());
        log::error!("{} detector panicked: {}", provider.name(), reason);
        let _ = panic::catch_unwind(AssertUnwindSafe(|| provider.close()));
        let _ = tx.send(DetectorEvent::Unavailable(ProviderError::DetectorStopped(reason)));
    }
}

fn detect_loop(
    provider: &mut dyn LandmarkProvider,
    tx: &Sender<DetectorEvent>,
    stop: &AtomicBool,
    opened: &AtomicBool,
) {
    if let Err(e) = provider.open() {
        log::warn!("{} unavailable: {}", provider.name(), e);
        let _ = tx.send(DetectorEvent::Unavailable(e));
        return;
    }
    opened.store(true, Ordering::Release);
    if stop.load(Ordering::Acquire) {
        provider.close();
        log::info!("{} closed before use", provider.name());
        return;
    }
    log::info!("{} ready", provider.name());
    if tx.send(DetectorEvent::Ready).is_err() {
        provider.close();
        return;
    }

    let start = Instant::now();
    let interval = provider.frame_interval();
    let mut last: Option<InteractionSignal> = None;

    while !stop.load(Ordering::Acquire) {
        let timestamp_ms = start.elapsed().as_millis() as u64;
        let landmarks = provider.detect(timestamp_ms);
        let signal = classify(landmarks.as_ref());

        if last != Some(signal) {
            log::debug!("{}: {:?} at {} ms", provider.name(), signal, timestamp_ms);
            last = Some(signal);
            if tx.send(DetectorEvent::Signal(signal)).is_err() {
                break;
            }
        }

        thread::sleep(interval);
    }

    provider.close();
    log::info!("{} closed", provider.name());
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ============================================================================
// ReplayProvider
// ============================================================================

/// Plays back landmarks recorded as JSON lines, looping at the end.
///
/// Each line is either `null` (no hand) or an array of `{"x", "y", "z"}`
/// points in the landmark model's order. Blank lines are skipped; malformed
/// lines are logged and played back as "no hand".
pub struct ReplayProvider {
    path: PathBuf,
    frames: Vec<Option<LandmarkSet>>,
    cursor: usize,
    interval: Duration,
}

impl ReplayProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            frames: Vec::new(),
            cursor: 0,
            interval: DEFAULT_FRAME_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Parse a JSON-lines landmark recording.
pub fn parse_recording(reader: impl BufRead) -> std::io::Result<Vec<Option<LandmarkSet>>> {
    let mut frames = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Option<LandmarkSet>>(line) {
            Ok(frame) => frames.push(frame),
            Err(e) => {
                log::warn!("Skipping malformed landmark line {}: {}", number + 1, e);
                frames.push(None);
            }
        }
    }
    Ok(frames)
}

impl LandmarkProvider for ReplayProvider {
    fn open(&mut self) -> Result<(), ProviderError> {
        let file = std::fs::File::open(&self.path).map_err(|source| ProviderError::Io {
            path: self.path.clone(),
            source,
        })?;
        let frames = parse_recording(std::io::BufReader::new(file)).map_err(|source| {
            ProviderError::Io { path: self.path.clone(), source }
        })?;
        if frames.is_empty() {
            return Err(ProviderError::EmptyRecording(self.path.clone()));
        }
        log::info!("Loaded {} landmark frames from {}", frames.len(), self.path.display());
        self.frames = frames;
        self.cursor = 0;
        Ok(())
    }

    fn detect(&mut self, _timestamp_ms: u64) -> Option<LandmarkSet> {
        if self.frames.is_empty() {
            return None;
        }
        let frame = self.frames[self.cursor % self.frames.len()].clone();
        self.cursor = (self.cursor + 1) % self.frames.len();
        frame
    }

    fn close(&mut self) {
        self.frames.clear();
    }

    fn frame_interval(&self) -> Duration {
        self.interval
    }

    fn name(&self) -> &str {
        "replay"
    }
}

// ============================================================================
// ScriptedProvider
// ============================================================================

/// Cycles through a fixed list of frames. Useful for demos and tests.
pub struct ScriptedProvider {
    frames: Vec<Option<LandmarkSet>>,
    cursor: usize,
    interval: Duration,
}

impl ScriptedProvider {
    pub fn new(frames: Vec<Option<LandmarkSet>>) -> Self {
        Self {
            frames,
            cursor: 0,
            interval: DEFAULT_FRAME_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl LandmarkProvider for ScriptedProvider {
    fn open(&mut self) -> Result<(), ProviderError> {
        Ok(())
    }

    fn detect(&mut self, _timestamp_ms: u64) -> Option<LandmarkSet> {
        if self.frames.is_empty() {
            return None;
        }
        let frame = self.frames[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.frames.len();
        frame
    }

    fn frame_interval(&self) -> Duration {
        self.interval
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

// ============================================================================
// UnavailableProvider
// ============================================================================

/// A provider that always fails to open, standing in for a missing camera.
pub struct UnavailableProvider {
    reason: String,
}

impl UnavailableProvider {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl LandmarkProvider for UnavailableProvider {
    fn open(&mut self) -> Result<(), ProviderError> {
        Err(ProviderError::CameraUnavailable(self.reason.clone()))
    }

    fn detect(&mut self, _timestamp_ms: u64) -> Option<LandmarkSet> {
        None
    }

    fn name(&self) -> &str {
        "camera"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{Landmark, LANDMARK_COUNT};
    use std::io::Cursor;

    fn hand(tip_y: f32, pip_y: f32) -> LandmarkSet {
        let mut points = vec![Landmark::new(0.5, 0.5, 0.0); LANDMARK_COUNT];
        for (tip, pip) in crate::gesture::VOTING_FINGERS {
            points[tip] = Landmark::new(0.5, tip_y, 0.0);
            points[pip] = Landmark::new(0.5, pip_y, 0.0);
        }
        LandmarkSet::new(points)
    }

    /// Reports an open hand `good_frames` times, then panics.
    struct FaultyProvider {
        good_frames: usize,
    }

    impl LandmarkProvider for FaultyProvider {
        fn open(&mut self) -> Result<(), ProviderError> {
            Ok(())
        }

        fn detect(&mut self, _timestamp_ms: u64) -> Option<LandmarkSet> {
            if self.good_frames == 0 {
                panic!("landmark model crashed");
            }
            self.good_frames -= 1;
            Some(hand(0.2, 0.4))
        }

        fn frame_interval(&self) -> Duration {
            Duration::from_millis(1)
        }
    }

    /// Blocks in `open` as if waiting on a permission prompt.
    struct SlowOpenProvider {
        delay: Duration,
    }

    impl LandmarkProvider for SlowOpenProvider {
        fn open(&mut self) -> Result<(), ProviderError> {
            thread::sleep(self.delay);
            Ok(())
        }

        fn detect(&mut self, _timestamp_ms: u64) -> Option<LandmarkSet> {
            None
        }
    }

    fn wait_for(detector: &Detector, count: usize) -> Vec<DetectorEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut seen = Vec::new();
        while seen.len() < count && Instant::now() < deadline {
            seen.extend(detector.events());
            thread::sleep(Duration::from_millis(1));
        }
        seen
    }

    #[test]
    fn test_parse_recording() {
        let text = "null\n\n[{\"x\":0.1,\"y\":0.2}]\nnot json\n";
        let frames = parse_recording(Cursor::new(text)).unwrap();
        assert_eq!(frames.len(), 3);
        assert!(frames[0].is_none());
        assert_eq!(frames[1].as_ref().map(|s| s.len()), Some(1));
        assert!(frames[2].is_none());
    }

    #[test]
    fn test_scripted_provider_cycles() {
        let mut provider = ScriptedProvider::new(vec![None, Some(hand(0.2, 0.4))]);
        provider.open().unwrap();
        assert!(provider.detect(0).is_none());
        assert!(provider.detect(16).is_some());
        assert!(provider.detect(32).is_none());
    }

    #[test]
    fn test_missing_recording_is_unavailable() {
        let mut provider = ReplayProvider::new("/nonexistent/tinsel/hands.jsonl");
        assert!(matches!(provider.open(), Err(ProviderError::Io { .. })));
    }

    #[test]
    fn test_detector_reports_unavailable() {
        let detector = spawn_detector(Box::new(UnavailableProvider::new("no camera")));
        let events = wait_for(&detector, 1);
        assert!(matches!(events.first(), Some(DetectorEvent::Unavailable(_))));
    }

    #[test]
    fn test_detector_emits_signal_changes() {
        let provider = ScriptedProvider::new(vec![Some(hand(0.2, 0.4))])
            .with_interval(Duration::from_millis(1));
        let mut detector = spawn_detector(Box::new(provider));
        let events = wait_for(&detector, 2);
        detector.stop();

        assert!(matches!(events.first(), Some(DetectorEvent::Ready)));
        assert!(matches!(events.get(1), Some(DetectorEvent::Signal(InteractionSignal::Open))));
        // An unchanging hand produces a single signal.
        let signals = events.iter().filter(|e| matches!(e, DetectorEvent::Signal(_))).count();
        assert_eq!(signals, 1);
        assert!(!detector.is_running());
    }

    #[test]
    fn test_detector_panic_reports_unavailable() {
        let detector = spawn_detector(Box::new(FaultyProvider { good_frames: 3 }));
        let events = wait_for(&detector, 3);

        assert!(matches!(events.first(), Some(DetectorEvent::Ready)));
        assert!(matches!(events.get(1), Some(DetectorEvent::Signal(InteractionSignal::Open))));
        assert!(matches!(
            events.get(2),
            Some(DetectorEvent::Unavailable(ProviderError::DetectorStopped(reason))) if reason.contains("crashed")
        ));
    }

    #[test]
    fn test_stop_does_not_wait_for_open() {
        let mut detector = spawn_detector(Box::new(SlowOpenProvider {
            delay: Duration::from_secs(3),
        }));
        let started = Instant::now();
        detector.stop();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!detector.is_running());
    }
}
