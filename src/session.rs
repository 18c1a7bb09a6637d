//! Session controller.
//!
//! A [`Session`] owns everything that lives for one run of the experience:
//! the particle field (generated once), the mode context, the morph driver,
//! and the background detector. The app calls [`Session::frame`] once per
//! redraw and forwards manual input; the renderer reads the returned
//! [`FrameState`] and the field's attribute arrays.

use crate::config::TinselConfig;
use crate::error::ProviderError;
use crate::field::ParticleField;
use crate::mode::{ControlSource, InteractionMode, ManualSignal, ModeState};
use crate::morph::{MorphDriver, SETTLE_EPSILON};
use crate::provider::{spawn_detector, Detector, DetectorEvent, LandmarkProvider};

/// Footer hint while the hand drives the mode.
pub const GESTURE_HINT: &str = "OPEN PALM TO SCATTER";
/// Footer hint under manual control.
pub const MANUAL_HINT: &str = "HOLD TO SCATTER";

/// Builds a fresh provider for each detection attempt.
pub type ProviderFactory = Box<dyn FnMut() -> Box<dyn LandmarkProvider>>;

/// Where control of the mode currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlStatus {
    /// Detector is opening. Manual input works meanwhile.
    Loading,
    /// Hand gestures drive the mode.
    GestureActive,
    /// Detection failed; waiting for retry or dismissal.
    PermissionPrompt,
    /// The user chose manual controls after a failure.
    ManualDismissed,
    /// No detection was configured.
    ManualOnly,
}

impl ControlStatus {
    pub fn is_gesture_active(self) -> bool {
        self == ControlStatus::GestureActive
    }

    /// Status line for the window title, if any.
    pub fn message(self) -> Option<&'static str> {
        match self {
            ControlStatus::Loading => Some("Initializing camera..."),
            ControlStatus::PermissionPrompt => {
                Some("Camera unavailable. R: retry, M: proceed with manual controls")
            }
            _ => None,
        }
    }
}

/// Per-frame values handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    pub morph_factor: f32,
    /// Seconds of animation time.
    pub elapsed: f32,
    pub mode: InteractionMode,
}

pub struct Session {
    field: ParticleField,
    mode: ModeState,
    morph: MorphDriver,
    status: ControlStatus,
    detector: Option<Detector>,
    factory: Option<ProviderFactory>,
    settled: bool,
}

impl Session {
    /// Generate the field and start detection if a provider factory is
    /// given. Without one the session is manual-only.
    pub fn new(config: &TinselConfig, factory: Option<ProviderFactory>) -> Self {
        let field = match config.seed {
            Some(seed) => ParticleField::generate_seeded(config.particle_count, seed),
            None => ParticleField::generate(config.particle_count),
        };
        log::info!("Generated {} particles", field.len());

        let mut session = Self {
            field,
            mode: ModeState::new(),
            morph: MorphDriver::new(),
            status: ControlStatus::ManualOnly,
            detector: None,
            factory,
            settled: true,
        };
        session.start_detection();
        session
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn status(&self) -> ControlStatus {
        self.status
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode.mode()
    }

    pub fn control_source(&self) -> ControlSource {
        self.mode.source()
    }

    pub fn morph(&self) -> &MorphDriver {
        &self.morph
    }

    /// Footer text for the current control source.
    pub fn hint(&self) -> &'static str {
        if self.status.is_gesture_active() {
            GESTURE_HINT
        } else {
            MANUAL_HINT
        }
    }

    /// Apply pending detector events, then advance the morph by `dt` seconds.
    pub fn frame(&mut self, dt: f32) -> FrameState {
        // Check for exit before draining so nothing sent before it is missed.
        let (events, exited): (Vec<DetectorEvent>, bool) = match &self.detector {
            Some(detector) => {
                let exited = !detector.is_running();
                (detector.events().collect(), exited)
            }
            None => (Vec::new(), false),
        };
        for event in events {
            self.handle_detector_event(event);
        }
        if exited && self.detector.is_some() {
            self.fall_back_to_manual(ProviderError::DetectorStopped(
                "detector thread exited".into(),
            ));
        }

        let mode = self.mode.mode();
        let factor = self.morph.update(dt, mode);

        let settled = self.morph.is_settled(mode, SETTLE_EPSILON);
        if settled && !self.settled {
            log::debug!("Morph settled at {:.3} ({:?})", factor, mode);
        }
        self.settled = settled;

        FrameState {
            morph_factor: factor,
            elapsed: self.morph.elapsed(),
            mode,
        }
    }

    /// Manual press (pointer down, touch start). Ignored under gesture
    /// control. Returns `true` if the mode changed.
    pub fn press(&mut self) -> bool {
        self.manual(ManualSignal::Press)
    }

    /// Manual release (pointer up or leave, touch end).
    pub fn release(&mut self) -> bool {
        self.manual(ManualSignal::Release)
    }

    /// Restart detection after a failure. Only valid from the permission
    /// prompt; returns `true` if a new attempt started.
    pub fn retry(&mut self) -> bool {
        if self.status != ControlStatus::PermissionPrompt || self.factory.is_none() {
            return false;
        }
        log::info!("Retrying hand detection");
        self.start_detection();
        true
    }

    /// Continue with manual controls after a failure.
    pub fn dismiss(&mut self) -> bool {
        if self.status != ControlStatus::PermissionPrompt {
            return false;
        }
        log::info!("Proceeding with manual controls");
        self.status = ControlStatus::ManualDismissed;
        true
    }

    fn manual(&mut self, signal: ManualSignal) -> bool {
        let changed = self.mode.apply_manual(signal);
        if changed {
            log::debug!("Mode -> {:?} (manual)", self.mode.mode());
        }
        changed
    }

    fn start_detection(&mut self) {
        if self.factory.is_none() {
            return;
        }
        self.stop_detection();
        let Some(factory) = self.factory.as_mut() else {
            return;
        };
        self.detector = Some(spawn_detector(factory()));
        self.status = ControlStatus::Loading;
    }

    fn stop_detection(&mut self) {
        if let Some(mut detector) = self.detector.take() {
            detector.stop();
        }
    }

    fn fall_back_to_manual(&mut self, error: ProviderError) {
        log::warn!("Hand detection unavailable: {}", error);
        self.status = ControlStatus::PermissionPrompt;
        if self.mode.set_source(ControlSource::Manual) {
            log::info!("Manual control active");
        }
        self.stop_detection();
    }

    fn handle_detector_event(&mut self, event: DetectorEvent) {
        match event {
            DetectorEvent::Ready => {
                self.status = ControlStatus::GestureActive;
                if self.mode.set_source(ControlSource::Gesture) {
                    log::info!("Gesture control active");
                }
            }
            DetectorEvent::Unavailable(e) => self.fall_back_to_manual(e),
            DetectorEvent::Signal(signal) => {
                if self.mode.apply_signal(signal) {
                    log::debug!("Mode -> {:?} ({:?})", self.mode.mode(), signal);
                }
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop_detection();
    }
}
