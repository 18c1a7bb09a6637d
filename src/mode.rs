//! Interaction mode and the per-session mode context.
//!
//! The mode has exactly one writer per update cycle: gesture signals while
//! camera-driven control is active, manual pointer/touch input otherwise.
//! [`ModeState`] enforces that by tracking which [`ControlSource`] currently
//! owns it and ignoring writes from the other one.

use crate::gesture::InteractionSignal;

/// Binary session state driving the morph target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum InteractionMode {
    /// Particles gathered into the tree shape.
    #[default]
    Assembled,
    /// Particles spread into the spherical cloud.
    Scattered,
}

impl InteractionMode {
    /// Morph target for this mode (0 = assembled, 1 = scattered).
    #[inline]
    pub fn target(self) -> f32 {
        match self {
            InteractionMode::Assembled => 0.0,
            InteractionMode::Scattered => 1.0,
        }
    }
}

impl From<InteractionSignal> for InteractionMode {
    fn from(signal: InteractionSignal) -> Self {
        match signal {
            InteractionSignal::Open => InteractionMode::Scattered,
            InteractionSignal::Closed | InteractionSignal::Absent => InteractionMode::Assembled,
        }
    }
}

/// Edge-triggered manual control signals from pointer or touch devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualSignal {
    /// Pointer down / touch start.
    Press,
    /// Pointer up, pointer leaving the window, or touch end.
    Release,
}

/// Which input currently owns the mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ControlSource {
    /// Pointer/touch input (gesture detection unavailable or dismissed).
    #[default]
    Manual,
    /// Hand gesture classifier output.
    Gesture,
}

/// Owned mode context, passed into the per-frame update.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeState {
    mode: InteractionMode,
    source: ControlSource,
}

impl ModeState {
    /// Assembled, under manual control.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    #[inline]
    pub fn source(&self) -> ControlSource {
        self.source
    }

    /// Hand ownership to another input. The mode falls back to assembled
    /// so a held press or open palm doesn't leak across the switch.
    ///
    /// Returns `true` if the source actually changed.
    pub fn set_source(&mut self, source: ControlSource) -> bool {
        if self.source == source {
            return false;
        }
        self.source = source;
        self.mode = InteractionMode::Assembled;
        true
    }

    /// Apply a classifier result. Ignored unless gesture control is active.
    ///
    /// Returns `true` if the mode changed.
    pub fn apply_signal(&mut self, signal: InteractionSignal) -> bool {
        if self.source != ControlSource::Gesture {
            return false;
        }
        self.set_mode(signal.into())
    }

    /// Apply a manual press/release. Ignored unless manual control is active.
    ///
    /// Returns `true` if the mode changed.
    pub fn apply_manual(&mut self, signal: ManualSignal) -> bool {
        if self.source != ControlSource::Manual {
            return false;
        }
        let mode = match signal {
            ManualSignal::Press => InteractionMode::Scattered,
            ManualSignal::Release => InteractionMode::Assembled,
        };
        self.set_mode(mode)
    }

    fn set_mode(&mut self, mode: InteractionMode) -> bool {
        let changed = self.mode != mode;
        self.mode = mode;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_assembled_manual() {
        let state = ModeState::new();
        assert_eq!(state.mode(), InteractionMode::Assembled);
        assert_eq!(state.source(), ControlSource::Manual);
    }

    #[test]
    fn test_signal_mapping() {
        assert_eq!(InteractionMode::from(InteractionSignal::Open), InteractionMode::Scattered);
        assert_eq!(InteractionMode::from(InteractionSignal::Closed), InteractionMode::Assembled);
        assert_eq!(InteractionMode::from(InteractionSignal::Absent), InteractionMode::Assembled);
    }

    #[test]
    fn test_manual_press_release() {
        let mut state = ModeState::new();
        assert!(state.apply_manual(ManualSignal::Press));
        assert_eq!(state.mode(), InteractionMode::Scattered);
        assert!(!state.apply_manual(ManualSignal::Press));
        assert!(state.apply_manual(ManualSignal::Release));
        assert_eq!(state.mode(), InteractionMode::Assembled);
    }

    #[test]
    fn test_gesture_ignored_under_manual_control() {
        let mut state = ModeState::new();
        assert!(!state.apply_signal(InteractionSignal::Open));
        assert_eq!(state.mode(), InteractionMode::Assembled);
    }

    #[test]
    fn test_manual_ignored_under_gesture_control() {
        let mut state = ModeState::new();
        state.set_source(ControlSource::Gesture);
        assert!(!state.apply_manual(ManualSignal::Press));
        assert!(state.apply_signal(InteractionSignal::Open));
        assert_eq!(state.mode(), InteractionMode::Scattered);
    }

    #[test]
    fn test_source_switch_resets_mode() {
        let mut state = ModeState::new();
        state.apply_manual(ManualSignal::Press);
        assert!(state.set_source(ControlSource::Gesture));
        assert_eq!(state.mode(), InteractionMode::Assembled);
        assert!(!state.set_source(ControlSource::Gesture));
    }
}
