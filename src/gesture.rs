//! Open-palm gesture classification.
//!
//! Maps one frame's hand landmarks to a binary interaction signal. A finger
//! counts as open when its tip sits strictly above its middle (PIP) joint in
//! image space. The palm is open when the index, middle and ring fingers are
//! all open.
//!
//! The thumb and pinky are deliberately left out of the decision, and a
//! missing hand behaves like a closed one. Both are part of the intended
//! feel of the interaction, not gaps to be filled.

use crate::landmarks::{
    LandmarkSet, INDEX_PIP, INDEX_TIP, MIDDLE_PIP, MIDDLE_TIP, RING_PIP, RING_TIP,
};

/// (tip, middle joint) index pairs for the fingers that vote.
pub const VOTING_FINGERS: [(usize, usize); 3] = [
    (INDEX_TIP, INDEX_PIP),
    (MIDDLE_TIP, MIDDLE_PIP),
    (RING_TIP, RING_PIP),
];

/// Result of classifying one detection frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionSignal {
    /// Index, middle and ring fingers all extended.
    Open,
    /// A hand was seen but at least one voting finger is curled, or the
    /// landmark data was incomplete.
    Closed,
    /// No hand in the frame. Treated exactly like [`InteractionSignal::Closed`].
    Absent,
}

impl InteractionSignal {
    #[inline]
    pub fn is_open(self) -> bool {
        self == InteractionSignal::Open
    }
}

/// Classify one detection frame.
///
/// Total over its input: short or malformed sets classify as `Closed`, and a
/// NaN coordinate never compares as open.
pub fn classify(landmarks: Option<&LandmarkSet>) -> InteractionSignal {
    let Some(set) = landmarks else {
        return InteractionSignal::Absent;
    };

    let all_open = VOTING_FINGERS
        .iter()
        .all(|&(tip, joint)| finger_open(set, tip, joint).unwrap_or(false));

    if all_open {
        InteractionSignal::Open
    } else {
        InteractionSignal::Closed
    }
}

fn finger_open(set: &LandmarkSet, tip: usize, joint: usize) -> Option<bool> {
    let tip = set.get(tip)?;
    let joint = set.get(joint)?;
    Some(tip.y < joint.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{Landmark, LANDMARK_COUNT, PINKY_PIP, PINKY_TIP, THUMB_IP, THUMB_TIP};

    /// A complete hand with every voting finger at the given (tip, joint) y.
    fn hand(tip_y: f32, joint_y: f32) -> Vec<Landmark> {
        let mut points = vec![Landmark::new(0.5, 0.8, 0.0); LANDMARK_COUNT];
        for &(tip, joint) in &VOTING_FINGERS {
            points[tip].y = tip_y;
            points[joint].y = joint_y;
        }
        points
    }

    #[test]
    fn test_absent_hand() {
        assert_eq!(classify(None), InteractionSignal::Absent);
        assert!(!classify(None).is_open());
    }

    #[test]
    fn test_open_palm() {
        let set = LandmarkSet::new(hand(0.20, 0.35));
        assert_eq!(classify(Some(&set)), InteractionSignal::Open);
    }

    #[test]
    fn test_one_curled_finger_closes() {
        let mut points = hand(0.20, 0.35);
        points[RING_TIP].y = 0.50;
        points[RING_PIP].y = 0.40;
        let set = LandmarkSet::new(points);
        assert_eq!(classify(Some(&set)), InteractionSignal::Closed);
    }

    #[test]
    fn test_equal_height_is_not_open() {
        let set = LandmarkSet::new(hand(0.30, 0.30));
        assert_eq!(classify(Some(&set)), InteractionSignal::Closed);
    }

    #[test]
    fn test_thumb_and_pinky_do_not_vote() {
        let mut points = hand(0.20, 0.35);
        points[THUMB_TIP].y = 0.9;
        points[THUMB_IP].y = 0.1;
        points[PINKY_TIP].y = 0.9;
        points[PINKY_PIP].y = 0.1;
        let set = LandmarkSet::new(points);
        assert_eq!(classify(Some(&set)), InteractionSignal::Open);
    }

    #[test]
    fn test_short_sets_are_closed() {
        let full = hand(0.20, 0.35);
        for len in 0..=RING_TIP {
            let set = LandmarkSet::new(full[..len].to_vec());
            assert_eq!(classify(Some(&set)), InteractionSignal::Closed, "len {}", len);
        }
    }

    #[test]
    fn test_nan_coordinates_are_closed() {
        let mut points = hand(0.20, 0.35);
        points[MIDDLE_TIP].y = f32::NAN;
        let set = LandmarkSet::new(points);
        assert_eq!(classify(Some(&set)), InteractionSignal::Closed);
    }
}
