//! Hand landmark data produced by the vision model.
//!
//! A [`LandmarkSet`] is one detected hand pose for one video frame: 21
//! keypoints in normalized image space, indexed by anatomical joint. Sets are
//! produced fresh by every detection call and never retained.
//!
//! The external model occasionally returns partial data, so a set may hold
//! fewer than [`LANDMARK_COUNT`] points. Lookups go through
//! [`LandmarkSet::get`] and never panic.

use serde::{Deserialize, Serialize};

// ============================================================================
// HAND LANDMARK INDICES
// ============================================================================

pub const WRIST: usize = 0;
pub const THUMB_CMC: usize = 1;
pub const THUMB_MCP: usize = 2;
pub const THUMB_IP: usize = 3;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_DIP: usize = 7;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_DIP: usize = 11;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_DIP: usize = 15;
pub const RING_TIP: usize = 16;
pub const PINKY_MCP: usize = 17;
pub const PINKY_PIP: usize = 18;
pub const PINKY_DIP: usize = 19;
pub const PINKY_TIP: usize = 20;

/// Number of keypoints in a complete hand.
pub const LANDMARK_COUNT: usize = 21;

/// A single keypoint in normalized image space.
///
/// `x` and `y` are in [0, 1] with the origin at the top-left of the frame,
/// so a smaller `y` is higher in the image. `z` is relative depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// One detected hand: an ordered sequence of keypoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    /// Wrap detector output. The length is not checked here.
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    /// Keypoint at an anatomical index, or `None` if the set is short.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.points.get(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl From<Vec<Landmark>> for LandmarkSet {
    fn from(points: Vec<Landmark>) -> Self {
        Self::new(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_set_lookup_is_none() {
        let set = LandmarkSet::new(vec![Landmark::default(); 10]);
        assert!(set.get(INDEX_PIP).is_some());
        assert!(set.get(MIDDLE_PIP).is_none());
        assert!(set.get(LANDMARK_COUNT).is_none());
    }

    #[test]
    fn test_deserialize_from_point_array() {
        let json = r#"[{"x":0.1,"y":0.2,"z":0.3},{"x":0.4,"y":0.5}]"#;
        let set: LandmarkSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(WRIST), Some(&Landmark::new(0.1, 0.2, 0.3)));
        assert_eq!(set.get(1).map(|p| p.z), Some(0.0));
    }
}
