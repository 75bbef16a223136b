//! Hand-gesture classification from MediaPipe-style landmarks.
//!
//! The vision pipeline hands us 21 normalized points per hand. A finger
//! counts as extended when its tip sits farther from the wrist than its PIP
//! joint by a 1.1x margin; gestures are pure functions of the five
//! extended/curled flags.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Landmarks per detected hand in the MediaPipe hand model
pub const LANDMARKS_PER_HAND: usize = 21;

/// Wrist landmark index (projectile origin)
pub const WRIST: usize = 0;

/// (tip, pip) landmark index pairs: thumb, index, middle, ring, pinky
const FINGERS: [(usize, usize); 5] = [(4, 3), (8, 6), (12, 10), (16, 14), (20, 18)];

/// Margin by which a tip must out-distance its PIP joint to count as extended
const EXTENSION_RATIO: f32 = 1.1;

/// A single normalized hand landmark (0.0..1.0 in capture space)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

impl Landmark {
    pub fn distance(&self, other: &Landmark) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Classified hand pose
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gesture {
    #[default]
    None,
    Fist,
    Point,
    OpenPalm,
    ThumbsUp,
}

impl Gesture {
    /// Wire name expected by the backend
    pub fn as_str(&self) -> &'static str {
        match self {
            Gesture::None => "NONE",
            Gesture::Fist => "FIST",
            Gesture::Point => "POINT",
            Gesture::OpenPalm => "OPEN_PALM",
            Gesture::ThumbsUp => "THUMBS_UP",
        }
    }
}

/// Which poses the classifier recognizes.
///
/// The battle ruleset ignores the thumb when testing POINT; the tutorial
/// ruleset recognizes THUMBS_UP and requires the thumb curled for POINT.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Ruleset {
    #[default]
    Battle,
    Tutorial,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GestureError {
    #[error("expected {LANDMARKS_PER_HAND} hand landmarks, got {got}")]
    InvalidLandmarkCount { got: usize },
}

fn finger_extended(landmarks: &[Landmark], tip: usize, pip: usize) -> bool {
    let wrist = landmarks[WRIST];
    landmarks[tip].distance(&wrist) > landmarks[pip].distance(&wrist) * EXTENSION_RATIO
}

/// Classify one hand's landmarks into a gesture
pub fn classify(landmarks: &[Landmark], ruleset: Ruleset) -> Result<Gesture, GestureError> {
    if landmarks.len() != LANDMARKS_PER_HAND {
        return Err(GestureError::InvalidLandmarkCount {
            got: landmarks.len(),
        });
    }

    let [thumb, index, middle, ring, pinky] =
        FINGERS.map(|(tip, pip)| finger_extended(landmarks, tip, pip));
    let extended_count = [thumb, index, middle, ring, pinky]
        .iter()
        .filter(|f| **f)
        .count();

    if ruleset == Ruleset::Tutorial && thumb && !index && !middle && !ring && !pinky {
        return Ok(Gesture::ThumbsUp);
    }
    if extended_count == 0 {
        return Ok(Gesture::Fist);
    }
    let point = match ruleset {
        Ruleset::Battle => index && !middle && !ring && !pinky,
        Ruleset::Tutorial => index && !middle && !ring && !pinky && !thumb,
    };
    if point {
        return Ok(Gesture::Point);
    }
    if extended_count >= 4 {
        return Ok(Gesture::OpenPalm);
    }
    Ok(Gesture::None)
}

/// Wrist position of a hand frame, if the frame is well-formed
pub fn wrist(landmarks: &[Landmark]) -> Option<Landmark> {
    (landmarks.len() == LANDMARKS_PER_HAND).then(|| landmarks[WRIST])
}
