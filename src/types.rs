use rayon::prelude::*;

#[derive(Clone, Debug)]
pub struct Frame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    pub fn new(rgba: Vec<u8>, width: u32, height: u32) -> Self {
        Self { rgba, width, height }
    }

    /// Mirror the frame around its vertical axis so the output reads like a mirror.
    pub fn mirror(&mut self) {
        let stride = self.width as usize * 4;
        if stride == 0 || self.rgba.len() % stride != 0 {
            return;
        }
        self.rgba.par_chunks_mut(stride).for_each(|row| {
            let pixels = row.len() / 4;
            for x in 0..pixels / 2 {
                let (left, right) = (x * 4, (pixels - 1 - x) * 4);
                for c in 0..4 {
                    row.swap(left + c, right + c);
                }
            }
        });
    }
}

/// One tracked body joint in normalized image coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub visibility: f32,
}

impl Point3 {
    pub const fn new(x: f32, y: f32, z: f32, visibility: f32) -> Self {
        Self {
            x,
            y,
            z,
            visibility,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

pub const LANDMARK_COUNT: usize = 33;

/// The 33 body joints reported by the landmark model, in model output order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum Joint {
    Nose = 0,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl Joint {
    pub const ALL: [Joint; LANDMARK_COUNT] = [
        Joint::Nose,
        Joint::LeftEyeInner,
        Joint::LeftEye,
        Joint::LeftEyeOuter,
        Joint::RightEyeInner,
        Joint::RightEye,
        Joint::RightEyeOuter,
        Joint::LeftEar,
        Joint::RightEar,
        Joint::MouthLeft,
        Joint::MouthRight,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftPinky,
        Joint::RightPinky,
        Joint::LeftIndex,
        Joint::RightIndex,
        Joint::LeftThumb,
        Joint::RightThumb,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
        Joint::LeftHeel,
        Joint::RightHeel,
        Joint::LeftFootIndex,
        Joint::RightFootIndex,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// A complete skeleton for one frame. Frames without a detection carry no
/// `LandmarkSet` at all (`Option<LandmarkSet>`), so partial sets cannot exist.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkSet {
    points: [Point3; LANDMARK_COUNT],
}

impl LandmarkSet {
    pub fn new(points: [Point3; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    pub fn from_fn(mut f: impl FnMut(Joint) -> Point3) -> Self {
        Self {
            points: Joint::ALL.map(&mut f),
        }
    }

    /// Builds a set from model output; anything but exactly 33 points is rejected.
    pub fn from_slice(points: &[Point3]) -> Option<Self> {
        let points: [Point3; LANDMARK_COUNT] = points.try_into().ok()?;
        Some(Self { points })
    }

    pub fn point(&self, joint: Joint) -> &Point3 {
        &self.points[joint.index()]
    }

    /// The joint's position, or `None` when the model produced unusable coordinates.
    pub fn joint(&self, joint: Joint) -> Option<&Point3> {
        let point = self.point(joint);
        point.is_finite().then_some(point)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Joint, &Point3)> {
        Joint::ALL.iter().copied().zip(self.points.iter())
    }
}

/// Pose names matched for one frame, in registry order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassificationResult {
    matches: Vec<&'static str>,
}

impl ClassificationResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_matches(matches: Vec<&'static str>) -> Self {
        Self { matches }
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn names(&self) -> &[&'static str] {
        &self.matches
    }

    pub fn contains(&self, name: &str) -> bool {
        self.matches.iter().any(|m| *m == name)
    }

    pub fn label(&self) -> String {
        if self.matches.is_empty() {
            "No pose detected".to_string()
        } else {
            format!("Detected: {}", self.matches.join(", "))
        }
    }
}
