use serde::{Deserialize, Serialize};

/// Face Mesh landmark indices used by the focus features.
pub mod mesh {
    // 6-point EAR sets: outer corner, upper lid x2, inner corner, lower lid x2
    pub const LEFT_EYE: [usize; 6] = [33, 160, 158, 133, 153, 144];
    pub const RIGHT_EYE: [usize; 6] = [362, 385, 387, 263, 373, 380];

    pub const NOSE_TIP: usize = 1;
    pub const LEFT_EYE_CORNER: usize = 33;
    pub const RIGHT_EYE_CORNER: usize = 263;

    // 虹膜中心点 (478点模型)
    pub const LEFT_IRIS_CENTER: usize = 468;
    pub const RIGHT_IRIS_CENTER: usize = 473;

    /// Point count of the mesh with iris refinement.
    pub const IRIS_MESH_POINTS: usize = 478;

    /// Smallest frame that still addresses every reserved index.
    pub const MIN_ADDRESSABLE: usize = RIGHT_IRIS_CENTER + 1;
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Landmark {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance in the image plane; depth is ignored.
    #[inline]
    pub fn planar_distance(&self, other: &Landmark) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// One detection cycle's output. Empty means no face was found.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameLandmarks(Vec<Landmark>);

impl FrameLandmarks {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self(points)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn points(&self) -> &[Landmark] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.0.get(index)
    }

    pub fn into_points(self) -> Vec<Landmark> {
        self.0
    }
}

impl From<Vec<Landmark>> for FrameLandmarks {
    fn from(points: Vec<Landmark>) -> Self {
        Self(points)
    }
}
