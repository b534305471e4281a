//! Synthetic face-mesh frames with controllable geometry.
//!
//! Used by benches, tests and demo feeds where a real detector is not
//! available. Only the reserved indices carry meaningful geometry; every
//! other point sits at the frame center.

use crate::landmark::{mesh, FrameLandmarks, Landmark};

const EYE_WIDTH: f64 = 0.08;
const EYE_Y: f64 = 0.42;
const LEFT_EYE_CENTER_X: f64 = 0.40;
const RIGHT_EYE_CENTER_X: f64 = 0.60;

#[derive(Debug, Clone)]
pub struct SyntheticFace {
    left_ear: f64,
    right_ear: f64,
    head_deviation: f64,
    left_iris_z: f64,
    right_iris_z: f64,
    offset: (f64, f64),
    points: usize,
}

impl Default for SyntheticFace {
    fn default() -> Self {
        Self {
            left_ear: 0.30,
            right_ear: 0.30,
            head_deviation: 0.0,
            left_iris_z: 0.0,
            right_iris_z: 0.0,
            offset: (0.0, 0.0),
            points: mesh::IRIS_MESH_POINTS,
        }
    }
}

impl SyntheticFace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ear(mut self, ear: f64) -> Self {
        self.left_ear = ear;
        self.right_ear = ear;
        self
    }

    pub fn eyes(mut self, left: f64, right: f64) -> Self {
        self.left_ear = left;
        self.right_ear = right;
        self
    }

    /// Horizontal nose offset from the midpoint of the eye corners.
    pub fn head_deviation(mut self, deviation: f64) -> Self {
        self.head_deviation = deviation;
        self
    }

    pub fn iris_depth(mut self, left: f64, right: f64) -> Self {
        self.left_iris_z = left;
        self.right_iris_z = right;
        self
    }

    /// Shift every point, e.g. to simulate frame-to-frame jitter.
    pub fn offset(mut self, dx: f64, dy: f64) -> Self {
        self.offset = (dx, dy);
        self
    }

    pub fn point_count(mut self, points: usize) -> Self {
        self.points = points;
        self
    }

    pub fn build(&self) -> FrameLandmarks {
        let mut points = vec![Landmark::new(0.5, 0.5, 0.0); self.points];

        place_eye(&mut points, &mesh::LEFT_EYE, LEFT_EYE_CENTER_X, self.left_ear);
        place_eye(&mut points, &mesh::RIGHT_EYE, RIGHT_EYE_CENTER_X, self.right_ear);

        let corners_mid = (LEFT_EYE_CENTER_X + RIGHT_EYE_CENTER_X) / 2.0;
        let nose = Landmark::new(corners_mid + self.head_deviation, 0.55, -0.05);
        let left_iris = Landmark::new(LEFT_EYE_CENTER_X, EYE_Y, self.left_iris_z);
        let right_iris = Landmark::new(RIGHT_EYE_CENTER_X, EYE_Y, self.right_iris_z);
        set(&mut points, mesh::NOSE_TIP, nose);
        set(&mut points, mesh::LEFT_IRIS_CENTER, left_iris);
        set(&mut points, mesh::RIGHT_IRIS_CENTER, right_iris);

        let (dx, dy) = self.offset;
        for p in points.iter_mut() {
            p.x += dx;
            p.y += dy;
        }

        FrameLandmarks::new(points)
    }
}

fn set(points: &mut [Landmark], index: usize, value: Landmark) {
    if let Some(slot) = points.get_mut(index) {
        *slot = value;
    }
}

// p1 always lands on the smaller x, which puts 33 and 263 on the outside.
fn place_eye(points: &mut [Landmark], indices: &[usize; 6], center_x: f64, ear: f64) {
    let half_gap = ear * EYE_WIDTH / 2.0;
    let p1_x = center_x - EYE_WIDTH / 2.0;
    let p4_x = center_x + EYE_WIDTH / 2.0;
    let third = EYE_WIDTH / 3.0;

    set(points, indices[0], Landmark::new(p1_x, EYE_Y, 0.0));
    set(points, indices[3], Landmark::new(p4_x, EYE_Y, 0.0));
    set(points, indices[1], Landmark::new(p1_x + third, EYE_Y - half_gap, 0.0));
    set(points, indices[5], Landmark::new(p1_x + third, EYE_Y + half_gap, 0.0));
    set(points, indices[2], Landmark::new(p1_x + 2.0 * third, EYE_Y - half_gap, 0.0));
    set(points, indices[4], Landmark::new(p1_x + 2.0 * third, EYE_Y + half_gap, 0.0));
}
