use serde::{Deserialize, Serialize};

use crate::landmark::{mesh, FrameLandmarks, Landmark};

/// Below this eye width (normalized units) the ratio is meaningless.
const MIN_EYE_WIDTH: f64 = 0.001;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EarPair {
    pub left: f64,
    pub right: f64,
}

impl EarPair {
    pub fn average(&self) -> f64 {
        (self.left + self.right) / 2.0
    }
}

fn compute_ear_6pt(
    p1: &Landmark,
    p2: &Landmark,
    p3: &Landmark,
    p4: &Landmark,
    p5: &Landmark,
    p6: &Landmark,
) -> Option<f64> {
    let v1 = p2.planar_distance(p6);
    let v2 = p3.planar_distance(p5);
    let h = p1.planar_distance(p4);
    if h.is_nan() || h < MIN_EYE_WIDTH {
        return None;
    }
    let ear = (v1 + v2) / (2.0 * h);
    ear.is_finite().then_some(ear)
}

/// EAR of a single eye from its 6-point index set.
///
/// Returns `None` when an index is out of range or the eye corners collapse
/// onto each other.
pub fn eye_aspect_ratio(frame: &FrameLandmarks, indices: &[usize; 6]) -> Option<f64> {
    let p1 = frame.get(indices[0])?;
    let p2 = frame.get(indices[1])?;
    let p3 = frame.get(indices[2])?;
    let p4 = frame.get(indices[3])?;
    let p5 = frame.get(indices[4])?;
    let p6 = frame.get(indices[5])?;

    compute_ear_6pt(p1, p2, p3, p4, p5, p6)
}

pub fn both_eyes(frame: &FrameLandmarks) -> Option<EarPair> {
    let left = eye_aspect_ratio(frame, &mesh::LEFT_EYE)?;
    let right = eye_aspect_ratio(frame, &mesh::RIGHT_EYE)?;
    Some(EarPair { left, right })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_eye(indices: &[usize; 6], width: f64, lid_gap: f64) -> FrameLandmarks {
        let mut points = vec![Landmark::default(); mesh::IRIS_MESH_POINTS];
        let half = lid_gap / 2.0;
        points[indices[0]] = Landmark::new(0.40, 0.50, 0.0);
        points[indices[3]] = Landmark::new(0.40 + width, 0.50, 0.0);
        points[indices[1]] = Landmark::new(0.40 + width / 3.0, 0.50 - half, 0.0);
        points[indices[2]] = Landmark::new(0.40 + 2.0 * width / 3.0, 0.50 - half, 0.0);
        points[indices[4]] = Landmark::new(0.40 + 2.0 * width / 3.0, 0.50 + half, 0.0);
        points[indices[5]] = Landmark::new(0.40 + width / 3.0, 0.50 + half, 0.0);
        FrameLandmarks::new(points)
    }

    #[test]
    fn test_ear_matches_formula() {
        let frame = frame_with_eye(&mesh::LEFT_EYE, 0.10, 0.03);
        let ear = eye_aspect_ratio(&frame, &mesh::LEFT_EYE).unwrap();
        // (0.03 + 0.03) / (2 * 0.10)
        assert!((ear - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_closed_eye_is_near_zero() {
        let frame = frame_with_eye(&mesh::RIGHT_EYE, 0.10, 0.0);
        let ear = eye_aspect_ratio(&frame, &mesh::RIGHT_EYE).unwrap();
        assert!(ear.abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_width_rejected() {
        let frame = frame_with_eye(&mesh::LEFT_EYE, 0.0, 0.03);
        assert!(eye_aspect_ratio(&frame, &mesh::LEFT_EYE).is_none());
    }

    #[test]
    fn test_short_frame_rejected() {
        let frame = FrameLandmarks::new(vec![Landmark::default(); 100]);
        assert!(both_eyes(&frame).is_none());
    }

    #[test]
    fn test_average() {
        let pair = EarPair { left: 0.2, right: 0.3 };
        assert!((pair.average() - 0.25).abs() < 1e-12);
    }
}
