use serde::{Deserialize, Serialize};

use crate::ear;
use crate::landmark::{mesh, FrameLandmarks};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Frames shorter than this carry no iris refinement and are rejected.
    pub min_landmarks: usize,
    /// Iris centers at or below this depth count as hidden.
    pub iris_z_threshold: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            min_landmarks: mesh::IRIS_MESH_POINTS,
            iris_z_threshold: -0.15,
        }
    }
}

/// Per-frame geometric features. Never kept past the frame it was
/// computed for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocusSample {
    pub ear_left: f64,
    pub ear_right: f64,
    pub head_deviation: f64,
    pub iris_visible_left: bool,
    pub iris_visible_right: bool,
    pub jitter: f64,
}

impl FocusSample {
    pub fn avg_ear(&self) -> f64 {
        (self.ear_left + self.ear_right) / 2.0
    }

    pub fn irises_visible(&self) -> bool {
        self.iris_visible_left && self.iris_visible_right
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: FeatureConfig,
}

impl FeatureExtractor {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    fn required_landmarks(&self) -> usize {
        self.config.min_landmarks.max(mesh::MIN_ADDRESSABLE)
    }

    /// Computes the focus features of `current`.
    ///
    /// `previous` is the immediately preceding frame of the same face, used
    /// only for jitter. Returns `None` for empty, truncated or garbled frames.
    pub fn extract(
        &self,
        current: &FrameLandmarks,
        previous: Option<&FrameLandmarks>,
    ) -> Option<FocusSample> {
        if current.len() < self.required_landmarks() {
            return None;
        }

        let reserved = mesh::LEFT_EYE
            .into_iter()
            .chain(mesh::RIGHT_EYE)
            .chain([mesh::NOSE_TIP, mesh::LEFT_IRIS_CENTER, mesh::RIGHT_IRIS_CENTER]);
        for index in reserved {
            if !current.get(index)?.is_finite() {
                return None;
            }
        }

        let ears = ear::both_eyes(current)?;
        let head_deviation = head_deviation(current)?;

        let left_iris = current.get(mesh::LEFT_IRIS_CENTER)?;
        let right_iris = current.get(mesh::RIGHT_IRIS_CENTER)?;

        Some(FocusSample {
            ear_left: ears.left,
            ear_right: ears.right,
            head_deviation,
            iris_visible_left: left_iris.z > self.config.iris_z_threshold,
            iris_visible_right: right_iris.z > self.config.iris_z_threshold,
            jitter: previous.map_or(0.0, |prev| jitter(current, prev)),
        })
    }
}

/// Yaw proxy: horizontal offset of the nose tip from the eye-corner midpoint.
pub fn head_deviation(frame: &FrameLandmarks) -> Option<f64> {
    let nose = frame.get(mesh::NOSE_TIP)?;
    let left = frame.get(mesh::LEFT_EYE_CORNER)?;
    let right = frame.get(mesh::RIGHT_EYE_CORNER)?;
    let eye_center_x = (left.x + right.x) / 2.0;
    Some((nose.x - eye_center_x).abs())
}

/// Mean planar displacement across all indices. Frames of different
/// topology are not comparable and yield 0.
pub fn jitter(current: &FrameLandmarks, previous: &FrameLandmarks) -> f64 {
    if current.is_empty() || current.len() != previous.len() {
        return 0.0;
    }

    let total: f64 = current
        .points()
        .iter()
        .zip(previous.points())
        .map(|(a, b)| a.planar_distance(b))
        .filter(|d| d.is_finite())
        .sum();

    total / current.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::Landmark;
    use crate::synthetic::SyntheticFace;

    #[test]
    fn test_extract_neutral_face() {
        let extractor = FeatureExtractor::default();
        let frame = SyntheticFace::new().ear(0.28).build();
        let sample = extractor.extract(&frame, None).unwrap();

        assert!((sample.avg_ear() - 0.28).abs() < 1e-9);
        assert!(sample.head_deviation < 1e-9);
        assert!(sample.irises_visible());
        assert_eq!(sample.jitter, 0.0);
    }

    #[test]
    fn test_too_few_landmarks() {
        let extractor = FeatureExtractor::default();
        let frame = SyntheticFace::new().point_count(468).build();
        assert!(extractor.extract(&frame, None).is_none());
        assert!(extractor.extract(&FrameLandmarks::empty(), None).is_none());
    }

    #[test]
    fn test_min_landmarks_never_below_addressable() {
        let extractor = FeatureExtractor::new(FeatureConfig {
            min_landmarks: 10,
            ..Default::default()
        });
        assert_eq!(extractor.config().min_landmarks, 10);
        let frame = SyntheticFace::new().point_count(mesh::MIN_ADDRESSABLE - 1).build();
        assert!(extractor.extract(&frame, None).is_none());

        let frame = SyntheticFace::new().point_count(mesh::MIN_ADDRESSABLE).build();
        assert!(extractor.extract(&frame, None).is_some());
    }

    #[test]
    fn test_head_deviation_is_absolute() {
        let extractor = FeatureExtractor::default();
        let right = SyntheticFace::new().head_deviation(0.07).build();
        let left = SyntheticFace::new().head_deviation(-0.07).build();
        let right = extractor.extract(&right, None).unwrap();
        let left = extractor.extract(&left, None).unwrap();
        assert!((right.head_deviation - 0.07).abs() < 1e-9);
        assert!((left.head_deviation - 0.07).abs() < 1e-9);
    }

    #[test]
    fn test_iris_depth_threshold() {
        let extractor = FeatureExtractor::default();
        let frame = SyntheticFace::new().iris_depth(-0.2, -0.1).build();
        let sample = extractor.extract(&frame, None).unwrap();
        assert!(!sample.iris_visible_left);
        assert!(sample.iris_visible_right);
        assert!(!sample.irises_visible());

        let frame = SyntheticFace::new().iris_depth(-0.15, -0.149).build();
        let sample = extractor.extract(&frame, None).unwrap();
        assert!(!sample.iris_visible_left);
        assert!(sample.iris_visible_right);
    }

    #[test]
    fn test_jitter_uses_previous_frame() {
        let extractor = FeatureExtractor::default();
        let prev = SyntheticFace::new().build();
        let cur = SyntheticFace::new().offset(0.003, 0.004).build();
        let sample = extractor.extract(&cur, Some(&prev)).unwrap();
        assert!((sample.jitter - 0.005).abs() < 1e-9);
    }

    #[test]
    fn test_jitter_mismatched_topology() {
        let a = FrameLandmarks::new(vec![Landmark::new(0.1, 0.1, 0.0); 3]);
        let b = FrameLandmarks::new(vec![Landmark::new(0.2, 0.2, 0.0); 4]);
        assert_eq!(jitter(&a, &b), 0.0);
    }

    #[test]
    fn test_garbled_reserved_point_rejected() {
        let extractor = FeatureExtractor::default();
        let mut points = SyntheticFace::new().build().into_points();
        points[mesh::NOSE_TIP].x = f64::NAN;
        assert!(extractor.extract(&FrameLandmarks::new(points), None).is_none());
    }
}
