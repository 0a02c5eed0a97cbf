//! Camera orientation and projection.

use glam::{DMat4, DVec3};
use strata_core::{Camera, Transform};
use strata_scene::{CameraData, Projection};

/// Prefix of imported camera names.
pub const CAMERA_PREFIX: &str = "Cam: ";

/// Name of the camera imported from the last active view.
pub const LAST_VIEW: &str = "Last View";

/// Orthonormal camera axes. The camera looks down `-forward`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub right: DVec3,
    pub up: DVec3,
    pub forward: DVec3,
}

/// Derives camera transforms and projections from source cameras.
#[derive(Debug, Clone, Copy)]
pub struct CameraProjector {
    viewport_aspect_ratio: f64,
    far_plane: f64,
}

impl CameraProjector {
    pub fn new(viewport_aspect_ratio: f64, far_plane: f64) -> Self {
        Self {
            viewport_aspect_ratio,
            far_plane,
        }
    }

    /// Basis vectors for a camera at `position` looking at `target`.
    ///
    /// `forward` points from the target back to the camera. Degenerate
    /// input (coincident points, or `up` parallel to the view direction)
    /// falls back to world axes instead of producing NaNs.
    pub fn project(position: DVec3, target: DVec3, up: DVec3) -> CameraBasis {
        let forward = (position - target).try_normalize().unwrap_or(DVec3::Z);
        let right = up
            .cross(forward)
            .try_normalize()
            .or_else(|| DVec3::Y.cross(forward).try_normalize())
            .unwrap_or(DVec3::X);
        let up = forward.cross(right).normalize();
        CameraBasis { right, up, forward }
    }

    /// Projection of a source camera. No field of view means orthographic;
    /// otherwise the angle is the field of view in radians scaled by the
    /// aspect ratio (the viewport's when the camera has none).
    pub fn projection(&self, camera: &Camera) -> Projection {
        match camera.fov {
            Some(fov) if fov.is_finite() && fov > 0.0 => {
                let aspect = camera.aspect_ratio.unwrap_or(self.viewport_aspect_ratio);
                Projection::Perspective {
                    angle: (std::f64::consts::PI * fov / 180.0) * aspect,
                }
            }
            _ => Projection::Orthographic,
        }
    }

    /// Output camera named `"Cam: <name>"`.
    pub fn camera_data(&self, name: &str, camera: &Camera) -> CameraData {
        let basis = Self::project(camera.position, camera.target, camera.up);
        let matrix = DMat4::from_cols(
            basis.right.extend(0.0),
            basis.up.extend(0.0),
            basis.forward.extend(0.0),
            camera.position.extend(1.0),
        );
        let data = CameraData {
            name: format!("{CAMERA_PREFIX}{name}"),
            transform: Transform::from_matrix(matrix),
            projection: self.projection(camera),
            clip_end: self.far_plane,
        };
        if camera.aspect_ratio.is_none() {
            log::debug!("{} uses the viewport aspect ratio", data.name);
        }
        if data.is_orthographic() {
            log::debug!("{} is orthographic", data.name);
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_basis_looking_down_y() {
        let basis = CameraProjector::project(DVec3::new(0.0, -10.0, 0.0), DVec3::ZERO, DVec3::Z);
        assert!(basis.forward.abs_diff_eq(DVec3::NEG_Y, EPS));
        assert!(basis.right.abs_diff_eq(DVec3::X, EPS));
        assert!(basis.up.abs_diff_eq(DVec3::Z, EPS));
    }

    #[test]
    fn test_basis_is_orthonormal() {
        let basis = CameraProjector::project(DVec3::new(3.0, -7.0, 4.0), DVec3::new(1.0, 2.0, 0.5), DVec3::new(0.1, 0.0, 1.0));
        for axis in [basis.right, basis.up, basis.forward] {
            assert!((axis.length() - 1.0).abs() < 1e-9);
        }
        assert!(basis.right.dot(basis.up).abs() < 1e-9);
        assert!(basis.right.dot(basis.forward).abs() < 1e-9);
        assert!(basis.up.dot(basis.forward).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_input_stays_finite() {
        let basis = CameraProjector::project(DVec3::ONE, DVec3::ONE, DVec3::Z);
        assert!(basis.right.is_finite() && basis.up.is_finite() && basis.forward.is_finite());
        let straight_down = CameraProjector::project(DVec3::new(0.0, 0.0, 10.0), DVec3::ZERO, DVec3::Z);
        assert!(straight_down.right.is_finite());
        assert!((straight_down.right.length() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_fov_is_orthographic() {
        let projector = CameraProjector::new(16.0 / 9.0, 250.0);
        let camera = Camera::orthographic(DVec3::Z, DVec3::ZERO);
        assert_eq!(projector.projection(&camera), Projection::Orthographic);
    }

    #[test]
    fn test_fov_scaled_by_aspect() {
        let projector = CameraProjector::new(16.0 / 9.0, 250.0);
        let camera = Camera::perspective(DVec3::Z, DVec3::ZERO, 60.0).with_aspect_ratio(1.5);
        match projector.projection(&camera) {
            Projection::Perspective { angle } => assert!((angle - (PI * 60.0 / 180.0) * 1.5).abs() < EPS),
            other => panic!("expected perspective, got {other:?}"),
        }
    }

    #[test]
    fn test_viewport_aspect_fallback() {
        let projector = CameraProjector::new(2.0, 250.0);
        let camera = Camera::perspective(DVec3::Z, DVec3::ZERO, 45.0);
        assert_eq!(
            projector.projection(&camera),
            Projection::Perspective {
                angle: (PI * 45.0 / 180.0) * 2.0
            }
        );
    }

    #[test]
    fn test_camera_data() {
        let projector = CameraProjector::new(16.0 / 9.0, 120.0);
        let camera = Camera::perspective(DVec3::new(0.0, -10.0, 2.0), DVec3::new(0.0, 0.0, 2.0), 35.0);
        let data = projector.camera_data("Front", &camera);
        assert_eq!(data.name, "Cam: Front");
        assert_eq!(data.clip_end, 120.0);
        assert_eq!(data.transform.translation(), DVec3::new(0.0, -10.0, 2.0));
    }
}
