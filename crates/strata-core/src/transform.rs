//! Affine transforms for scene nodes.

use glam::{DMat4, DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// A 4x4 affine transform.
///
/// Serialized as 16 column-major numbers. Composition follows the usual
/// convention: `parent.compose(&local)` applies `local` first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transform(DMat4);

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<DMat4> for Transform {
    fn from(matrix: DMat4) -> Self {
        Self(matrix)
    }
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self(DMat4::IDENTITY);

    pub fn from_matrix(matrix: DMat4) -> Self {
        Self(matrix)
    }

    /// Build a transform from 16 column-major values.
    pub fn from_cols_array(values: &[f64; 16]) -> Self {
        Self(DMat4::from_cols_array(values))
    }

    pub fn from_translation(translation: DVec3) -> Self {
        Self(DMat4::from_translation(translation))
    }

    pub fn from_rotation(rotation: DQuat) -> Self {
        Self(DMat4::from_quat(rotation))
    }

    pub fn from_scale(scale: DVec3) -> Self {
        Self(DMat4::from_scale(scale))
    }

    pub fn from_scale_rotation_translation(scale: DVec3, rotation: DQuat, translation: DVec3) -> Self {
        Self(DMat4::from_scale_rotation_translation(scale, rotation, translation))
    }

    /// The underlying matrix.
    pub fn matrix(&self) -> DMat4 {
        self.0
    }

    /// Compose with a child transform: the result maps child space to this
    /// transform's parent space.
    pub fn compose(&self, local: &Transform) -> Transform {
        Self(self.0 * local.0)
    }

    pub fn inverse(&self) -> Transform {
        Self(self.0.inverse())
    }

    /// Express this (world) transform relative to `parent` (also world).
    pub fn relative_to(&self, parent: &Transform) -> Transform {
        parent.inverse().compose(self)
    }

    pub fn translation(&self) -> DVec3 {
        self.0.w_axis.truncate()
    }

    /// A transform carrying only this transform's translation.
    pub fn translation_only(&self) -> Transform {
        Self::from_translation(self.translation())
    }

    pub fn transform_point(&self, point: DVec3) -> DVec3 {
        self.0.transform_point3(point)
    }

    pub fn is_identity(&self) -> bool {
        self.0 == DMat4::IDENTITY
    }

    /// Split into translation, rotation and scale.
    ///
    /// A negative determinant is carried by the x scale component, so
    /// mirrored transforms recompose to the same matrix.
    pub fn decompose(&self) -> Decomposed {
        let (scale, rotation, translation) = self.0.to_scale_rotation_translation();
        Decomposed {
            translation,
            rotation,
            scale,
        }
    }

    pub fn abs_diff_eq(&self, other: &Transform, max_abs_diff: f64) -> bool {
        self.0.abs_diff_eq(other.0, max_abs_diff)
    }
}

/// The parts of a decomposed transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decomposed {
    pub translation: DVec3,
    pub rotation: DQuat,
    pub scale: DVec3,
}

impl Decomposed {
    pub fn recompose(&self) -> Transform {
        Transform::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Key identifying the (scale, rotation) pair, independent of location.
    pub fn orientation_key(&self) -> OrientationKey {
        // q and -q are the same rotation
        let rotation = if self.rotation.w < 0.0 {
            -self.rotation
        } else {
            self.rotation
        };
        OrientationKey([
            canonical_bits(self.scale.x),
            canonical_bits(self.scale.y),
            canonical_bits(self.scale.z),
            canonical_bits(rotation.x),
            canonical_bits(rotation.y),
            canonical_bits(rotation.z),
            canonical_bits(rotation.w),
        ])
    }
}

/// Exact-equality key over a decomposed scale and rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrientationKey([u64; 7]);

fn canonical_bits(value: f64) -> u64 {
    if value == 0.0 {
        0
    } else {
        value.to_bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f64::consts::FRAC_PI_2;

    const EPS: f64 = 1e-9;

    fn arb_transform() -> impl Strategy<Value = Transform> {
        (
            (-100.0..100.0f64, -100.0..100.0f64, -100.0..100.0f64),
            (-3.0..3.0f64, -3.0..3.0f64, -3.0..3.0f64),
            (0.1..4.0f64, 0.1..4.0f64, 0.1..4.0f64),
        )
            .prop_map(|(t, r, s)| {
                let rotation = DQuat::from_euler(glam::EulerRot::XYZ, r.0, r.1, r.2);
                Transform::from_scale_rotation_translation(
                    DVec3::new(s.0, s.1, s.2),
                    rotation,
                    DVec3::new(t.0, t.1, t.2),
                )
            })
    }

    #[test]
    fn test_identity_default() {
        assert_eq!(Transform::default(), Transform::IDENTITY);
        assert!(Transform::IDENTITY.is_identity());
    }

    #[test]
    fn test_compose_applies_local_first() {
        let parent = Transform::from_translation(DVec3::new(10.0, 0.0, 0.0));
        let local = Transform::from_scale(DVec3::splat(2.0));
        let world = parent.compose(&local);
        let p = world.transform_point(DVec3::new(1.0, 1.0, 1.0));
        assert!(p.abs_diff_eq(DVec3::new(12.0, 2.0, 2.0), EPS));
    }

    #[test]
    fn test_relative_to_recovers_local() {
        let parent = Transform::from_translation(DVec3::new(3.0, 4.0, 5.0));
        let local = Transform::from_rotation(DQuat::from_rotation_z(FRAC_PI_2));
        let world = parent.compose(&local);
        assert!(world.relative_to(&parent).abs_diff_eq(&local, EPS));
    }

    #[test]
    fn test_translation_only() {
        let t = Transform::from_scale_rotation_translation(
            DVec3::splat(3.0),
            DQuat::from_rotation_x(0.4),
            DVec3::new(1.0, 2.0, 3.0),
        );
        let only = t.translation_only();
        assert_eq!(only.translation(), DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(only.decompose().scale, DVec3::ONE);
    }

    #[test]
    fn test_decompose_preserves_non_uniform_scale() {
        let t = Transform::from_scale_rotation_translation(
            DVec3::new(1.0, 2.5, 0.5),
            DQuat::from_rotation_y(0.3),
            DVec3::new(-4.0, 0.0, 9.0),
        );
        let parts = t.decompose();
        assert!(parts.scale.abs_diff_eq(DVec3::new(1.0, 2.5, 0.5), EPS));
        assert!(parts.recompose().abs_diff_eq(&t, EPS));
    }

    #[test]
    fn test_decompose_preserves_mirroring() {
        let t = Transform::from_scale(DVec3::new(-1.0, 1.0, 1.0));
        let parts = t.decompose();
        assert!(parts.scale.x < 0.0);
        assert!(parts.recompose().abs_diff_eq(&t, EPS));
    }

    #[test]
    fn test_orientation_key_ignores_location() {
        let rotation = DQuat::from_rotation_z(0.7);
        let a = Transform::from_scale_rotation_translation(DVec3::ONE, rotation, DVec3::ZERO);
        let b = Transform::from_scale_rotation_translation(
            DVec3::ONE,
            rotation,
            DVec3::new(50.0, -2.0, 8.0),
        );
        assert_eq!(a.decompose().orientation_key(), b.decompose().orientation_key());

        let c = Transform::from_scale_rotation_translation(DVec3::splat(2.0), rotation, DVec3::ZERO);
        assert_ne!(a.decompose().orientation_key(), c.decompose().orientation_key());
    }

    #[test]
    fn test_serde_column_major() {
        let t = Transform::from_translation(DVec3::new(1.0, 2.0, 3.0));
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(
            json,
            "[1.0,0.0,0.0,0.0,0.0,1.0,0.0,0.0,0.0,0.0,1.0,0.0,1.0,2.0,3.0,1.0]"
        );
        let back: Transform = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }

    proptest! {
        #[test]
        fn test_compose_is_associative(a in arb_transform(), b in arb_transform(), c in arb_transform()) {
            let left = a.compose(&b).compose(&c);
            let right = a.compose(&b.compose(&c));
            prop_assert!(left.abs_diff_eq(&right, 1e-6));
        }

        #[test]
        fn test_decompose_round_trips(t in arb_transform()) {
            prop_assert!(t.decompose().recompose().abs_diff_eq(&t, 1e-6));
        }
    }
}
