//! Homogeneous transforms and their translation + quaternion decomposition.

use glam::{DMat3, DMat4, DQuat, DVec3, DVec4};

/// Decimal places kept in emitted poses.
pub const OUTPUT_DECIMALS: i32 = 3;

/// Build a 4x4 homogeneous transform from a row-major rotation and a translation.
pub fn pose_matrix(rotation: &[[f64; 3]; 3], translation: &[f64; 3]) -> DMat4 {
    let r = rotation;
    let t = translation;
    DMat4::from_cols(
        DVec4::new(r[0][0], r[1][0], r[2][0], 0.0),
        DVec4::new(r[0][1], r[1][1], r[2][1], 0.0),
        DVec4::new(r[0][2], r[1][2], r[2][2], 0.0),
        DVec4::new(t[0], t[1], t[2], 1.0),
    )
}

/// Build a matrix from row-major rows (glam stores columns).
pub fn from_rows(rows: &[[f64; 4]; 4]) -> DMat4 {
    DMat4::from_cols_array_2d(rows).transpose()
}

/// Row-major rows of a matrix.
pub fn to_rows(m: &DMat4) -> [[f64; 4]; 4] {
    m.transpose().to_cols_array_2d()
}

/// Unit quaternion of a rotation block.
///
/// Uses the largest of the diagonal entries and the trace to pick the
/// numerically stable branch, then normalizes. Blocks that are only close to
/// orthonormal (e.g. hand-rounded constants) still yield a unit quaternion.
pub fn quat_from_rotation(m: &DMat3) -> DQuat {
    let at = |row: usize, col: usize| m.col(col)[row];
    let trace = at(0, 0) + at(1, 1) + at(2, 2);
    let decision = [at(0, 0), at(1, 1), at(2, 2), trace];
    let choice = (1..4).fold(0, |best, i| if decision[i] > decision[best] { i } else { best });

    let q = if choice < 3 {
        let i = choice;
        let j = (i + 1) % 3;
        let k = (j + 1) % 3;
        let mut q = [0.0; 4];
        q[i] = 1.0 - trace + 2.0 * at(i, i);
        q[j] = at(j, i) + at(i, j);
        q[k] = at(k, i) + at(i, k);
        q[3] = at(k, j) - at(j, k);
        q
    } else {
        [
            at(2, 1) - at(1, 2),
            at(0, 2) - at(2, 0),
            at(1, 0) - at(0, 1),
            1.0 + trace,
        ]
    };

    DQuat::from_array(q).normalize()
}

/// Round to `decimals` places.
///
/// Small negative values keep their sign and round to `-0.0`, so printed
/// reports read `-0.0` the same way the calibration scripts print them.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// A rigid transform as translation + rotation quaternion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkTransform {
    pub translation: DVec3,
    pub rotation: DQuat,
}

impl LinkTransform {
    /// Split a homogeneous transform into its translation column and rotation block.
    pub fn from_matrix(m: &DMat4) -> Self {
        Self {
            translation: m.w_axis.truncate(),
            rotation: quat_from_rotation(&DMat3::from_mat4(*m)),
        }
    }

    /// `[x, y, z, qx, qy, qz, qw]`
    pub fn to_array(&self) -> [f64; 7] {
        let t = self.translation;
        let q = self.rotation;
        [t.x, t.y, t.z, q.x, q.y, q.z, q.w]
    }

    /// `[x, y, z, qx, qy, qz, qw]`, each rounded to `decimals` places.
    pub fn rounded(&self, decimals: i32) -> [f64; 7] {
        self.to_array().map(|v| round_to(v, decimals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_1_SQRT_2;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-12, "{} != {}", a, b);
    }

    #[test]
    fn test_identity_rotation_gives_identity_quaternion() {
        let q = quat_from_rotation(&DMat3::IDENTITY);
        assert_eq!(q.to_array(), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_quarter_turn_about_z() {
        let rotation = [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
        let m = pose_matrix(&rotation, &[0.0; 3]);
        let q = LinkTransform::from_matrix(&m).rotation;
        assert_close(q.x, 0.0);
        assert_close(q.y, 0.0);
        assert_close(q.z, FRAC_1_SQRT_2);
        assert_close(q.w, FRAC_1_SQRT_2);
    }

    #[test]
    fn test_half_turn_about_x_uses_diagonal_branch() {
        let m = DMat3::from_rotation_x(std::f64::consts::PI);
        let q = quat_from_rotation(&m);
        assert_close(q.x.abs(), 1.0);
        assert_close(q.w, 0.0);
    }

    #[test]
    fn test_matches_glam_for_proper_rotations() {
        let rotation = DQuat::from_euler(glam::EulerRot::ZYX, 0.3, -1.2, 2.5);
        let q = quat_from_rotation(&DMat3::from_quat(rotation));
        // q and -q are the same rotation
        assert!(q.dot(rotation).abs() > 1.0 - 1e-12);
    }

    #[test]
    fn test_near_orthonormal_block_normalizes() {
        let m = from_rows(&[
            [0.002, -1.000, 0.005, 0.0],
            [0.003, -0.005, -1.000, 0.0],
            [1.000, 0.002, 0.003, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        let q = LinkTransform::from_matrix(&m).rotation;
        assert_close(q.length(), 1.0);
    }

    #[test]
    fn test_rows_round_trip_layout() {
        let rows = [
            [1.0, 2.0, 3.0, 4.0],
            [5.0, 6.0, 7.0, 8.0],
            [9.0, 10.0, 11.0, 12.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        let m = from_rows(&rows);
        assert_eq!(m.w_axis.to_array(), [4.0, 8.0, 12.0, 1.0]);
        assert_eq!(to_rows(&m), rows);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.0739978, 3), 0.074);
        assert_eq!(round_to(-0.059, 3), -0.059);
        assert_eq!(round_to(-0.00037, 3), 0.0);
        assert!(round_to(-0.00037, 3).is_sign_negative());
        assert!(round_to(0.00014, 3).is_sign_positive());
        assert_eq!(round_to(0.9999916, 3), 1.0);
    }

    #[test]
    fn test_translation_passes_through() {
        let identity = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let m = pose_matrix(&identity, &[1.0, 0.0, 0.0]);
        let t = LinkTransform::from_matrix(&m);
        assert_eq!(t.rounded(OUTPUT_DECIMALS), [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
    }
}
