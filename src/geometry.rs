use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};

/// Below this magnitude a homogeneous coordinate is treated as a point at infinity
const HOMOGENEOUS_EPS: f64 = 1e-12;

/// Transform a point using a projective matrix.
///
/// Returns `None` when the point maps to infinity.
pub fn transform_point(matrix: &Matrix3<f64>, x: f64, y: f64) -> Option<(f64, f64)> {
    let p = matrix * Vector3::new(x, y, 1.0);
    if p.z.abs() < HOMOGENEOUS_EPS {
        return None;
    }
    Some((p.x / p.z, p.y / p.z))
}

/// Translate to the centroid and scale so the mean distance is sqrt(2)
fn normalize_points(pts: &[Point2<f64>; 4]) -> ([Point2<f64>; 4], Matrix3<f64>) {
    let cx = pts.iter().map(|p| p.x).sum::<f64>() / 4.0;
    let cy = pts.iter().map(|p| p.y).sum::<f64>() / 4.0;

    let mean_dist = pts
        .iter()
        .map(|p| ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt())
        .sum::<f64>()
        / 4.0;

    let s = if mean_dist > HOMOGENEOUS_EPS {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    let t = Matrix3::new(
        s, 0.0, -s * cx,
        0.0, s, -s * cy,
        0.0, 0.0, 1.0,
    );

    let mut out = [Point2::origin(); 4];
    for (dst, p) in out.iter_mut().zip(pts) {
        let v = t * Vector3::new(p.x, p.y, 1.0);
        *dst = Point2::new(v.x, v.y);
    }

    (out, t)
}

/// Compute H such that `dst ~ H * src` from four point correspondences.
///
/// Corner order must match between `src` and `dst`. Returns `None` when the
/// correspondences do not determine a unique, invertible transform.
pub fn homography_from_4pt(src: &[Point2<f64>; 4], dst: &[Point2<f64>; 4]) -> Option<Matrix3<f64>> {
    // Unknowns: [h11 h12 h13 h21 h22 h23 h31 h32], with h33 = 1
    let (src_n, t_src) = normalize_points(src);
    let (dst_n, t_dst) = normalize_points(dst);

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..4 {
        let (x, y) = (src_n[k].x, src_n[k].y);
        let (u, v) = (dst_n[k].x, dst_n[k].y);

        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        let r1 = 2 * k + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let h = a.lu().solve(&b)?;
    if h.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let hn = Matrix3::new(
        h[0], h[1], h[2],
        h[3], h[4], h[5],
        h[6], h[7], 1.0,
    );

    // Undo normalization: H = T_dst^-1 * Hn * T_src
    let full = t_dst.try_inverse()? * hn * t_src;
    let scale = full[(2, 2)];
    if scale.abs() < HOMOGENEOUS_EPS {
        return None;
    }
    let full = full / scale;

    if full.determinant().abs() < HOMOGENEOUS_EPS {
        return None;
    }

    Some(full)
}
