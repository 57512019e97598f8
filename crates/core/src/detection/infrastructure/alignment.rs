//! Landmark-based face alignment for the ArcFace embedder.
//!
//! Estimates a 4-DOF similarity transform (scale, rotation, translation)
//! from the five detected landmarks to the InsightFace reference layout and
//! warps the RGB frame into a 112×112 crop.

/// ArcFace reference landmarks for a 112×112 output.
pub const REFERENCE_LANDMARKS_112: [(f64, f64); 5] = [
    (38.2946, 51.6963), // left eye
    (73.5318, 51.5014), // right eye
    (56.0252, 71.7366), // nose
    (41.5493, 92.3655), // left mouth
    (70.7299, 92.2041), // right mouth
];

pub const ALIGNED_SIZE: usize = 112;

/// Similarity transform `[a, -b, tx, b, a, ty]`:
/// ```text
/// | a  -b  tx |
/// | b   a  ty |
/// ```
pub type Similarity = [f64; 6];

/// Least-squares similarity transform mapping `src` points onto `dst`.
pub fn estimate_similarity(src: &[(f64, f64); 5], dst: &[(f64, f64); 5]) -> Similarity {
    // Normal equations for the unknowns [a, b, tx, ty]; each point pair
    // contributes rows [sx, -sy, 1, 0] -> dx and [sy, sx, 0, 1] -> dy.
    let mut ata = [[0.0f64; 4]; 4];
    let mut atb = [0.0f64; 4];

    for ((sx, sy), (dx, dy)) in src.iter().zip(dst.iter()) {
        let r1 = [*sx, -*sy, 1.0, 0.0];
        let r2 = [*sy, *sx, 0.0, 1.0];
        for j in 0..4 {
            for k in 0..4 {
                ata[j][k] += r1[j] * r1[k] + r2[j] * r2[k];
            }
            atb[j] += r1[j] * dx + r2[j] * dy;
        }
    }

    let [a, b, tx, ty] = solve_4x4(ata, atb).unwrap_or([1.0, 0.0, 0.0, 0.0]);
    [a, -b, tx, b, a, ty]
}

/// Gaussian elimination with partial pivoting. `None` for singular systems
/// (e.g. all landmarks at one point).
#[allow(clippy::needless_range_loop)]
fn solve_4x4(mut m: [[f64; 4]; 4], mut rhs: [f64; 4]) -> Option<[f64; 4]> {
    for col in 0..4 {
        let pivot_row = (col..4).max_by(|&i, &j| m[i][col].abs().total_cmp(&m[j][col].abs()))?;
        if m[pivot_row][col].abs() < 1e-12 {
            return None;
        }
        m.swap(col, pivot_row);
        rhs.swap(col, pivot_row);

        for row in (col + 1)..4 {
            let factor = m[row][col] / m[col][col];
            for j in col..4 {
                m[row][j] -= factor * m[col][j];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut x = [0.0f64; 4];
    for i in (0..4).rev() {
        let tail: f64 = ((i + 1)..4).map(|j| m[i][j] * x[j]).sum();
        x[i] = (rhs[i] - tail) / m[i][i];
    }
    Some(x)
}

/// Warps an RGB frame through `transform` into an `out_size`² RGB crop.
///
/// Bilinear sampling; pixels mapping outside the source are black.
pub fn warp_affine_rgb(
    rgb: &[u8],
    src_width: usize,
    src_height: usize,
    transform: &Similarity,
    out_size: usize,
) -> Vec<u8> {
    let (a, b, tx, ty) = (transform[0], transform[3], transform[2], transform[5]);
    let mut output = vec![0u8; out_size * out_size * 3];

    // Inverse of [[a, -b], [b, a]] is [[a, b], [-b, a]] / (a² + b²)
    let det = a * a + b * b;
    if det < 1e-12 {
        return output;
    }
    let ia = a / det;
    let ib = b / det;

    let sample = |x: i64, y: i64, c: usize| -> f64 {
        if x >= 0 && y >= 0 && (x as usize) < src_width && (y as usize) < src_height {
            rgb[(y as usize * src_width + x as usize) * 3 + c] as f64
        } else {
            0.0
        }
    };

    for oy in 0..out_size {
        for ox in 0..out_size {
            let dx = ox as f64 - tx;
            let dy = oy as f64 - ty;
            let sx = ia * dx + ib * dy;
            let sy = -ib * dx + ia * dy;

            let x0 = sx.floor() as i64;
            let y0 = sy.floor() as i64;
            let fx = sx - x0 as f64;
            let fy = sy - y0 as f64;

            for c in 0..3 {
                let val = sample(x0, y0, c) * (1.0 - fx) * (1.0 - fy)
                    + sample(x0 + 1, y0, c) * fx * (1.0 - fy)
                    + sample(x0, y0 + 1, c) * (1.0 - fx) * fy
                    + sample(x0 + 1, y0 + 1, c) * fx * fy;
                output[(oy * out_size + ox) * 3 + c] = val.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    output
}

/// Aligns the face with the given landmarks to a canonical 112×112 RGB crop.
pub fn align_face(rgb: &[u8], width: u32, height: u32, landmarks: &[(f64, f64); 5]) -> Vec<u8> {
    let transform = estimate_similarity(landmarks, &REFERENCE_LANDMARKS_112);
    warp_affine_rgb(rgb, width as usize, height as usize, &transform, ALIGNED_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_identity_transform() {
        let m = estimate_similarity(&REFERENCE_LANDMARKS_112, &REFERENCE_LANDMARKS_112);
        let expected = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        for (got, want) in m.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(*got, *want, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_scaled_landmarks_give_half_scale() {
        let src = REFERENCE_LANDMARKS_112.map(|(x, y)| (x * 2.0, y * 2.0));
        let m = estimate_similarity(&src, &REFERENCE_LANDMARKS_112);
        assert_abs_diff_eq!(m[0], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(m[3], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_translated_landmarks_recover_offset() {
        let src = REFERENCE_LANDMARKS_112.map(|(x, y)| (x + 30.0, y - 10.0));
        let m = estimate_similarity(&src, &REFERENCE_LANDMARKS_112);
        assert_abs_diff_eq!(m[2], -30.0, epsilon = 1e-6);
        assert_abs_diff_eq!(m[5], 10.0, epsilon = 1e-6);
    }

    #[test]
    fn test_degenerate_landmarks_fall_back_to_identity() {
        let src = [(5.0, 5.0); 5];
        let m = estimate_similarity(&src, &REFERENCE_LANDMARKS_112);
        assert_abs_diff_eq!(m[0], 1.0);
        assert_abs_diff_eq!(m[3], 0.0);
    }

    #[test]
    fn test_warp_identity_copies_pixels() {
        let w = 4;
        let h = 4;
        let rgb: Vec<u8> = (0..(w * h * 3)).map(|i| i as u8).collect();
        let identity = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let out = warp_affine_rgb(&rgb, w, h, &identity, 4);
        assert_eq!(out, rgb);
    }

    #[test]
    fn test_align_face_output_size() {
        let rgb = vec![128u8; 640 * 480 * 3];
        let aligned = align_face(&rgb, 640, 480, &REFERENCE_LANDMARKS_112);
        assert_eq!(aligned.len(), ALIGNED_SIZE * ALIGNED_SIZE * 3);
    }

    #[test]
    fn test_landmark_lands_near_reference_position() {
        let (w, h) = (200usize, 200usize);
        let mut rgb = vec![0u8; w * h * 3];
        let src: [(f64, f64); 5] = [
            (80.0, 60.0),
            (120.0, 60.0),
            (100.0, 85.0),
            (85.0, 110.0),
            (115.0, 110.0),
        ];

        // Bright 5x5 patch on the left eye
        for y in 58..63 {
            for x in 78..83 {
                rgb[(y * w + x) * 3..(y * w + x) * 3 + 3].fill(255);
            }
        }

        let aligned = align_face(&rgb, w as u32, h as u32, &src);
        let (rx, ry) = (
            REFERENCE_LANDMARKS_112[0].0.round() as usize,
            REFERENCE_LANDMARKS_112[0].1.round() as usize,
        );
        let brightest = (ry - 1..=ry + 1)
            .flat_map(|y| (rx - 1..=rx + 1).map(move |x| (y, x)))
            .map(|(y, x)| aligned[(y * ALIGNED_SIZE + x) * 3])
            .max()
            .unwrap();
        assert!(brightest > 100, "left eye patch not found near ({rx}, {ry})");
    }
}
