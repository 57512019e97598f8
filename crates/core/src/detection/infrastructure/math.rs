//! Geometry helpers shared by the detection backends.

/// IoU between two bounding boxes represented as `[x1, y1, x2, y2]`.
pub fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }

    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

/// Nearest-neighbour source index for output position `dst` when resampling
/// `src_len` samples to `dst_len`, sampling at pixel centres.
pub fn nearest_source_index(dst: usize, src_len: usize, dst_len: usize) -> usize {
    let pos = (dst as f64 + 0.5) * src_len as f64 / dst_len as f64;
    (pos as usize).min(src_len.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bbox_iou_no_overlap() {
        let a = [0.0, 0.0, 10.0, 10.0];
        let b = [20.0, 20.0, 30.0, 30.0];
        assert_eq!(bbox_iou(&a, &b), 0.0);
    }

    #[test]
    fn test_bbox_iou_perfect_overlap() {
        let a = [0.0, 0.0, 10.0, 10.0];
        assert_relative_eq!(bbox_iou(&a, &a), 1.0);
    }

    #[test]
    fn test_bbox_iou_partial_overlap() {
        let a = [0.0, 0.0, 10.0, 10.0];
        let b = [5.0, 5.0, 15.0, 15.0];
        assert_relative_eq!(bbox_iou(&a, &b), 25.0 / 175.0);
    }

    #[test]
    fn test_nearest_source_index_downscale() {
        // 10 -> 5: centres 1, 3, 5, 7, 9
        let idx: Vec<usize> = (0..5).map(|i| nearest_source_index(i, 10, 5)).collect();
        assert_eq!(idx, vec![1, 3, 5, 7, 9]);
    }

    #[test]
    fn test_nearest_source_index_upscale_stays_in_bounds() {
        for i in 0..112 {
            assert!(nearest_source_index(i, 3, 112) < 3);
        }
    }
}
