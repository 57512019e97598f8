/// Five-point facial landmarks in frame coordinates:
/// `[left_eye, right_eye, nose, left_mouth, right_mouth]`.
pub type Landmarks = [(f64, f64); 5];

/// A located face: integer bounding box in frame pixels plus the detector's
/// confidence and, when the model provides them, facial landmarks.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub confidence: f64,
    pub landmarks: Option<Landmarks>,
}

impl Region {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            confidence: 1.0,
            landmarks: None,
        }
    }

    /// Builds a region from floating-point corner coordinates, clamped to
    /// the frame.
    pub fn from_corners(
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        frame_width: u32,
        frame_height: u32,
    ) -> Self {
        let x1 = x1.round() as i32;
        let y1 = y1.round() as i32;
        let x2 = x2.round() as i32;
        let y2 = y2.round() as i32;
        Region::new(x1, y1, x2 - x1, y2 - y1).clamped(frame_width, frame_height)
    }

    pub fn area(&self) -> i64 {
        self.width.max(0) as i64 * self.height.max(0) as i64
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Intersection with the frame rectangle. Width and height never go
    /// negative; a region fully outside the frame becomes empty.
    pub fn clamped(&self, frame_width: u32, frame_height: u32) -> Region {
        let fw = frame_width as i32;
        let fh = frame_height as i32;
        let x1 = self.x.clamp(0, fw);
        let y1 = self.y.clamp(0, fh);
        let x2 = self.right().clamp(0, fw);
        let y2 = self.bottom().clamp(0, fh);
        Region {
            x: x1,
            y: y1,
            width: (x2 - x1).max(0),
            height: (y2 - y1).max(0),
            confidence: self.confidence,
            landmarks: self.landmarks,
        }
    }

    /// Landmarks usable for alignment: present and all five visible.
    /// Detectors report occluded points as `(0, 0)`.
    pub fn visible_landmarks(&self) -> Option<&Landmarks> {
        self.landmarks
            .as_ref()
            .filter(|pts| pts.iter().all(|(x, y)| *x > 0.0 && *y > 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_area() {
        assert_eq!(Region::new(0, 0, 10, 20).area(), 200);
        assert_eq!(Region::new(0, 0, -5, 20).area(), 0);
    }

    #[test]
    fn test_from_corners_rounds_and_clamps() {
        let r = Region::from_corners(-10.4, 5.6, 50.2, 300.0, 100, 100);
        assert_eq!(r, Region::new(0, 6, 50, 94));
    }

    #[rstest]
    #[case::inside(Region::new(10, 10, 20, 20), Region::new(10, 10, 20, 20))]
    #[case::left_edge(Region::new(-5, 10, 20, 20), Region::new(0, 10, 15, 20))]
    #[case::bottom_right(Region::new(90, 90, 20, 20), Region::new(90, 90, 10, 10))]
    #[case::outside(Region::new(200, 200, 20, 20), Region::new(100, 100, 0, 0))]
    fn test_clamped(#[case] input: Region, #[case] expected: Region) {
        assert_eq!(input.clamped(100, 100), expected);
    }

    #[test]
    fn test_clamped_empty_region() {
        assert!(Region::new(200, 200, 20, 20).clamped(100, 100).is_empty());
        assert!(!Region::new(0, 0, 1, 1).clamped(100, 100).is_empty());
    }

    #[test]
    fn test_visible_landmarks_requires_all_points() {
        let mut r = Region::new(0, 0, 10, 10);
        assert!(r.visible_landmarks().is_none());

        r.landmarks = Some([(1.0, 1.0), (2.0, 1.0), (1.5, 2.0), (1.0, 3.0), (2.0, 3.0)]);
        assert!(r.visible_landmarks().is_some());

        r.landmarks = Some([(1.0, 1.0), (0.0, 0.0), (1.5, 2.0), (1.0, 3.0), (2.0, 3.0)]);
        assert!(r.visible_landmarks().is_none());
    }
}
