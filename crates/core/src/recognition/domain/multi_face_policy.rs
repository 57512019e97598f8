use std::fmt;
use std::str::FromStr;

use crate::detection::domain::detection::Detection;

/// Which face to keep when a reference image shows more than one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MultiFacePolicy {
    /// The detector's first face (its most confident).
    #[default]
    First,
    /// The face with the largest bounding box.
    Largest,
    /// Ignore the image.
    Skip,
}

impl MultiFacePolicy {
    /// Picks the reference face from `detections` (two or more).
    pub fn select(self, detections: Vec<Detection>) -> Option<Detection> {
        match self {
            MultiFacePolicy::First => detections.into_iter().next(),
            MultiFacePolicy::Largest => detections
                .into_iter()
                .enumerate()
                // Earlier detections win equal areas.
                .max_by(|(ia, a), (ib, b)| {
                    a.region.area().cmp(&b.region.area()).then(ib.cmp(ia))
                })
                .map(|(_, d)| d),
            MultiFacePolicy::Skip => None,
        }
    }
}

impl fmt::Display for MultiFacePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MultiFacePolicy::First => "first",
            MultiFacePolicy::Largest => "largest",
            MultiFacePolicy::Skip => "skip",
        })
    }
}

impl FromStr for MultiFacePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first" => Ok(MultiFacePolicy::First),
            "largest" => Ok(MultiFacePolicy::Largest),
            "skip" => Ok(MultiFacePolicy::Skip),
            other => Err(format!(
                "unknown multi-face policy '{other}' (expected first, largest or skip)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::domain::embedding::Embedding;
    use crate::shared::region::Region;
    use rstest::rstest;

    fn detection(x: i32, size: i32) -> Detection {
        Detection {
            region: Region::new(x, 0, size, size),
            embedding: Embedding::new(vec![x as f32]),
        }
    }

    fn faces() -> Vec<Detection> {
        vec![detection(0, 10), detection(50, 30), detection(100, 30)]
    }

    #[test]
    fn test_first_keeps_detector_order() {
        let picked = MultiFacePolicy::First.select(faces()).unwrap();
        assert_eq!(picked.region.x, 0);
    }

    #[test]
    fn test_largest_picks_biggest_box_earliest_on_tie() {
        let picked = MultiFacePolicy::Largest.select(faces()).unwrap();
        assert_eq!(picked.region.x, 50);
    }

    #[test]
    fn test_skip_picks_nothing() {
        assert!(MultiFacePolicy::Skip.select(faces()).is_none());
    }

    #[rstest]
    #[case("first", MultiFacePolicy::First)]
    #[case("Largest", MultiFacePolicy::Largest)]
    #[case("SKIP", MultiFacePolicy::Skip)]
    fn test_parse(#[case] input: &str, #[case] expected: MultiFacePolicy) {
        assert_eq!(input.parse::<MultiFacePolicy>().unwrap(), expected);
        assert_eq!(expected.to_string().parse::<MultiFacePolicy>().unwrap(), expected);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("biggest".parse::<MultiFacePolicy>().is_err());
    }

    #[test]
    fn test_default_is_first() {
        assert_eq!(MultiFacePolicy::default(), MultiFacePolicy::First);
    }
}
