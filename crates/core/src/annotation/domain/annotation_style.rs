use crate::recognition::domain::face_matcher::{Label, MatchResult};

/// Label colour for known identities (red, as in the classic
/// face_recognition demo).
pub const KNOWN_COLOR: [u8; 3] = [255, 0, 0];
pub const UNKNOWN_COLOR: [u8; 3] = [128, 128, 128];
pub const TEXT_COLOR: [u8; 3] = [255, 255, 255];

pub const DEFAULT_THICKNESS: u32 = 2;
pub const DEFAULT_BANNER_HEIGHT: u32 = 35;
pub const DEFAULT_TEXT_INSET: u32 = 6;
pub const DEFAULT_FONT_SIZE: f32 = 24.0;

/// Visual parameters for box-and-label annotation.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationStyle {
    pub known_color: [u8; 3],
    pub unknown_color: [u8; 3],
    pub text_color: [u8; 3],
    pub thickness: u32,
    pub banner_height: u32,
    pub text_inset: u32,
    pub font_size: f32,
    /// Append the match distance to each label.
    pub show_distance: bool,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            known_color: KNOWN_COLOR,
            unknown_color: UNKNOWN_COLOR,
            text_color: TEXT_COLOR,
            thickness: DEFAULT_THICKNESS,
            banner_height: DEFAULT_BANNER_HEIGHT,
            text_inset: DEFAULT_TEXT_INSET,
            font_size: DEFAULT_FONT_SIZE,
            show_distance: false,
        }
    }
}

impl AnnotationStyle {
    pub fn color_for(&self, label: &Label) -> [u8; 3] {
        if label.is_known() {
            self.known_color
        } else {
            self.unknown_color
        }
    }

    pub fn label_text(&self, result: &MatchResult) -> String {
        if self.show_distance && result.distance.is_finite() {
            format!("{} ({:.2})", result.label, result.distance)
        } else {
            result.label.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(label: Label, distance: f64) -> MatchResult {
        MatchResult {
            nearest: label.as_str().to_string(),
            label,
            distance,
            ambiguous: false,
        }
    }

    #[test]
    fn test_colors_by_label_kind() {
        let style = AnnotationStyle::default();
        assert_eq!(style.color_for(&Label::Known("alice".into())), KNOWN_COLOR);
        assert_eq!(style.color_for(&Label::Unknown), UNKNOWN_COLOR);
    }

    #[test]
    fn test_label_text_plain() {
        let style = AnnotationStyle::default();
        assert_eq!(style.label_text(&result(Label::Known("bob".into()), 0.31)), "bob");
        assert_eq!(style.label_text(&result(Label::Unknown, 1.7)), "Unknown");
    }

    #[test]
    fn test_label_text_with_distance() {
        let style = AnnotationStyle {
            show_distance: true,
            ..AnnotationStyle::default()
        };
        assert_eq!(
            style.label_text(&result(Label::Known("bob".into()), 0.314)),
            "bob (0.31)"
        );
    }
}
