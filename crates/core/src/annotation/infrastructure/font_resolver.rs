//! Locates a TrueType font for label text.
//!
//! An explicitly requested font must load; otherwise the first loadable
//! entry of [`SYSTEM_FONT_PATHS`] is used. Having no font at all is not an
//! error: the annotator then draws boxes and banners without text.

use std::path::{Path, PathBuf};

use ab_glyph::FontVec;

use crate::shared::error::ConfigurationError;

pub const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

pub fn resolve_font(explicit: Option<&Path>) -> Result<Option<FontVec>, ConfigurationError> {
    if let Some(path) = explicit {
        return load_font(path).map(Some);
    }
    Ok(first_loadable(SYSTEM_FONT_PATHS.iter().map(PathBuf::from)))
}

pub fn load_font(path: &Path) -> Result<FontVec, ConfigurationError> {
    let unreadable = |reason: String| ConfigurationError::FontUnreadable {
        path: path.to_path_buf(),
        reason,
    };
    let bytes = std::fs::read(path).map_err(|e| unreadable(e.to_string()))?;
    FontVec::try_from_vec(bytes).map_err(|e| unreadable(e.to_string()))
}

fn first_loadable(candidates: impl IntoIterator<Item = PathBuf>) -> Option<FontVec> {
    candidates
        .into_iter()
        .filter(|path| path.is_file())
        .find_map(|path| match load_font(&path) {
            Ok(font) => {
                log::debug!("Using font {}", path.display());
                Some(font)
            }
            Err(e) => {
                log::debug!("{e}");
                None
            }
        })
}
