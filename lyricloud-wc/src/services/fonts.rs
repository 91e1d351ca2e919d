//! Font loading for the word-cloud renderer

use ab_glyph::FontArc;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::renderer::RenderError;

/// Preferred file names, best first
const PREFERRED_FONTS: &[&str] = &[
    "DejaVuSans.ttf",
    "LiberationSans-Regular.ttf",
    "Arial.ttf",
    "arial.ttf",
    "NotoSans-Regular.ttf",
    "Roboto-Regular.ttf",
];

/// Load the configured font, or the best one found in the platform font directories
pub fn load_font(configured: Option<&Path>) -> Result<FontArc, RenderError> {
    let path = match configured {
        Some(path) => path.to_path_buf(),
        None => discover_font_file().ok_or_else(|| {
            RenderError::FontUnavailable(
                "no TrueType/OpenType font found; set render.font_path in the config".to_string(),
            )
        })?,
    };

    let bytes = std::fs::read(&path)
        .map_err(|e| RenderError::FontUnavailable(format!("{}: {}", path.display(), e)))?;
    let font = FontArc::try_from_vec(bytes)
        .map_err(|e| RenderError::Font(format!("{}: {}", path.display(), e)))?;

    tracing::info!(font = %path.display(), "Loaded word-cloud font");
    Ok(font)
}

/// Search the platform font directories for a usable font file
pub fn discover_font_file() -> Option<PathBuf> {
    let candidates = find_font_files(&font_dirs());

    PREFERRED_FONTS
        .iter()
        .find_map(|name| {
            candidates
                .iter()
                .find(|p| p.file_name().and_then(|f| f.to_str()) == Some(*name))
                .cloned()
        })
        .or_else(|| candidates.into_iter().next())
}

fn find_font_files(dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = dirs
        .iter()
        .filter(|dir| dir.is_dir())
        .flat_map(|dir| {
            WalkDir::new(dir)
                .max_depth(5)
                .follow_links(true)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|path| is_font_file(path))
        })
        .collect();

    files.sort();
    files
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ttf") || ext.eq_ignore_ascii_case("otf"))
}

fn font_dirs() -> Vec<PathBuf> {
    let mut dirs_list = Vec::new();

    if let Some(home) = dirs::home_dir() {
        dirs_list.push(home.join(".fonts"));
        dirs_list.push(home.join(".local/share/fonts"));
        dirs_list.push(home.join("Library/Fonts"));
    }

    if cfg!(target_os = "windows") {
        dirs_list.push(PathBuf::from("C:\\Windows\\Fonts"));
    } else if cfg!(target_os = "macos") {
        dirs_list.push(PathBuf::from("/Library/Fonts"));
        dirs_list.push(PathBuf::from("/System/Library/Fonts"));
    } else {
        dirs_list.push(PathBuf::from("/usr/share/fonts"));
        dirs_list.push(PathBuf::from("/usr/local/share/fonts"));
    }

    dirs_list
}
