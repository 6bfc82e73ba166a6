use std::path::{Path, PathBuf};

use crate::ops::cover_art::extract_cover_art;
use crate::ops::probe::{probe_duration, probe_tags};

/// One loaded audio file. Immutable once probed; opening a new file replaces
/// the whole value.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub path: PathBuf,
    pub duration: f64,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub cover_path: Option<PathBuf>,
}

impl Track {
    /// Placeholder before any file has been opened.
    pub fn empty() -> Self {
        Track {
            path: PathBuf::new(),
            duration: 0.0,
            title: None,
            artist: None,
            cover_path: None,
        }
    }

    /// Probe duration, tags and cover art for `path`. Failures degrade to
    /// defaults (duration 0, no tags, no cover) rather than erroring.
    pub fn probe(path: &Path) -> Self {
        let duration = probe_duration(path);
        let tags = probe_tags(path);
        let cover_path = extract_cover_art(path, None);
        Track {
            path: path.to_path_buf(),
            duration,
            title: non_empty(tags.get("title")),
            artist: non_empty(tags.get("artist")),
            cover_path,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.path.as_os_str().is_empty()
    }

    /// Tag title, falling back to the file stem.
    pub fn display_title(&self) -> String {
        if let Some(title) = &self.title {
            return title.clone();
        }
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Header line shown above the cover.
    pub fn header_text(&self) -> String {
        format!(
            "{} — {}",
            self.display_title(),
            self.artist.as_deref().unwrap_or("")
        )
    }
}

fn non_empty(tag: Option<&String>) -> Option<String> {
    tag.filter(|s| !s.is_empty()).cloned()
}
