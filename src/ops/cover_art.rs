use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::debug;

/// Extract embedded cover art from `path` into `out_dir` (system temp dir by
/// default). Tries three ffmpeg strategies in order and returns the first
/// non-empty output file, or None when they all fail.
pub fn extract_cover_art(path: &Path, out_dir: Option<&Path>) -> Option<PathBuf> {
    let out_dir = out_dir.map(Path::to_path_buf).unwrap_or_else(env::temp_dir);
    let stem = path.file_stem()?.to_string_lossy().into_owned();
    let jpg_out = out_dir.join(format!("{stem}_cover.jpg"));
    let png_out = out_dir.join(format!("{stem}_cover.png"));

    // Direct stream copy, audio-stripped copy, then png stream copy. Some
    // containers only yield under one of the three.
    let strategies: [(&[&str], &Path); 3] = [
        (&["-map", "0:v:0", "-c", "copy"], &jpg_out),
        (&["-an", "-vcodec", "copy"], &jpg_out),
        (&["-map", "0:v:0", "-c", "copy"], &png_out),
    ];

    for (args, out) in strategies {
        if run_extract(path, args, out) && non_empty_file(out) {
            return Some(out.to_path_buf());
        }
    }
    debug!("no cover art extracted from {}", path.display());
    None
}

fn run_extract(input: &Path, args: &[&str], out: &Path) -> bool {
    let status = Command::new("ffmpeg")
        .args(["-y", "-v", "error", "-i"])
        .arg(input)
        .args(args)
        .arg(out)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    matches!(status, Ok(s) if s.success())
}

fn non_empty_file(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_non_media_input_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("not_audio.mp3");
        fs::File::create(&input)
            .unwrap()
            .write_all(b"plain text")
            .unwrap();
        assert_eq!(extract_cover_art(&input, Some(dir.path())), None);
    }

    #[test]
    fn test_failed_extraction_leaves_no_cover_behind() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("album track.flac");
        fs::File::create(&input).unwrap();
        assert_eq!(extract_cover_art(&input, Some(dir.path())), None);
        assert!(!non_empty_file(&dir.path().join("album track_cover.jpg")));
        assert!(!non_empty_file(&dir.path().join("album track_cover.png")));
    }
}
