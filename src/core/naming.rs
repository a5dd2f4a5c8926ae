//! Destination path derivation
//!
//! Pure string logic: no filesystem access happens here.

use std::path::{Path, PathBuf};

/// Suffix used by the raw PCM sink when nothing overrides it
pub const DEFAULT_SUFFIX: &str = ".pcm";

/// Compute the destination path for a decoded source file
///
/// # Arguments
/// * `source` - Path of the file being decoded
/// * `batch` - Whether the file was selected by a directory walk
/// * `output_override` - The `-o` value; empty when not given
/// * `default_suffix` - Suffix used when no override applies (e.g. `.pcm`)
///
/// In single-file mode a non-empty override is the destination verbatim.
/// In batch mode it replaces the suffix, gaining a leading `.` if missing.
///
/// Returns `None` if the source path is not valid UTF-8.
pub fn output_name(
    source: &Path,
    batch: bool,
    output_override: &str,
    default_suffix: &str,
) -> Option<PathBuf> {
    if !batch && !output_override.is_empty() {
        return Some(PathBuf::from(output_override));
    }

    let suffix = if batch && !output_override.is_empty() {
        normalize_suffix(output_override)
    } else {
        default_suffix.to_string()
    };

    let source = source.to_str()?;
    let name = match source.rfind('.') {
        Some(i) if i > 0 => format!("{}{}", &source[..i], suffix),
        _ => format!("{}{}", source, suffix),
    };
    Some(PathBuf::from(name))
}

/// Ensure a suffix starts with a dot ("mp3" -> ".mp3")
pub fn normalize_suffix(suffix: &str) -> String {
    if suffix.starts_with('.') {
        suffix.to_string()
    } else {
        format!(".{}", suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(source: &str, batch: bool, output: &str) -> String {
        output_name(Path::new(source), batch, output, DEFAULT_SUFFIX)
            .unwrap()
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn test_replaces_extension() {
        assert_eq!(name("voice/a.amr", false, ""), "voice/a.pcm");
        assert_eq!(name("voice/a.b.amr", true, ""), "voice/a.b.pcm");
    }

    #[test]
    fn test_appends_when_no_extension() {
        assert_eq!(name("voice/a", false, ""), "voice/a.pcm");
        assert_eq!(name("a", true, ""), "a.pcm");
    }

    #[test]
    fn test_leading_dot_is_not_an_extension() {
        assert_eq!(name(".hidden", false, ""), ".hidden.pcm");
        assert_eq!(name(".hidden", true, "wav"), ".hidden.wav");
    }

    #[test]
    fn test_last_dot_anywhere_in_path_is_used() {
        // Works on the whole path string, not just the file name
        assert_eq!(name("./voice/a", false, ""), "./voice/a.pcm");
        assert_eq!(name("rec.d/clip", true, ""), "rec.pcm");
    }

    #[test]
    fn test_single_file_override_is_verbatim() {
        assert_eq!(name("voice/a.amr", false, "out/x.raw"), "out/x.raw");
        assert_eq!(name("voice/a.amr", false, "mp3"), "mp3");
    }

    #[test]
    fn test_batch_override_is_suffix() {
        assert_eq!(name("voice/a.amr", true, "mp3"), "voice/a.mp3");
        assert_eq!(name("voice/b.amr", true, ".mp3"), "voice/b.mp3");
    }

    #[test]
    fn test_custom_default_suffix() {
        let out = output_name(Path::new("a.silk"), false, "", ".wav").unwrap();
        assert_eq!(out, PathBuf::from("a.wav"));
    }

    #[test]
    fn test_normalize_suffix() {
        assert_eq!(normalize_suffix("mp3"), ".mp3");
        assert_eq!(normalize_suffix(".mp3"), ".mp3");
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_path_has_no_name() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let source = Path::new(OsStr::from_bytes(b"voice/\xff.amr"));
        assert!(output_name(source, true, "", DEFAULT_SUFFIX).is_none());
    }
}
