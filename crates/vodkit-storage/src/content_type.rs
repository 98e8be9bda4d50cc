//! Content-type guessing for transcode artifacts.

use std::path::Path;

/// Guess the MIME type of an artifact from its file extension.
///
/// Playlists and fMP4 segments get their HLS types; everything unknown
/// falls back to octet-stream.
pub fn guess_content_type(path: &Path) -> &'static str {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    if name.ends_with(".m3u8") {
        "application/vnd.apple.mpegurl"
    } else if name.ends_with(".m4s") {
        "video/iso.segment"
    } else if name.ends_with(".mp4") {
        "video/mp4"
    } else if name.ends_with(".ts") {
        "video/mp2t"
    } else {
        "application/octet-stream"
    }
}
