//! HLS playlist inspection.

use std::path::Path;

use crate::error::MediaResult;

/// Extract the `RESOLUTION=` value from each `#EXT-X-STREAM-INF` header of
/// a master playlist, in stream order. A missing playlist yields an empty
/// list; a header without a resolution attribute yields `None` at its slot.
pub async fn master_resolutions(master_playlist: &Path) -> MediaResult<Vec<Option<String>>> {
    if !master_playlist.exists() {
        return Ok(Vec::new());
    }
    let content = tokio::fs::read_to_string(master_playlist).await?;

    Ok(content
        .lines()
        .filter(|line| line.starts_with("#EXT-X-STREAM-INF"))
        .map(parse_resolution)
        .collect())
}

fn parse_resolution(header_line: &str) -> Option<String> {
    header_line
        .split(',')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("RESOLUTION=").map(str::to_string))
}

/// Sum the `#EXTINF` duration markers of a sub-playlist, rounded to whole
/// seconds. Returns `None` when the playlist is missing or carries no
/// usable markers.
pub async fn playlist_duration_seconds(playlist: &Path) -> MediaResult<Option<u32>> {
    if !playlist.exists() {
        return Ok(None);
    }
    let content = tokio::fs::read_to_string(playlist).await?;

    let mut total = 0.0f64;
    for line in content.lines() {
        if let Some(payload) = line.strip_prefix("#EXTINF:") {
            let payload = payload.split(',').next().unwrap_or(payload);
            if let Ok(seconds) = payload.trim().parse::<f64>() {
                total += seconds;
            }
        }
    }

    if total <= 0.0 {
        Ok(None)
    } else {
        Ok(Some(total.round() as u32))
    }
}
