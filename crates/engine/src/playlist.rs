// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Playlist readiness check (spec §4.E step 8): a playlist is ready iff it
//! contains `#EXTM3U`, references a resolvable first segment (last segment
//! for VOD), and that segment exists with size > 0; VOD additionally
//! requires `#EXT-X-ENDLIST`.

use std::path::{Path, PathBuf};

use xg2g_adapters::{Platform, PlatformError};

/// `<hlsRoot>/sessions/<sessionId>/index.m3u8` with the legacy
/// `<hlsRoot>/<sessionId>/stream.m3u8` layout as a fallback (spec §6).
pub fn candidate_paths(hls_root: &Path, session_id: &str) -> [PathBuf; 2] {
    [
        hls_root.join("sessions").join(session_id).join("index.m3u8"),
        hls_root.join(session_id).join("stream.m3u8"),
    ]
}

fn has_tag(contents: &str, tag: &str) -> bool {
    contents.lines().any(|line| line.trim() == tag)
}

/// The first segment reference for live playback, or the last for VOD.
/// Segment lines are any non-empty line that is not a `#`-prefixed tag.
fn segment_reference(contents: &str, want_last: bool) -> Option<&str> {
    let mut segments = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'));
    if want_last {
        segments.last()
    } else {
        segments.next()
    }
}

/// Poll once: read the playlist (trying the canonical path, then the legacy
/// fallback), and report whether it is ready to serve. `Ok(false)` means
/// "not ready yet, keep polling"; `Err` means a filesystem fault distinct
/// from "not yet written".
pub async fn is_ready(
    platform: &dyn Platform,
    hls_root: &Path,
    session_id: &str,
    is_vod: bool,
) -> Result<bool, PlatformError> {
    let mut playlist_path = None;
    let mut contents = None;
    for candidate in candidate_paths(hls_root, session_id) {
        if platform.exists(&candidate).await {
            contents = Some(platform.read_to_string(&candidate).await?);
            playlist_path = Some(candidate);
            break;
        }
    }
    let (playlist_path, contents) = match (playlist_path, contents) {
        (Some(p), Some(c)) => (p, c),
        _ => return Ok(false),
    };

    if !has_tag(&contents, "#EXTM3U") {
        return Ok(false);
    }
    if is_vod && !has_tag(&contents, "#EXT-X-ENDLIST") {
        return Ok(false);
    }

    let Some(segment) = segment_reference(&contents, is_vod) else {
        return Ok(false);
    };
    let segment_dir = playlist_path.parent().unwrap_or(hls_root);
    let segment_path = segment_dir.join(segment);
    if !platform.exists(&segment_path).await {
        return Ok(false);
    }
    let size = platform.file_len(&segment_path).await?;
    Ok(size > 0)
}

#[cfg(test)]
#[path = "playlist_tests.rs"]
mod tests;
