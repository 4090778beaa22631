use std::path::Path;

use xg2g_adapters::FakePlatform;

use super::*;

fn hls_root() -> &'static Path {
    Path::new("/virtual/hls")
}

#[tokio::test]
async fn not_ready_when_playlist_is_missing() {
    let platform = FakePlatform::new("/virtual/hls");
    assert!(!is_ready(&platform, hls_root(), "s1", false).await.unwrap());
}

#[tokio::test]
async fn not_ready_without_extm3u_tag() {
    let platform = FakePlatform::new("/virtual/hls");
    platform.write_file("/virtual/hls/sessions/s1/index.m3u8", b"not a playlist".to_vec());
    assert!(!is_ready(&platform, hls_root(), "s1", false).await.unwrap());
}

#[tokio::test]
async fn live_ready_once_first_segment_exists_with_nonzero_size() {
    let platform = FakePlatform::new("/virtual/hls");
    platform.write_file(
        "/virtual/hls/sessions/s1/index.m3u8",
        b"#EXTM3U\n#EXTINF:6.0,\nseg0.ts\n".to_vec(),
    );
    assert!(!is_ready(&platform, hls_root(), "s1", false).await.unwrap());

    platform.write_file("/virtual/hls/sessions/s1/seg0.ts", b"data".to_vec());
    assert!(is_ready(&platform, hls_root(), "s1", false).await.unwrap());
}

#[tokio::test]
async fn live_not_ready_when_segment_is_empty() {
    let platform = FakePlatform::new("/virtual/hls");
    platform.write_file(
        "/virtual/hls/sessions/s1/index.m3u8",
        b"#EXTM3U\nseg0.ts\n".to_vec(),
    );
    platform.write_file("/virtual/hls/sessions/s1/seg0.ts", Vec::new());
    assert!(!is_ready(&platform, hls_root(), "s1", false).await.unwrap());
}

#[tokio::test]
async fn vod_requires_endlist_tag_and_last_segment() {
    let platform = FakePlatform::new("/virtual/hls");
    platform.write_file(
        "/virtual/hls/sessions/s1/index.m3u8",
        b"#EXTM3U\nseg0.ts\nseg1.ts\n".to_vec(),
    );
    platform.write_file("/virtual/hls/sessions/s1/seg0.ts", b"data".to_vec());
    platform.write_file("/virtual/hls/sessions/s1/seg1.ts", b"data".to_vec());
    // No #EXT-X-ENDLIST yet: not ready even though both segments exist.
    assert!(!is_ready(&platform, hls_root(), "s1", true).await.unwrap());

    platform.write_file(
        "/virtual/hls/sessions/s1/index.m3u8",
        b"#EXTM3U\nseg0.ts\nseg1.ts\n#EXT-X-ENDLIST\n".to_vec(),
    );
    assert!(is_ready(&platform, hls_root(), "s1", true).await.unwrap());
}

#[tokio::test]
async fn legacy_layout_is_accepted_as_fallback() {
    let platform = FakePlatform::new("/virtual/hls");
    platform.write_file("/virtual/hls/s1/stream.m3u8", b"#EXTM3U\nseg0.ts\n".to_vec());
    platform.write_file("/virtual/hls/s1/seg0.ts", b"data".to_vec());
    assert!(is_ready(&platform, hls_root(), "s1", false).await.unwrap());
}
