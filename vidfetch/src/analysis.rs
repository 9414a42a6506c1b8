//! Quality catalog construction from probe metadata.
//!
//! Turns the engine's raw format list into the summary advertised to
//! clients. Classification is intentionally permissive: a format missing its
//! codec fields still counts, only the literal `"none"` marker excludes it.

use std::collections::BTreeSet;

use crate::engine::{FormatDescriptor, MediaProbe};

/// Standard quality ladder always offered alongside detected heights,
/// highest first.
pub const STANDARD_LADDER: [u32; 8] = [2160, 1440, 1080, 720, 480, 360, 240, 144];

/// Summary of what a probed URL has to offer.
#[derive(Debug, Clone)]
pub struct QualityCatalog {
    /// Media title, `"Unknown"` when the probe carries none.
    pub title: String,
    /// Duration in seconds, when known.
    pub duration: Option<f64>,
    /// Thumbnail URL, when known.
    pub thumbnail: Option<String>,
    /// Advertised heights, deduplicated and sorted highest first.
    pub video_qualities: Vec<u32>,
    /// Whether any audio-capable format exists.
    pub has_audio: bool,
    /// Extractor name, `"Unknown"` when the probe carries none.
    pub platform: String,
}

/// A format counts as video when its video codec is not disabled and it has
/// a positive height.
fn is_video(format: &FormatDescriptor) -> bool {
    format.vcodec.as_deref() != Some("none") && format.height.is_some_and(|h| h > 0)
}

/// A format counts as audio when its audio codec is not disabled.
fn is_audio(format: &FormatDescriptor) -> bool {
    format.acodec.as_deref() != Some("none")
}

/// Build the quality catalog for a probe.
///
/// Formats are bucketed in order: video first, otherwise audio. A format
/// that is neither contributes nothing.
pub fn build_catalog(probe: &MediaProbe) -> QualityCatalog {
    let mut detected = Vec::new();
    let mut has_audio = false;

    for format in &probe.formats {
        if is_video(format) {
            if let Some(height) = format.height {
                detected.push(height);
            }
        } else if is_audio(format) {
            has_audio = true;
        }
    }

    QualityCatalog {
        title: probe.title.clone().unwrap_or_else(|| "Unknown".to_string()),
        duration: probe.duration,
        thumbnail: probe.thumbnail.clone(),
        video_qualities: advertised_qualities(&detected),
        has_audio,
        platform: probe
            .extractor
            .clone()
            .unwrap_or_else(|| "Unknown".to_string()),
    }
}

/// Union of detected heights and the standard ladder, deduplicated and
/// sorted highest first.
pub fn advertised_qualities(detected: &[u32]) -> Vec<u32> {
    let mut heights: BTreeSet<u32> = detected.iter().copied().collect();
    heights.extend(STANDARD_LADDER);
    heights.into_iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_format(height: u32) -> FormatDescriptor {
        FormatDescriptor {
            format_id: Some(format!("v{height}")),
            ext: Some("mp4".to_string()),
            height: Some(height),
            vcodec: Some("avc1".to_string()),
            acodec: Some("none".to_string()),
            ..Default::default()
        }
    }

    fn audio_format() -> FormatDescriptor {
        FormatDescriptor {
            format_id: Some("a1".to_string()),
            ext: Some("m4a".to_string()),
            vcodec: Some("none".to_string()),
            acodec: Some("mp4a.40.2".to_string()),
            abr: Some(128.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_advertised_qualities_is_ladder_union() {
        let qualities = advertised_qualities(&[1080, 720, 480]);
        assert_eq!(qualities, vec![2160, 1440, 1080, 720, 480, 360, 240, 144]);
    }

    #[test]
    fn test_advertised_qualities_inserts_nonstandard_heights() {
        let qualities = advertised_qualities(&[608, 1080]);
        assert_eq!(
            qualities,
            vec![2160, 1440, 1080, 720, 608, 480, 360, 240, 144]
        );
    }

    #[test]
    fn test_advertised_qualities_empty_detected_is_ladder() {
        assert_eq!(advertised_qualities(&[]), STANDARD_LADDER.to_vec());
    }

    #[test]
    fn test_build_catalog_buckets_formats() {
        let probe = MediaProbe {
            title: Some("Clip".to_string()),
            duration: Some(93.0),
            thumbnail: Some("https://example.com/t.jpg".to_string()),
            extractor: Some("youtube".to_string()),
            formats: vec![video_format(1080), video_format(720), audio_format()],
        };

        let catalog = build_catalog(&probe);
        assert_eq!(catalog.title, "Clip");
        assert_eq!(catalog.duration, Some(93.0));
        assert_eq!(catalog.thumbnail.as_deref(), Some("https://example.com/t.jpg"));
        assert_eq!(
            catalog.video_qualities,
            vec![2160, 1440, 1080, 720, 480, 360, 240, 144]
        );
        assert!(catalog.has_audio);
        assert_eq!(catalog.platform, "youtube");
    }

    #[test]
    fn test_build_catalog_missing_vcodec_counts_as_video() {
        let probe = MediaProbe {
            formats: vec![FormatDescriptor {
                height: Some(540),
                ..Default::default()
            }],
            ..Default::default()
        };

        let catalog = build_catalog(&probe);
        assert!(catalog.video_qualities.contains(&540));
        // The format landed in the video bucket, so it never reached the
        // audio check.
        assert!(!catalog.has_audio);
    }

    #[test]
    fn test_build_catalog_zero_height_falls_through_to_audio() {
        let probe = MediaProbe {
            formats: vec![FormatDescriptor {
                height: Some(0),
                vcodec: Some("avc1".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };

        let catalog = build_catalog(&probe);
        assert_eq!(catalog.video_qualities, STANDARD_LADDER.to_vec());
        assert!(catalog.has_audio);
    }

    #[test]
    fn test_build_catalog_defaults_title_and_platform() {
        let catalog = build_catalog(&MediaProbe::default());
        assert_eq!(catalog.title, "Unknown");
        assert_eq!(catalog.platform, "Unknown");
        assert_eq!(catalog.duration, None);
        assert_eq!(catalog.thumbnail, None);
        assert!(!catalog.has_audio);
    }

    #[test]
    fn test_build_catalog_audio_only_media() {
        let probe = MediaProbe {
            title: Some("Podcast".to_string()),
            formats: vec![audio_format()],
            ..Default::default()
        };

        let catalog = build_catalog(&probe);
        assert!(catalog.has_audio);
        assert_eq!(catalog.video_qualities, STANDARD_LADDER.to_vec());
    }
}
