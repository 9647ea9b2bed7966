//! Transcode policy configuration.

use serde::{Deserialize, Serialize};

/// Default derivative height (360p).
pub const DEFAULT_TARGET_HEIGHT: u32 = 360;

/// Fixed transcode policy: scale to a target vertical resolution while
/// preserving aspect ratio. A configuration value, not per-job state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TranscodeSpec {
    /// Target vertical resolution in pixels
    #[serde(default = "default_target_height")]
    pub target_height: u32,
}

fn default_target_height() -> u32 {
    DEFAULT_TARGET_HEIGHT
}

impl Default for TranscodeSpec {
    fn default() -> Self {
        Self {
            target_height: DEFAULT_TARGET_HEIGHT,
        }
    }
}

impl TranscodeSpec {
    /// FFmpeg scale filter for this spec.
    ///
    /// Width is `-2` so the encoder gets an even width regardless of the
    /// source aspect ratio.
    pub fn scale_filter(&self) -> String {
        format!("scale=-2:{}", self.target_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_360p() {
        let spec = TranscodeSpec::default();
        assert_eq!(spec.target_height, 360);
        assert_eq!(spec.scale_filter(), "scale=-2:360");
    }

    #[test]
    fn test_custom_height() {
        let spec = TranscodeSpec { target_height: 720 };
        assert_eq!(spec.scale_filter(), "scale=-2:720");
    }
}
