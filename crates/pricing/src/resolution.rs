use std::fmt;

use serde::{Deserialize, Serialize};

/// Height assumed when a resolution cannot be read.
pub const DEFAULT_HEIGHT: u32 = 720;

/// Extracts the vertical resolution from `"WxH"`, `"720p"` or a bare
/// number. Anything else yields [`DEFAULT_HEIGHT`].
pub fn parse_height(resolution: &str) -> u32 {
    let s = resolution.trim().to_ascii_lowercase();
    let candidate = if let Some((_, h)) = s.split_once('x') {
        h
    } else if let Some(h) = s.strip_suffix('p') {
        h
    } else {
        s.as_str()
    };
    leading_number(candidate).unwrap_or(DEFAULT_HEIGHT)
}

// Parses the leading run of digits, like `parseInt` on "1080p60".
fn leading_number(s: &str) -> Option<u32> {
    let s = s.trim_start();
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(s.len(), |(i, _)| i);
    s[..end].parse().ok()
}

/// Price multiplier for a video height.
pub fn quality_multiplier(height: u32) -> f64 {
    QualityTier::from_height(height).multiplier()
}

/// Pricing tier of a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    /// 720p and below.
    Standard,
    /// Above 720p up to 1080p.
    FullHd,
    /// Above 1080p.
    UltraHd,
}

impl QualityTier {
    pub fn from_height(height: u32) -> Self {
        if height > 1080 {
            Self::UltraHd
        } else if height > 720 {
            Self::FullHd
        } else {
            Self::Standard
        }
    }

    pub fn from_resolution(resolution: &str) -> Self {
        Self::from_height(parse_height(resolution))
    }

    pub fn multiplier(&self) -> f64 {
        match self {
            Self::Standard => 1.0,
            Self::FullHd => 1.5,
            Self::UltraHd => 2.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Standard => "base price",
            Self::FullHd => "1.5x (Full HD)",
            Self::UltraHd => "2x (4K)",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
