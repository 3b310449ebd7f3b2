//! ReelCues Core Type Definitions
//!
//! Defines fundamental types used throughout the project.

use serde::{Deserialize, Serialize};

// =============================================================================
// Time Types
// =============================================================================

/// Time in seconds (floating point)
pub type TimeSec = f64;

/// Character offset into a linearized transcript (counted in chars, not bytes)
pub type CharOffset = usize;

// =============================================================================
// Layout Types
// =============================================================================

/// Target frame orientation of the rendered video.
///
/// Portrait frames are narrow, so captions get a smaller character budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaptionLayout {
    /// 9:16 short-form video
    Portrait,
    /// 16:9 video (default)
    #[default]
    Landscape,
}

impl CaptionLayout {
    /// Returns the default caption character budget for this layout
    pub const fn default_max_chars(&self) -> usize {
        match self {
            CaptionLayout::Portrait => 20,
            CaptionLayout::Landscape => 40,
        }
    }

    /// Returns the layout name for logging/display
    pub fn name(&self) -> &'static str {
        match self {
            CaptionLayout::Portrait => "portrait",
            CaptionLayout::Landscape => "landscape",
        }
    }
}

impl std::str::FromStr for CaptionLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "portrait" | "vertical" => Ok(CaptionLayout::Portrait),
            "landscape" | "horizontal" => Ok(CaptionLayout::Landscape),
            _ => Err(format!("Unknown caption layout: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_budgets() {
        assert!(
            CaptionLayout::Portrait.default_max_chars()
                < CaptionLayout::Landscape.default_max_chars()
        );
        assert_eq!(CaptionLayout::default(), CaptionLayout::Landscape);
    }

    #[test]
    fn test_layout_from_str() {
        assert_eq!(
            "Portrait".parse::<CaptionLayout>().unwrap(),
            CaptionLayout::Portrait
        );
        assert_eq!(
            "horizontal".parse::<CaptionLayout>().unwrap(),
            CaptionLayout::Landscape
        );
        assert!("square".parse::<CaptionLayout>().is_err());
    }
}
