use std::fmt;
use std::str::FromStr;

use crate::gate::DEFAULT_MAX_FRAMES_IN_FLIGHT;

/// Where a frame is encoded before it reaches the drawable.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum SubmitMode {
    /// Encode straight into the swap-chain image.
    #[default]
    Direct,
    /// Encode into an intermediate texture, then composite it full-screen.
    Tile,
}

impl fmt::Display for SubmitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SubmitMode::Direct => "direct",
            SubmitMode::Tile => "tile",
        })
    }
}

impl FromStr for SubmitMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "direct" => Ok(SubmitMode::Direct),
            "tile" | "offscreen" => Ok(SubmitMode::Tile),
            other => anyhow::bail!("unknown submit mode {other:?} (expected `direct` or `tile`)"),
        }
    }
}

/// Submitter settings.
#[derive(Debug, Clone)]
pub struct SubmitterConfig {
    /// Frames that may be committed but not yet completed. Must be at least 1.
    pub max_frames_in_flight: usize,
    pub mode: SubmitMode,
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            max_frames_in_flight: DEFAULT_MAX_FRAMES_IN_FLIGHT,
            mode: SubmitMode::Direct,
        }
    }
}
