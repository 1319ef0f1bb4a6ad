use std::fmt;
use std::time::Duration;

use rand::Rng;

use crate::error::{Error, Result};

pub const LOWER_LIMIT_SECS: u32 = 1;
pub const UPPER_LIMIT_SECS: u32 = 3600;

/// Inclusive range of whole seconds between two chimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalRange {
    min_secs: u32,
    max_secs: u32,
}

impl Default for IntervalRange {
    fn default() -> Self {
        Self {
            min_secs: 30,
            max_secs: 120,
        }
    }
}

impl IntervalRange {
    pub fn new(min_secs: u32, max_secs: u32) -> Result<Self> {
        if min_secs < LOWER_LIMIT_SECS || max_secs > UPPER_LIMIT_SECS || min_secs > max_secs {
            return Err(Error::InvalidInterval {
                min: min_secs,
                max: max_secs,
            });
        }
        Ok(Self { min_secs, max_secs })
    }

    pub fn min_secs(&self) -> u32 {
        self.min_secs
    }

    pub fn max_secs(&self) -> u32 {
        self.max_secs
    }

    /// Draw a delay uniformly from `[min, max]` seconds.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Duration {
        let secs = rng.gen_range(self.min_secs..=self.max_secs);
        Duration::from_secs(u64::from(secs))
    }

    /// Move the lower bound, dragging the upper bound along if they would cross.
    pub fn with_min(self, min_secs: u32) -> Self {
        let min_secs = min_secs.clamp(LOWER_LIMIT_SECS, UPPER_LIMIT_SECS);
        Self {
            min_secs,
            max_secs: self.max_secs.max(min_secs),
        }
    }

    /// Move the upper bound, dragging the lower bound along if they would cross.
    pub fn with_max(self, max_secs: u32) -> Self {
        let max_secs = max_secs.clamp(LOWER_LIMIT_SECS, UPPER_LIMIT_SECS);
        Self {
            min_secs: self.min_secs.min(max_secs),
            max_secs,
        }
    }
}

impl fmt::Display for IntervalRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} s", self.min_secs, self.max_secs)
    }
}

/// Format seconds as `m:ss`, or `h:mm:ss` past the hour.
pub fn format_secs(total: u64) -> String {
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}
