//! Offer countdown shown in the urgency banner.
//!
//! The end instant is persisted so a returning visitor sees the same deadline
//! instead of a fresh window on every page load.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::debug;

/// Default offer window.
pub const DEFAULT_WINDOW: Duration = Duration::hours(24);

#[derive(Debug, Error)]
pub enum CountdownError {
    #[error("failed to persist countdown to {path}: {source}")]
    Persist { path: PathBuf, source: io::Error },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    ends_at: DateTime<Utc>,
}

impl Countdown {
    pub fn ending_at(ends_at: DateTime<Utc>) -> Self {
        Self { ends_at }
    }

    /// Resume the deadline stored at `path` if it is still ahead of `now`, otherwise
    /// start a new `window` and store it.
    ///
    /// A missing or unreadable file counts as no deadline.
    pub fn resume_or_start(
        path: impl AsRef<Path>,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<Self, CountdownError> {
        let path = path.as_ref();

        let saved = fs::read_to_string(path)
            .ok()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .and_then(DateTime::<Utc>::from_timestamp_millis);
        if let Some(ends_at) = saved.filter(|end| *end > now) {
            debug!(%ends_at, "countdown resumed");
            return Ok(Self { ends_at });
        }

        let ends_at = now + window;
        fs::write(path, ends_at.timestamp_millis().to_string()).map_err(|source| {
            CountdownError::Persist {
                path: path.to_path_buf(),
                source,
            }
        })?;
        debug!(%ends_at, "countdown started");
        Ok(Self { ends_at })
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        self.ends_at
    }

    /// Time left, never negative.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.ends_at - now).max(Duration::zero())
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining(now).is_zero()
    }

    /// `(hours, minutes, seconds)`, each zero padded to two digits.
    pub fn hms(&self, now: DateTime<Utc>) -> (String, String, String) {
        let left = self.remaining(now);
        let hours = left.num_hours();
        let minutes = left.num_minutes() % 60;
        let seconds = left.num_seconds() % 60;
        (
            format!("{hours:02}"),
            format!("{minutes:02}"),
            format!("{seconds:02}"),
        )
    }
}
