//! Version generation.
//!
//! Versions come from a coarse clock. When the reading does not exceed the
//! bucket's latest version (two commits inside one clock tick, or a clock
//! that stepped backwards) the generator sleeps and re-reads until it does.
//! Callers serialize generation per bucket; the generator itself holds no
//! state about previous versions.

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::config::FilesystemConfig;
use crate::filesystem::types::Version;

/// clock reads allowed before a commit stops waiting for the clock
const MAX_RETRIES: u32 = 3;

/// Granularity of a version clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockResolution {
    Seconds,
    #[default]
    Millis,
    Micros,
}

impl ClockResolution {
    /// clock ticks elapsed since the unix epoch at `at`
    pub fn ticks_at(&self, at: DateTime<Utc>) -> i64 {
        match self {
            ClockResolution::Seconds => at.timestamp(),
            ClockResolution::Millis => at.timestamp_millis(),
            ClockResolution::Micros => at.timestamp_micros(),
        }
    }
}

impl fmt::Display for ClockResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClockResolution::Seconds => write!(f, "seconds"),
            ClockResolution::Millis => write!(f, "millis"),
            ClockResolution::Micros => write!(f, "micros"),
        }
    }
}

/// A source of clock readings for version generation.
pub trait VersionClock: Send + Sync + fmt::Debug {
    /// the current reading, in clock ticks
    fn ticks(&self) -> i64;
}

/// Wall clock at a fixed resolution.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    resolution: ClockResolution,
}

impl SystemClock {
    pub fn new(resolution: ClockResolution) -> Self {
        Self { resolution }
    }
}

impl VersionClock for SystemClock {
    fn ticks(&self) -> i64 {
        self.resolution.ticks_at(Utc::now())
    }
}

/// Produces versions strictly greater than a given latest version.
#[derive(Debug, Clone)]
pub struct VersionGenerator {
    clock: Arc<dyn VersionClock>,
    retry_interval: Duration,
}

impl VersionGenerator {
    pub fn new(clock: Arc<dyn VersionClock>, retry_interval: Duration) -> Self {
        Self {
            clock,
            retry_interval,
        }
    }

    /// a generator reading the system clock as configured
    pub fn from_config(config: &FilesystemConfig) -> Self {
        Self::new(
            Arc::new(SystemClock::new(config.clock_resolution)),
            config.retry_interval,
        )
    }

    /// Produce a version after `latest`.
    ///
    /// The clock is re-read up to `MAX_RETRIES` times. If it still has not
    /// passed `latest` (a clock that stepped back, or a snapshot written at a
    /// finer resolution) the version following `latest` is used instead.
    pub fn next_after(&self, latest: Option<&Version>) -> Version {
        let Some(latest) = latest else {
            return Version::from_ticks(self.clock.ticks());
        };

        let mut retries: u32 = 0;
        loop {
            let candidate = Version::from_ticks(self.clock.ticks());
            if candidate > *latest {
                return candidate;
            }

            retries += 1;
            if retries >= MAX_RETRIES {
                let bumped = successor(latest);
                warn!(%candidate, %latest, %bumped, "clock behind latest version, advancing past it");
                return bumped;
            }
            debug!(%candidate, %latest, retries, "version collision, waiting for clock");
            thread::sleep(self.retry_interval);
        }
    }
}

/// the smallest generated version after `latest`, or `latest` with a digit
/// appended when it is not a generated version
fn successor(latest: &Version) -> Version {
    match latest.ticks().and_then(|ticks| ticks.checked_add(1)) {
        Some(next) => Version::from_ticks(next),
        None => Version::new(format!("{}0", latest)),
    }
}

impl Default for VersionGenerator {
    fn default() -> Self {
        Self::from_config(&FilesystemConfig::default())
    }
}

/// Clock that replays scripted readings and then repeats the last one,
/// advancing by one tick per read once the script runs out.
#[cfg(test)]
#[derive(Debug)]
pub(crate) struct ScriptedClock {
    readings: parking_lot::Mutex<std::collections::VecDeque<i64>>,
    last: std::sync::atomic::AtomicI64,
}

#[cfg(test)]
impl ScriptedClock {
    pub(crate) fn new(readings: impl IntoIterator<Item = i64>) -> Self {
        Self {
            readings: parking_lot::Mutex::new(readings.into_iter().collect()),
            last: std::sync::atomic::AtomicI64::new(0),
        }
    }
}

#[cfg(test)]
impl VersionClock for ScriptedClock {
    fn ticks(&self) -> i64 {
        use std::sync::atomic::Ordering;
        match self.readings.lock().pop_front() {
            Some(reading) => {
                self.last.store(reading, Ordering::SeqCst);
                reading
            }
            None => self.last.fetch_add(1, Ordering::SeqCst) + 1,
        }
    }
}
