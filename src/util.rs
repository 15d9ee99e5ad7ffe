//! Timing and logging helpers.

use std::time::Instant;

/// RAII timer that logs elapsed time on drop.
///
/// Used around precomputation steps (query cache builds, bulk loads) so the
/// cost shows up in logs without littering call sites with `Instant` pairs.
pub struct Timed {
    name: &'static str,
    start: Instant,
    level: log::Level,
}

impl Timed {
    /// Timer that reports at INFO level on drop.
    pub fn info(name: &'static str) -> Self {
        Self::with_level(name, log::Level::Info)
    }

    /// Timer that reports at DEBUG level on drop.
    pub fn debug(name: &'static str) -> Self {
        Self::with_level(name, log::Level::Debug)
    }

    fn with_level(name: &'static str, level: log::Level) -> Self {
        Self {
            name,
            start: Instant::now(),
            level,
        }
    }
}

impl Drop for Timed {
    fn drop(&mut self) {
        log::log!(self.level, "{}: {:.3?}", self.name, self.start.elapsed());
    }
}
