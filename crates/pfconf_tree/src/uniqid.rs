//! Unique identifiers for new configuration entries.

use crate::error::{TreeError, TreeResult};
use parking_lot::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of fresh `refid` values.
pub trait IdGenerator: Send + Sync {
    /// Returns an identifier not handed out before by this generator.
    ///
    /// # Errors
    ///
    /// Returns `TreeError::IdGeneration` if no identifier can be produced.
    fn next_id(&self) -> TreeResult<String>;
}

/// Time-based identifiers in the 13 hex digit `uniqid` layout.
///
/// The first 8 digits are the Unix seconds, the last 5 the microseconds.
/// Identifiers are strictly increasing within a process: if the clock has
/// not advanced since the previous call, the previous value plus one
/// microsecond is used.
#[derive(Debug, Default)]
pub struct UniqidGenerator {
    last_micros: Mutex<u64>,
}

impl UniqidGenerator {
    /// Creates a new generator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn format(micros: u64) -> String {
        format!("{:08x}{:05x}", micros / 1_000_000, micros % 1_000_000)
    }
}

impl IdGenerator for UniqidGenerator {
    fn next_id(&self) -> TreeResult<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| TreeError::IdGeneration(e.to_string()))?;
        let now = u64::try_from(now.as_micros())
            .map_err(|e| TreeError::IdGeneration(e.to_string()))?;

        let mut last = self.last_micros.lock();
        let micros = if now > *last { now } else { *last + 1 };
        *last = micros;
        Ok(Self::format(micros))
    }
}

/// Deterministic identifiers `<prefix>1`, `<prefix>2`, ...
///
/// Useful for reproducible runs and tests.
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: Mutex<u64>,
}

impl SequentialIds {
    /// Creates a generator whose first identifier is `<prefix>1`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: Mutex::new(1),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> TreeResult<String> {
        let mut next = self.next.lock();
        let id = format!("{}{}", self.prefix, *next);
        *next += 1;
        Ok(id)
    }
}
