//! Snowflake ID Generator
//!
//! Time-ordered unique IDs for opportunities.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Service epoch (2024-01-01T00:00:00.000Z)
const SERVICE_EPOCH: u64 = 1704067200000;

const SEQUENCE_BITS: u64 = 12;
const MACHINE_BITS: u64 = 5;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

/// Snowflake ID generator
///
/// Layout: 41 bits of milliseconds since the service epoch, 5 bits of
/// machine id, 12 bits of per-millisecond sequence.
pub struct SnowflakeGenerator {
    machine_id: u64,
    /// Packed `(timestamp << SEQUENCE_BITS) | sequence` of the last issued id
    state: AtomicU64,
}

impl SnowflakeGenerator {
    /// Create a new snowflake generator
    pub fn new(machine_id: u64) -> Self {
        Self {
            machine_id: machine_id & ((1 << MACHINE_BITS) - 1),
            state: AtomicU64::new(0),
        }
    }

    /// Generate a new snowflake ID
    pub fn generate(&self) -> i64 {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            let now = current_timestamp().saturating_sub(SERVICE_EPOCH);
            let last_ts = current >> SEQUENCE_BITS;
            let last_seq = current & SEQUENCE_MASK;

            let (ts, seq) = if now > last_ts {
                (now, 0)
            } else if last_seq < SEQUENCE_MASK {
                (last_ts, last_seq + 1)
            } else {
                // sequence exhausted for this millisecond; borrow the next one
                (last_ts + 1, 0)
            };

            let next = (ts << SEQUENCE_BITS) | seq;
            match self
                .state
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => {
                    let id = (ts << (MACHINE_BITS + SEQUENCE_BITS))
                        | (self.machine_id << SEQUENCE_BITS)
                        | seq;
                    return id as i64;
                }
                Err(observed) => current = observed,
            }
        }
    }
}

/// Get current timestamp in milliseconds
fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(SERVICE_EPOCH)
}

/// Extract timestamp (Unix milliseconds) from snowflake ID
pub fn extract_timestamp(snowflake: i64) -> u64 {
    ((snowflake as u64) >> (MACHINE_BITS + SEQUENCE_BITS)) + SERVICE_EPOCH
}
