//! Generated references
//!
//! When a caller omits a reference, one is generated as `{prefix}-{timestamp}`
//! with a second-granularity UTC timestamp. Two requests landing in the same
//! second would collide, so the generator remembers the last stamp issued per
//! prefix and appends `-2`, `-3`, ... to repeats.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

#[derive(Debug)]
struct LastIssued {
    stamp: String,
    count: u32,
}

/// Process-wide reference generator
#[derive(Debug, Default)]
pub struct ReferenceGenerator {
    issued: Mutex<HashMap<String, LastIssued>>,
}

impl ReferenceGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a reference for the current time
    pub fn next(&self, prefix: &str) -> String {
        self.next_at(prefix, Utc::now())
    }

    /// Generate a reference for a given instant
    pub fn next_at(&self, prefix: &str, at: DateTime<Utc>) -> String {
        let stamp = at.format(TIMESTAMP_FORMAT).to_string();
        let mut issued = self.issued.lock();

        match issued.get_mut(prefix) {
            Some(last) if last.stamp == stamp => {
                last.count += 1;
                format!("{}-{}-{}", prefix, stamp, last.count)
            }
            _ => {
                issued.insert(
                    prefix.to_string(),
                    LastIssued {
                        stamp: stamp.clone(),
                        count: 1,
                    },
                );
                format!("{}-{}", prefix, stamp)
            }
        }
    }
}

/// Use the caller's reference when present and non-blank, otherwise generate one
pub fn reference_or_generate(
    reference: Option<String>,
    prefix: &str,
    generator: &ReferenceGenerator,
) -> String {
    match reference {
        Some(reference) if !reference.trim().is_empty() => reference.trim().to_string(),
        _ => generator.next(prefix),
    }
}
