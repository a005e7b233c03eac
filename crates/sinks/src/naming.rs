//! Bucket and object key naming
//!
//! Output layout is compatibility-bearing: downstream consumers locate
//! their slice by convention alone, so these functions are the single
//! source of truth for it.

use sluice_protocol::{OutputFormat, Window};

/// Longest bucket name the sink accepts
pub const MAX_BUCKET_LEN: usize = 63;

/// Hex digits of the overflow hash suffix
const HASH_SUFFIX_LEN: usize = 8;

/// The bucket for a client: `{prefix}-{client_id}`, normalized
///
/// Lowercased; any character outside `[a-z0-9-]` becomes `-`;
/// leading/trailing hyphens are trimmed. Names past the length cap are
/// truncated and given a deterministic FNV-1a suffix so two long
/// clients cannot silently collide by truncation alone.
pub fn bucket_name(prefix: &str, client_id: &str) -> String {
    let raw = format!("{prefix}-{client_id}");
    let normalized: String = raw
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let normalized = normalized.trim_matches('-');

    if normalized.len() <= MAX_BUCKET_LEN {
        return normalized.to_owned();
    }

    // Normalized names are pure ASCII, so byte slicing is safe
    let keep = MAX_BUCKET_LEN - HASH_SUFFIX_LEN - 1;
    let head = normalized[..keep].trim_end_matches('-');
    let hash = fnv1a64(normalized.as_bytes()) as u32;
    format!("{head}-{hash:08x}")
}

/// The object key for a window: `events-{YYYY}-{MM}-{DD}-{HH}.{ext}`
///
/// Chunked objects (early-shipped buffers) interpose a `part` index:
/// `events-{YYYY}-{MM}-{DD}-{HH}-part{NNNN}.{ext}`.
pub fn object_key(window: &Window, format: OutputFormat, chunk: Option<u32>) -> String {
    match chunk {
        None => format!("events-{}.{}", window.key_stamp(), format.extension()),
        Some(part) => format!(
            "events-{}-part{part:04}.{}",
            window.key_stamp(),
            format.extension()
        ),
    }
}

/// FNV-1a 64-bit
fn fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = OFFSET;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn window() -> Window {
        Window::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 1, 11, 0, 0).unwrap(),
        )
    }

    #[test]
    fn simple_names_pass_through() {
        assert_eq!(bucket_name("events", "acme"), "events-acme");
    }

    #[test]
    fn names_are_lowercased_and_hyphenated() {
        assert_eq!(bucket_name("events", "Acme Corp"), "events-acme-corp");
        assert_eq!(bucket_name("events", "a_b.c"), "events-a-b-c");
        assert_eq!(bucket_name("events", "café"), "events-caf");
    }

    #[test]
    fn edge_hyphens_are_trimmed() {
        assert_eq!(bucket_name("events", "acme-"), "events-acme");
        assert_eq!(bucket_name("-events", "acme"), "events-acme");
    }

    #[test]
    fn long_names_get_a_deterministic_hash_suffix() {
        let long_client = "a".repeat(100);
        let first = bucket_name("events", &long_client);
        let second = bucket_name("events", &long_client);

        assert_eq!(first, second);
        assert_eq!(first.len(), MAX_BUCKET_LEN);
        assert!(first.starts_with("events-aaaa"));

        // A different long client hashes differently
        let other = bucket_name("events", &"b".repeat(100));
        assert_ne!(first, other);
    }

    #[test]
    fn object_keys_follow_the_layout() {
        assert_eq!(
            object_key(&window(), OutputFormat::Json, None),
            "events-2024-06-01-10.json"
        );
        assert_eq!(
            object_key(&window(), OutputFormat::Csv, None),
            "events-2024-06-01-10.csv"
        );
        assert_eq!(
            object_key(&window(), OutputFormat::Jsonl, Some(3)),
            "events-2024-06-01-10-part0003.jsonl"
        );
    }
}
