//! Record id generation
//!
//! Ids are the creation time in base-36 milliseconds followed by a random
//! base-36 suffix, which keeps them roughly time-ordered and unique at the
//! scale of a personal journal.

use chrono::{DateTime, Utc};
use rand::Rng;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 11;

/// Generate a new record id stamped with `now`
pub fn generate_id(now: DateTime<Utc>) -> String {
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default();
    let mut id = to_base36(millis);

    let mut rng = rand::thread_rng();
    for _ in 0..SUFFIX_LEN {
        id.push(ALPHABET[rng.gen_range(0..ALPHABET.len())] as char);
    }

    id
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();

    String::from_utf8_lossy(&digits).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_700_000_000_000), "loyw3v28");
    }

    #[test]
    fn test_prefix_is_time_based() {
        let now = Utc::now();
        let id = generate_id(now);
        let prefix = to_base36(now.timestamp_millis() as u64);

        assert!(id.starts_with(&prefix));
        assert_eq!(id.len(), prefix.len() + SUFFIX_LEN);
        assert!(id.bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn test_ids_are_unique() {
        let now = Utc::now();
        let ids: HashSet<String> = (0..500).map(|_| generate_id(now)).collect();
        assert_eq!(ids.len(), 500);
    }
}
