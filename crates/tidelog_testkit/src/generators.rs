//! Property-based test generators using proptest.

use proptest::prelude::*;

/// Strategy for one log record: a printable line, newline terminated.
pub fn record_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::string::string_regex("[ -~]{1,80}")
        .expect("Invalid regex")
        .prop_map(|line| format!("{line}\n").into_bytes())
}

/// Strategy for a batch of up to `max` records.
pub fn records_strategy(max: usize) -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(record_strategy(), 1..=max.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn records_are_single_lines(record in record_strategy()) {
            prop_assert_eq!(record.last(), Some(&b'\n'));
            prop_assert_eq!(record.iter().filter(|&&b| b == b'\n').count(), 1);
        }
    }
}
