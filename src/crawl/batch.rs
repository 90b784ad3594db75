//! # Batch partitioning
//!
//! Module dedicated to partitioning a folder's message numbers into
//! fixed-size fetch batches, the unit of concurrent crawl work.

/// Partition `1..=message_count` into consecutive inclusive ranges of
/// `batch_size` messages. The last range may be shorter.
///
/// An empty folder yields no range at all: a `(1, 0)` range would be
/// an invalid fetch.
pub(crate) fn batch_ranges(message_count: u32, batch_size: u32) -> Vec<(u32, u32)> {
    if message_count == 0 {
        return Vec::new();
    }

    let batch_size = batch_size.max(1);
    let mut ranges = Vec::new();
    let mut first = 1u32;

    while u64::from(first) + u64::from(batch_size) <= u64::from(message_count) {
        ranges.push((first, first + batch_size - 1));
        first += batch_size;
    }
    ranges.push((first, message_count));

    ranges
}
