use crate::error::InvalidBatchSize;
use shared::store::MAX_BATCH_WRITES;
use std::ops::Range;

/// Number of batches needed for `count` items. Always at least one.
pub fn batch_count(count: usize, batch_size: usize) -> usize {
    count.div_ceil(batch_size).max(1)
}

/// Splits `0..count` into ascending, contiguous ranges of `batch_size` items. The last
/// range holds the remainder, and `count == 0` yields the single range `0..0`.
pub fn plan_batches(
    count: usize,
    batch_size: usize,
) -> Result<Vec<Range<usize>>, InvalidBatchSize> {
    validate_batch_size(batch_size)?;

    let batches = batch_count(count, batch_size);
    Ok((0..batches)
        .map(|i| {
            let start = i * batch_size;
            if i == batches - 1 {
                start..count
            } else {
                start..start + batch_size
            }
        })
        .collect())
}

pub fn validate_batch_size(batch_size: usize) -> Result<usize, InvalidBatchSize> {
    if (1..=MAX_BATCH_WRITES).contains(&batch_size) {
        Ok(batch_size)
    } else {
        Err(InvalidBatchSize(batch_size))
    }
}
