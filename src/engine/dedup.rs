//! Duplicate-page detection
//!
//! The backstop termination guarantee: a pagination control that claims to
//! advance but re-renders identical content is caught by comparing the batch
//! collected since the last advance against its predecessor.

/// Whether `current` represents genuinely new content relative to `last`.
///
/// Differing batch sizes always count as progress (a different page).
/// Equal-sized batches are scanned element-wise then field-wise; the first
/// differing field proves progress. A fully equal scan means the pagination
/// looped or hit a static end.
pub fn batch_progressed(last: &[Vec<String>], current: &[Vec<String>]) -> bool {
    if last.len() != current.len() {
        return true;
    }

    for (last_record, current_record) in last.iter().zip(current) {
        if last_record.len() != current_record.len() {
            return true;
        }
        for (last_field, current_field) in last_record.iter().zip(current_record) {
            if last_field != current_field {
                return true;
            }
        }
    }

    false
}
