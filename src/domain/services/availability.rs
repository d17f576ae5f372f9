use chrono::NaiveDate;
use crate::domain::models::booking::{Booking, BlockedRange};
use crate::error::AppError;

/// Half-open ranges `[a_start, a_end)` and `[b_start, b_end)` share at least one night.
pub fn ranges_overlap(a_start: NaiveDate, a_end: NaiveDate, b_start: NaiveDate, b_end: NaiveDate) -> bool {
    a_start < b_end && a_end > b_start
}

pub fn validate_stay(start: NaiveDate, end: NaiveDate) -> Result<(), AppError> {
    if end <= start {
        return Err(AppError::Validation("end_date must be after start_date".into()));
    }
    Ok(())
}

pub fn nights_between(start: NaiveDate, end: NaiveDate) -> Result<i64, AppError> {
    validate_stay(start, end)?;
    Ok((end - start).num_days())
}

pub fn quote_total(price_per_night: i64, start: NaiveDate, end: NaiveDate) -> Result<i64, AppError> {
    let nights = nights_between(start, end)?;
    price_per_night.checked_mul(nights)
        .ok_or_else(|| AppError::Validation("Total price is out of range".into()))
}

/// Fails with `Conflict` if any non-canceled booking overlaps `[start, end)`.
pub fn ensure_no_overlap(existing: &[Booking], start: NaiveDate, end: NaiveDate) -> Result<(), AppError> {
    let clash = existing.iter()
        .filter(|b| b.blocks_dates())
        .find(|b| ranges_overlap(b.start_date, b.end_date, start, end));

    match clash {
        Some(b) => Err(AppError::Conflict(format!(
            "Property is already booked from {} to {}", b.start_date, b.end_date
        ))),
        None => Ok(()),
    }
}

/// Blocked ranges sorted by start date, for availability calendars.
pub fn blocked_ranges(existing: &[Booking]) -> Vec<BlockedRange> {
    let mut ranges: Vec<BlockedRange> = existing.iter()
        .filter(|b| b.blocks_dates())
        .map(BlockedRange::from)
        .collect();
    ranges.sort_by_key(|r| (r.start_date, r.end_date));
    ranges
}
