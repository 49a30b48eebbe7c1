use chrono::{Days, NaiveDate};
use tracing::{debug, warn};

use crate::error::AvailabilityError;
use crate::models::MacroPeriodPublicView;

/// Inclusive calendar range a macro period allows selections in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PeriodRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn of(view: &MacroPeriodPublicView) -> Self {
        Self::new(view.start_date, view.end_date)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }
}

/// Maps a clicked date to the block of `total_days` consecutive dates that
/// starts on it. The block must lie entirely inside `range`.
pub fn map_block(
    clicked: NaiveDate,
    range: &PeriodRange,
    total_days: u32,
    can_edit: bool,
) -> Result<Vec<NaiveDate>, AvailabilityError> {
    debug!("Mapping block of {} day(s) from {}", total_days, clicked);

    if !range.contains(clicked) {
        warn!("Clicked date {} outside {}..{}", clicked, range.start, range.end);
        return Err(AvailabilityError::OutOfRange {
            date: clicked,
            start: range.start,
            end: range.end,
        });
    }

    if !can_edit {
        return Err(AvailabilityError::EditLocked);
    }

    if total_days == 0 {
        return Err(AvailabilityError::InvalidDayCount(total_days));
    }

    let last_day = clicked.checked_add_days(Days::new(u64::from(total_days - 1)));
    match last_day {
        Some(last_day) if last_day <= range.end => {}
        overrun => {
            let last_day = overrun.unwrap_or(NaiveDate::MAX);
            warn!("Block {}..{} overruns period end {}", clicked, last_day, range.end);
            return Err(AvailabilityError::BlockOverrun {
                start: clicked,
                last_day,
                end: range.end,
            });
        }
    }

    Ok(clicked.iter_days().take(total_days as usize).collect())
}
