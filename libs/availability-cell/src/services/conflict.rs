use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveTime};
use tracing::debug;

use crate::models::{Conflict, MacroPeriodUnit, PartOfDay, Selection};

/// Detects same-date overlaps between selections of different units.
///
/// Only label-level rules are enforced: FULL_DAY is exclusive on its date, and
/// MORNING / AFTERNOON may each be taken once per date. CUSTOM ranges are not
/// compared against anything.
pub struct ConflictDetector<'a> {
    units: &'a [MacroPeriodUnit],
}

type CanonicalKey<'s> = (usize, i64, PartOfDay, Option<NaiveTime>, Option<NaiveTime>, Option<&'s str>);

impl<'a> ConflictDetector<'a> {
    pub fn new(units: &'a [MacroPeriodUnit]) -> Self {
        Self { units }
    }

    /// Pure and order-independent: the result is sorted by date and message.
    pub fn detect(&self, selections: &[Selection]) -> Vec<Conflict> {
        let mut by_date: BTreeMap<NaiveDate, Vec<&Selection>> = BTreeMap::new();
        for selection in selections {
            by_date.entry(selection.date).or_default().push(selection);
        }

        let mut conflicts = Vec::new();
        for (date, mut day) in by_date {
            day.sort_by(|a, b| self.canonical_key(a).cmp(&self.canonical_key(b)));
            self.check_day(date, &day, &mut conflicts);
        }

        conflicts.sort();
        if !conflicts.is_empty() {
            debug!("Detected {} conflict(s) across {} selection(s)", conflicts.len(), selections.len());
        }
        conflicts
    }

    fn check_day(&self, date: NaiveDate, day: &[&Selection], out: &mut Vec<Conflict>) {
        let full_day: Vec<&Selection> = day
            .iter()
            .copied()
            .filter(|s| s.part_of_day == PartOfDay::FullDay)
            .collect();

        if full_day.len() > 1 {
            out.push(Conflict {
                date,
                message: format!("Duplicate FULL_DAY across units: {}", self.unit_names(&full_day)),
            });
        }

        if let Some(anchor) = full_day.first() {
            let anchor_unit = self.unit_name(anchor.macro_period_unit_id);
            for other in day.iter().filter(|s| s.part_of_day != PartOfDay::FullDay) {
                out.push(Conflict {
                    date,
                    message: format!(
                        "FULL_DAY in {} conflicts with {} in {}",
                        anchor_unit,
                        other.period_label(),
                        self.unit_name(other.macro_period_unit_id)
                    ),
                });
            }
        }

        for period in [PartOfDay::Morning, PartOfDay::Afternoon] {
            let taken: Vec<&Selection> = day.iter().copied().filter(|s| s.part_of_day == period).collect();
            if taken.len() > 1 {
                out.push(Conflict {
                    date,
                    message: format!("Duplicate {} across units: {}", period.label(), self.unit_names(&taken)),
                });
            }
        }
    }

    fn canonical_key<'s>(&self, selection: &'s Selection) -> CanonicalKey<'s> {
        (
            self.unit_position(selection.macro_period_unit_id),
            selection.macro_period_unit_id,
            selection.part_of_day,
            selection.custom_start,
            selection.custom_end,
            selection.block_id.as_deref(),
        )
    }

    fn unit_position(&self, unit_id: i64) -> usize {
        self.units
            .iter()
            .position(|u| u.id == unit_id)
            .unwrap_or(usize::MAX)
    }

    pub fn unit_name(&self, unit_id: i64) -> String {
        self.units
            .iter()
            .find(|u| u.id == unit_id)
            .map(|u| u.unit_name.clone())
            .unwrap_or_else(|| format!("unit #{}", unit_id))
    }

    // Input is already in canonical order, so equal names are adjacent.
    fn unit_names(&self, selections: &[&Selection]) -> String {
        let mut names: Vec<String> = selections
            .iter()
            .map(|s| self.unit_name(s.macro_period_unit_id))
            .collect();
        names.dedup();
        names.join(", ")
    }
}

pub fn detect(units: &[MacroPeriodUnit], selections: &[Selection]) -> Vec<Conflict> {
    ConflictDetector::new(units).detect(selections)
}

pub fn conflict_dates(conflicts: &[Conflict]) -> BTreeSet<NaiveDate> {
    conflicts.iter().map(|c| c.date).collect()
}
