use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, warn};

use crate::error::AvailabilityError;
use crate::models::{AvailabilityByDate, Conflict, DayConfig, MacroPeriodUnit, PartOfDay, Selection};
use crate::services::conflict::ConflictDetector;

/// Block id given to simulated selections while checking pending conflicts.
pub const PENDING_BLOCK_ID: &str = "pending";

/// Consecutive dates picked for one unit, not yet committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingBlock {
    pub unit_id: i64,
    pub dates: Vec<NaiveDate>,
}

/// Per-day configuration of a pending block.
#[derive(Debug, Clone)]
pub struct PeriodConfigBuilder {
    block: PendingBlock,
    configs: BTreeMap<NaiveDate, DayConfig>,
    mark_all_full_day: bool,
}

impl PeriodConfigBuilder {
    /// Opens a builder with every date seeded as FULL_DAY.
    pub fn new(unit_id: i64, dates: Vec<NaiveDate>) -> Self {
        let configs = dates.iter().map(|d| (*d, DayConfig::full_day())).collect();
        Self {
            block: PendingBlock { unit_id, dates },
            configs,
            mark_all_full_day: true,
        }
    }

    pub fn block(&self) -> &PendingBlock {
        &self.block
    }

    pub fn unit_id(&self) -> i64 {
        self.block.unit_id
    }

    pub fn configs(&self) -> &BTreeMap<NaiveDate, DayConfig> {
        &self.configs
    }

    pub fn config_for(&self, date: NaiveDate) -> Option<&DayConfig> {
        self.configs.get(&date)
    }

    pub fn mark_all_full_day(&self) -> bool {
        self.mark_all_full_day
    }

    /// Enabling forces every date to FULL_DAY and locks per-date edits.
    /// Disabling only unlocks; existing per-date choices stay.
    pub fn set_mark_all_full_day(&mut self, enabled: bool) {
        self.mark_all_full_day = enabled;
        if enabled {
            for config in self.configs.values_mut() {
                *config = DayConfig::full_day();
            }
        }
    }

    pub fn set_part_of_day(&mut self, date: NaiveDate, part_of_day: PartOfDay) -> Result<(), AvailabilityError> {
        let locked = self.mark_all_full_day;
        let config = self.editable_config(date, locked)?;

        // Custom times survive only while the day stays CUSTOM.
        let (custom_start, custom_end) = if part_of_day == PartOfDay::Custom {
            (config.custom_start, config.custom_end)
        } else {
            (None, None)
        };

        *config = DayConfig {
            part_of_day,
            custom_start,
            custom_end,
        };
        debug!("Pending {} set to {:?}", date, part_of_day);
        Ok(())
    }

    pub fn set_custom_time(
        &mut self,
        date: NaiveDate,
        custom_start: Option<NaiveTime>,
        custom_end: Option<NaiveTime>,
    ) -> Result<(), AvailabilityError> {
        let locked = self.mark_all_full_day;
        let config = self.editable_config(date, locked)?;

        if config.part_of_day != PartOfDay::Custom {
            return Err(AvailabilityError::InvalidCustomRange {
                date,
                reason: "custom times only apply to CUSTOM".to_string(),
            });
        }

        config.custom_start = custom_start;
        config.custom_end = custom_end;
        Ok(())
    }

    /// Applies a whole day configuration in one step. On a CUSTOM day each
    /// time left out keeps the value already entered for it.
    pub fn set_day(&mut self, date: NaiveDate, day: DayConfig) -> Result<(), AvailabilityError> {
        self.set_part_of_day(date, day.part_of_day)?;
        if day.part_of_day == PartOfDay::Custom && (day.custom_start.is_some() || day.custom_end.is_some()) {
            let current = self.configs.get(&date).copied().unwrap_or_default();
            self.set_custom_time(
                date,
                day.custom_start.or(current.custom_start),
                day.custom_end.or(current.custom_end),
            )?;
        }
        Ok(())
    }

    fn editable_config(&mut self, date: NaiveDate, locked: bool) -> Result<&mut DayConfig, AvailabilityError> {
        let config = self
            .configs
            .get_mut(&date)
            .ok_or(AvailabilityError::DateNotInBlock(date))?;
        if locked {
            return Err(AvailabilityError::AllFullDayLocked);
        }
        Ok(config)
    }

    /// The pending block expressed as selections sharing `block_id`.
    pub fn to_selections(&self, block_id: &str) -> Vec<Selection> {
        self.block
            .dates
            .iter()
            .map(|date| {
                let config = self.configs.get(date).copied().unwrap_or_default();
                Selection::new(self.block.unit_id, *date, config.normalized(), Some(block_id.to_string()))
            })
            .collect()
    }

    /// Conflicts that committing this block would introduce, computed against
    /// `committed` plus the simulated block.
    pub fn pending_conflicts(&self, committed: &[Selection], units: &[MacroPeriodUnit]) -> Vec<Conflict> {
        let mut simulated = committed.to_vec();
        simulated.extend(self.to_selections(PENDING_BLOCK_ID));
        ConflictDetector::new(units).detect(&simulated)
    }

    /// Advisory availability for every date of the block.
    pub fn availability(&self, committed: &[Selection]) -> AvailabilityByDate {
        self.block
            .dates
            .iter()
            .map(|date| (*date, available_periods_for(*date, self.block.unit_id, committed)))
            .collect()
    }

    /// Validates the block and turns it into selections tagged with `block_id`.
    /// Refused while any pending conflict exists.
    pub fn finalize(
        &self,
        committed: &[Selection],
        units: &[MacroPeriodUnit],
        block_id: &str,
    ) -> Result<Vec<Selection>, AvailabilityError> {
        for (date, config) in &self.configs {
            config.validate().map_err(|reason| AvailabilityError::InvalidCustomRange { date: *date, reason })?;
        }

        let conflicts = self.pending_conflicts(committed, units);
        if !conflicts.is_empty() {
            warn!("Block for unit {} refused: {} pending conflict(s)", self.block.unit_id, conflicts.len());
            return Err(AvailabilityError::PendingConflicts(conflicts));
        }

        Ok(self.to_selections(block_id))
    }
}

/// Parts of day still offered for `unit_id` on `date`, given what other units
/// already hold on that date. Advisory only.
pub fn available_periods_for(date: NaiveDate, unit_id: i64, selections: &[Selection]) -> Vec<PartOfDay> {
    let taken: Vec<PartOfDay> = selections
        .iter()
        .filter(|s| s.date == date && s.macro_period_unit_id != unit_id)
        .map(|s| s.part_of_day)
        .collect();

    if taken.contains(&PartOfDay::FullDay) {
        return Vec::new();
    }

    let morning_free = !taken.contains(&PartOfDay::Morning);
    let afternoon_free = !taken.contains(&PartOfDay::Afternoon);

    PartOfDay::ALL
        .into_iter()
        .filter(|period| match period {
            PartOfDay::FullDay => morning_free && afternoon_free,
            PartOfDay::Morning => morning_free,
            PartOfDay::Afternoon => afternoon_free,
            PartOfDay::Custom => morning_free || afternoon_free,
        })
        .collect()
}
