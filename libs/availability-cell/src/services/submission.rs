use tracing::{debug, warn};

use crate::error::AvailabilityError;
use crate::models::{
    MacroPeriodUnit, ReviewLine, SelectionPayload, SubmissionKind, SubmitResponseRequest,
};
use crate::services::conflict::ConflictDetector;
use crate::services::selection_store::SelectionStore;

/// Gates draft-save and confirm-submit before any network call.
pub struct SubmissionValidator<'a> {
    units: &'a [MacroPeriodUnit],
}

impl<'a> SubmissionValidator<'a> {
    pub fn new(units: &'a [MacroPeriodUnit]) -> Self {
        Self { units }
    }

    pub fn validate(&self, store: &SelectionStore, kind: SubmissionKind) -> Result<(), AvailabilityError> {
        debug!("Validating {:?} submission of {} selection(s)", kind, store.len());

        if store.is_empty() {
            return Err(AvailabilityError::EmptySelection);
        }

        for unit in self.units {
            let actual = store.unique_day_count(unit.id);
            if actual != unit.total_days as usize {
                warn!("{} has {} of {} day(s)", unit.unit_name, actual, unit.total_days);
                return Err(AvailabilityError::IncompleteUnit {
                    unit_name: unit.unit_name.clone(),
                    required: unit.total_days,
                    actual,
                });
            }
        }

        if kind.is_confirm() {
            let conflicts = ConflictDetector::new(self.units).detect(store.as_slice());
            if !conflicts.is_empty() {
                return Err(AvailabilityError::Conflicts(conflicts));
            }
        }

        Ok(())
    }

    /// Every selection as the doctor should see it before confirming,
    /// ordered by date and then by unit position.
    pub fn review(&self, store: &SelectionStore) -> Vec<ReviewLine> {
        let detector = ConflictDetector::new(self.units);
        let mut ordered: Vec<_> = store.as_slice().iter().collect();
        ordered.sort_by_key(|s| {
            let position = self
                .units
                .iter()
                .position(|u| u.id == s.macro_period_unit_id)
                .unwrap_or(usize::MAX);
            (s.date, position, s.part_of_day)
        });

        ordered
            .into_iter()
            .map(|selection| {
                let unit = self.units.iter().find(|u| u.id == selection.macro_period_unit_id);
                let shifts = unit.map(|u| u.config_turnos).unwrap_or_default();
                ReviewLine {
                    date: selection.date,
                    unit_name: detector.unit_name(selection.macro_period_unit_id),
                    period_label: selection.period_label(),
                    time_range: selection.resolved_range(&shifts).map(|w| w.to_string()),
                }
            })
            .collect()
    }

    /// The full selection set plus the confirm flag; never a diff.
    pub fn build_request(store: &SelectionStore, kind: SubmissionKind) -> SubmitResponseRequest {
        SubmitResponseRequest {
            selections: store.as_slice().iter().map(SelectionPayload::from).collect(),
            confirm: kind.is_confirm(),
        }
    }
}
