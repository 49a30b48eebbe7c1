use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use shared_utils::time_format;

// ==============================================================================
// MACRO PERIOD
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MacroPeriodStatus {
    Aguardando,
    Respondido,
    EdicaoLiberada,
    Confirmado,
    Cancelado,
    Expirado,
}

impl MacroPeriodStatus {
    /// Statuses in which the doctor may still change the response.
    pub fn allows_doctor_edit(&self) -> bool {
        matches!(self, MacroPeriodStatus::Aguardando | MacroPeriodStatus::EdicaoLiberada)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MacroPeriodStatus::Confirmado | MacroPeriodStatus::Cancelado | MacroPeriodStatus::Expirado
        )
    }
}

impl fmt::Display for MacroPeriodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MacroPeriodStatus::Aguardando => "AGUARDANDO",
            MacroPeriodStatus::Respondido => "RESPONDIDO",
            MacroPeriodStatus::EdicaoLiberada => "EDICAO_LIBERADA",
            MacroPeriodStatus::Confirmado => "CONFIRMADO",
            MacroPeriodStatus::Cancelado => "CANCELADO",
            MacroPeriodStatus::Expirado => "EXPIRADO",
        };
        f.write_str(label)
    }
}

/// The view returned by `GET /public/macro-period/{token}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacroPeriodPublicView {
    pub id: i64,
    pub doctor_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: MacroPeriodStatus,
    pub can_edit: bool,
    #[serde(default)]
    pub units: Vec<MacroPeriodUnit>,
    #[serde(default)]
    pub selections: Vec<Selection>,
}

impl MacroPeriodPublicView {
    pub fn unit(&self, unit_id: i64) -> Option<&MacroPeriodUnit> {
        self.units.iter().find(|u| u.id == unit_id)
    }
}

// ==============================================================================
// UNITS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftWindow {
    #[serde(with = "time_format")]
    pub start: NaiveTime,
    #[serde(with = "time_format")]
    pub end: NaiveTime,
}

impl ShiftWindow {
    fn hm(start: (u32, u32), end: (u32, u32)) -> Self {
        Self {
            start: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl fmt::Display for ShiftWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", time_format::format(&self.start), time_format::format(&self.end))
    }
}

/// Morning/afternoon reference windows of a unit. Display guidance only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftConfig {
    pub morning: ShiftWindow,
    pub afternoon: ShiftWindow,
}

impl Default for ShiftConfig {
    fn default() -> Self {
        Self {
            morning: ShiftWindow::hm((8, 0), (12, 0)),
            afternoon: ShiftWindow::hm((13, 0), (17, 0)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacroPeriodUnit {
    pub id: i64,
    #[serde(default)]
    pub macro_period_id: Option<i64>,
    pub unit_id: i64,
    pub unit_name: String,
    #[serde(default)]
    pub unit_city: String,
    pub total_days: u32,
    #[serde(default)]
    pub order_position: Option<i32>,
    #[serde(default)]
    pub config_turnos: ShiftConfig,
}

// ==============================================================================
// SELECTIONS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartOfDay {
    Morning,
    Afternoon,
    FullDay,
    Custom,
}

impl PartOfDay {
    pub const ALL: [PartOfDay; 4] = [
        PartOfDay::FullDay,
        PartOfDay::Morning,
        PartOfDay::Afternoon,
        PartOfDay::Custom,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PartOfDay::Morning => "Morning",
            PartOfDay::Afternoon => "Afternoon",
            PartOfDay::FullDay => "FULL_DAY",
            PartOfDay::Custom => "Custom",
        }
    }
}

/// Per-day settings: part of day plus the custom range when it applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayConfig {
    pub part_of_day: PartOfDay,
    #[serde(default, with = "time_format::option")]
    pub custom_start: Option<NaiveTime>,
    #[serde(default, with = "time_format::option")]
    pub custom_end: Option<NaiveTime>,
}

impl DayConfig {
    pub fn full_day() -> Self {
        Self::of(PartOfDay::FullDay)
    }

    pub fn of(part_of_day: PartOfDay) -> Self {
        Self {
            part_of_day,
            custom_start: None,
            custom_end: None,
        }
    }

    pub fn custom(start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            part_of_day: PartOfDay::Custom,
            custom_start: Some(start),
            custom_end: Some(end),
        }
    }

    /// Checks the custom range rule: required iff CUSTOM, start before end.
    pub fn validate(&self) -> Result<(), String> {
        match (self.part_of_day, self.custom_start, self.custom_end) {
            (PartOfDay::Custom, Some(start), Some(end)) if start < end => Ok(()),
            (PartOfDay::Custom, Some(_), Some(_)) => Err("custom start must be before custom end".to_string()),
            (PartOfDay::Custom, _, _) => Err("custom start and end are required".to_string()),
            (_, None, None) => Ok(()),
            _ => Err("custom times only apply to CUSTOM".to_string()),
        }
    }

    /// Drops custom times unless the part of day is CUSTOM.
    pub fn normalized(self) -> Self {
        if self.part_of_day == PartOfDay::Custom {
            self
        } else {
            Self::of(self.part_of_day)
        }
    }
}

impl Default for DayConfig {
    fn default() -> Self {
        Self::full_day()
    }
}

/// One calendar date allocated to one unit for part of that day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub macro_period_unit_id: i64,
    pub date: NaiveDate,
    pub part_of_day: PartOfDay,
    #[serde(default, with = "time_format::option")]
    pub custom_start: Option<NaiveTime>,
    #[serde(default, with = "time_format::option")]
    pub custom_end: Option<NaiveTime>,
    #[serde(default)]
    pub block_id: Option<String>,
}

impl Selection {
    pub fn new(unit_id: i64, date: NaiveDate, config: DayConfig, block_id: Option<String>) -> Self {
        Self {
            id: None,
            macro_period_unit_id: unit_id,
            date,
            part_of_day: config.part_of_day,
            custom_start: config.custom_start,
            custom_end: config.custom_end,
            block_id,
        }
    }

    pub fn apply(&mut self, config: DayConfig) {
        let config = config.normalized();
        self.part_of_day = config.part_of_day;
        self.custom_start = config.custom_start;
        self.custom_end = config.custom_end;
    }

    /// Human label used in conflict messages and review lines.
    pub fn period_label(&self) -> String {
        match self.part_of_day {
            PartOfDay::Custom => format!(
                "{} - {}",
                self.custom_start.as_ref().map(time_format::format).unwrap_or_default(),
                self.custom_end.as_ref().map(time_format::format).unwrap_or_default(),
            ),
            other => other.label().to_string(),
        }
    }

    /// Concrete time range of this selection given the unit's shift windows.
    pub fn resolved_range(&self, shifts: &ShiftConfig) -> Option<ShiftWindow> {
        match self.part_of_day {
            PartOfDay::Morning => Some(shifts.morning),
            PartOfDay::Afternoon => Some(shifts.afternoon),
            PartOfDay::FullDay => Some(ShiftWindow {
                start: shifts.morning.start,
                end: shifts.afternoon.end,
            }),
            PartOfDay::Custom => match (self.custom_start, self.custom_end) {
                (Some(start), Some(end)) => Some(ShiftWindow { start, end }),
                _ => None,
            },
        }
    }

    pub fn key(&self) -> SelectionKey {
        SelectionKey {
            id: self.id,
            macro_period_unit_id: self.macro_period_unit_id,
            date: self.date,
            block_id: self.block_id.clone(),
        }
    }
}

/// Identifies a selection by server id, or by (date, unit, block id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionKey {
    #[serde(default)]
    pub id: Option<i64>,
    pub macro_period_unit_id: i64,
    pub date: NaiveDate,
    #[serde(default)]
    pub block_id: Option<String>,
}

impl SelectionKey {
    pub fn matches(&self, selection: &Selection) -> bool {
        let same_id = matches!((self.id, selection.id), (Some(a), Some(b)) if a == b);
        let same_slot = selection.date == self.date
            && selection.macro_period_unit_id == self.macro_period_unit_id
            && selection.block_id == self.block_id;
        same_id || same_slot
    }
}

// ==============================================================================
// DERIVED VALUES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Conflict {
    pub date: NaiveDate,
    pub message: String,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.date, self.message)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectionBlock {
    pub block_id: String,
    pub selections: Vec<Selection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnitSelections {
    pub unit_id: i64,
    pub blocks: Vec<SelectionBlock>,
    pub standalone: Vec<Selection>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitProgress {
    pub unit_id: i64,
    pub unit_name: String,
    pub selected_days: usize,
    pub total_days: u32,
    pub is_complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewLine {
    pub date: NaiveDate,
    pub unit_name: String,
    pub period_label: String,
    pub time_range: Option<String>,
}

// ==============================================================================
// SUBMISSION
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    Draft,
    Confirm,
}

impl SubmissionKind {
    pub fn from_confirm(confirm: bool) -> Self {
        if confirm {
            SubmissionKind::Confirm
        } else {
            SubmissionKind::Draft
        }
    }

    pub fn is_confirm(&self) -> bool {
        matches!(self, SubmissionKind::Confirm)
    }
}

/// Wire shape of one selection in `POST /public/macro-period/{token}/response`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPayload {
    pub macro_period_unit_id: i64,
    pub date: NaiveDate,
    pub part_of_day: PartOfDay,
    #[serde(default, with = "time_format::option")]
    pub custom_start: Option<NaiveTime>,
    #[serde(default, with = "time_format::option")]
    pub custom_end: Option<NaiveTime>,
    #[serde(default)]
    pub block_id: Option<String>,
}

impl From<&Selection> for SelectionPayload {
    fn from(selection: &Selection) -> Self {
        Self {
            macro_period_unit_id: selection.macro_period_unit_id,
            date: selection.date,
            part_of_day: selection.part_of_day,
            custom_start: selection.custom_start,
            custom_end: selection.custom_end,
            block_id: selection.block_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponseRequest {
    pub selections: Vec<SelectionPayload>,
    pub confirm: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<MacroPeriodStatus>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Confirm-submit needs the doctor to acknowledge these lines first.
    ReviewRequired { review: Vec<ReviewLine> },
    Submitted { kind: SubmissionKind, receipt: SubmissionReceipt },
}

#[derive(Debug, Clone)]
pub struct CalendarFeed {
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Per-date advisory availability, keyed by date.
pub type AvailabilityByDate = BTreeMap<NaiveDate, Vec<PartOfDay>>;
