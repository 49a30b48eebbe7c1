pub mod calendar;
pub mod conflict;
pub mod period_config;
pub mod public_api;
pub mod selection_store;
pub mod session;
pub mod submission;

pub use calendar::{map_block, PeriodRange};
pub use conflict::ConflictDetector;
pub use period_config::{available_periods_for, PendingBlock, PeriodConfigBuilder};
pub use public_api::{MacroPeriodGateway, PublicMacroPeriodApi};
pub use selection_store::SelectionStore;
pub use session::{ResponseController, SessionSnapshot};
pub use submission::SubmissionValidator;
