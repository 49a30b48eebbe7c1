pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod state;

pub use error::AvailabilityError;
pub use models::*;
pub use router::public_response_routes;
pub use services::*;
pub use state::AvailabilityState;
