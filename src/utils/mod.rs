pub mod compensation;
pub mod parameter_error_handler;
pub mod random;
pub mod single_flight;
pub mod validate;

pub use compensation::Compensator;
pub use parameter_error_handler::{json_error_handler, query_error_handler};
pub use random::random_token;
pub use single_flight::SingleFlight;
pub use validate::{parse_uuid, validate_email};
