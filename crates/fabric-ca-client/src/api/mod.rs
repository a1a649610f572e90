//! API endpoint modules.

mod enroll;
mod info;

pub use enroll::EnrollmentApi;
pub use info::{CaInfo, InfoApi};
