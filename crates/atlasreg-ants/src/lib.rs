pub mod backend;
pub mod session;

pub use backend::{RegisterRequest, RegistrationBackend, ResampleRequest};
pub use session::{RegistrationSession, REGISTRATION_SUBDIR};
