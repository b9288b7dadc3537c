//! Service layer - user flows on top of the repository and collaborators.

mod authentication;
mod password;
mod password_reset;
mod registration;
mod user_service;

pub use authentication::AuthenticationService;
pub use password::PasswordEncryptor;
pub use password_reset::PasswordResetFlow;
pub use registration::{RegistrationOutcome, RegistrationSaga, SagaState};
pub use user_service::{UserManager, UserService};
