mod password;
mod token;
mod validate;

pub use password::PasswordHasher;
pub use token::{Claims, ClaimsUser, TokenSigner};
pub use validate::{is_valid_email, FieldError};
