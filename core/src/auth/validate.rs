use serde::Serialize;

/// One failed field check, reported back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub msg: &'static str,
}

impl FieldError {
    pub fn new(field: &'static str, msg: &'static str) -> Self {
        Self { field, msg }
    }
}

/// `local@domain.tld`, no whitespace, exactly one `@`.
pub fn is_valid_email(email: &str) -> bool {
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && tld.len() >= 2 && !domain.starts_with('.') && !domain.contains("..")
}
