use thiserror::Error;

/// Admin login failures. `Display` is the text shown on the login form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("Please enter both email and password.")]
    MissingInput,
    #[error("Invalid admin email or password.")]
    InvalidCredentials,
}

#[derive(Debug, Clone)]
pub struct AdminCredentials {
    email: String,
    password: String,
}

impl AdminCredentials {
    pub fn new(email: String, password: String) -> Self {
        Self { email, password }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn check(&self, email: &str, password: &str) -> Result<(), LoginError> {
        if email.is_empty() || password.is_empty() {
            return Err(LoginError::MissingInput);
        }
        if email != self.email || password != self.password {
            return Err(LoginError::InvalidCredentials);
        }
        Ok(())
    }
}
