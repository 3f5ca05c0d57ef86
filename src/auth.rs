use crate::models::{Role, SessionIdentity};

// Why the user is being asked to log in; decides the role they get.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthIntent {
    Booking,
    ProviderRegistration,
}

impl AuthIntent {
    pub fn role(&self) -> Role {
        match self {
            AuthIntent::Booking => Role::Patient,
            AuthIntent::ProviderRegistration => Role::Provider,
        }
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            AuthIntent::Booking => "Login to Book Appointment\nEnter your email to continue with booking:",
            AuthIntent::ProviderRegistration => "Login to Register as Dentist\nEnter your email to register as a dentist:",
        }
    }
}

/// Identity boundary. Swapping in a real identity provider means a new impl.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, email: &str, intent: AuthIntent) -> Option<SessionIdentity>;
}

/// Accepts any non-blank email. No verification happens.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmailStub;

impl Authenticator for EmailStub {
    fn authenticate(&self, email: &str, intent: AuthIntent) -> Option<SessionIdentity> {
        let email = email.trim();
        if email.is_empty() {
            return None;
        }
        Some(SessionIdentity {
            email: email.to_string(),
            role: intent.role(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_email_is_rejected() {
        assert_eq!(EmailStub.authenticate("", AuthIntent::Booking), None);
        assert_eq!(EmailStub.authenticate("   \t", AuthIntent::Booking), None);
    }

    #[test]
    fn email_is_trimmed_and_not_validated() {
        let identity = EmailStub.authenticate("  not-an-email ", AuthIntent::Booking).unwrap();
        assert_eq!(identity.email, "not-an-email");
        assert_eq!(identity.role, Role::Patient);
    }

    #[test]
    fn role_follows_intent() {
        let identity = EmailStub
            .authenticate("patient@example.com", AuthIntent::ProviderRegistration)
            .unwrap();
        assert_eq!(identity.role, Role::Provider);
    }
}
