use std::fmt;

use thiserror::Error;

use crate::models::TREATMENT_CATALOGUE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    FullName,
    City,
    Bio,
}

impl Field {
    pub fn prompt(&self) -> &'static str {
        match self {
            Field::FullName => "full name (e.g. Dr. John Smith).",
            Field::City => "city (e.g. London).",
            Field::Bio => "professional bio. Tell patients about your experience, specializations, and approach to dental care.",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Field::FullName => "full name",
            Field::City => "city",
            Field::Bio => "professional bio",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationDraft {
    pub full_name: String,
    pub city: String,
    pub bio: String,
    pub treatments: Vec<String>,
}

impl RegistrationDraft {
    pub fn next_missing_field(&self) -> Option<Field> {
        if self.full_name.trim().is_empty() {
            Some(Field::FullName)
        } else if self.city.trim().is_empty() {
            Some(Field::City)
        } else if self.bio.trim().is_empty() {
            Some(Field::Bio)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationState {
    Idle,
    Filling(RegistrationDraft),
    Submitted(RegistrationDraft),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationBlocked {
    #[error("registration form is not open")]
    NotFilling,
    #[error("missing {0}")]
    MissingField(Field),
    #[error("select at least one treatment")]
    NoTreatments,
}

#[derive(Debug)]
pub struct RegistrationFlow {
    state: RegistrationState,
}

impl RegistrationFlow {
    pub fn new() -> Self {
        RegistrationFlow { state: RegistrationState::Idle }
    }

    pub fn state(&self) -> &RegistrationState {
        &self.state
    }

    pub fn draft(&self) -> Option<&RegistrationDraft> {
        match &self.state {
            RegistrationState::Filling(draft) => Some(draft),
            _ => None,
        }
    }

    pub fn is_filling(&self) -> bool {
        matches!(self.state, RegistrationState::Filling(_))
    }

    /// Starts with an empty form. An already open form is kept.
    pub fn open(&mut self) {
        if let RegistrationState::Idle = self.state {
            self.state = RegistrationState::Filling(RegistrationDraft::default());
            debug!("Registration flow opened");
        }
    }

    /// Stores `text` into the first empty field and returns that field.
    pub fn fill_next(&mut self, text: &str) -> Option<Field> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let draft = match &mut self.state {
            RegistrationState::Filling(draft) => draft,
            _ => return None,
        };
        let field = draft.next_missing_field()?;
        match field {
            Field::FullName => draft.full_name = text.to_string(),
            Field::City => draft.city = text.to_string(),
            Field::Bio => draft.bio = text.to_string(),
        }
        Some(field)
    }

    /// Flips a catalogue treatment on or off. Unknown labels are ignored.
    pub fn toggle_treatment(&mut self, label: &str) -> bool {
        if !TREATMENT_CATALOGUE.contains(&label) {
            return false;
        }
        let draft = match &mut self.state {
            RegistrationState::Filling(draft) => draft,
            _ => return false,
        };
        if let Some(pos) = draft.treatments.iter().position(|t| t == label) {
            draft.treatments.remove(pos);
        } else {
            draft.treatments.push(label.to_string());
        }
        true
    }

    pub fn check(&self) -> Result<&RegistrationDraft, RegistrationBlocked> {
        let draft = self.draft().ok_or(RegistrationBlocked::NotFilling)?;
        if let Some(field) = draft.next_missing_field() {
            return Err(RegistrationBlocked::MissingField(field));
        }
        if draft.treatments.is_empty() {
            return Err(RegistrationBlocked::NoTreatments);
        }
        Ok(draft)
    }

    pub fn can_submit(&self) -> bool {
        self.check().is_ok()
    }

    /// Simulated submit: nothing is stored anywhere.
    pub fn submit(&mut self) -> Result<RegistrationDraft, RegistrationBlocked> {
        let draft = self.check()?.clone();
        info!(
            "Dentist registration submitted: {} ({}) offering {:?}",
            draft.full_name, draft.city, draft.treatments
        );
        self.state = RegistrationState::Submitted(draft.clone());
        Ok(draft)
    }

    pub fn reset_elapsed(&mut self) -> bool {
        match self.state {
            RegistrationState::Submitted(_) => {
                self.state = RegistrationState::Idle;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.state = RegistrationState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> RegistrationFlow {
        let mut flow = RegistrationFlow::new();
        flow.open();
        flow.fill_next("Dr. John Smith");
        flow.fill_next("Leeds");
        flow.fill_next("Ten years of family dentistry.");
        flow
    }

    #[test]
    fn fields_fill_in_order() {
        let mut flow = RegistrationFlow::new();
        assert_eq!(flow.fill_next("ignored"), None);

        flow.open();
        assert_eq!(flow.fill_next("   "), None);
        assert_eq!(flow.fill_next(" Dr. John Smith "), Some(Field::FullName));
        assert_eq!(flow.fill_next("Leeds"), Some(Field::City));
        assert_eq!(flow.fill_next("Bio"), Some(Field::Bio));
        assert_eq!(flow.fill_next("extra"), None);

        let draft = flow.draft().unwrap();
        assert_eq!(draft.full_name, "Dr. John Smith");
        assert_eq!(draft.city, "Leeds");
    }

    #[test]
    fn submit_blocked_without_treatments() {
        let mut flow = filled();
        assert_eq!(flow.submit(), Err(RegistrationBlocked::NoTreatments));
        assert!(flow.is_filling());
    }

    #[test]
    fn deselecting_only_treatment_blocks_again() {
        let mut flow = filled();
        assert!(flow.toggle_treatment("Braces"));
        assert!(flow.can_submit());
        assert!(flow.toggle_treatment("Braces"));
        assert!(!flow.can_submit());
        assert_eq!(flow.check().unwrap_err(), RegistrationBlocked::NoTreatments);
    }

    #[test]
    fn unknown_treatment_is_ignored() {
        let mut flow = filled();
        assert!(!flow.toggle_treatment("Hair Transplant"));
        assert!(flow.draft().unwrap().treatments.is_empty());
    }

    #[test]
    fn submit_blocked_on_missing_field() {
        let mut flow = RegistrationFlow::new();
        flow.open();
        flow.fill_next("Dr. John Smith");
        flow.toggle_treatment("Cleaning");
        assert_eq!(flow.submit(), Err(RegistrationBlocked::MissingField(Field::City)));
        assert_eq!(RegistrationBlocked::MissingField(Field::City).to_string(), "missing city");
        assert_eq!(RegistrationBlocked::MissingField(Field::FullName).to_string(), "missing full name");
    }

    #[test]
    fn submit_then_reset_returns_to_empty() {
        let mut flow = filled();
        flow.toggle_treatment("Implants");
        flow.toggle_treatment("Check-up");

        let submitted = flow.submit().unwrap();
        assert_eq!(submitted.treatments, vec!["Implants", "Check-up"]);
        assert!(matches!(flow.state(), RegistrationState::Submitted(_)));

        assert!(flow.reset_elapsed());
        assert_eq!(flow.state(), &RegistrationState::Idle);
        assert!(!flow.reset_elapsed());

        flow.open();
        assert_eq!(flow.draft(), Some(&RegistrationDraft::default()));
    }

    #[test]
    fn cancel_drops_the_draft() {
        let mut flow = filled();
        flow.cancel();
        assert_eq!(flow.state(), &RegistrationState::Idle);
    }
}
