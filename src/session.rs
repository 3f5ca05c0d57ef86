use chrono::NaiveDate;

use crate::auth::{AuthIntent, Authenticator};
use crate::booking::BookingFlow;
use crate::models::SessionIdentity;
use crate::registration::RegistrationFlow;
use crate::search::SearchState;
use crate::timer::TimerHandle;

// What free text typed into the chat means right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStep {
    MainMenu,
    EnteringEmail(AuthIntent),
}

#[derive(Debug, PartialEq, Eq)]
pub enum AuthOutcome {
    Rejected,
    LoggedIn,
    BookingResumed,
    RegistrationOpened,
}

#[derive(Debug, PartialEq, Eq)]
pub enum RegistrationGate {
    Opened,
    NeedsLogin,
}

/// State owned by one chat: identity, the two flows and the search panel.
pub struct UserSession {
    pub step: UserStep,
    pub identity: Option<SessionIdentity>,
    pub search: SearchState,
    pub booking: BookingFlow,
    pub registration: RegistrationFlow,
    booking_reset: Option<TimerHandle>,
    registration_reset: Option<TimerHandle>,
}

impl UserSession {
    pub fn new() -> Self {
        UserSession {
            step: UserStep::MainMenu,
            identity: None,
            search: SearchState::new(),
            booking: BookingFlow::new(),
            registration: RegistrationFlow::new(),
            booking_reset: None,
            registration_reset: None,
        }
    }

    pub fn request_login(&mut self) {
        self.step = UserStep::EnteringEmail(AuthIntent::Booking);
    }

    pub fn request_booking(&mut self, dentist_id: i32, today: NaiveDate) {
        self.booking.select_dentist(dentist_id, self.identity.as_ref(), today);
        if self.identity.is_none() {
            self.step = UserStep::EnteringEmail(AuthIntent::Booking);
        }
    }

    pub fn request_registration(&mut self) -> RegistrationGate {
        if self.identity.is_some() {
            self.registration.open();
            RegistrationGate::Opened
        } else {
            self.step = UserStep::EnteringEmail(AuthIntent::ProviderRegistration);
            RegistrationGate::NeedsLogin
        }
    }

    /// Runs the auth stub with the pending intent and hands over to whichever
    /// flow was waiting for it.
    pub fn submit_email(&mut self, auth: &dyn Authenticator, email: &str, today: NaiveDate) -> AuthOutcome {
        let intent = match self.step {
            UserStep::EnteringEmail(intent) => intent,
            UserStep::MainMenu => return AuthOutcome::Rejected,
        };
        let identity = match auth.authenticate(email, intent) {
            Some(identity) => identity,
            None => return AuthOutcome::Rejected,
        };
        info!("Session identity {} ({})", identity.email, identity.role.label());
        self.step = UserStep::MainMenu;

        let outcome = match intent {
            AuthIntent::ProviderRegistration => {
                self.registration.open();
                AuthOutcome::RegistrationOpened
            }
            AuthIntent::Booking => {
                if self.booking.identity_established(&identity, today) {
                    AuthOutcome::BookingResumed
                } else {
                    AuthOutcome::LoggedIn
                }
            }
        };
        self.identity = Some(identity);
        outcome
    }

    /// Remembers the timer that will close the booking confirmation,
    /// cancelling an older booking timer.
    pub fn track_booking_reset(&mut self, handle: TimerHandle) {
        replace_timer(&mut self.booking_reset, Some(handle));
    }

    pub fn track_registration_reset(&mut self, handle: TimerHandle) {
        replace_timer(&mut self.registration_reset, Some(handle));
    }

    pub fn cancel_booking(&mut self) {
        replace_timer(&mut self.booking_reset, None);
        self.booking.cancel();
    }

    pub fn cancel_registration(&mut self) {
        replace_timer(&mut self.registration_reset, None);
        self.registration.cancel();
    }

    pub fn cancel(&mut self) {
        self.cancel_booking();
        self.cancel_registration();
        self.step = UserStep::MainMenu;
    }

    pub fn logout(&mut self) {
        if let Some(identity) = self.identity.take() {
            info!("{} logged out", identity.email);
        }
        self.cancel();
    }
}

fn replace_timer(slot: &mut Option<TimerHandle>, handle: Option<TimerHandle>) {
    if let Some(old) = std::mem::replace(slot, handle) {
        old.cancel();
    }
}
