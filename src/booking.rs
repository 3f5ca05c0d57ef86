use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use rand::Rng;
use thiserror::Error;
use time::macros::{format_description, time};
use time::Time;

use crate::analytics::{AnalyticsEvent, EventLogger, APPOINTMENT_BOOKED};
use crate::models::{Directory, SessionIdentity};

pub const CLOSED_WEEKDAY: Weekday = Weekday::Sun;

// Morning shift, then afternoon shift.
pub const TIME_SLOTS: [Time; 13] = [
    time!(9:00),
    time!(9:30),
    time!(10:00),
    time!(10:30),
    time!(11:00),
    time!(11:30),
    time!(14:00),
    time!(14:30),
    time!(15:00),
    time!(15:30),
    time!(16:00),
    time!(16:30),
    time!(17:00),
];

const NAME_MISSING: &str = "name_missing";
const CITY_MISSING: &str = "city_missing";

pub fn is_date_disabled(date: NaiveDate, today: NaiveDate) -> bool {
    date < today || date.weekday() == CLOSED_WEEKDAY
}

pub fn format_slot(slot: Time) -> String {
    format!("{:02}:{:02}", slot.hour(), slot.minute())
}

/// Parses "HH:MM" and accepts it only if it is one of the bookable slots.
pub fn parse_slot(value: &str) -> Option<Time> {
    let format = format_description!("[hour]:[minute]");
    Time::parse(value, &format)
        .ok()
        .filter(|t| TIME_SLOTS.contains(t))
}

pub fn format_date_short(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

pub fn format_date_long(date: NaiveDate) -> String {
    date.format("%A, %-d %B %Y").to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingDraft {
    pub dentist_id: i32,
    pub date: Option<NaiveDate>,
    pub time: Option<Time>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    pub dentist_id: i32,
    pub dentist_name: String,
    pub date: NaiveDate,
    pub time: Time,
    pub correlation_id: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BookingState {
    Idle,
    AwaitingIdentity { dentist_id: i32 },
    Selecting(BookingDraft),
    Confirmed(Confirmation),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BookingBlocked {
    #[error("no booking is being edited")]
    NotSelecting,
    #[error("pick a date first")]
    MissingDate,
    #[error("pick a time first")]
    MissingTime,
    #[error("the practice does not take bookings on that day")]
    DisabledDate,
}

#[derive(Debug)]
pub struct BookingFlow {
    state: BookingState,
}

impl BookingFlow {
    pub fn new() -> Self {
        BookingFlow { state: BookingState::Idle }
    }

    pub fn state(&self) -> &BookingState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != BookingState::Idle
    }

    pub fn draft(&self) -> Option<&BookingDraft> {
        match &self.state {
            BookingState::Selecting(draft) => Some(draft),
            _ => None,
        }
    }

    /// Targets a dentist. Without an identity the flow waits for login first.
    /// Ignored while a confirmation is on screen.
    pub fn select_dentist(&mut self, dentist_id: i32, identity: Option<&SessionIdentity>, today: NaiveDate) {
        if let BookingState::Confirmed(_) = self.state {
            debug!("Ignoring dentist selection while confirmation is shown");
            return;
        }
        self.state = match identity {
            None => BookingState::AwaitingIdentity { dentist_id },
            Some(_) => BookingState::Selecting(fresh_draft(dentist_id, today)),
        };
        debug!("Booking flow -> {:?}", self.state);
    }

    /// Resumes a booking that was waiting for login. Returns false if nothing was waiting.
    pub fn identity_established(&mut self, identity: &SessionIdentity, today: NaiveDate) -> bool {
        match self.state {
            BookingState::AwaitingIdentity { dentist_id } => {
                debug!("{} logged in, resuming booking with dentist {}", identity.email, dentist_id);
                self.state = BookingState::Selecting(fresh_draft(dentist_id, today));
                true
            }
            _ => false,
        }
    }

    /// Returns false, leaving the draft untouched, for past or closed days.
    pub fn set_date(&mut self, date: NaiveDate, today: NaiveDate) -> bool {
        if is_date_disabled(date, today) {
            debug!("Rejected disabled date {}", date);
            return false;
        }
        match &mut self.state {
            BookingState::Selecting(draft) => {
                draft.date = Some(date);
                true
            }
            _ => false,
        }
    }

    pub fn clear_date(&mut self) {
        if let BookingState::Selecting(draft) = &mut self.state {
            draft.date = None;
        }
    }

    pub fn set_time(&mut self, slot: Time) -> bool {
        if !TIME_SLOTS.contains(&slot) {
            return false;
        }
        match &mut self.state {
            BookingState::Selecting(draft) => {
                draft.time = Some(slot);
                true
            }
            _ => false,
        }
    }

    pub fn check(&self, today: NaiveDate) -> Result<(NaiveDate, Time), BookingBlocked> {
        let draft = self.draft().ok_or(BookingBlocked::NotSelecting)?;
        let date = draft.date.ok_or(BookingBlocked::MissingDate)?;
        let time = draft.time.ok_or(BookingBlocked::MissingTime)?;
        if is_date_disabled(date, today) {
            return Err(BookingBlocked::DisabledDate);
        }
        Ok((date, time))
    }

    pub fn can_confirm(&self, today: NaiveDate) -> bool {
        self.check(today).is_ok()
    }

    /// Commits the draft and reports it to analytics exactly once.
    /// A blocked confirm leaves the flow in `Selecting`.
    pub fn confirm(
        &mut self,
        today: NaiveDate,
        directory: &Directory,
        events: &dyn EventLogger,
        identity: &SessionIdentity,
    ) -> Result<Confirmation, BookingBlocked> {
        let (date, time) = self.check(today)?;
        let dentist_id = match &self.state {
            BookingState::Selecting(draft) => draft.dentist_id,
            _ => return Err(BookingBlocked::NotSelecting),
        };

        let dentist = directory.find(dentist_id);
        let dentist_name = dentist
            .map(|d| d.name.clone())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| NAME_MISSING.to_string());
        let dentist_city = dentist
            .map(|d| d.city.clone())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| CITY_MISSING.to_string());

        let correlation_id = rand::thread_rng().gen_range(0..1000);
        let mut properties = BTreeMap::new();
        properties.insert("selected_date".to_string(), format_date_short(date));
        properties.insert("selected_time".to_string(), format_slot(time));
        properties.insert("dentist_name".to_string(), dentist_name.clone());
        properties.insert("dentist_city".to_string(), dentist_city);
        events.log_event(AnalyticsEvent {
            name: APPOINTMENT_BOOKED.to_string(),
            correlation_id,
            user_id: identity.email.clone(),
            properties,
        });

        let confirmation = Confirmation {
            dentist_id,
            dentist_name,
            date,
            time,
            correlation_id,
        };
        info!(
            "Booked {} with dentist {} on {} at {}",
            identity.email,
            dentist_id,
            date,
            format_slot(time)
        );
        self.state = BookingState::Confirmed(confirmation.clone());
        Ok(confirmation)
    }

    /// Called when the confirmation interval is over. No-op unless confirmed.
    pub fn reset_elapsed(&mut self) -> bool {
        match self.state {
            BookingState::Confirmed(_) => {
                self.state = BookingState::Idle;
                debug!("Booking flow reset after confirmation");
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        if self.is_open() {
            debug!("Booking flow cancelled from {:?}", self.state);
        }
        self.state = BookingState::Idle;
    }
}

fn fresh_draft(dentist_id: i32, today: NaiveDate) -> BookingDraft {
    BookingDraft {
        dentist_id,
        date: Some(today),
        time: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::testing::RecordingLogger;
    use crate::models::Role;

    // A Friday.
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn patient() -> SessionIdentity {
        SessionIdentity {
            email: "jane@example.com".to_string(),
            role: Role::Patient,
        }
    }

    fn selecting(dentist_id: i32) -> BookingFlow {
        let mut flow = BookingFlow::new();
        flow.select_dentist(dentist_id, Some(&patient()), today());
        flow
    }

    #[test]
    fn slots_cover_two_shifts() {
        assert_eq!(TIME_SLOTS.len(), 13);
        assert_eq!(format_slot(TIME_SLOTS[0]), "09:00");
        assert_eq!(format_slot(TIME_SLOTS[5]), "11:30");
        assert_eq!(format_slot(TIME_SLOTS[6]), "14:00");
        assert_eq!(format_slot(TIME_SLOTS[12]), "17:00");
        assert_eq!(parse_slot("14:30"), Some(time!(14:30)));
        assert_eq!(parse_slot("12:00"), None);
        assert_eq!(parse_slot("noon"), None);
    }

    #[test]
    fn disabled_dates() {
        let sunday = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let yesterday = today().pred_opt().unwrap();
        assert!(!is_date_disabled(today(), today()));
        assert!(is_date_disabled(yesterday, today()));
        assert!(is_date_disabled(sunday, today()));
        assert!(!is_date_disabled(sunday.succ_opt().unwrap(), today()));
    }

    #[test]
    fn selecting_without_identity_waits_for_login() {
        let mut flow = BookingFlow::new();
        flow.select_dentist(3, None, today());
        assert_eq!(flow.state(), &BookingState::AwaitingIdentity { dentist_id: 3 });

        assert!(flow.identity_established(&patient(), today()));
        assert_eq!(
            flow.state(),
            &BookingState::Selecting(BookingDraft {
                dentist_id: 3,
                date: Some(today()),
                time: None,
            })
        );
    }

    #[test]
    fn login_without_pending_booking_changes_nothing() {
        let mut flow = BookingFlow::new();
        assert!(!flow.identity_established(&patient(), today()));
        assert_eq!(flow.state(), &BookingState::Idle);
    }

    #[test]
    fn disabled_dates_are_ignored() {
        let mut flow = selecting(1);
        let sunday = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert!(!flow.set_date(sunday, today()));
        assert!(!flow.set_date(today().pred_opt().unwrap(), today()));
        assert_eq!(flow.draft().unwrap().date, Some(today()));

        let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert!(flow.set_date(monday, today()));
        assert_eq!(flow.draft().unwrap().date, Some(monday));
    }

    #[test]
    fn confirm_needs_date_and_time() {
        let directory = Directory::reference();
        let events = RecordingLogger::default();
        let mut flow = selecting(1);

        assert_eq!(flow.confirm(today(), &directory, &events, &patient()), Err(BookingBlocked::MissingTime));

        flow.set_time(time!(9:30));
        flow.clear_date();
        assert!(!flow.can_confirm(today()));
        assert_eq!(flow.confirm(today(), &directory, &events, &patient()), Err(BookingBlocked::MissingDate));
        assert!(matches!(flow.state(), BookingState::Selecting(_)));
        assert!(events.events().is_empty());
    }

    #[test]
    fn default_date_on_closed_day_blocks_confirm() {
        let directory = Directory::reference();
        let events = RecordingLogger::default();
        let sunday = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let mut flow = BookingFlow::new();
        flow.select_dentist(2, Some(&patient()), sunday);
        flow.set_time(time!(10:00));

        assert_eq!(flow.confirm(sunday, &directory, &events, &patient()), Err(BookingBlocked::DisabledDate));
        assert!(flow.set_date(sunday.succ_opt().unwrap(), sunday));
        assert!(flow.can_confirm(sunday));
    }

    #[test]
    fn confirm_logs_one_event_and_resets() {
        let directory = Directory::reference();
        let events = RecordingLogger::default();
        let mut flow = selecting(2);
        flow.set_time(time!(15:00));

        let confirmation = flow.confirm(today(), &directory, &events, &patient()).unwrap();
        assert_eq!(confirmation.dentist_name, "Dr. James Patel");
        assert!(confirmation.correlation_id < 1000);
        assert!(matches!(flow.state(), BookingState::Confirmed(_)));

        let logged = events.events();
        assert_eq!(logged.len(), 1);
        let event = &logged[0];
        assert_eq!(event.name, "appointment_booked");
        assert_eq!(event.correlation_id, confirmation.correlation_id);
        assert_eq!(event.user_id, "jane@example.com");
        assert_eq!(event.properties["selected_date"], "16/10/2026");
        assert_eq!(event.properties["selected_time"], "15:00");
        assert_eq!(event.properties["dentist_name"], "Dr. James Patel");
        assert_eq!(event.properties["dentist_city"], "Manchester");

        // A second confirm while the confirmation is on screen does nothing.
        assert_eq!(flow.confirm(today(), &directory, &events, &patient()), Err(BookingBlocked::NotSelecting));
        assert_eq!(events.events().len(), 1);

        assert!(flow.reset_elapsed());
        assert_eq!(flow.state(), &BookingState::Idle);
        assert!(flow.draft().is_none());
        assert!(!flow.reset_elapsed());
        assert_eq!(flow.state(), &BookingState::Idle);
    }

    #[test]
    fn unknown_dentist_uses_placeholders() {
        let directory = Directory::reference();
        let events = RecordingLogger::default();
        let mut flow = selecting(42);
        flow.set_time(time!(9:00));
        let confirmation = flow.confirm(today(), &directory, &events, &patient()).unwrap();

        assert_eq!(confirmation.dentist_name, "name_missing");
        let event = &events.events()[0];
        assert_eq!(event.properties["dentist_name"], "name_missing");
        assert_eq!(event.properties["dentist_city"], "city_missing");
    }

    #[test]
    fn cancel_discards_draft_from_any_state() {
        let mut flow = selecting(1);
        flow.set_time(time!(11:00));
        flow.cancel();
        assert_eq!(flow.state(), &BookingState::Idle);

        flow.select_dentist(4, None, today());
        flow.cancel();
        assert_eq!(flow.state(), &BookingState::Idle);
        assert!(!flow.reset_elapsed());
    }

    #[test]
    fn closed_flow_has_no_draft_to_date() {
        let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let mut flow = BookingFlow::new();
        assert!(flow.draft().is_none());
        assert!(!flow.set_date(monday, today()));

        let mut flow = selecting(1);
        flow.cancel();
        assert!(flow.draft().is_none());
        assert!(!flow.set_date(monday, today()));
        assert_eq!(flow.state(), &BookingState::Idle);
    }

    #[test]
    fn long_date_format() {
        assert_eq!(format_date_long(today()), "Friday, 16 October 2026");
    }
}
