use chrono::{Datelike, NaiveDate};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};

use crate::booking::{format_date_long, format_slot, is_date_disabled, BookingDraft, Confirmation, TIME_SLOTS};
use crate::models::{DentistProfile, Directory, OFFICE_HOURS, TREATMENT_CATALOGUE};
use crate::registration::RegistrationDraft;
use crate::search::{Filter, Listing, SearchState, ALL_CITIES, ALL_TREATMENTS};

pub const FIND_DENTIST: &str = "Find a dentist";
pub const LOGIN: &str = "Login";
pub const REGISTER_PATIENT: &str = "Register as patient";
pub const REGISTER_DENTIST: &str = "Register as a dentist";
pub const LOGOUT: &str = "Logout";

fn ignore(text: impl Into<String>) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, "ignore")
}

pub fn main_menu(logged_in: bool) -> KeyboardMarkup {
    let buttons: Vec<Vec<KeyboardButton>> = if logged_in {
        vec![
            vec![KeyboardButton::new(FIND_DENTIST)],
            vec![KeyboardButton::new(REGISTER_DENTIST)],
            vec![KeyboardButton::new(LOGOUT)],
        ]
    } else {
        vec![
            vec![KeyboardButton::new(FIND_DENTIST)],
            vec![KeyboardButton::new(LOGIN), KeyboardButton::new(REGISTER_PATIENT)],
            vec![KeyboardButton::new(REGISTER_DENTIST)],
        ]
    };
    KeyboardMarkup::new(buttons).resize_keyboard()
}

fn mark(selected: bool, label: &str) -> String {
    if selected {
        format!("✓ {}", label)
    } else {
        label.to_string()
    }
}

pub fn search_panel(directory: &Directory, search: &SearchState) -> InlineKeyboardMarkup {
    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = Vec::new();

    keyboard.push(vec![ignore("📍 City")]);
    let mut cities = vec![InlineKeyboardButton::callback(
        mark(search.city == Filter::All, ALL_CITIES),
        "filter:city:all",
    )];
    for (i, city) in directory.cities().iter().enumerate() {
        let selected = search.city == Filter::Only(city.clone());
        cities.push(InlineKeyboardButton::callback(mark(selected, city), format!("filter:city:{}", i)));
    }
    for row in cities.chunks(3) {
        keyboard.push(row.to_vec());
    }

    keyboard.push(vec![ignore("🦷 Treatment")]);
    let mut treatments = vec![InlineKeyboardButton::callback(
        mark(search.treatment == Filter::All, ALL_TREATMENTS),
        "filter:treatment:all",
    )];
    for (i, treatment) in directory.treatments().iter().enumerate() {
        let selected = search.treatment == Filter::Only(treatment.clone());
        treatments.push(InlineKeyboardButton::callback(
            mark(selected, treatment),
            format!("filter:treatment:{}", i),
        ));
    }
    for row in treatments.chunks(2) {
        keyboard.push(row.to_vec());
    }

    keyboard.push(vec![InlineKeyboardButton::callback("🔍 Search dentists", "search")]);
    InlineKeyboardMarkup::new(keyboard)
}

pub fn search_panel_text(search: &SearchState) -> String {
    format!(
        "Search for Dentists\nFind dentists by location and treatment type.\n\nCity: {}\nTreatment: {}",
        search.city.label(ALL_CITIES),
        search.treatment.label(ALL_TREATMENTS)
    )
}

fn treatment_badges(dentist: &DentistProfile) -> String {
    let mut badges: Vec<String> = dentist.treatments.iter().take(2).cloned().collect();
    if dentist.treatments.len() > 2 {
        badges.push(format!("+{} more", dentist.treatments.len() - 2));
    }
    badges.join(" · ")
}

pub fn listing_text(listing: &Listing) -> String {
    let dentists = match listing {
        Listing::NoMatches => return "No dentists found matching your criteria.".to_string(),
        Listing::Unfiltered(all) => all,
        Listing::Matches(found) => found,
    };
    let mut text = String::from("Find Your Perfect Dentist\n");
    for d in dentists {
        text.push_str(&format!(
            "\n👤 {}\n📍 {}\n{}\n{}\n",
            d.name,
            d.city,
            d.headline,
            treatment_badges(d)
        ));
    }
    text
}

pub fn listing_markup(listing: &Listing) -> InlineKeyboardMarkup {
    let dentists = match listing {
        Listing::NoMatches => {
            return InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
                "Clear filters",
                "clear_filters",
            )]])
        }
        Listing::Unfiltered(all) => all,
        Listing::Matches(found) => found,
    };
    let keyboard: Vec<Vec<InlineKeyboardButton>> = dentists
        .iter()
        .map(|d| {
            vec![
                InlineKeyboardButton::callback(format!("ℹ️ {}", d.name), format!("profile:{}", d.id)),
                InlineKeyboardButton::callback("📅 Book", format!("book:{}", d.id)),
            ]
        })
        .collect();
    InlineKeyboardMarkup::new(keyboard)
}

pub fn profile_text(dentist: &DentistProfile) -> String {
    let mut message = format!(
        "*{}*\n📍 {}\n\n*About*\n{}\n\n*Treatments Offered*\n{}\n",
        dentist.name,
        dentist.city,
        dentist.bio,
        dentist.treatments.join(", ")
    );
    if let Some(years) = dentist.experience_years {
        message.push_str(&format!("\n*Experience:* {} years", years));
    }
    if let Some(education) = &dentist.education {
        message.push_str(&format!("\n*Education:* {}", education));
    }

    message.push_str("\n\n*Contact Information*");
    if let Some(phone) = &dentist.phone {
        message.push_str(&format!("\n📞 {}", phone));
    }
    if let Some(email) = &dentist.email {
        message.push_str(&format!("\n✉️ {}", email));
    }

    message.push_str("\n\n*Office Hours*");
    for (days, hours) in OFFICE_HOURS {
        message.push_str(&format!("\n{}: {}", days, hours));
    }
    message
}

pub fn profile_markup(dentist_id: i32) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("📅 Book Appointment", format!("book:{}", dentist_id))],
        vec![InlineKeyboardButton::callback("⟵ Back", "back_to_directory")],
    ])
}

pub const NOT_FOUND_TEXT: &str = "Dentist Not Found";
pub const BOOKING_CLOSED_TEXT: &str = "This booking is no longer active.";

pub fn not_found_markup() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "Return to directory",
        "back_to_directory",
    )]])
}

pub fn booking_text(dentist: Option<&DentistProfile>, draft: &BookingDraft) -> String {
    let mut text = match dentist {
        Some(d) => format!(
            "📅 Book Appointment with {}\n{}\n{}\n\nSelect your preferred date and time.",
            d.name,
            d.city,
            d.treatments.join(" · ")
        ),
        None => "📅 Book Appointment\n\nSelect your preferred date and time.".to_string(),
    };
    if let (Some(date), Some(time)) = (draft.date, draft.time) {
        text.push_str(&format!(
            "\n\nAppointment Summary\nDate: {}\nTime: {}",
            format_date_long(date),
            format_slot(time)
        ));
        if let Some(d) = dentist {
            text.push_str(&format!("\nDentist: {}", d.name));
        }
    }
    text
}

pub fn confirmation_text(confirmation: &Confirmation) -> String {
    format!(
        "✅ Booking Confirmed!\nYour appointment with {} has been scheduled for {} at {}.\n\nYou will receive a confirmation email shortly.",
        confirmation.dentist_name,
        format_date_long(confirmation.date),
        format_slot(confirmation.time)
    )
}

/// Calendar for one month, slot grid and the confirm/cancel row.
pub fn booking_markup(
    draft: &BookingDraft,
    month: u32,
    year: i32,
    today: NaiveDate,
    can_confirm: bool,
) -> InlineKeyboardMarkup {
    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = Vec::new();

    keyboard.push(vec![ignore(format!("📅 {} {}", month_name(month), year))]);
    let weekdays = vec!["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"];
    keyboard.push(weekdays.into_iter().map(ignore).collect());

    if let Some(first_day) = NaiveDate::from_ymd_opt(year, month, 1) {
        let mut row: Vec<InlineKeyboardButton> = Vec::new();
        let shift = first_day.weekday().num_days_from_monday() as usize;
        for _ in 0..shift {
            row.push(ignore(" "));
        }

        for date in first_day.iter_days().take_while(|d| d.month() == month) {
            let day = date.day();
            if is_date_disabled(date, today) {
                row.push(ignore(format!("❌ {}", day)));
            } else if draft.date == Some(date) {
                row.push(InlineKeyboardButton::callback(format!("[{}]", day), "calendar:clear"));
            } else {
                row.push(InlineKeyboardButton::callback(
                    format!("{:2}", day),
                    format!("calendar:select:{}", date),
                ));
            }

            if row.len() == 7 {
                keyboard.push(row.clone());
                row.clear();
            }
        }

        if !row.is_empty() {
            while row.len() < 7 {
                row.push(ignore(" "));
            }
            keyboard.push(row);
        }
    }

    keyboard.push(vec![
        InlineKeyboardButton::callback("< Month", format!("calendar:prev_month:{}:{}", month, year)),
        InlineKeyboardButton::callback("Month >", format!("calendar:next_month:{}:{}", month, year)),
    ]);

    let mut current_row: Vec<InlineKeyboardButton> = Vec::new();
    for slot in TIME_SLOTS {
        let label = format_slot(slot);
        let text = if draft.time == Some(slot) {
            format!("✓ 🕐 {}", label)
        } else {
            format!("🕐 {}", label)
        };
        current_row.push(InlineKeyboardButton::callback(text, format!("time-{}", label)));
        if current_row.len() == 2 {
            keyboard.push(current_row);
            current_row = Vec::new();
        }
    }
    if !current_row.is_empty() {
        keyboard.push(current_row);
    }

    let mut actions = vec![InlineKeyboardButton::callback("Cancel", "booking:cancel")];
    if can_confirm {
        actions.push(InlineKeyboardButton::callback("Confirm Booking", "booking:confirm"));
    }
    keyboard.push(actions);

    InlineKeyboardMarkup::new(keyboard)
}

pub fn registration_text(draft: &RegistrationDraft) -> String {
    let value = |v: &str| if v.is_empty() { "—".to_string() } else { v.to_string() };
    let mut text = format!(
        "🧑‍⚕️ Register as a Dentist\nFill out your professional information to join our platform.\n\nFull name: {}\nCity: {}\nBio: {}\nTreatments: {}",
        value(&draft.full_name),
        value(&draft.city),
        value(&draft.bio),
        value(&draft.treatments.join(", "))
    );
    match draft.next_missing_field() {
        Some(field) => text.push_str(&format!("\n\nNext, send your {}", field.prompt())),
        None => text.push_str("\n\nSelect all treatments you provide."),
    }
    text
}

pub fn registration_markup(draft: &RegistrationDraft, can_submit: bool) -> InlineKeyboardMarkup {
    let buttons: Vec<InlineKeyboardButton> = TREATMENT_CATALOGUE
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let checked = draft.treatments.iter().any(|s| s == t);
            let label = format!("{} {}", if checked { "☑" } else { "☐" }, t);
            InlineKeyboardButton::callback(label, format!("reg:toggle:{}", i))
        })
        .collect();

    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = buttons.chunks(2).map(|r| r.to_vec()).collect();
    let mut actions = vec![InlineKeyboardButton::callback("Cancel", "reg:cancel")];
    if can_submit {
        actions.push(InlineKeyboardButton::callback("Register", "reg:submit"));
    }
    keyboard.push(actions);
    InlineKeyboardMarkup::new(keyboard)
}

pub const REGISTRATION_DONE_TEXT: &str =
    "✅ Registration Successful!\nWelcome to DentalConnect! Your profile has been created successfully.";

fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January", 2 => "February", 3 => "March", 4 => "April",
        5 => "May", 6 => "June", 7 => "July", 8 => "August",
        9 => "September", 10 => "October", 11 => "November", 12 => "December",
        _ => "",
    }
}

pub fn next_month(month: u32, year: i32) -> (u32, i32) {
    if month == 12 {
        (1, year + 1)
    } else {
        (month + 1, year)
    }
}

pub fn prev_month(month: u32, year: i32) -> (u32, i32) {
    if month == 1 {
        (12, year - 1)
    } else {
        (month - 1, year)
    }
}
