use std::{collections::HashMap, error::Error, sync::Arc, time::Duration};

use chrono::{Datelike, Local, NaiveDate};
use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message, MessageId, ParseMode, ReplyMarkup},
};
use tokio::sync::Mutex;

use crate::analytics::EventLogger;
use crate::auth::Authenticator;
use crate::booking::{format_date_long, format_slot, parse_slot, BookingState, Confirmation};
use crate::keyboards::{self, FIND_DENTIST, LOGIN, LOGOUT, REGISTER_DENTIST, REGISTER_PATIENT};
use crate::models::{Directory, ProfileView, TREATMENT_CATALOGUE};
use crate::registration::RegistrationDraft;
use crate::search::{ALL_CITIES, ALL_TREATMENTS};
use crate::session::{AuthOutcome, RegistrationGate, UserSession, UserStep};
use crate::timer::{Scheduler, Task};

pub type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;
pub type SessionStore = Arc<Mutex<HashMap<i64, UserSession>>>;

/// Everything the handlers share across chats. Built once in `main`.
pub struct App {
    pub directory: Directory,
    pub auth: Box<dyn Authenticator>,
    pub events: Box<dyn EventLogger>,
    pub scheduler: Box<dyn Scheduler>,
    pub confirmation_delay: Duration,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub async fn handle_message(msg: Message, bot: Bot, app: Arc<App>, sessions: SessionStore) -> HandlerResult {
    let chat_id = msg.chat.id;
    let text = msg.text().unwrap_or("").trim();
    let today = today();

    let mut user_sessions = sessions.lock().await;
    let session = user_sessions.entry(chat_id.0).or_insert_with(UserSession::new);

    match text {
        "/start" => {
            session.cancel();
            bot.send_message(chat_id, "Welcome to DentalConnect! Connect with qualified dental professionals in your area and book appointments easily.")
                .reply_markup(ReplyMarkup::Keyboard(keyboards::main_menu(session.identity.is_some())))
                .await?;
            send_listing(&bot, chat_id, &app, session).await?;
            return Ok(());
        }
        "/cancel" => {
            session.cancel();
            bot.send_message(chat_id, "Cancelled.")
                .reply_markup(ReplyMarkup::Keyboard(keyboards::main_menu(session.identity.is_some())))
                .await?;
            return Ok(());
        }
        FIND_DENTIST => {
            bot.send_message(chat_id, keyboards::search_panel_text(&session.search))
                .reply_markup(keyboards::search_panel(&app.directory, &session.search))
                .await?;
            return Ok(());
        }
        LOGIN | REGISTER_PATIENT => {
            session.request_login();
            send_login_prompt(&bot, chat_id, session).await?;
            return Ok(());
        }
        REGISTER_DENTIST => {
            match session.request_registration() {
                RegistrationGate::Opened => send_registration(&bot, chat_id, None, session).await?,
                RegistrationGate::NeedsLogin => send_login_prompt(&bot, chat_id, session).await?,
            }
            return Ok(());
        }
        LOGOUT => {
            session.logout();
            bot.send_message(chat_id, "You have been logged out.")
                .reply_markup(ReplyMarkup::Keyboard(keyboards::main_menu(false)))
                .await?;
            return Ok(());
        }
        _ => {}
    }

    if let Some(arg) = text.strip_prefix("/dentist") {
        // Anything that is not a known id, garbage included, is a lookup miss.
        let id = arg.trim().parse::<i32>().unwrap_or(-1);
        show_profile(&bot, chat_id, None, &app, id).await?;
        return Ok(());
    }

    match session.step {
        UserStep::EnteringEmail(_) => match session.submit_email(app.auth.as_ref(), text, today) {
            AuthOutcome::Rejected => {
                bot.send_message(chat_id, "Please enter your email address.").await?;
            }
            outcome => {
                let email = session.identity.as_ref().map(|i| i.email.clone()).unwrap_or_default();
                bot.send_message(chat_id, format!("Logged in as {}", email))
                    .reply_markup(ReplyMarkup::Keyboard(keyboards::main_menu(true)))
                    .await?;
                match outcome {
                    AuthOutcome::BookingResumed => show_booking(&bot, chat_id, None, &app, session, None, today).await?,
                    AuthOutcome::RegistrationOpened => send_registration(&bot, chat_id, None, session).await?,
                    _ => {}
                }
            }
        },
        UserStep::MainMenu => {
            if session.registration.is_filling() {
                if session.registration.fill_next(text).is_some() {
                    send_registration(&bot, chat_id, None, session).await?;
                } else {
                    bot.send_message(chat_id, "Use the buttons to select the treatments you offer.").await?;
                }
            } else {
                debug!("Unhandled text from {}: {}", chat_id.0, text);
                bot.send_message(chat_id, "Unknown command")
                    .reply_markup(ReplyMarkup::Keyboard(keyboards::main_menu(session.identity.is_some())))
                    .await?;
            }
        }
    }

    Ok(())
}

pub async fn handle_callback_query(q: CallbackQuery, bot: Bot, msg: Message, app: Arc<App>, sessions: SessionStore) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;
    let data = match q.data.clone() {
        Some(data) => data,
        None => return Ok(()),
    };
    debug!("Callback query: {}", data);

    let chat_id = msg.chat.id;
    let today = today();
    let mut user_sessions = sessions.lock().await;
    let session = user_sessions.entry(chat_id.0).or_insert_with(UserSession::new);

    // Slot labels contain ':' so they get their own prefix.
    if let Some(slot) = data.strip_prefix("time-") {
        if let Some(slot) = parse_slot(slot) {
            if session.booking.set_time(slot) {
                show_booking(&bot, chat_id, Some(msg.id), &app, session, None, today).await?;
            }
        }
        return Ok(());
    }

    let parts: Vec<&str> = data.split(':').collect();
    match parts.as_slice() {
        ["ignore"] => {}
        ["filter", "city", choice] => {
            match *choice {
                "all" => session.search.set_city(ALL_CITIES),
                index => {
                    if let Some(city) = pick(&app.directory.cities(), index) {
                        session.search.set_city(&city);
                    }
                }
            }
            edit_search_panel(&bot, chat_id, msg.id, &app, session).await?;
        }
        ["filter", "treatment", choice] => {
            match *choice {
                "all" => session.search.set_treatment(ALL_TREATMENTS),
                index => {
                    if let Some(treatment) = pick(&app.directory.treatments(), index) {
                        session.search.set_treatment(&treatment);
                    }
                }
            }
            edit_search_panel(&bot, chat_id, msg.id, &app, session).await?;
        }
        ["search"] => {
            session.search.run(&app.directory);
            send_listing(&bot, chat_id, &app, session).await?;
        }
        ["clear_filters"] => {
            session.search.clear();
            edit_listing(&bot, chat_id, msg.id, &app, session).await?;
        }
        ["back_to_directory"] => {
            edit_listing(&bot, chat_id, msg.id, &app, session).await?;
        }
        ["profile", id] => {
            let id = id.parse::<i32>().unwrap_or(-1);
            show_profile(&bot, chat_id, Some(msg.id), &app, id).await?;
        }
        ["book", id] => {
            let id = match id.parse::<i32>() {
                Ok(id) => id,
                Err(_) => return Ok(()),
            };
            if let BookingState::Confirmed(_) = session.booking.state() {
                bot.send_message(chat_id, "Please wait for the current booking to finish.").await?;
                return Ok(());
            }
            session.request_booking(id, today);
            if session.identity.is_none() {
                send_login_prompt(&bot, chat_id, session).await?;
            } else {
                show_booking(&bot, chat_id, None, &app, session, None, today).await?;
            }
        }
        ["calendar", "select", date] => {
            if session.booking.draft().is_none() {
                bot.edit_message_text(chat_id, msg.id, keyboards::BOOKING_CLOSED_TEXT).await?;
            } else if let Ok(date) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
                if session.booking.set_date(date, today) {
                    show_booking(&bot, chat_id, Some(msg.id), &app, session, None, today).await?;
                } else {
                    bot.send_message(chat_id, "That day is not available. Please choose another date.").await?;
                }
            }
        }
        ["calendar", "clear"] => {
            session.booking.clear_date();
            show_booking(&bot, chat_id, Some(msg.id), &app, session, None, today).await?;
        }
        ["calendar", direction @ ("next_month" | "prev_month"), month, year] => {
            if let (Ok(month), Ok(year)) = (month.parse::<u32>(), year.parse::<i32>()) {
                let shown = if *direction == "next_month" {
                    keyboards::next_month(month, year)
                } else {
                    keyboards::prev_month(month, year)
                };
                show_booking(&bot, chat_id, Some(msg.id), &app, session, Some(shown), today).await?;
            }
        }
        ["booking", "confirm"] => {
            let identity = match session.identity.clone() {
                Some(identity) => identity,
                None => return Ok(()),
            };
            match session.booking.confirm(today, &app.directory, app.events.as_ref(), &identity) {
                Ok(confirmation) => {
                    bot.edit_message_text(chat_id, msg.id, keyboards::confirmation_text(&confirmation))
                        .await?;
                    let task = booking_reset_task(bot.clone(), sessions.clone(), chat_id, msg.id, confirmation);
                    let handle = app.scheduler.schedule(app.confirmation_delay, task);
                    session.track_booking_reset(handle);
                }
                Err(blocked) => {
                    debug!("Confirm blocked for {}: {}", chat_id.0, blocked);
                    bot.send_message(chat_id, format!("Can't confirm yet: {}", blocked)).await?;
                }
            }
        }
        ["booking", "cancel"] => {
            session.cancel_booking();
            bot.edit_message_text(chat_id, msg.id, "Booking cancelled.").await?;
        }
        ["reg", "toggle", index] => {
            if let Some(label) = index.parse::<usize>().ok().and_then(|i| TREATMENT_CATALOGUE.get(i)) {
                if session.registration.toggle_treatment(label) {
                    send_registration(&bot, chat_id, Some(msg.id), session).await?;
                }
            }
        }
        ["reg", "submit"] => match session.registration.submit() {
            Ok(_) => {
                bot.edit_message_text(chat_id, msg.id, keyboards::REGISTRATION_DONE_TEXT).await?;
                let task = registration_reset_task(sessions.clone(), chat_id);
                let handle = app.scheduler.schedule(app.confirmation_delay, task);
                session.track_registration_reset(handle);
            }
            Err(blocked) => {
                bot.send_message(chat_id, format!("Can't register yet: {}", blocked)).await?;
            }
        },
        ["reg", "cancel"] => {
            session.cancel_registration();
            bot.edit_message_text(chat_id, msg.id, "Registration cancelled.").await?;
        }
        _ => {
            warn!("Unknown callback data: {}", data);
        }
    }

    Ok(())
}

fn pick(options: &[String], index: &str) -> Option<String> {
    index.parse::<usize>().ok().and_then(|i| options.get(i).cloned())
}

async fn send_login_prompt(bot: &Bot, chat_id: ChatId, session: &UserSession) -> HandlerResult {
    if let UserStep::EnteringEmail(intent) = session.step {
        bot.send_message(chat_id, intent.prompt()).await?;
    }
    Ok(())
}

async fn send_listing(bot: &Bot, chat_id: ChatId, app: &App, session: &UserSession) -> HandlerResult {
    let listing = session.search.listing(&app.directory);
    bot.send_message(chat_id, keyboards::listing_text(&listing))
        .reply_markup(keyboards::listing_markup(&listing))
        .await?;
    Ok(())
}

async fn edit_listing(bot: &Bot, chat_id: ChatId, message_id: MessageId, app: &App, session: &UserSession) -> HandlerResult {
    let listing = session.search.listing(&app.directory);
    bot.edit_message_text(chat_id, message_id, keyboards::listing_text(&listing))
        .reply_markup(keyboards::listing_markup(&listing))
        .await?;
    Ok(())
}

async fn edit_search_panel(bot: &Bot, chat_id: ChatId, message_id: MessageId, app: &App, session: &UserSession) -> HandlerResult {
    bot.edit_message_text(chat_id, message_id, keyboards::search_panel_text(&session.search))
        .reply_markup(keyboards::search_panel(&app.directory, &session.search))
        .await?;
    Ok(())
}

async fn show_profile(bot: &Bot, chat_id: ChatId, edit: Option<MessageId>, app: &App, id: i32) -> HandlerResult {
    let (text, markup, parse_mode) = match ProfileView::resolve(&app.directory, id) {
        ProfileView::Found(dentist) => (
            keyboards::profile_text(dentist),
            keyboards::profile_markup(dentist.id),
            Some(ParseMode::Markdown),
        ),
        ProfileView::NotFound => {
            debug!("Profile lookup miss for id {}", id);
            (keyboards::NOT_FOUND_TEXT.to_string(), keyboards::not_found_markup(), None)
        }
    };

    match edit {
        Some(message_id) => {
            let mut request = bot.edit_message_text(chat_id, message_id, text).reply_markup(markup);
            if let Some(mode) = parse_mode {
                request = request.parse_mode(mode);
            }
            request.await?;
        }
        None => {
            let mut request = bot.send_message(chat_id, text).reply_markup(markup);
            if let Some(mode) = parse_mode {
                request = request.parse_mode(mode);
            }
            request.await?;
        }
    }
    Ok(())
}

async fn show_booking(
    bot: &Bot,
    chat_id: ChatId,
    edit: Option<MessageId>,
    app: &App,
    session: &UserSession,
    shown_month: Option<(u32, i32)>,
    today: NaiveDate,
) -> HandlerResult {
    let draft = match session.booking.draft() {
        Some(draft) => draft,
        None => {
            if let Some(message_id) = edit {
                bot.edit_message_text(chat_id, message_id, keyboards::BOOKING_CLOSED_TEXT).await?;
            }
            return Ok(());
        }
    };
    let (month, year) = shown_month.unwrap_or_else(|| {
        let date = draft.date.unwrap_or(today);
        (date.month(), date.year())
    });

    let text = keyboards::booking_text(app.directory.find(draft.dentist_id), draft);
    let markup = keyboards::booking_markup(draft, month, year, today, session.booking.can_confirm(today));
    match edit {
        Some(message_id) => {
            bot.edit_message_text(chat_id, message_id, text).reply_markup(markup).await?;
        }
        None => {
            bot.send_message(chat_id, text).reply_markup(markup).await?;
        }
    }
    Ok(())
}

async fn send_registration(bot: &Bot, chat_id: ChatId, edit: Option<MessageId>, session: &UserSession) -> HandlerResult {
    let draft: &RegistrationDraft = match session.registration.draft() {
        Some(draft) => draft,
        None => return Ok(()),
    };
    let text = keyboards::registration_text(draft);
    let markup = keyboards::registration_markup(draft, session.registration.can_submit());
    match edit {
        Some(message_id) => {
            bot.edit_message_text(chat_id, message_id, text).reply_markup(markup).await?;
        }
        None => {
            bot.send_message(chat_id, text).reply_markup(markup).await?;
        }
    }
    Ok(())
}

fn booking_reset_task(bot: Bot, sessions: SessionStore, chat_id: ChatId, message_id: MessageId, confirmation: Confirmation) -> Task {
    Box::pin(async move {
        let closed = {
            let mut user_sessions = sessions.lock().await;
            user_sessions
                .get_mut(&chat_id.0)
                .map(|s| s.booking.reset_elapsed())
                .unwrap_or(false)
        };
        if !closed {
            return;
        }
        let summary = format!(
            "📅 Appointment with {} on {} at {}",
            confirmation.dentist_name,
            format_date_long(confirmation.date),
            format_slot(confirmation.time)
        );
        if let Err(e) = bot.edit_message_text(chat_id, message_id, summary).await {
            warn!("Failed to close confirmation for {}: {}", chat_id.0, e);
        }
    })
}

fn registration_reset_task(sessions: SessionStore, chat_id: ChatId) -> Task {
    Box::pin(async move {
        let mut user_sessions = sessions.lock().await;
        if let Some(session) = user_sessions.get_mut(&chat_id.0) {
            if session.registration.reset_elapsed() {
                debug!("Registration flow closed for {}", chat_id.0);
            }
        }
    })
}
