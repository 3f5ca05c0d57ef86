use std::{collections::HashMap, sync::Arc};

use analytics::{EventLogger, LocalLogger, StatsigLogger};
use auth::EmailStub;
use config::Config;
use handlers::{handle_callback_query, handle_message, App, SessionStore};
use models::Directory;
use timer::TokioScheduler;
use tokio::sync::Mutex;
mod analytics;
mod auth;
mod booking;
mod config;
mod handlers;
mod keyboards;
mod models;
mod registration;
mod search;
mod session;
mod timer;
use teloxide::{
    dispatching::UpdateFilterExt,
    prelude::*,
    types::{CallbackQuery, MaybeInaccessibleMessage},
};

extern crate pretty_env_logger;
#[macro_use] extern crate log;

#[tokio::main]
async fn main() {
    pretty_env_logger::init();
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let events: Box<dyn EventLogger> = match &config.statsig_server_key {
        Some(key) => match StatsigLogger::new(config.statsig_events_url.clone(), key.clone()) {
            Ok(logger) => Box::new(logger),
            Err(e) => {
                warn!("Analytics client could not be built, logging events locally: {}", e);
                Box::new(LocalLogger)
            }
        },
        None => {
            info!("STATSIG_SERVER_KEY not set, analytics events are only logged");
            Box::new(LocalLogger)
        }
    };

    let app = Arc::new(App {
        directory: Directory::reference(),
        auth: Box::new(EmailStub),
        events,
        scheduler: Box::new(TokioScheduler),
        confirmation_delay: config.confirmation_delay,
    });
    let bot = Bot::from_env();
    let user_sessions: SessionStore = Arc::new(Mutex::new(HashMap::new()));

    let handler = dptree::entry()
    .branch(
        Update::filter_message().endpoint({
        let app = app.clone();
        let user_sessions = user_sessions.clone();

        move |bot: Bot, msg: Message| {
            let app = app.clone();
            let user_sessions = user_sessions.clone();

            async move {
                if let Err(e) = handle_message(msg, bot, app, user_sessions).await {
                    error!("Message handler failed: {}", e);
                }
                respond(())
            }
        }
    }))
    .branch(Update::filter_callback_query().endpoint({
        let app = app.clone();
        let user_sessions = user_sessions.clone();

        move |q: CallbackQuery, bot: Bot| {
            let app = app.clone();
            let user_sessions = user_sessions.clone();

            async move {
                let message = q
                    .message
                    .as_ref()
                    .and_then(MaybeInaccessibleMessage::regular_message)
                    .cloned();
                if let Some(message) = message {
                    if let Err(e) = handle_callback_query(q, bot, message, app, user_sessions).await {
                        error!("Callback handler failed: {}", e);
                    }
                }
                respond(())
            }
        }
    }));

    info!("DentalConnect bot starting");
    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
