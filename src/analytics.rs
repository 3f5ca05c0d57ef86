use std::collections::BTreeMap;

use serde::Serialize;
use url::Url;

pub const APPOINTMENT_BOOKED: &str = "appointment_booked";

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsEvent {
    pub name: String,
    pub correlation_id: u32,
    pub user_id: String,
    pub properties: BTreeMap<String, String>,
}

/// Fire-and-forget sink for product events. Nothing is returned and a failed
/// delivery never reaches the caller.
pub trait EventLogger: Send + Sync {
    fn log_event(&self, event: AnalyticsEvent);
}

// Wire format of the Statsig event intake.
#[derive(Debug, Serialize)]
struct LogEventRequest {
    events: Vec<StatsigEvent>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsigEvent {
    event_name: String,
    value: String,
    metadata: BTreeMap<String, String>,
    user: StatsigUser,
    time: i64,
}

#[derive(Debug, Serialize)]
struct StatsigUser {
    #[serde(rename = "userID")]
    user_id: String,
}

impl From<AnalyticsEvent> for LogEventRequest {
    fn from(event: AnalyticsEvent) -> Self {
        LogEventRequest {
            events: vec![StatsigEvent {
                event_name: event.name,
                value: event.correlation_id.to_string(),
                metadata: event.properties,
                user: StatsigUser { user_id: event.user_id },
                time: chrono::Utc::now().timestamp_millis(),
            }],
        }
    }
}

pub struct StatsigLogger {
    client: reqwest::Client,
    endpoint: Url,
    server_key: String,
}

impl StatsigLogger {
    pub fn new(endpoint: Url, server_key: String) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(StatsigLogger { client, endpoint, server_key })
    }
}

impl EventLogger for StatsigLogger {
    fn log_event(&self, event: AnalyticsEvent) {
        debug!("Sending analytics event {} ({})", event.name, event.correlation_id);
        let request = self
            .client
            .post(self.endpoint.clone())
            .header("STATSIG-API-KEY", &self.server_key)
            .json(&LogEventRequest::from(event));

        tokio::spawn(async move {
            match request.send().await {
                Ok(response) if !response.status().is_success() => {
                    warn!("Analytics intake answered {}", response.status());
                }
                Ok(_) => {}
                Err(e) => warn!("Failed to deliver analytics event: {}", e),
            }
        });
    }
}

/// Used when no analytics key is configured.
pub struct LocalLogger;

impl EventLogger for LocalLogger {
    fn log_event(&self, event: AnalyticsEvent) {
        info!(
            "analytics event {} id={} user={} {:?}",
            event.name, event.correlation_id, event.user_id, event.properties
        );
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct RecordingLogger {
        events: Mutex<Vec<AnalyticsEvent>>,
    }

    impl RecordingLogger {
        pub fn events(&self) -> Vec<AnalyticsEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl EventLogger for RecordingLogger {
        fn log_event(&self, event: AnalyticsEvent) {
            self.events.lock().unwrap().push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_uses_statsig_field_names() {
        let mut properties = BTreeMap::new();
        properties.insert("selected_time".to_string(), "09:30".to_string());
        let event = AnalyticsEvent {
            name: APPOINTMENT_BOOKED.to_string(),
            correlation_id: 42,
            user_id: "jane@example.com".to_string(),
            properties,
        };

        let body = serde_json::to_value(LogEventRequest::from(event)).unwrap();
        let sent = &body["events"][0];
        assert_eq!(sent["eventName"], "appointment_booked");
        assert_eq!(sent["value"], "42");
        assert_eq!(sent["user"]["userID"], "jane@example.com");
        assert_eq!(sent["metadata"]["selected_time"], "09:30");
        assert!(sent["time"].is_i64());
    }
}
