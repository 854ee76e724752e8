//! Operator notifications. Delivery is best effort and never fails a run.

use crate::settings::Settings;
use crate::settings::TelegramSettings;
use reqwest::blocking::Client;
use reqwest::blocking::Request;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

const TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// Fire-and-forget message sink for operators.
pub trait Notifier {
    fn notify(&self, severity: Severity, message: &str);
}

/// Posts messages to a Telegram chat topic through the bot API.
pub struct TelegramNotifier {
    client: Client,
    endpoint: String,
    chat_id: String,
    reply_to_message_id: Option<String>,
}

impl TelegramNotifier {
    pub fn new(settings: &TelegramSettings) -> Self {
        let chat_id = match &settings.topic_id {
            Some(topic) => format!("{}/{}", settings.chat_id, topic),
            None => settings.chat_id.to_owned(),
        };
        Self {
            client: Client::new(),
            endpoint: format!("{TELEGRAM_API}/bot{}/sendMessage", settings.token),
            chat_id,
            reply_to_message_id: settings.reply_to_message_id.to_owned(),
        }
    }

    /// Builds the `sendMessage` GET request for `text`.
    fn request(&self, text: &str) -> reqwest::Result<Request> {
        let mut params = vec![("chat_id", self.chat_id.as_str()), ("text", text)];
        if let Some(reply_to) = &self.reply_to_message_id {
            params.push(("reply_to_message_id", reply_to.as_str()));
        }
        self.client.get(&self.endpoint).query(&params).build()
    }
}

impl Notifier for TelegramNotifier {
    /// Only errors reach the chat; info notices are logged.
    fn notify(&self, severity: Severity, message: &str) {
        if severity == Severity::Info {
            info!(notification = message);
            return;
        }
        debug!("Sending {:?} notification to chat {}", severity, self.chat_id);
        let response = self.request(message).and_then(|request| self.client.execute(request));
        match response {
            Ok(response) if response.status().is_success() => debug!("Notification delivered"),
            Ok(response) => warn!("Notification rejected with status {}", response.status()),
            Err(e) => warn!("Notification failed: {e}"),
        }
    }
}

/// Writes notifications to the log only.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info => info!(notification = message),
            Severity::Error => error!(notification = message),
        }
    }
}

/// Telegram when a bot token is configured, the log otherwise.
pub fn notifier_from_settings(settings: &Settings) -> Box<dyn Notifier> {
    match settings.telegram.as_ref().filter(|telegram| !telegram.token.is_empty()) {
        Some(telegram) => Box::new(TelegramNotifier::new(telegram)),
        None => Box::new(LogNotifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(topic: Option<&str>, reply_to: Option<&str>) -> TelegramSettings {
        TelegramSettings {
            token: "123:abc".to_owned(),
            chat_id: "-100200".to_owned(),
            topic_id: topic.map(str::to_owned),
            reply_to_message_id: reply_to.map(str::to_owned),
        }
    }

    #[test]
    fn request_carries_chat_topic_and_reply() {
        let notifier = TelegramNotifier::new(&settings(Some("1069"), Some("1071")));
        let request = notifier.request("Ошибка в файле").unwrap();
        let url = request.url();
        assert_eq!(url.path(), "/bot123:abc/sendMessage");
        let query: Vec<(String, String)> = url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();
        assert_eq!(
            query,
            vec![
                ("chat_id".to_owned(), "-100200/1069".to_owned()),
                ("text".to_owned(), "Ошибка в файле".to_owned()),
                ("reply_to_message_id".to_owned(), "1071".to_owned()),
            ]
        );
    }

    #[test]
    fn request_without_topic() {
        let notifier = TelegramNotifier::new(&settings(None, None));
        let request = notifier.request("done").unwrap();
        assert_eq!(request.url().query(), Some("chat_id=-100200&text=done"));
    }
}
