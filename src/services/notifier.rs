//! Webhook delivery of the rendered dashboard

use chrono::NaiveDate;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::constants::HTTP_TIMEOUT_SECS;
use crate::error::{Error, Result};

/// Image plus the message posted alongside it
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub image_path: PathBuf,
    pub caption: String,
}

impl Notification {
    pub fn new(image_path: PathBuf, caption: String) -> Self {
        Self { image_path, caption }
    }

    /// Dashboard notification with the standard caption for `symbol` on `date`
    pub fn dashboard(image_path: PathBuf, symbol: &str, date: NaiveDate) -> Self {
        Self::new(image_path, caption_for(symbol, date))
    }
}

/// `📊 **2313 自動籌碼戰情分析** (2024-01-05)`
pub fn caption_for(symbol: &str, date: NaiveDate) -> String {
    format!("📊 **{} 自動籌碼戰情分析** ({})", symbol, date.format("%Y-%m-%d"))
}

/// Delivers a notification somewhere
#[allow(async_fn_in_trait)]
pub trait Notifier {
    async fn send(&self, notification: &Notification) -> Result<()>;
}

/// Discord-style webhook: multipart POST with `content` and `file` parts
pub struct WebhookNotifier {
    endpoint: String,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(endpoint: String) -> Result<Self> {
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(Error::Config(format!("Invalid webhook endpoint: {}", endpoint)));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()?;

        Ok(Self { endpoint, client })
    }

    fn build_form(notification: &Notification, bytes: Vec<u8>) -> Result<Form> {
        let file_name = notification
            .image_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("dashboard.png")
            .to_string();

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("image/png")?;

        Ok(Form::new()
            .text("content", notification.caption.clone())
            .part("file", part))
    }
}

impl Notifier for WebhookNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        let bytes = tokio::fs::read(&notification.image_path).await?;
        let size = bytes.len();
        let form = Self::build_form(notification, bytes)?;

        let response = self.client.post(&self.endpoint).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Network(format!(
                "Webhook returned HTTP {}: {}",
                status.as_u16(),
                body.chars().take(200).collect::<String>()
            )));
        }

        info!("Delivered {} ({} bytes) to webhook", notification.image_path.display(), size);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct RecordingNotifier {
        sent: RefCell<Vec<Notification>>,
    }

    impl Notifier for RecordingNotifier {
        async fn send(&self, notification: &Notification) -> Result<()> {
            self.sent.borrow_mut().push(notification.clone());
            Ok(())
        }
    }

    #[test]
    fn test_caption_format() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(caption_for("2313", date), "📊 **2313 自動籌碼戰情分析** (2024-01-05)");
    }

    #[test]
    fn test_dashboard_notification() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let n = Notification::dashboard(PathBuf::from("out/dashboard.png"), "2330", date);
        assert_eq!(n.image_path, PathBuf::from("out/dashboard.png"));
        assert!(n.caption.contains("2330"));
        assert!(n.caption.ends_with("(2024-03-09)"));
    }

    #[test]
    fn test_rejects_non_http_endpoint() {
        assert!(matches!(
            WebhookNotifier::new("discord.com/api/webhooks/1".to_string()),
            Err(Error::Config(_))
        ));
        assert!(WebhookNotifier::new("https://discord.com/api/webhooks/1/abc".to_string()).is_ok());
    }

    #[tokio::test]
    async fn test_missing_image_is_io_error() {
        let notifier = WebhookNotifier::new("http://127.0.0.1:9/hook".to_string()).unwrap();
        let n = Notification::new(PathBuf::from("/nonexistent/dashboard.png"), "x".to_string());
        assert!(matches!(notifier.send(&n).await, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_notifier_trait_seam() {
        let notifier = RecordingNotifier { sent: RefCell::new(Vec::new()) };
        let n = Notification::new(PathBuf::from("dashboard.png"), "hello".to_string());
        notifier.send(&n).await.unwrap();
        assert_eq!(notifier.sent.borrow().as_slice(), &[n]);
    }
}
