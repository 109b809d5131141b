use std::time::Duration;

use crate::application::{AppResult, Notification, Notifier};

pub const DEFAULT_MAX_BODY_CHARS: usize = 4000;
pub const DEFAULT_PART_DELAY: Duration = Duration::from_secs(10);

/// Sends a notification, splitting long bodies into numbered parts.
///
/// Parts are sent one by one with `part_delay` in between to stay under
/// the mail provider's rate limit.
pub struct DeliverNotificationUseCase<'a> {
    pub notifier: &'a dyn Notifier,
    pub max_body_chars: usize,
    pub part_delay: Duration,
}

impl<'a> DeliverNotificationUseCase<'a> {
    pub fn new(notifier: &'a dyn Notifier) -> Self {
        Self {
            notifier,
            max_body_chars: DEFAULT_MAX_BODY_CHARS,
            part_delay: DEFAULT_PART_DELAY,
        }
    }

    pub async fn execute(&self, message: &Notification) -> AppResult<()> {
        let parts = split_body(&message.body, self.max_body_chars);
        if parts.len() <= 1 {
            return self.notifier.notify(message).await;
        }

        let total = parts.len();
        for (i, part) in parts.into_iter().enumerate() {
            let numbered = Notification {
                subject: format!("{} ({}/{})", message.subject, i + 1, total),
                body: part,
            };
            self.notifier.notify(&numbered).await?;
            tracing::info!(part = i + 1, total, "notification part sent");

            if i + 1 < total && !self.part_delay.is_zero() {
                tracing::info!(
                    delay_secs = self.part_delay.as_secs(),
                    "waiting before next part"
                );
                tokio::time::sleep(self.part_delay).await;
            }
        }
        Ok(())
    }
}

/// Cuts `body` into pieces of at most `max_chars` characters.
///
/// Cuts land on char boundaries, not on line breaks. A zero limit disables
/// splitting.
pub fn split_body(body: &str, max_chars: usize) -> Vec<String> {
    if max_chars == 0 || body.chars().count() <= max_chars {
        return vec![body.to_string()];
    }

    let chars: Vec<char> = body.chars().collect();
    chars
        .chunks(max_chars)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
