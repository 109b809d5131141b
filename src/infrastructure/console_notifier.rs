use async_trait::async_trait;

use crate::application::{AppResult, Notification, Notifier};

pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notify(&self, message: &Notification) -> AppResult<()> {
        println!("NOTIFY: {}\n{}\n", message.subject, message.body);
        Ok(())
    }
}
