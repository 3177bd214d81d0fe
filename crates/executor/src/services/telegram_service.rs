use async_trait::async_trait;
use common::models::{SecurityEventRow, SignalRow};
use teloxide::prelude::*;

use crate::config::DeliveryConfig;
use crate::services::notifier::{Notifier, format_event_alert, format_signal_alert};

pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotifier {
    pub fn new(config: &DeliveryConfig) -> Self {
        Self {
            bot: Bot::new(config.bot_token.clone()),
            chat_id: ChatId(config.user_id),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify_signal(&self, signal: &SignalRow) -> anyhow::Result<()> {
        self.bot
            .send_message(self.chat_id, format_signal_alert(signal))
            .await?;
        Ok(())
    }

    async fn notify_event(&self, event: &SecurityEventRow) -> anyhow::Result<()> {
        self.bot
            .send_message(self.chat_id, format_event_alert(event))
            .await?;
        Ok(())
    }
}
