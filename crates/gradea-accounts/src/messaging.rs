//! Team broadcasts and private messages.

use crate::error::AccountError;
use crate::records::{admin_child, collection, PRIVATE_MESSAGES, TEAM_MESSAGES};
use chrono::Utc;
use document_store::{DocumentStore, Fields};
use identity_client::AccountId;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct Messaging {
    store: Arc<dyn DocumentStore>,
}

impl Messaging {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Post a message to every student in the administrator's team.
    /// Returns the generated message key.
    #[instrument(skip(self, message), fields(admin_id = %admin_id))]
    pub async fn send_team_message(
        &self,
        admin_id: &AccountId,
        message: &str,
    ) -> Result<String, AccountError> {
        let message = non_blank(message)?;

        let mut fields = Fields::new();
        fields.insert("message".into(), json!(message));
        fields.insert("sender".into(), json!("admin"));
        fields.insert("timestamp".into(), json!(Utc::now()));
        fields.insert("isTeamMessage".into(), json!(true));

        let key = self
            .store
            .append(&admin_child(admin_id, TEAM_MESSAGES)?, fields)
            .await?;

        info!(message_key = %key, "Team message sent");
        Ok(key)
    }

    /// Send a message from one account to another.
    #[instrument(skip(self, message), fields(sender = %sender, receiver = %receiver))]
    pub async fn send_private_message(
        &self,
        sender: &AccountId,
        receiver: &AccountId,
        message: &str,
    ) -> Result<String, AccountError> {
        let message = non_blank(message)?;

        let mut fields = Fields::new();
        fields.insert("senderUid".into(), json!(sender));
        fields.insert("receiverUid".into(), json!(receiver));
        fields.insert("message".into(), json!(message));
        fields.insert("timestamp".into(), json!(Utc::now()));
        fields.insert("isPrivate".into(), json!(true));

        let key = self
            .store
            .append(&collection(PRIVATE_MESSAGES)?, fields)
            .await?;

        info!(message_key = %key, "Private message sent");
        Ok(key)
    }
}

fn non_blank(message: &str) -> Result<&str, AccountError> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Err(AccountError::Validation("message must not be empty".into()));
    }
    Ok(trimmed)
}
