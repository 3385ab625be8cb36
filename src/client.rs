use crate::errors::StoreError;
use crate::models::{
    ChatMessage, DayRecord, Habit, HabitId, HabitUpdate, NewHabitRequest, NewMessageRequest,
    RecordKey, StoredValue, UpsertRecordRequest, UserId,
};
use crate::sync::RecordStore;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub const CHAT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// HTTP client for the habit API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn create_habit(&self, request: &NewHabitRequest) -> Result<Habit, StoreError> {
        let response = self
            .http
            .post(self.url("/api/habits"))
            .json(request)
            .send()
            .await?;
        json(response).await
    }

    pub async fn fetch_messages(&self, after: u64) -> Result<Vec<ChatMessage>, StoreError> {
        let response = self
            .http
            .get(self.url("/api/chat"))
            .query(&[("after", after)])
            .send()
            .await?;
        json(response).await
    }

    pub async fn send_message(
        &self,
        user_id: UserId,
        text: &str,
    ) -> Result<ChatMessage, StoreError> {
        let request = NewMessageRequest {
            user_id,
            text: text.to_string(),
        };
        let response = self
            .http
            .post(self.url("/api/chat"))
            .json(&request)
            .send()
            .await?;
        json(response).await
    }
}

async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn json<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    Ok(check(response).await?.json().await?)
}

impl RecordStore for ApiClient {
    async fn list_habits(&self, user_id: UserId) -> Result<Vec<Habit>, StoreError> {
        let response = self
            .http
            .get(self.url("/api/habits"))
            .query(&[("user_id", user_id)])
            .send()
            .await?;
        json(response).await
    }

    async fn list_records(
        &self,
        user_id: UserId,
        year: i32,
        month: u32,
    ) -> Result<Vec<DayRecord>, StoreError> {
        let response = self
            .http
            .get(self.url("/api/records"))
            .query(&[
                ("user_id", user_id.to_string()),
                ("year", year.to_string()),
                ("month", month.to_string()),
            ])
            .send()
            .await?;
        json(response).await
    }

    async fn upsert_record(&self, key: RecordKey, value: f64) -> Result<(), StoreError> {
        let request = UpsertRecordRequest {
            user_id: key.user_id,
            habit_id: key.habit_id,
            year: key.year,
            month: key.month,
            day: key.day,
            value: StoredValue::Number(value),
        };
        let response = self
            .http
            .post(self.url("/api/records"))
            .json(&request)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn delete_record(&self, key: RecordKey) -> Result<(), StoreError> {
        let response = self
            .http
            .delete(self.url("/api/records"))
            .query(&key)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn update_habit(
        &self,
        user_id: UserId,
        habit_id: HabitId,
        update: &HabitUpdate,
    ) -> Result<Habit, StoreError> {
        let response = self
            .http
            .put(self.url(&format!("/api/habits/{habit_id}")))
            .query(&[("user_id", user_id)])
            .json(update)
            .send()
            .await?;
        json(response).await
    }

    async fn delete_habit(&self, user_id: UserId, habit_id: HabitId) -> Result<(), StoreError> {
        let response = self
            .http
            .delete(self.url(&format!("/api/habits/{habit_id}")))
            .query(&[("user_id", user_id)])
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}

/// Background poll of the chat. Dropping the poller stops it.
pub struct ChatPoller {
    handle: JoinHandle<()>,
}

impl ChatPoller {
    /// Polls at the chat screen's fixed rate of [`CHAT_POLL_INTERVAL`].
    pub fn spawn_default(
        client: ApiClient,
        sender: mpsc::UnboundedSender<Vec<ChatMessage>>,
    ) -> Self {
        Self::spawn(client, CHAT_POLL_INTERVAL, sender)
    }

    /// Fetches new messages every `interval` and forwards non-empty batches.
    /// The task ends on its own once the receiver is gone.
    pub fn spawn(
        client: ApiClient,
        interval: Duration,
        sender: mpsc::UnboundedSender<Vec<ChatMessage>>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            let mut last_seen = 0;
            loop {
                ticker.tick().await;
                if sender.is_closed() {
                    break;
                }
                match client.fetch_messages(last_seen).await {
                    Ok(messages) if messages.is_empty() => {}
                    Ok(messages) => {
                        last_seen = messages.iter().map(|m| m.id).max().unwrap_or(last_seen);
                        debug!(count = messages.len(), "chat messages received");
                        if sender.send(messages).is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!("chat poll failed: {err}"),
                }
            }
        });
        Self { handle }
    }
}

impl Drop for ChatPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
