use crate::errors::AppError;
use crate::models::AppData;
use crate::storage::persist_data;
use std::{path::PathBuf, sync::Arc};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub data_path: PathBuf,
    pub data: Arc<Mutex<AppData>>,
}

impl AppState {
    pub fn new(data_path: PathBuf, data: AppData) -> Self {
        Self {
            data_path,
            data: Arc::new(Mutex::new(data)),
        }
    }

    /// Runs `change` on a copy of the data under the lock and publishes the
    /// copy only once the file write succeeded. A failed write leaves readers
    /// on the last persisted state. The lock is held through the write, so
    /// concurrent edits of the same day resolve to whichever request takes the
    /// lock last.
    pub async fn mutate<T, E>(
        &self,
        change: impl FnOnce(&mut AppData) -> Result<T, E>,
    ) -> Result<T, AppError>
    where
        AppError: From<E>,
    {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        let result = change(&mut next)?;
        persist_data(&self.data_path, &next).await?;
        *data = next;
        Ok(result)
    }
}
