//! services/studio/src/adapters/preferences.rs
//!
//! Implements the `PreferenceStore` port with a small JSON file next to the
//! database. It holds the confirmed license key and the last placed order.

use async_trait::async_trait;
use freeplotter_core::domain::{LicenseKey, OrderReceipt};
use freeplotter_core::ports::{PortError, PortResult, PreferenceStore};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::Mutex;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreferenceFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    license_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_order: Option<StoredOrder>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredOrder {
    license_key: String,
    start_date: String,
    end_date: String,
}

impl From<&OrderReceipt> for StoredOrder {
    fn from(order: &OrderReceipt) -> Self {
        Self {
            license_key: order.license_key.clone(),
            start_date: order.start_date.clone(),
            end_date: order.end_date.clone(),
        }
    }
}

impl From<StoredOrder> for OrderReceipt {
    fn from(order: StoredOrder) -> Self {
        Self {
            license_key: order.license_key,
            start_date: order.start_date,
            end_date: order.end_date,
        }
    }
}

/// A `PreferenceStore` backed by one JSON file.
pub struct FilePreferences {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file.
    lock: Mutex<()>,
}

impl FilePreferences {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// A missing file reads as empty preferences.
    async fn load(&self) -> PortResult<PreferenceFile> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                PortError::Unexpected(format!(
                    "Corrupt preferences file {}: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PreferenceFile::default()),
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }

    async fn store(&self, file: &PreferenceFile) -> PortResult<()> {
        let bytes =
            serde_json::to_vec_pretty(file).map_err(|e| PortError::Unexpected(e.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
        }
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }

    async fn update(&self, change: impl FnOnce(&mut PreferenceFile)) -> PortResult<()> {
        let _guard = self.lock.lock().await;
        let mut file = self.load().await?;
        change(&mut file);
        self.store(&file).await
    }
}

#[async_trait]
impl PreferenceStore for FilePreferences {
    async fn license_key(&self) -> PortResult<Option<LicenseKey>> {
        let _guard = self.lock.lock().await;
        let file = self.load().await?;
        Ok(file.license_key.as_deref().and_then(LicenseKey::new))
    }

    async fn set_license_key(&self, key: Option<&LicenseKey>) -> PortResult<()> {
        let key = key.map(|k| k.as_str().to_string());
        self.update(|file| file.license_key = key).await
    }

    async fn last_order(&self) -> PortResult<Option<OrderReceipt>> {
        let _guard = self.lock.lock().await;
        let file = self.load().await?;
        Ok(file.last_order.map(OrderReceipt::from))
    }

    async fn set_last_order(&self, order: Option<&OrderReceipt>) -> PortResult<()> {
        let order = order.map(StoredOrder::from);
        self.update(|file| file.last_order = order).await
    }
}
