//! Shared process state: the dispatcher (and the store it wraps) plus the
//! persistence guard both the link task and the operator task serialize
//! through (`§5`'s "scheduling guard... if multiplexed").

use std::path::PathBuf;

use tokio::sync::Mutex;
use tracing::{error, info};

use crate::dispatcher::Dispatcher;
use crate::error::Result;

pub struct AppState {
    pub dispatcher: Dispatcher,
    pub data_dir: PathBuf,
    /// Held across `save_all`/`write_report` so the dispatcher's `Q` and an
    /// operator `quit` can never snapshot concurrently.
    save_lock: Mutex<()>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, data_dir: PathBuf) -> Self {
        Self {
            dispatcher,
            data_dir,
            save_lock: Mutex::new(()),
        }
    }

    pub fn load(data_dir: PathBuf) -> Result<Self> {
        let store = atm_store::persistence::primary::load_all(&data_dir)?;
        info!(accounts = store.len(), "loaded primary store");
        Ok(Self::new(Dispatcher::new(store), data_dir))
    }

    /// Snapshot the primary store and refresh the report view. Errors are
    /// logged, not propagated — a failed save should not crash the link
    /// loop or the operator console (`§4.6`/`§7`).
    pub async fn save(&self) {
        let _guard = self.save_lock.lock().await;
        if let Err(e) = atm_store::persistence::primary::save_all(&self.dispatcher.store, &self.data_dir) {
            error!(error = %e, "failed to save primary store");
        }
        if let Err(e) = atm_store::persistence::report::write_report(&self.dispatcher.store, &self.data_dir) {
            error!(error = %e, "failed to write report view");
        }
    }
}
