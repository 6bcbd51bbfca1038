//! One-shot asynchronous initialization.

use std::future::Future;

use crowdsource_common::AppResult;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Gate in front of an expensive, load-once dependency such as a map
/// provider.
///
/// The first caller runs the loader; callers arriving while it runs wait for
/// the same result; later callers get the stored value immediately. A failed
/// load is not stored, so the next caller tries again.
#[derive(Debug)]
pub struct LoadGate<T> {
    name: &'static str,
    cell: OnceCell<T>,
}

impl<T> LoadGate<T> {
    /// Create an unloaded gate.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            cell: OnceCell::new(),
        }
    }

    /// Create a gate that is already open.
    #[must_use]
    pub fn loaded(name: &'static str, value: T) -> Self {
        Self {
            name,
            cell: OnceCell::new_with(Some(value)),
        }
    }

    /// The loaded value, if any.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        self.cell.get()
    }

    /// Whether the value has been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// Wait for the value, running `load` if nobody has yet.
    pub async fn wait<F, Fut>(&self, load: F) -> AppResult<&T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        if let Some(value) = self.cell.get() {
            return Ok(value);
        }
        let name = self.name;
        self.cell
            .get_or_try_init(|| async move {
                debug!(gate = name, "Loading");
                let result = load().await;
                if let Err(err) = &result {
                    warn!(gate = name, error = %err, "Load failed");
                }
                result
            })
            .await
    }
}
