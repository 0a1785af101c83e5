//! Boot counter and runtime diagnostics.
//!
//! The boot counter is the only value the router persists.  It lives in the
//! "diag" namespace as a postcard-encoded [`BootRecord`] and is bumped once
//! per power-up, before the control loop starts.

use serde::{Deserialize, Serialize};

use crate::app::ports::{StorageError, StoragePort};

const DIAG_NAMESPACE: &str = "diag";
const BOOT_KEY: &str = "boots";

/// Persisted form of the counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootRecord {
    pub count: u32,
}

/// Storage-backed boot counter.
pub struct BootCounter;

impl BootCounter {
    /// Read the stored count.  A missing key means this is the first boot.
    pub fn load(nvs: &dyn StoragePort) -> Result<u32, StorageError> {
        let mut buf = [0u8; 8];
        match nvs.read(DIAG_NAMESPACE, BOOT_KEY, &mut buf) {
            Ok(len) => postcard::from_bytes::<BootRecord>(&buf[..len])
                .map(|rec| rec.count)
                .map_err(|_| StorageError::Corrupted),
            Err(StorageError::NotFound) => Ok(0),
            Err(e) => Err(e),
        }
    }

    /// Increment and persist.  Returns the new count.
    ///
    /// A corrupted record restarts the count from zero rather than
    /// blocking boot.
    pub fn increment(nvs: &mut dyn StoragePort) -> Result<u32, StorageError> {
        let previous = match Self::load(nvs) {
            Ok(n) => n,
            Err(StorageError::Corrupted) => {
                log::warn!("Boot counter corrupted, restarting from 0");
                0
            }
            Err(e) => return Err(e),
        };

        let record = BootRecord {
            count: previous.saturating_add(1),
        };
        let mut buf = [0u8; 8];
        let bytes = postcard::to_slice(&record, &mut buf).map_err(|_| StorageError::IoError)?;
        nvs.write(DIAG_NAMESPACE, BOOT_KEY, bytes)?;
        log::info!("Boot #{}", record.count);
        Ok(record.count)
    }
}
