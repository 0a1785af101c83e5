//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`StoragePort`].  The only client is the boot counter.
//!
//! - **`espidf`**: `EspNvs` on the default NVS partition, one namespace
//!   handle opened per call.  Commits are atomic.
//! - **host**: an in-memory map keyed by `namespace::key`.

use crate::app::ports::{StorageError, StoragePort};
use log::info;

#[cfg(not(feature = "espidf"))]
use std::collections::HashMap;

#[cfg(feature = "espidf")]
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};

pub struct NvsAdapter {
    #[cfg(feature = "espidf")]
    partition: EspDefaultNvsPartition,
    #[cfg(not(feature = "espidf"))]
    store: HashMap<String, Vec<u8>>,
}

impl NvsAdapter {
    /// Take the default NVS partition.  ESP-IDF erases and re-initialises
    /// the partition itself on a version mismatch.
    #[cfg(feature = "espidf")]
    pub fn new(partition: EspDefaultNvsPartition) -> Self {
        info!("NvsAdapter: ESP-IDF NVS ready");
        Self { partition }
    }

    /// In-memory backend for host builds.
    #[cfg(not(feature = "espidf"))]
    pub fn new() -> Self {
        info!("NvsAdapter: simulation backend");
        Self {
            store: HashMap::new(),
        }
    }

    #[cfg(feature = "espidf")]
    fn open(&self, namespace: &str, write: bool) -> Result<EspNvs<NvsDefault>, StorageError> {
        EspNvs::new(self.partition.clone(), namespace, write).map_err(|e| {
            log::warn!("NvsAdapter: open '{}' failed: {}", namespace, e);
            StorageError::IoError
        })
    }

    #[cfg(not(feature = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }
}

#[cfg(not(feature = "espidf"))]
impl Default for NvsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        #[cfg(not(feature = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            match self.store.get(&composite) {
                Some(data) => {
                    let len = data.len().min(buf.len());
                    buf[..len].copy_from_slice(&data[..len]);
                    Ok(len)
                }
                None => Err(StorageError::NotFound),
            }
        }

        #[cfg(feature = "espidf")]
        {
            let nvs = self.open(namespace, false)?;
            match nvs.get_raw(key, buf) {
                Ok(Some(data)) => Ok(data.len()),
                Ok(None) => Err(StorageError::NotFound),
                Err(_) => Err(StorageError::IoError),
            }
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        #[cfg(not(feature = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.insert(composite, data.to_vec());
            Ok(())
        }

        #[cfg(feature = "espidf")]
        {
            let mut nvs = self.open(namespace, true)?;
            nvs.set_raw(key, data)
                .map(|_| ())
                .map_err(|_| StorageError::IoError)
        }
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        #[cfg(not(feature = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.remove(&composite);
            Ok(())
        }

        #[cfg(feature = "espidf")]
        {
            let mut nvs = self.open(namespace, true)?;
            nvs.remove(key)
                .map(|_| ())
                .map_err(|_| StorageError::IoError)
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        #[cfg(not(feature = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.contains_key(&composite)
        }

        #[cfg(feature = "espidf")]
        {
            self.open(namespace, false)
                .and_then(|nvs| nvs.contains(key).map_err(|_| StorageError::IoError))
                .unwrap_or(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::BootCounter;

    #[test]
    fn storage_round_trip() {
        let mut nvs = NvsAdapter::new();
        let data = b"hello NVS";
        nvs.write("test_ns", "greeting", data).unwrap();
        assert!(nvs.exists("test_ns", "greeting"));

        let mut buf = [0u8; 64];
        let len = nvs.read("test_ns", "greeting", &mut buf).unwrap();
        assert_eq!(&buf[..len], data);

        nvs.delete("test_ns", "greeting").unwrap();
        assert!(!nvs.exists("test_ns", "greeting"));
    }

    #[test]
    fn storage_read_missing_key() {
        let nvs = NvsAdapter::new();
        let mut buf = [0u8; 64];
        assert_eq!(
            nvs.read("ns", "nope", &mut buf),
            Err(StorageError::NotFound)
        );
    }

    #[test]
    fn namespace_isolation() {
        let mut nvs = NvsAdapter::new();
        nvs.write("ns_a", "key", b"alpha").unwrap();
        nvs.write("ns_b", "key", b"bravo").unwrap();

        let mut buf = [0u8; 64];
        let len = nvs.read("ns_a", "key", &mut buf).unwrap();
        assert_eq!(&buf[..len], b"alpha");

        let len = nvs.read("ns_b", "key", &mut buf).unwrap();
        assert_eq!(&buf[..len], b"bravo");
    }

    #[test]
    fn boot_counter_persists_in_adapter() {
        let mut nvs = NvsAdapter::new();
        BootCounter::increment(&mut nvs).unwrap();
        BootCounter::increment(&mut nvs).unwrap();
        assert_eq!(BootCounter::load(&nvs), Ok(2));
    }
}
