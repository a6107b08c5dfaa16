//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`] for the recipient table and alert settings.
//!
//! The config is stored as a single blob: a two-byte magic followed by the
//! `postcard` encoding of [`SystemConfig`].  A missing magic means the
//! partition has never held (or no longer holds) a valid config.
//!
//! - **`target_os = "espidf"`**: ESP-IDF NVS, committed per save.
//! - **`not(target_os = "espidf")`**: in-memory map for tests.

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::{SystemConfig, is_valid_number};
use log::{info, warn};

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(not(target_os = "espidf"))]
const CONFIG_NAMESPACE: &str = "smsalert";
#[cfg(not(target_os = "espidf"))]
const CONFIG_KEY: &str = "syscfg";

/// Leading bytes of every stored config blob.
const CONFIG_MAGIC: u16 = 0x5341;

#[cfg(target_os = "espidf")]
const MAX_BLOB_SIZE: usize = 512;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: HashMap<String, Vec<u8>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// On a full or outdated partition the flash is erased and
    /// re-initialised; anything else unrecoverable is an `IoError`.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any other NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK || unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: HashMap::new(),
        })
    }

    /// Load the stored config, replacing a missing or corrupt one with
    /// defaults (which are saved straight away).
    pub fn load_or_default(&mut self) -> SystemConfig {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                warn!("NvsAdapter: {}, setting defaults", e);
                let config = SystemConfig::default();
                if let Err(e) = self.save(&config) {
                    warn!("NvsAdapter: could not store defaults: {}", e);
                }
                config
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// Overwrite the raw blob (simulation only), e.g. to model corruption.
    #[cfg(not(target_os = "espidf"))]
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.store
            .insert(Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY), bytes.to_vec());
    }

    fn read_blob(&self) -> Result<Vec<u8>, ConfigError> {
        #[cfg(not(target_os = "espidf"))]
        {
            self.store
                .get(&Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY))
                .cloned()
                .ok_or(ConfigError::NotFound)
        }

        #[cfg(target_os = "espidf")]
        {
            Self::with_nvs_handle(false, |handle| {
                let mut size: usize = 0;
                // First call: get size
                let ret = unsafe {
                    nvs_get_blob(handle, c"syscfg".as_ptr(), core::ptr::null_mut(), &mut size)
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                if size == 0 || size > MAX_BLOB_SIZE {
                    return Err(ESP_ERR_NVS_INVALID_LENGTH);
                }
                let mut buf = vec![0u8; size];
                let ret = unsafe {
                    nvs_get_blob(handle, c"syscfg".as_ptr(), buf.as_mut_ptr().cast(), &mut size)
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(buf)
            })
            .map_err(|e| {
                if e == ESP_ERR_NVS_NOT_FOUND {
                    ConfigError::NotFound
                } else {
                    warn!("NvsAdapter: NVS read error {}", e);
                    ConfigError::IoError
                }
            })
        }
    }

    fn write_blob(&mut self, bytes: &[u8]) -> Result<(), ConfigError> {
        #[cfg(not(target_os = "espidf"))]
        {
            self.write_raw(bytes);
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            Self::with_nvs_handle(true, |handle| {
                let ret = unsafe {
                    nvs_set_blob(handle, c"syscfg".as_ptr(), bytes.as_ptr().cast(), bytes.len())
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            })
            .map_err(|e| {
                warn!("NvsAdapter: NVS write error {}", e);
                ConfigError::IoError
            })
        }
    }

    /// Open the config namespace, run `f` with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(c"smsalert".as_ptr(), mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }
}

fn validate_config(cfg: &SystemConfig) -> Result<(), ConfigError> {
    if cfg.resend_delay_secs == 0 {
        return Err(ConfigError::ValidationFailed("resend_delay_secs must be > 0"));
    }
    for recipient in &cfg.recipients {
        if !recipient.is_empty() && !is_valid_number(&recipient.number) {
            return Err(ConfigError::ValidationFailed(
                "recipient number must be digits with optional leading +",
            ));
        }
    }
    Ok(())
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let blob = self.read_blob()?;
        let payload = match blob.split_first_chunk::<2>() {
            Some((magic, payload)) if u16::from_le_bytes(*magic) == CONFIG_MAGIC => payload,
            _ => return Err(ConfigError::Corrupted),
        };
        let cfg: SystemConfig = postcard::from_bytes(payload).map_err(|_| ConfigError::Corrupted)?;
        validate_config(&cfg).map_err(|_| ConfigError::Corrupted)?;
        info!("NvsAdapter: loaded config ({} bytes)", blob.len());
        Ok(cfg)
    }

    fn save(&mut self, config: &SystemConfig) -> Result<(), ConfigError> {
        validate_config(config)?;

        let mut blob = CONFIG_MAGIC.to_le_bytes().to_vec();
        let payload = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        blob.extend_from_slice(&payload);
        self.write_blob(&blob)?;
        info!("NvsAdapter: config saved ({} bytes)", blob.len());
        Ok(())
    }
}
