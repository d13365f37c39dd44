//! Flash-backed persistence for config and choreography documents
//!
//! The upper megabyte of the 2MB part is split two ways:
//!
//! - Sixteen fixed 60KB slots hold choreography documents as raw JSON
//!   behind a small header. A document rewrite erases only its own
//!   slot.
//! - The last 64KB is a sequential-storage map partition carrying the
//!   system config and the name-to-slot index, both postcard encoded.
//!
//! Map access is async; the document slots use the flash peripheral's
//! blocking calls because the [`ChoreoStore`] trait is synchronous and
//! runs inside the conductor.

use alloc::string::String;
use alloc::vec;

use defmt::*;
use embassy_futures::block_on;
use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Flash, ERASE_SIZE};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use heapless::Vec;
use sequential_storage::cache::NoCache;
use sequential_storage::map;

use polychron_core::choreo::{
    json, ChoreoName, ChoreoStore, Choreography, StoreError, MAX_CHOREOGRAPHIES,
};
use polychron_core::config::SystemConfig;

/// Flash storage configuration
pub const FLASH_SIZE: usize = 2 * 1024 * 1024; // 2MB flash on the Pico

/// Map partition in the last 64KB of flash
pub const MAP_PARTITION_SIZE: usize = 64 * 1024;
pub const MAP_PARTITION_START: usize = FLASH_SIZE - MAP_PARTITION_SIZE;

/// Flash range for the map partition
pub const MAP_RANGE: core::ops::Range<u32> =
    (MAP_PARTITION_START as u32)..(FLASH_SIZE as u32);

/// Choreography document slots, directly below the map partition
pub const DOC_SLOT_SIZE: usize = 60 * 1024;
pub const DOC_SLOT_COUNT: usize = MAX_CHOREOGRAPHIES;
pub const DOC_REGION_START: usize = MAP_PARTITION_START - DOC_SLOT_COUNT * DOC_SLOT_SIZE;

/// Document slot header: magic, body length LE, body XOR, padding
const DOC_MAGIC: [u8; 4] = *b"PLYC";
const DOC_HEADER_LEN: usize = 12;

/// RP2040 flash programs in 256 byte pages
const PAGE_LEN: usize = 256;

/// Keys in the map partition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StorageKey {
    /// System configuration (binary postcard format)
    SystemConfig = 0,
    /// Document name-to-slot assignments (binary postcard format)
    DocIndex = 1,
}

impl StorageKey {
    /// Get the key as a byte value
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Create a key from a byte value
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(StorageKey::SystemConfig),
            1 => Some(StorageKey::DocIndex),
            _ => None,
        }
    }
}

impl map::Key for StorageKey {
    fn serialize_into(
        &self,
        buffer: &mut [u8],
    ) -> Result<usize, sequential_storage::map::SerializationError> {
        if buffer.is_empty() {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        buffer[0] = self.as_u8();
        Ok(1)
    }

    fn deserialize_from(
        buffer: &[u8],
    ) -> Result<(Self, usize), sequential_storage::map::SerializationError> {
        if buffer.is_empty() {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        match StorageKey::from_u8(buffer[0]) {
            Some(key) => Ok((key, 1)),
            None => Err(sequential_storage::map::SerializationError::InvalidFormat),
        }
    }
}

/// Flash-backed choreography store and config persistence.
pub struct FlashStore<'d> {
    flash: Flash<'d, FLASH, Async, FLASH_SIZE>,
    index: Vec<(ChoreoName, u8), DOC_SLOT_COUNT>,
}

impl<'d> FlashStore<'d> {
    pub fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl Channel>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
            index: Vec::new(),
        }
    }

    /// Load the slot index and the stored config. Call once at boot.
    pub async fn init(&mut self) -> SystemConfig {
        self.load_index().await;
        info!("{} choreographies indexed", self.index.len());
        self.load_config().await
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Load the name-to-slot index from the map partition.
    ///
    /// An unreadable map gets erased; that orphans slot bodies but
    /// keeps the master booting.
    async fn load_index(&mut self) {
        let mut data_buffer = [0u8; 2048];

        let result = map::fetch_item::<StorageKey, &[u8], _>(
            &mut self.flash,
            MAP_RANGE,
            &mut NoCache::new(),
            &mut data_buffer,
            &StorageKey::DocIndex,
        )
        .await;

        match result {
            Ok(Some(data)) => match postcard::from_bytes(data) {
                Ok(index) => self.index = index,
                Err(_) => warn!("Stored document index does not parse, starting empty"),
            },
            Ok(None) => info!("No document index stored"),
            Err(_) => {
                warn!("Map partition unreadable, erasing it");
                self.wipe_map();
            }
        }
    }

    fn wipe_map(&mut self) {
        if self
            .flash
            .blocking_erase(MAP_RANGE.start, MAP_RANGE.end)
            .is_err()
        {
            error!("Map partition erase failed");
        }
    }

    /// Load the stored config, falling back to defaults.
    pub async fn load_config(&mut self) -> SystemConfig {
        let mut data_buffer = [0u8; 2048];

        let result = map::fetch_item::<StorageKey, &[u8], _>(
            &mut self.flash,
            MAP_RANGE,
            &mut NoCache::new(),
            &mut data_buffer,
            &StorageKey::SystemConfig,
        )
        .await;

        match result {
            Ok(Some(data)) => match postcard::from_bytes(data) {
                Ok(config) => {
                    info!("Config restored from flash");
                    config
                }
                Err(_) => {
                    warn!("Stored config does not parse, using defaults");
                    SystemConfig::default()
                }
            },
            Ok(None) => {
                info!("No stored config, using defaults");
                SystemConfig::default()
            }
            Err(_) => {
                warn!("Config fetch failed, using defaults");
                SystemConfig::default()
            }
        }
    }

    /// Persist the config to the map partition.
    pub async fn save_config(&mut self, config: &SystemConfig) -> Result<(), StoreError> {
        let mut payload = [0u8; 1024];
        let used: &[u8] =
            postcard::to_slice(config, &mut payload).map_err(|_| StoreError::Io)?;

        let mut data_buffer = [0u8; 2048];
        map::store_item(
            &mut self.flash,
            MAP_RANGE,
            &mut NoCache::new(),
            &mut data_buffer,
            &StorageKey::SystemConfig,
            &used,
        )
        .await
        .map_err(|_| StoreError::Io)
    }

    async fn store_index(&mut self) -> Result<(), StoreError> {
        let mut payload = [0u8; 1024];
        let used: &[u8] =
            postcard::to_slice(&self.index, &mut payload).map_err(|_| StoreError::Io)?;

        let mut data_buffer = [0u8; 2048];
        map::store_item(
            &mut self.flash,
            MAP_RANGE,
            &mut NoCache::new(),
            &mut data_buffer,
            &StorageKey::DocIndex,
            &used,
        )
        .await
        .map_err(|_| StoreError::Io)
    }

    /// Lowest slot number the index does not claim.
    fn free_slot(&self) -> Option<u8> {
        (0..DOC_SLOT_COUNT as u8).find(|slot| !self.index.iter().any(|(_, s)| s == slot))
    }

    fn read_doc(&mut self, slot: u8) -> Result<String, StoreError> {
        let base = (DOC_REGION_START + slot as usize * DOC_SLOT_SIZE) as u32;

        let mut header = [0u8; DOC_HEADER_LEN];
        self.flash
            .blocking_read(base, &mut header)
            .map_err(|_| StoreError::Io)?;
        if header[0..4] != DOC_MAGIC {
            return Err(StoreError::Corrupt);
        }
        let len = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;
        if len > DOC_SLOT_SIZE - DOC_HEADER_LEN {
            return Err(StoreError::Corrupt);
        }

        let mut body = vec![0u8; len];
        self.flash
            .blocking_read(base + DOC_HEADER_LEN as u32, &mut body)
            .map_err(|_| StoreError::Io)?;
        let check = body.iter().fold(0u8, |acc, b| acc ^ b);
        if check != header[8] {
            return Err(StoreError::Corrupt);
        }

        String::from_utf8(body).map_err(|_| StoreError::Corrupt)
    }

    fn write_doc(&mut self, slot: u8, body: &[u8]) -> Result<(), StoreError> {
        if body.len() > DOC_SLOT_SIZE - DOC_HEADER_LEN {
            return Err(StoreError::Full);
        }
        let base = (DOC_REGION_START + slot as usize * DOC_SLOT_SIZE) as u32;

        let total = DOC_HEADER_LEN + body.len();
        let erase_len = total.div_ceil(ERASE_SIZE) * ERASE_SIZE;
        self.flash
            .blocking_erase(base, base + erase_len as u32)
            .map_err(|_| StoreError::Io)?;

        let mut header = [0xFFu8; DOC_HEADER_LEN];
        header[0..4].copy_from_slice(&DOC_MAGIC);
        header[4..8].copy_from_slice(&(body.len() as u32).to_le_bytes());
        header[8] = body.iter().fold(0u8, |acc, b| acc ^ b);

        // Writes go out as whole 256 byte pages; the first one carries
        // the header
        let mut page = [0xFFu8; PAGE_LEN];
        page[..DOC_HEADER_LEN].copy_from_slice(&header);
        let first = (PAGE_LEN - DOC_HEADER_LEN).min(body.len());
        page[DOC_HEADER_LEN..DOC_HEADER_LEN + first].copy_from_slice(&body[..first]);
        self.flash
            .blocking_write(base, &page)
            .map_err(|_| StoreError::Io)?;

        let mut offset = PAGE_LEN;
        let mut written = first;
        while written < body.len() {
            let chunk = (body.len() - written).min(PAGE_LEN);
            let mut page = [0xFFu8; PAGE_LEN];
            page[..chunk].copy_from_slice(&body[written..written + chunk]);
            self.flash
                .blocking_write(base + offset as u32, &page)
                .map_err(|_| StoreError::Io)?;
            offset += PAGE_LEN;
            written += chunk;
        }
        Ok(())
    }
}

impl<'d> ChoreoStore for FlashStore<'d> {
    fn list(&mut self) -> Vec<ChoreoName, MAX_CHOREOGRAPHIES> {
        self.index.iter().map(|(name, _)| name.clone()).collect()
    }

    fn load(&mut self, name: &str) -> Result<Choreography, StoreError> {
        let slot = self
            .index
            .iter()
            .find(|(key, _)| key.as_str() == name)
            .map(|(_, slot)| *slot)
            .ok_or(StoreError::NotFound)?;
        let body = self.read_doc(slot)?;
        json::from_json(&body)
    }

    fn save(&mut self, choreo: &Choreography) -> Result<(), StoreError> {
        let body = json::to_json(choreo)?;

        let existing = self
            .index
            .iter()
            .find(|(key, _)| key.as_str() == choreo.name.as_str())
            .map(|(_, slot)| *slot);
        let slot = match existing {
            Some(slot) => slot,
            None => self.free_slot().ok_or(StoreError::Full)?,
        };

        // Body lands on flash before the index points at it
        self.write_doc(slot, body.as_bytes())?;
        drop(body);

        if existing.is_none() {
            self.index
                .push((choreo.name.clone(), slot))
                .map_err(|_| StoreError::Full)?;
            block_on(self.store_index())?;
        }
        debug!("Stored document in slot {}", slot);
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<(), StoreError> {
        let pos = self
            .index
            .iter()
            .position(|(key, _)| key.as_str() == name)
            .ok_or(StoreError::NotFound)?;
        self.index.remove(pos);
        block_on(self.store_index())
    }
}
