//! RegistryStore — in-memory device and action state.
//!
//! Single source of truth for the fleet. Device records, action records,
//! and the action id counter all live behind one coarse mutex; every
//! operation holds the lock for its full duration, which makes each one
//! atomic and linearizable with respect to every other. Accessors hand
//! out copies only, so no caller can observe a mutation in progress.
//!
//! Nothing sleeps or performs I/O under the lock — contention couples
//! unrelated devices, acceptable at registry cardinality.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use crate::error::{RegistryError, RegistryResult};
use crate::types::*;

#[derive(Default)]
struct Inner {
    devices: HashMap<DeviceId, DeviceRecord>,
    actions: HashMap<ActionId, ActionRecord>,
    /// Strictly increasing; combined with a clock reading for action ids.
    action_counter: u64,
}

/// Thread-safe registry store.
///
/// `Clone` hands out another handle to the same shared state, so the
/// store can be shared across request handlers and executor tasks.
#[derive(Clone, Default)]
pub struct RegistryStore {
    inner: Arc<Mutex<Inner>>,
}

impl RegistryStore {
    /// Create an empty registry store.
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> MutexGuard<'_, Inner> {
        // No operation leaves the maps half-updated, so a poisoned
        // lock still guards consistent state.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Devices ───────────────────────────────────────────────────

    /// Register a new device under a caller-supplied id.
    ///
    /// The device starts `Idle` with empty metadata. Fails with
    /// `AlreadyExists` if the id is taken; a failed call leaves the
    /// store untouched.
    pub fn register_device(&self, device_id: &str) -> RegistryResult<DeviceRecord> {
        let mut inner = self.locked();
        if inner.devices.contains_key(device_id) {
            return Err(RegistryError::AlreadyExists(device_id.to_string()));
        }

        let record = DeviceRecord {
            device_id: device_id.to_string(),
            status: DeviceStatus::Idle,
            metadata: String::new(),
            last_seen: epoch_secs(),
        };
        inner.devices.insert(device_id.to_string(), record.clone());
        info!(%device_id, "device registered");
        Ok(record)
    }

    /// Overwrite a device's status directly.
    ///
    /// Administrative override, independent of the action lifecycle.
    pub fn set_device_status(
        &self,
        device_id: &str,
        status: DeviceStatus,
    ) -> RegistryResult<DeviceRecord> {
        let mut inner = self.locked();
        let record = inner
            .devices
            .get_mut(device_id)
            .ok_or_else(|| RegistryError::NotFound(device_id.to_string()))?;

        record.status = status;
        record.last_seen = epoch_secs();
        debug!(%device_id, ?status, "device status set");
        Ok(record.clone())
    }

    /// Get a copy of a device record.
    pub fn get_device(&self, device_id: &str) -> RegistryResult<DeviceRecord> {
        let inner = self.locked();
        inner
            .devices
            .get(device_id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(device_id.to_string()))
    }

    /// Snapshot of every device record. No ordering guarantee.
    pub fn list_devices(&self) -> Vec<DeviceRecord> {
        let inner = self.locked();
        inner.devices.values().cloned().collect()
    }

    // ── Actions ───────────────────────────────────────────────────

    /// Create an action against a device and return its generated id.
    ///
    /// The action starts `Queued`. If the device exists it is flipped to
    /// `Updating`; if it does not, the action is created anyway — device
    /// validation is the caller's responsibility, not the store's.
    pub fn create_action(
        &self,
        device_id: &str,
        action_type: i32,
        params: HashMap<String, String>,
    ) -> ActionId {
        let mut inner = self.locked();
        let action_id = make_action_id(&mut inner);
        let now = epoch_secs();

        let record = ActionRecord {
            action_id: action_id.clone(),
            device_id: device_id.to_string(),
            action_type,
            status: ActionStatus::Queued,
            status_message: String::new(),
            started_at: now,
            finished_at: None,
            params,
        };
        inner.actions.insert(action_id.clone(), record);

        if let Some(device) = inner.devices.get_mut(device_id) {
            device.status = DeviceStatus::Updating;
            device.last_seen = now;
        }

        info!(%action_id, %device_id, action_type, "action created");
        action_id
    }

    /// Get a copy of an action record.
    pub fn get_action(&self, action_id: &str) -> RegistryResult<ActionRecord> {
        let inner = self.locked();
        inner
            .actions
            .get(action_id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(action_id.to_string()))
    }

    /// Record an action status report and cascade to the owning device.
    ///
    /// Unknown action ids are a silent no-op so a stray late report
    /// cannot fail the reporter. Otherwise the action's status, message,
    /// and finish time are overwritten, and the referenced device (if it
    /// exists) moves to `Idle` on `Completed` and `Error` on every
    /// other status, `Running` included. Reporters must therefore send
    /// `Running` before any terminal status, and the device reads
    /// `Error` while an action is in flight.
    pub fn update_action_status(&self, action_id: &str, status: ActionStatus, message: &str) {
        let mut inner = self.locked();
        let Some(action) = inner.actions.get_mut(action_id) else {
            warn!(%action_id, "status report for unknown action, ignoring");
            return;
        };

        let now = epoch_secs();
        action.status = status;
        action.status_message = message.to_string();
        action.finished_at = Some(now);
        let device_id = action.device_id.clone();

        if let Some(device) = inner.devices.get_mut(&device_id) {
            device.status = if status == ActionStatus::Completed {
                DeviceStatus::Idle
            } else {
                DeviceStatus::Error
            };
            device.last_seen = now;
        }

        debug!(%action_id, %device_id, ?status, msg = message, "action status updated");
    }
}

/// Build a process-unique action id.
///
/// A nanosecond clock reading plus the strictly-increasing counter,
/// both read under the store lock, so concurrent creations can never
/// collide.
fn make_action_id(inner: &mut Inner) -> ActionId {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    inner.action_counter += 1;
    format!("{nanos:x}-{}", inner.action_counter)
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
