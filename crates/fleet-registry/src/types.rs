//! Domain types for the fleet registry.
//!
//! Devices and actions are the two entities the registry tracks. Both
//! are handed out by value only — the store owns the live records and
//! returns copies to callers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Unique identifier for a device, supplied by the caller at registration.
pub type DeviceId = String;

/// Unique identifier for an action, generated by the store at creation.
pub type ActionId = String;

// ── Device ────────────────────────────────────────────────────────

/// Lifecycle status of a fleet device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceStatus {
    Unknown,
    Idle,
    Busy,
    Offline,
    Maintenance,
    Updating,
    Recovering,
    Error,
}

/// A registered fleet device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceRecord {
    pub device_id: DeviceId,
    pub status: DeviceStatus,
    /// Opaque operator-supplied blob; not interpreted by the registry.
    pub metadata: String,
    /// Unix timestamp (seconds) of the last state-affecting operation.
    /// Never decreases across updates to the same record.
    pub last_seen: u64,
}

// ── Action ────────────────────────────────────────────────────────

/// Lifecycle status of an administrative action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

/// An administrative action requested against a device.
///
/// Once created, a record is never deleted; only its mutable fields
/// (status, message, finish time) change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionRecord {
    pub action_id: ActionId,
    /// The device this action targets. Existence is not enforced after
    /// creation — the device may have never been registered.
    pub device_id: DeviceId,
    /// Caller-supplied classification, opaque to the registry.
    pub action_type: i32,
    pub status: ActionStatus,
    /// Free-text outcome description; empty until the action leaves `Queued`.
    pub status_message: String,
    /// Unix timestamp (seconds) when the action was created.
    pub started_at: u64,
    /// Unix timestamp (seconds) of the last status report against this
    /// action; `None` until the first report arrives. The `Running`
    /// report sets it too, not just the terminal ones.
    pub finished_at: Option<u64>,
    /// Opaque caller-supplied parameters; last write wins per key.
    pub params: HashMap<String, String>,
}
