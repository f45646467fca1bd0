//! Request and outcome types for the matchmaking workflows.

use crate::db::{ClassRecord, PairingRecord, UserRecord, WaitlistEntryDetail};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Composite key a waitlist entry queues up for: when and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlotKey {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub venue_id: i64,
}

/// Unassigned waitlist entries sharing one slot.
#[derive(Debug, Clone, Serialize)]
pub struct WaitlistGroup {
    pub slot: SlotKey,
    pub entries: Vec<WaitlistEntryDetail>,
}

/// Per-student delivery outcome counts for one workflow operation.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DispatchSummary {
    pub sent: u32,
    pub failed: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PairingRequest {
    pub student_ids: Vec<i64>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub venue_id: i64,
    #[serde(default)]
    pub description: String,
    pub price: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassRequest {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub price: i64,
    #[serde(default)]
    pub description: String,
    pub training_type_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PairingOutcome {
    pub class: ClassRecord,
    pub pairing: PairingRecord,
    pub entries_assigned: usize,
    pub notifications: DispatchSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmOutcome {
    pub class_id: i64,
    pub notifications: DispatchSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelOutcome {
    pub entry_id: i64,
    /// Whether the cancellation email reached the transport.
    pub notification_delivered: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttachOutcome {
    pub class_id: i64,
    pub pairing_id: i64,
    pub student: UserRecord,
    pub entries_assigned: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetachOutcome {
    pub class_id: i64,
    pub pairing_id: i64,
    pub student: UserRecord,
    pub entries_released: usize,
}
