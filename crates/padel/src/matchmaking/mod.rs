//! Waitlist grouping and the pairing/assignment workflow.
//!
//! Staff view pending waitlist demand grouped by slot, turn a group into a
//! confirmed class with a pairing, and manage individual class membership.
//! Every operation here takes the explicit [`StaffAuth`] capability; none of
//! them reads ambient request state.

mod error;
mod types;

pub use error::MatchmakingError;
pub use types::{
    AttachOutcome, CancelOutcome, ClassRequest, ConfirmOutcome, DetachOutcome, DispatchSummary,
    PairingOutcome, PairingRequest, SlotKey, WaitlistGroup,
};

use crate::auth::StaffAuth;
use crate::db::{ClassRecord, ClubDbManager, EventKind};
use crate::notify::NotificationDispatcher;
use tracing::{info, warn};

const MIN_PLAYERS: usize = 2;
const MAX_PLAYERS: usize = 4;

/// Groups all unassigned waitlist entries by (date, time, venue), ascending.
///
/// Pure read; ordering within a group is whatever the store returned.
pub fn group_pending_entries(db: &ClubDbManager) -> Result<Vec<WaitlistGroup>, MatchmakingError> {
    let entries = db.pending_entries()?;

    let mut groups: Vec<WaitlistGroup> = Vec::new();
    for entry in entries {
        let slot = SlotKey {
            date: entry.entry.entry_date,
            time: entry.entry.entry_time,
            venue_id: entry.entry.venue_id,
        };
        // Entries arrive sorted by slot, so a new slot starts a new group.
        match groups.last_mut() {
            Some(group) if group.slot == slot => group.entries.push(entry),
            _ => groups.push(WaitlistGroup {
                slot,
                entries: vec![entry],
            }),
        }
    }
    Ok(groups)
}

/// Turns a set of waiting students into a confirmed class with a pairing.
///
/// The class, pairing, membership, and waitlist back-references are written
/// as one atomic unit. Confirmation emails are then dispatched per student,
/// best-effort: an individual delivery failure is counted and reported but
/// never unwinds the created records.
pub fn create_pairing_from_waitlist(
    db: &ClubDbManager,
    dispatcher: &NotificationDispatcher,
    staff: &StaffAuth,
    request: &PairingRequest,
) -> Result<PairingOutcome, MatchmakingError> {
    let players = request.student_ids.len();
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&players) {
        return Err(MatchmakingError::validation(format!(
            "you must select between {MIN_PLAYERS} and {MAX_PLAYERS} players, got {players}"
        )));
    }

    let (class, pairing, entries_assigned) = db.create_class_with_pairing(
        staff.staff.user_id,
        request.date,
        request.time,
        request.venue_id,
        &request.description,
        request.price,
        &request.student_ids,
    )?;
    info!(
        "Created class {} with pairing {} for {players} players ({entries_assigned} waitlist entries assigned)",
        class.class_id, pairing.pairing_id
    );

    let notifications = notify_students(db, dispatcher, &class, &request.student_ids)?;
    Ok(PairingOutcome {
        class,
        pairing,
        entries_assigned,
        notifications,
    })
}

/// Creates a standalone, unconfirmed class; students are attached afterwards
/// via [`add_student_to_class`].
pub fn create_class(
    db: &ClubDbManager,
    staff: &StaffAuth,
    request: &ClassRequest,
) -> Result<ClassRecord, MatchmakingError> {
    if let Some(training_type_id) = request.training_type_id {
        if db.get_training_type(training_type_id)?.is_none() {
            return Err(MatchmakingError::not_found("training type"));
        }
    }
    let class = db.create_class(
        staff.staff.user_id,
        request.date,
        request.time,
        request.price,
        request.training_type_id,
        &request.description,
    )?;
    info!("Created class {} (unconfirmed)", class.class_id);
    Ok(class)
}

/// Marks a class confirmed and notifies every student in its pairing.
///
/// A class without a pairing is still confirmed, with zero notifications.
pub fn confirm_class(
    db: &ClubDbManager,
    dispatcher: &NotificationDispatcher,
    _staff: &StaffAuth,
    class_id: i64,
) -> Result<ConfirmOutcome, MatchmakingError> {
    if !db.confirm_class(class_id)? {
        return Err(MatchmakingError::not_found("class"));
    }

    let mut notifications = DispatchSummary::default();
    if let Some(pairing) = db.first_pairing_for_class(class_id)? {
        let members = db.pairing_members(pairing.pairing_id)?;
        let student_ids: Vec<i64> = members.iter().map(|m| m.user_id).collect();
        let class = db
            .get_class(class_id)?
            .ok_or_else(|| MatchmakingError::not_found("class"))?;
        notifications = notify_students(db, dispatcher, &class, &student_ids)?;
    }
    info!(
        "Confirmed class {class_id}: {} notifications sent, {} failed",
        notifications.sent, notifications.failed
    );
    Ok(ConfirmOutcome {
        class_id,
        notifications,
    })
}

/// Deletes a waitlist entry, then sends its student a cancellation notice.
///
/// The deletion stands even when the email cannot be delivered.
pub fn cancel_waitlist_entry(
    db: &ClubDbManager,
    dispatcher: &NotificationDispatcher,
    _staff: &StaffAuth,
    entry_id: i64,
) -> Result<CancelOutcome, MatchmakingError> {
    let entry = db
        .get_waitlist_entry(entry_id)?
        .ok_or_else(|| MatchmakingError::not_found("waitlist entry"))?;
    let student = db
        .get_user(entry.user_id)?
        .ok_or_else(|| MatchmakingError::not_found("student"))?;

    db.delete_waitlist_entry(entry_id)?;

    let notification_id = db.create_notification(student.user_id, EventKind::Cancellation, None)?;
    let delivered = dispatcher.dispatch(
        db,
        &student,
        EventKind::Cancellation,
        None,
        Some(notification_id),
    );
    if !delivered {
        warn!(
            "Waitlist entry {entry_id} cancelled but the notification email to {} failed",
            student.email
        );
    }
    Ok(CancelOutcome {
        entry_id,
        notification_delivered: delivered,
    })
}

/// Adds a student to a class, creating the pairing if the class has none.
///
/// Idempotent: adding a student who is already a member changes nothing and
/// reports `AlreadyInState`.
pub fn add_student_to_class(
    db: &ClubDbManager,
    _staff: &StaffAuth,
    class_id: i64,
    student_id: i64,
) -> Result<AttachOutcome, MatchmakingError> {
    let class = db
        .get_class(class_id)?
        .ok_or_else(|| MatchmakingError::not_found("class"))?;
    let student = db
        .get_student(student_id)?
        .ok_or_else(|| MatchmakingError::not_found("student"))?;

    let pairing = db.get_or_create_pairing(
        class.class_id,
        &format!("Pairing for class on {}", class.class_date),
    )?;
    if db.is_pairing_member(pairing.pairing_id, student.user_id)? {
        return Err(MatchmakingError::AlreadyInState {
            message: format!("{} is already in this class", student.first_name),
        });
    }

    db.add_pairing_member(pairing.pairing_id, student.user_id)?;
    let entries_assigned = db.assign_waitlist_for_student(
        student.user_id,
        class.class_date,
        class.start_time,
        class.class_id,
        pairing.pairing_id,
    )?;
    info!(
        "Added student {} to class {} ({entries_assigned} waitlist entries assigned)",
        student.user_id, class.class_id
    );
    Ok(AttachOutcome {
        class_id: class.class_id,
        pairing_id: pairing.pairing_id,
        student,
        entries_assigned,
    })
}

/// Removes a student from a class's pairing and releases their waitlist
/// entries tied to that class. Warns instead of failing when the student is
/// not a member.
pub fn remove_student_from_class(
    db: &ClubDbManager,
    _staff: &StaffAuth,
    class_id: i64,
    student_id: i64,
) -> Result<DetachOutcome, MatchmakingError> {
    let class = db
        .get_class(class_id)?
        .ok_or_else(|| MatchmakingError::not_found("class"))?;
    let student = db
        .get_user(student_id)?
        .ok_or_else(|| MatchmakingError::not_found("student"))?;

    let pairing = db.first_pairing_for_class(class.class_id)?;
    let is_member = match &pairing {
        Some(p) => db.is_pairing_member(p.pairing_id, student.user_id)?,
        None => false,
    };
    let Some(pairing) = pairing.filter(|_| is_member) else {
        return Err(MatchmakingError::AlreadyInState {
            message: format!("{} is not in this class", student.first_name),
        });
    };

    db.remove_pairing_member(pairing.pairing_id, student.user_id)?;
    let entries_released = db.release_waitlist_for_class(student.user_id, class.class_id)?;
    info!(
        "Removed student {} from class {} ({entries_released} waitlist entries released)",
        student.user_id, class.class_id
    );
    Ok(DetachOutcome {
        class_id: class.class_id,
        pairing_id: pairing.pairing_id,
        student,
        entries_released,
    })
}

/// Creates and dispatches one confirmation notification per student,
/// counting outcomes instead of failing.
fn notify_students(
    db: &ClubDbManager,
    dispatcher: &NotificationDispatcher,
    class: &ClassRecord,
    student_ids: &[i64],
) -> Result<DispatchSummary, MatchmakingError> {
    let detail = db.class_detail(class.class_id)?;
    let mut summary = DispatchSummary::default();
    for &student_id in student_ids {
        let Some(student) = db.get_user(student_id)? else {
            warn!("Student {student_id} vanished before notification; counting as failed");
            summary.failed += 1;
            continue;
        };
        let notification_id =
            db.create_notification(student.user_id, EventKind::Confirmation, Some(class.class_id))?;
        if dispatcher.dispatch(
            db,
            &student,
            EventKind::Confirmation,
            detail.as_ref(),
            Some(notification_id),
        ) {
            summary.sent += 1;
        } else {
            summary.failed += 1;
        }
    }
    Ok(summary)
}
