//! Notification formatting and dispatch.
//!
//! The dispatcher owns the message templates and the delivery attempt. Mail
//! failures are soft: they are logged and counted by callers, never raised.

mod mailer;

#[cfg(test)]
pub use mailer::RecordingMailer;
pub use mailer::{MailTransport, SmtpMailer};

use crate::db::{ClassDetail, ClubDbManager, EventKind, UserRecord};
use std::sync::Arc;
use tracing::{error, info};

pub struct NotificationDispatcher {
    mailer: Arc<dyn MailTransport>,
    from_address: String,
}

impl NotificationDispatcher {
    pub fn new(mailer: Arc<dyn MailTransport>, from_address: String) -> Self {
        Self {
            mailer,
            from_address,
        }
    }

    /// Formats and attempts delivery of one notification email.
    ///
    /// On success, the backing notification row (when supplied) is marked
    /// sent, once. Returns whether delivery succeeded; there are no retries.
    pub fn dispatch(
        &self,
        db: &ClubDbManager,
        user: &UserRecord,
        kind: EventKind,
        class: Option<&ClassDetail>,
        notification_id: Option<i64>,
    ) -> bool {
        let (subject, body) = render_message(user, kind, class);

        info!(
            "Sending {} notification to {}",
            kind.as_str(),
            user.email
        );
        match self
            .mailer
            .send(&subject, &body, &self.from_address, &[user.email.clone()])
        {
            Ok(()) => {
                if let Some(id) = notification_id {
                    match db.mark_notification_sent(id) {
                        Ok(true) => {}
                        Ok(false) => {
                            info!("Notification {id} was already marked sent");
                        }
                        Err(e) => {
                            error!("Failed to record delivery of notification {id}: {e}");
                        }
                    }
                }
                true
            }
            Err(e) => {
                error!(
                    "Failed to send {} notification to {}: {e}",
                    kind.as_str(),
                    user.email
                );
                false
            }
        }
    }
}

fn render_message(user: &UserRecord, kind: EventKind, class: Option<&ClassDetail>) -> (String, String) {
    let date = class
        .map(|c| c.class_date.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    let time = class
        .map(|c| c.start_time.format("%H:%M").to_string())
        .unwrap_or_else(|| "N/A".to_string());

    match kind {
        EventKind::Confirmation => {
            let price = class
                .map(|c| format!("${}", c.price))
                .unwrap_or_else(|| "N/A".to_string());
            let instructor = class
                .map(|c| c.instructor_name.clone())
                .unwrap_or_else(|| "N/A".to_string());
            let training = class
                .and_then(|c| c.training_name.as_deref())
                .map(|name| format!("\nTraining: {name}"))
                .unwrap_or_default();
            (
                "Padel class confirmed".to_string(),
                format!(
                    "Hi {},\n\n\
                     Your padel class has been confirmed.\n\n\
                     Date: {date}\n\
                     Time: {time}\n\
                     Price: {price}\n\
                     Instructor: {instructor}{training}\n\n\
                     See you on the court!\n\n\
                     The Padel Club team",
                    user.first_name
                ),
            )
        }
        EventKind::Cancellation => (
            "Padel class cancelled".to_string(),
            format!(
                "Hi {},\n\n\
                 We are sorry to let you know that your padel class has been cancelled.\n\n\
                 Date: {date}\n\
                 Time: {time}\n\n\
                 We will contact you soon to reschedule.\n\n\
                 The Padel Club team",
                user.first_name
            ),
        ),
        EventKind::Reminder => (
            "Reminder: upcoming padel class".to_string(),
            format!(
                "Hi {},\n\n\
                 Reminder: you have a padel class coming up.\n\n\
                 Date: {date}\n\
                 Time: {time}\n\n\
                 Don't miss it!\n\n\
                 The Padel Club team",
                user.first_name
            ),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewUser, Role};
    use chrono::{NaiveDate, NaiveTime};

    fn student() -> UserRecord {
        UserRecord {
            user_id: 1,
            username: "ana".to_string(),
            role: Role::Student,
            first_name: "Ana".to_string(),
            last_name: "Diaz".to_string(),
            email: "ana@example.com".to_string(),
            phone: String::new(),
            skill_level: 4,
        }
    }

    fn class_detail(training: Option<&str>) -> ClassDetail {
        ClassDetail {
            class_id: 7,
            class_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            price: 15000,
            instructor_name: "Marta Ruiz".to_string(),
            training_name: training.map(str::to_string),
        }
    }

    #[test]
    fn test_confirmation_message_contents() {
        let (subject, body) = render_message(
            &student(),
            EventKind::Confirmation,
            Some(&class_detail(Some("Tactics"))),
        );
        assert_eq!(subject, "Padel class confirmed");
        assert!(body.contains("Hi Ana"));
        assert!(body.contains("Date: 2024-06-01"));
        assert!(body.contains("Time: 18:00"));
        assert!(body.contains("Price: $15000"));
        assert!(body.contains("Instructor: Marta Ruiz"));
        assert!(body.contains("Training: Tactics"));
    }

    #[test]
    fn test_confirmation_message_without_training_line() {
        let (_, body) = render_message(
            &student(),
            EventKind::Confirmation,
            Some(&class_detail(None)),
        );
        assert!(!body.contains("Training:"));
    }

    #[test]
    fn test_cancellation_without_class_uses_placeholders() {
        let (subject, body) = render_message(&student(), EventKind::Cancellation, None);
        assert_eq!(subject, "Padel class cancelled");
        assert!(body.contains("Date: N/A"));
        assert!(body.contains("Time: N/A"));
    }

    #[test]
    fn test_dispatch_marks_notification_sent_once() {
        let db = crate::db::ClubDbManager::new(":memory:");
        let user_id = db
            .create_user(&NewUser {
                username: "ana",
                role: Role::Student,
                first_name: "Ana",
                last_name: "",
                email: "ana@example.com",
                phone: "",
                skill_level: 4,
                password_hash: "s$h",
            })
            .unwrap();
        let user = db.get_user(user_id).unwrap().unwrap();
        let notification = db
            .create_notification(user_id, EventKind::Reminder, None)
            .unwrap();

        let mailer = Arc::new(RecordingMailer::new());
        let dispatcher = NotificationDispatcher::new(mailer.clone(), "club@example.com".to_string());

        assert!(dispatcher.dispatch(&db, &user, EventKind::Reminder, None, Some(notification)));
        let record = db.get_notification(notification).unwrap().unwrap();
        assert!(record.sent);
        assert!(record.sent_at.is_some());
        assert_eq!(mailer.sent_count(), 1);
        assert_eq!(mailer.sent.lock().unwrap()[0].to, vec!["ana@example.com"]);
    }

    #[test]
    fn test_dispatch_failure_is_soft_and_leaves_row_unsent() {
        let db = crate::db::ClubDbManager::new(":memory:");
        let user_id = db
            .create_user(&NewUser {
                username: "ben",
                role: Role::Student,
                first_name: "Ben",
                last_name: "",
                email: "ben@example.com",
                phone: "",
                skill_level: 2,
                password_hash: "s$h",
            })
            .unwrap();
        let user = db.get_user(user_id).unwrap().unwrap();
        let notification = db
            .create_notification(user_id, EventKind::Confirmation, None)
            .unwrap();

        let mailer = Arc::new(RecordingMailer::new());
        mailer.reject_recipient("ben@example.com");
        let dispatcher = NotificationDispatcher::new(mailer.clone(), "club@example.com".to_string());

        assert!(!dispatcher.dispatch(&db, &user, EventKind::Confirmation, None, Some(notification)));
        let record = db.get_notification(notification).unwrap().unwrap();
        assert!(!record.sent);
        assert!(record.sent_at.is_none());
        assert_eq!(mailer.sent_count(), 0);
    }
}
