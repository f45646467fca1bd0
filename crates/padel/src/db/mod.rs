/// Database module for the club's scheduling and matchmaking state

mod types;

pub use types::{
    ClassDetail, ClassRecord, EventKind, NewTrainingType, NewUser, NewVenue, NotificationRecord,
    PairingRecord, Role, TrainingTypeRecord, UserRecord, VenueRecord, WaitlistEntryDetail,
    WaitlistEntryRecord,
};

use chrono::{NaiveDate, NaiveTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use std::sync::Mutex;

const SCHEMA_SQL: &str = include_str!("../../../../sql/init_club.sql");

pub struct ClubDbManager {
    db: Mutex<Connection>,
}

impl ClubDbManager {
    /// Creates a new ClubDbManager and initializes the database schema
    pub fn new(db_path: &str) -> Self {
        let conn = Connection::open(db_path).expect("Failed to open database");

        conn.pragma_update(None, "foreign_keys", true)
            .expect("Failed to enable foreign key enforcement");
        conn.execute_batch(SCHEMA_SQL)
            .expect("Failed to initialize database schema");

        Self {
            db: Mutex::new(conn),
        }
    }

    // ---- users -----------------------------------------------------------

    pub fn create_user(&self, user: &NewUser) -> Result<i64> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO users (username, role, first_name, last_name, email, phone, skill_level, password_hash)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user.username,
                user.role.as_str(),
                user.first_name,
                user.last_name,
                user.email,
                user.phone,
                user.skill_level,
                user.password_hash,
            ],
        )?;
        Ok(db.last_insert_rowid())
    }

    pub fn get_user(&self, user_id: i64) -> Result<Option<UserRecord>> {
        let db = self.db.lock().unwrap();
        db.query_row(
            "SELECT user_id, username, role, first_name, last_name, email, phone, skill_level
             FROM users WHERE user_id = ?1",
            [user_id],
            user_from_row,
        )
        .optional()
    }

    /// Gets a user by id, restricted to the student role.
    pub fn get_student(&self, user_id: i64) -> Result<Option<UserRecord>> {
        let db = self.db.lock().unwrap();
        db.query_row(
            "SELECT user_id, username, role, first_name, last_name, email, phone, skill_level
             FROM users WHERE user_id = ?1 AND role = 'student'",
            [user_id],
            user_from_row,
        )
        .optional()
    }

    pub fn username_taken(&self, username: &str) -> Result<bool> {
        let db = self.db.lock().unwrap();
        let count: i64 = db.query_row(
            "SELECT COUNT(*) FROM users WHERE LOWER(username) = LOWER(?1)",
            [username],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Looks up a user by username or email, case-insensitively, together with
    /// the stored password hash. On duplicates the lowest user id wins.
    pub fn find_user_credentials(&self, identifier: &str) -> Result<Option<(UserRecord, String)>> {
        let db = self.db.lock().unwrap();
        db.query_row(
            "SELECT user_id, username, role, first_name, last_name, email, phone, skill_level, password_hash
             FROM users
             WHERE LOWER(username) = LOWER(?1) OR LOWER(email) = LOWER(?1)
             ORDER BY user_id
             LIMIT 1",
            [identifier],
            |row| Ok((user_from_row(row)?, row.get::<_, String>(8)?)),
        )
        .optional()
    }

    // ---- sessions --------------------------------------------------------

    pub fn create_session(&self, user_id: i64, token: &str) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO sessions (token, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![token, user_id, Utc::now().naive_utc()],
        )?;
        Ok(())
    }

    pub fn session_user(&self, token: &str) -> Result<Option<UserRecord>> {
        let db = self.db.lock().unwrap();
        db.query_row(
            "SELECT u.user_id, u.username, u.role, u.first_name, u.last_name, u.email, u.phone, u.skill_level
             FROM sessions s
             JOIN users u ON u.user_id = s.user_id
             WHERE s.token = ?1",
            [token],
            user_from_row,
        )
        .optional()
    }

    // ---- venues ----------------------------------------------------------

    /// Inserts a venue. The `indoor` flag is derived from the indoor court
    /// count here, never taken from the caller.
    pub fn create_venue(&self, venue: &NewVenue) -> Result<VenueRecord> {
        let indoor = venue.indoor_courts > 0;
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO venues (name, indoor_courts, outdoor_courts, indoor, surface, hourly_rate)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                venue.name,
                venue.indoor_courts,
                venue.outdoor_courts,
                indoor,
                venue.surface,
                venue.hourly_rate,
            ],
        )?;
        let venue_id = db.last_insert_rowid();
        db.query_row(
            "SELECT venue_id, name, indoor_courts, outdoor_courts, indoor, surface, hourly_rate
             FROM venues WHERE venue_id = ?1",
            [venue_id],
            venue_from_row,
        )
    }

    /// Updates a venue, recomputing the `indoor` flag from the court counts.
    pub fn update_venue(&self, venue: &VenueRecord) -> Result<VenueRecord> {
        let indoor = venue.indoor_courts > 0;
        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE venues
             SET name = ?2, indoor_courts = ?3, outdoor_courts = ?4, indoor = ?5, surface = ?6, hourly_rate = ?7
             WHERE venue_id = ?1",
            params![
                venue.venue_id,
                venue.name,
                venue.indoor_courts,
                venue.outdoor_courts,
                indoor,
                venue.surface,
                venue.hourly_rate,
            ],
        )?;
        db.query_row(
            "SELECT venue_id, name, indoor_courts, outdoor_courts, indoor, surface, hourly_rate
             FROM venues WHERE venue_id = ?1",
            [venue.venue_id],
            venue_from_row,
        )
    }

    pub fn get_venue(&self, venue_id: i64) -> Result<Option<VenueRecord>> {
        let db = self.db.lock().unwrap();
        db.query_row(
            "SELECT venue_id, name, indoor_courts, outdoor_courts, indoor, surface, hourly_rate
             FROM venues WHERE venue_id = ?1",
            [venue_id],
            venue_from_row,
        )
        .optional()
    }

    // ---- training types --------------------------------------------------

    pub fn create_training_type(&self, training: &NewTrainingType) -> Result<i64> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO training_types (name, category, duration_min, min_skill, max_skill)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                training.name,
                training.category,
                training.duration_min,
                training.min_skill,
                training.max_skill,
            ],
        )?;
        Ok(db.last_insert_rowid())
    }

    pub fn get_training_type(&self, training_type_id: i64) -> Result<Option<TrainingTypeRecord>> {
        let db = self.db.lock().unwrap();
        db.query_row(
            "SELECT training_type_id, name, category, duration_min, min_skill, max_skill
             FROM training_types WHERE training_type_id = ?1",
            [training_type_id],
            |row| {
                Ok(TrainingTypeRecord {
                    training_type_id: row.get(0)?,
                    name: row.get(1)?,
                    category: row.get(2)?,
                    duration_min: row.get(3)?,
                    min_skill: row.get(4)?,
                    max_skill: row.get(5)?,
                })
            },
        )
        .optional()
    }

    // ---- waitlist --------------------------------------------------------

    pub fn create_waitlist_entry(
        &self,
        user_id: i64,
        venue_id: i64,
        entry_date: NaiveDate,
        entry_time: NaiveTime,
        description: &str,
    ) -> Result<i64> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO waitlist (description, venue_id, user_id, entry_date, entry_time)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![description, venue_id, user_id, entry_date, entry_time],
        )?;
        Ok(db.last_insert_rowid())
    }

    pub fn get_waitlist_entry(&self, entry_id: i64) -> Result<Option<WaitlistEntryRecord>> {
        let db = self.db.lock().unwrap();
        db.query_row(
            "SELECT entry_id, description, venue_id, user_id, entry_date, entry_time, class_id, pairing_id
             FROM waitlist WHERE entry_id = ?1",
            [entry_id],
            waitlist_entry_from_row,
        )
        .optional()
    }

    pub fn delete_waitlist_entry(&self, entry_id: i64) -> Result<bool> {
        let db = self.db.lock().unwrap();
        let deleted = db.execute("DELETE FROM waitlist WHERE entry_id = ?1", [entry_id])?;
        Ok(deleted > 0)
    }

    /// A student's own entries, newest slot first.
    pub fn entries_for_user(&self, user_id: i64) -> Result<Vec<WaitlistEntryRecord>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT entry_id, description, venue_id, user_id, entry_date, entry_time, class_id, pairing_id
             FROM waitlist
             WHERE user_id = ?1
             ORDER BY entry_date DESC, entry_time DESC",
        )?;
        let entries = stmt.query_map([user_id], waitlist_entry_from_row)?;
        entries.collect()
    }

    /// All unassigned entries, ordered by (date, time, venue) so callers can
    /// fold consecutive rows into slot groups. Student and venue display
    /// fields come along for presentation.
    pub fn pending_entries(&self) -> Result<Vec<WaitlistEntryDetail>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT w.entry_id, w.description, w.venue_id, w.user_id, w.entry_date, w.entry_time,
                    w.class_id, w.pairing_id, u.first_name, u.last_name, u.email, v.name
             FROM waitlist w
             JOIN users u ON u.user_id = w.user_id
             JOIN venues v ON v.venue_id = w.venue_id
             WHERE w.class_id IS NULL AND w.pairing_id IS NULL
             ORDER BY w.entry_date, w.entry_time, w.venue_id",
        )?;
        let entries = stmt.query_map([], |row| {
            let entry = waitlist_entry_from_row(row)?;
            let first_name: String = row.get(8)?;
            let last_name: String = row.get(9)?;
            let student_name = if last_name.is_empty() {
                first_name
            } else {
                format!("{first_name} {last_name}")
            };
            Ok(WaitlistEntryDetail {
                entry,
                student_name,
                student_email: row.get(10)?,
                venue_name: row.get(11)?,
            })
        })?;
        entries.collect()
    }

    /// Points a student's unassigned entries at the given slot to a class and
    /// pairing. Entries already assigned elsewhere are left alone.
    pub fn assign_waitlist_for_student(
        &self,
        user_id: i64,
        entry_date: NaiveDate,
        entry_time: NaiveTime,
        class_id: i64,
        pairing_id: i64,
    ) -> Result<usize> {
        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE waitlist SET class_id = ?4, pairing_id = ?5
             WHERE user_id = ?1 AND entry_date = ?2 AND entry_time = ?3
               AND class_id IS NULL AND pairing_id IS NULL",
            params![user_id, entry_date, entry_time, class_id, pairing_id],
        )
    }

    /// Clears class/pairing references on a student's entries tied to a class.
    pub fn release_waitlist_for_class(&self, user_id: i64, class_id: i64) -> Result<usize> {
        let db = self.db.lock().unwrap();
        db.execute(
            "UPDATE waitlist SET class_id = NULL, pairing_id = NULL
             WHERE user_id = ?1 AND class_id = ?2",
            params![user_id, class_id],
        )
    }

    // ---- classes and pairings --------------------------------------------

    /// Creates a standalone class, unconfirmed until staff confirm it.
    pub fn create_class(
        &self,
        instructor_id: i64,
        class_date: NaiveDate,
        start_time: NaiveTime,
        price: i64,
        training_type_id: Option<i64>,
        description: &str,
    ) -> Result<ClassRecord> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO classes (description, instructor_id, class_date, start_time, confirmed, price, training_type_id)
             VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6)",
            params![
                description,
                instructor_id,
                class_date,
                start_time,
                price,
                training_type_id,
            ],
        )?;
        let class_id = db.last_insert_rowid();
        db.query_row(CLASS_SELECT, [class_id], class_from_row)
    }

    pub fn get_class(&self, class_id: i64) -> Result<Option<ClassRecord>> {
        let db = self.db.lock().unwrap();
        db.query_row(CLASS_SELECT, [class_id], class_from_row).optional()
    }

    /// Class row joined with instructor and training names for notifications.
    pub fn class_detail(&self, class_id: i64) -> Result<Option<ClassDetail>> {
        let db = self.db.lock().unwrap();
        db.query_row(
            "SELECT c.class_id, c.class_date, c.start_time, c.price, u.first_name, u.last_name, t.name
             FROM classes c
             JOIN users u ON u.user_id = c.instructor_id
             LEFT JOIN training_types t ON t.training_type_id = c.training_type_id
             WHERE c.class_id = ?1",
            [class_id],
            |row| {
                let first_name: String = row.get(4)?;
                let last_name: String = row.get(5)?;
                let instructor_name = if last_name.is_empty() {
                    first_name
                } else {
                    format!("{first_name} {last_name}")
                };
                Ok(ClassDetail {
                    class_id: row.get(0)?,
                    class_date: row.get(1)?,
                    start_time: row.get(2)?,
                    price: row.get(3)?,
                    instructor_name,
                    training_name: row.get(6)?,
                })
            },
        )
        .optional()
    }

    /// Marks a class confirmed. Returns false if no such class exists.
    pub fn confirm_class(&self, class_id: i64) -> Result<bool> {
        let db = self.db.lock().unwrap();
        let updated = db.execute(
            "UPDATE classes SET confirmed = 1 WHERE class_id = ?1",
            [class_id],
        )?;
        Ok(updated > 0)
    }

    /// The class's pairing by convention: first match, ordered by pairing id.
    pub fn first_pairing_for_class(&self, class_id: i64) -> Result<Option<PairingRecord>> {
        let db = self.db.lock().unwrap();
        db.query_row(
            "SELECT pairing_id, description, class_id FROM pairings
             WHERE class_id = ?1 ORDER BY pairing_id LIMIT 1",
            [class_id],
            pairing_from_row,
        )
        .optional()
    }

    /// Returns the class's first pairing, creating one with the given
    /// description if none exists yet.
    pub fn get_or_create_pairing(
        &self,
        class_id: i64,
        default_description: &str,
    ) -> Result<PairingRecord> {
        let db = self.db.lock().unwrap();
        let existing = db
            .query_row(
                "SELECT pairing_id, description, class_id FROM pairings
                 WHERE class_id = ?1 ORDER BY pairing_id LIMIT 1",
                [class_id],
                pairing_from_row,
            )
            .optional()?;
        if let Some(pairing) = existing {
            return Ok(pairing);
        }

        db.execute(
            "INSERT INTO pairings (description, class_id) VALUES (?1, ?2)",
            params![default_description, class_id],
        )?;
        Ok(PairingRecord {
            pairing_id: db.last_insert_rowid(),
            description: default_description.to_string(),
            class_id,
        })
    }

    pub fn pairing_members(&self, pairing_id: i64) -> Result<Vec<UserRecord>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT u.user_id, u.username, u.role, u.first_name, u.last_name, u.email, u.phone, u.skill_level
             FROM pairing_members m
             JOIN users u ON u.user_id = m.user_id
             WHERE m.pairing_id = ?1
             ORDER BY u.user_id",
        )?;
        let members = stmt.query_map([pairing_id], user_from_row)?;
        members.collect()
    }

    pub fn is_pairing_member(&self, pairing_id: i64, user_id: i64) -> Result<bool> {
        let db = self.db.lock().unwrap();
        db.query_row(
            "SELECT EXISTS(SELECT 1 FROM pairing_members WHERE pairing_id = ?1 AND user_id = ?2)",
            params![pairing_id, user_id],
            |row| row.get(0),
        )
    }

    pub fn add_pairing_member(&self, pairing_id: i64, user_id: i64) -> Result<()> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO pairing_members (pairing_id, user_id) VALUES (?1, ?2)",
            params![pairing_id, user_id],
        )?;
        Ok(())
    }

    pub fn remove_pairing_member(&self, pairing_id: i64, user_id: i64) -> Result<bool> {
        let db = self.db.lock().unwrap();
        let removed = db.execute(
            "DELETE FROM pairing_members WHERE pairing_id = ?1 AND user_id = ?2",
            params![pairing_id, user_id],
        )?;
        Ok(removed > 0)
    }

    /// Creates a confirmed class, its pairing, the member set, and the
    /// waitlist back-references in one transaction. A failure anywhere rolls
    /// the whole unit back, leaving no orphaned class or pairing.
    pub fn create_class_with_pairing(
        &self,
        instructor_id: i64,
        class_date: NaiveDate,
        start_time: NaiveTime,
        venue_id: i64,
        description: &str,
        price: i64,
        student_ids: &[i64],
    ) -> Result<(ClassRecord, PairingRecord, usize)> {
        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;

        tx.execute(
            "INSERT INTO classes (description, instructor_id, class_date, start_time, confirmed, price)
             VALUES (?1, ?2, ?3, ?4, 1, ?5)",
            params![description, instructor_id, class_date, start_time, price],
        )?;
        let class_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO pairings (description, class_id) VALUES (?1, ?2)",
            params![description, class_id],
        )?;
        let pairing_id = tx.last_insert_rowid();

        let mut entries_assigned = 0;
        for &student_id in student_ids {
            tx.execute(
                "INSERT INTO pairing_members (pairing_id, user_id) VALUES (?1, ?2)",
                params![pairing_id, student_id],
            )?;
            entries_assigned += tx.execute(
                "UPDATE waitlist SET class_id = ?5, pairing_id = ?6
                 WHERE user_id = ?1 AND entry_date = ?2 AND entry_time = ?3 AND venue_id = ?4
                   AND class_id IS NULL AND pairing_id IS NULL",
                params![student_id, class_date, start_time, venue_id, class_id, pairing_id],
            )?;
        }

        let class = tx.query_row(CLASS_SELECT, [class_id], class_from_row)?;
        let pairing = tx.query_row(
            "SELECT pairing_id, description, class_id FROM pairings WHERE pairing_id = ?1",
            [pairing_id],
            pairing_from_row,
        )?;
        tx.commit()?;

        Ok((class, pairing, entries_assigned))
    }

    // ---- notifications ---------------------------------------------------

    pub fn create_notification(
        &self,
        user_id: i64,
        event_kind: EventKind,
        class_id: Option<i64>,
    ) -> Result<i64> {
        let db = self.db.lock().unwrap();
        db.execute(
            "INSERT INTO notifications (user_id, event_kind, class_id, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![user_id, event_kind.as_str(), class_id, Utc::now().naive_utc()],
        )?;
        Ok(db.last_insert_rowid())
    }

    /// Sets the sent flag and timestamp together, at most once. Returns false
    /// when the notification was already marked or does not exist.
    pub fn mark_notification_sent(&self, notification_id: i64) -> Result<bool> {
        let db = self.db.lock().unwrap();
        let updated = db.execute(
            "UPDATE notifications SET sent = 1, sent_at = ?2
             WHERE notification_id = ?1 AND sent = 0",
            params![notification_id, Utc::now().naive_utc()],
        )?;
        Ok(updated > 0)
    }

    pub fn get_notification(&self, notification_id: i64) -> Result<Option<NotificationRecord>> {
        let db = self.db.lock().unwrap();
        db.query_row(
            "SELECT notification_id, user_id, event_kind, class_id, created_at, sent_at, sent
             FROM notifications WHERE notification_id = ?1",
            [notification_id],
            notification_from_row,
        )
        .optional()
    }

    pub fn notifications_for_class(&self, class_id: i64) -> Result<Vec<NotificationRecord>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT notification_id, user_id, event_kind, class_id, created_at, sent_at, sent
             FROM notifications WHERE class_id = ?1 ORDER BY notification_id",
        )?;
        let notifications = stmt.query_map([class_id], notification_from_row)?;
        notifications.collect()
    }

    pub fn notifications_for_user(&self, user_id: i64) -> Result<Vec<NotificationRecord>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT notification_id, user_id, event_kind, class_id, created_at, sent_at, sent
             FROM notifications WHERE user_id = ?1 ORDER BY notification_id",
        )?;
        let notifications = stmt.query_map([user_id], notification_from_row)?;
        notifications.collect()
    }
}

const CLASS_SELECT: &str =
    "SELECT class_id, description, instructor_id, class_date, start_time, confirmed, notified, price, training_type_id
     FROM classes WHERE class_id = ?1";

fn user_from_row(row: &Row) -> Result<UserRecord> {
    Ok(UserRecord {
        user_id: row.get(0)?,
        username: row.get(1)?,
        role: Role::parse(&row.get::<_, String>(2)?),
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        email: row.get(5)?,
        phone: row.get(6)?,
        skill_level: row.get(7)?,
    })
}

fn venue_from_row(row: &Row) -> Result<VenueRecord> {
    Ok(VenueRecord {
        venue_id: row.get(0)?,
        name: row.get(1)?,
        indoor_courts: row.get(2)?,
        outdoor_courts: row.get(3)?,
        indoor: row.get(4)?,
        surface: row.get(5)?,
        hourly_rate: row.get(6)?,
    })
}

fn class_from_row(row: &Row) -> Result<ClassRecord> {
    Ok(ClassRecord {
        class_id: row.get(0)?,
        description: row.get(1)?,
        instructor_id: row.get(2)?,
        class_date: row.get(3)?,
        start_time: row.get(4)?,
        confirmed: row.get(5)?,
        notified: row.get(6)?,
        price: row.get(7)?,
        training_type_id: row.get(8)?,
    })
}

fn pairing_from_row(row: &Row) -> Result<PairingRecord> {
    Ok(PairingRecord {
        pairing_id: row.get(0)?,
        description: row.get(1)?,
        class_id: row.get(2)?,
    })
}

fn waitlist_entry_from_row(row: &Row) -> Result<WaitlistEntryRecord> {
    Ok(WaitlistEntryRecord {
        entry_id: row.get(0)?,
        description: row.get(1)?,
        venue_id: row.get(2)?,
        user_id: row.get(3)?,
        entry_date: row.get(4)?,
        entry_time: row.get(5)?,
        class_id: row.get(6)?,
        pairing_id: row.get(7)?,
    })
}

fn notification_from_row(row: &Row) -> Result<NotificationRecord> {
    Ok(NotificationRecord {
        notification_id: row.get(0)?,
        user_id: row.get(1)?,
        event_kind: EventKind::parse(&row.get::<_, String>(2)?),
        class_id: row.get(3)?,
        created_at: row.get(4)?,
        sent_at: row.get(5)?,
        sent: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn test_db() -> ClubDbManager {
        ClubDbManager::new(":memory:")
    }

    fn add_user(db: &ClubDbManager, username: &str, role: Role) -> i64 {
        db.create_user(&NewUser {
            username,
            role,
            first_name: username,
            last_name: "",
            email: &format!("{username}@example.com"),
            phone: "",
            skill_level: 3,
            password_hash: "salt$hash",
        })
        .unwrap()
    }

    fn slot() -> (NaiveDate, NaiveTime) {
        (
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_venue_indoor_flag_recomputed_on_save() {
        let db = test_db();

        let covered = db
            .create_venue(&NewVenue {
                name: "Center Court",
                indoor_courts: 5,
                outdoor_courts: 0,
                surface: "glass",
                hourly_rate: 8000,
            })
            .unwrap();
        assert!(covered.indoor);

        let open_air = db
            .create_venue(&NewVenue {
                name: "Riverside",
                indoor_courts: 0,
                outdoor_courts: 0,
                surface: "wall",
                hourly_rate: 5000,
            })
            .unwrap();
        assert!(!open_air.indoor);

        // Court counts change on update; the flag follows.
        let mut changed = covered.clone();
        changed.indoor_courts = 0;
        changed.outdoor_courts = 3;
        let changed = db.update_venue(&changed).unwrap();
        assert!(!changed.indoor);

        let mut back = changed.clone();
        back.indoor_courts = 1;
        let back = db.update_venue(&back).unwrap();
        assert!(back.indoor);
    }

    #[test]
    fn test_create_class_with_pairing_is_atomic() {
        let db = test_db();
        let instructor = add_user(&db, "coach", Role::Instructor);
        let student = add_user(&db, "ana", Role::Student);
        let venue = db
            .create_venue(&NewVenue {
                name: "Club",
                indoor_courts: 2,
                outdoor_courts: 0,
                surface: "glass",
                hourly_rate: 6000,
            })
            .unwrap();
        let (date, time) = slot();

        // Unknown student id trips the FK inside the transaction; nothing of
        // the class or pairing may survive.
        let result = db.create_class_with_pairing(
            instructor,
            date,
            time,
            venue.venue_id,
            "",
            15000,
            &[student, 9999],
        );
        assert!(result.is_err());
        assert!(db.get_class(1).unwrap().is_none());
        assert!(db.first_pairing_for_class(1).unwrap().is_none());
    }

    #[test]
    fn test_assign_waitlist_skips_assigned_entries() {
        let db = test_db();
        let instructor = add_user(&db, "coach", Role::Instructor);
        let student = add_user(&db, "ana", Role::Student);
        let venue = db
            .create_venue(&NewVenue {
                name: "Club",
                indoor_courts: 2,
                outdoor_courts: 0,
                surface: "glass",
                hourly_rate: 6000,
            })
            .unwrap();
        let (date, time) = slot();

        let entry = db
            .create_waitlist_entry(student, venue.venue_id, date, time, "")
            .unwrap();
        let (class, pairing, assigned) = db
            .create_class_with_pairing(instructor, date, time, venue.venue_id, "", 15000, &[student])
            .unwrap();
        assert_eq!(assigned, 1);

        // A second assignment attempt at the same slot must not steal the entry.
        let touched = db
            .assign_waitlist_for_student(student, date, time, class.class_id, pairing.pairing_id)
            .unwrap();
        assert_eq!(touched, 0);

        let entry = db.get_waitlist_entry(entry).unwrap().unwrap();
        assert_eq!(entry.class_id, Some(class.class_id));
        assert_eq!(entry.pairing_id, Some(pairing.pairing_id));
    }

    #[test]
    fn test_first_pairing_is_lowest_id() {
        let db = test_db();
        let instructor = add_user(&db, "coach", Role::Instructor);
        let (date, time) = slot();
        let class = db
            .create_class(instructor, date, time, 12000, None, "")
            .unwrap();

        let first = db.get_or_create_pairing(class.class_id, "first").unwrap();
        // Convention, not a constraint: a second pairing can exist, lookups
        // keep returning the first.
        db.get_or_create_pairing(class.class_id, "ignored").unwrap();
        let found = db.first_pairing_for_class(class.class_id).unwrap().unwrap();
        assert_eq!(found.pairing_id, first.pairing_id);
    }

    #[test]
    fn test_mark_notification_sent_exactly_once() {
        let db = test_db();
        let student = add_user(&db, "ana", Role::Student);
        let id = db
            .create_notification(student, EventKind::Confirmation, None)
            .unwrap();

        let before = db.get_notification(id).unwrap().unwrap();
        assert!(!before.sent);
        assert!(before.sent_at.is_none());

        assert!(db.mark_notification_sent(id).unwrap());
        let after = db.get_notification(id).unwrap().unwrap();
        assert!(after.sent);
        assert!(after.sent_at.is_some());

        // Second attempt is a no-op.
        assert!(!db.mark_notification_sent(id).unwrap());
        let unchanged = db.get_notification(id).unwrap().unwrap();
        assert_eq!(unchanged.sent_at, after.sent_at);
    }

    #[test]
    fn test_pending_entries_ordering_and_filter() {
        let db = test_db();
        let instructor = add_user(&db, "coach", Role::Instructor);
        let ana = add_user(&db, "ana", Role::Student);
        let ben = add_user(&db, "ben", Role::Student);
        let venue = db
            .create_venue(&NewVenue {
                name: "Club",
                indoor_courts: 1,
                outdoor_courts: 1,
                surface: "glass",
                hourly_rate: 6000,
            })
            .unwrap();

        let d1 = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        let d0 = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let t = NaiveTime::from_hms_opt(18, 0, 0).unwrap();

        db.create_waitlist_entry(ana, venue.venue_id, d1, t, "").unwrap();
        db.create_waitlist_entry(ben, venue.venue_id, d0, t, "").unwrap();
        db.create_waitlist_entry(ana, venue.venue_id, d0, t, "").unwrap();

        // Assigned entries disappear from the pending view.
        db.create_class_with_pairing(instructor, d1, t, venue.venue_id, "", 10000, &[ana])
            .unwrap();

        let pending = db.pending_entries().unwrap();
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().all(|e| e.entry.is_unassigned()));
        assert_eq!(pending[0].entry.entry_date, d0);
        assert_eq!(pending[1].entry.entry_date, d0);
    }

    #[test]
    fn test_find_user_credentials_case_insensitive() {
        let db = test_db();
        add_user(&db, "Ana", Role::Student);

        let by_name = db.find_user_credentials("ana").unwrap();
        assert!(by_name.is_some());
        let by_email = db.find_user_credentials("ANA@EXAMPLE.COM").unwrap();
        assert!(by_email.is_some());
        assert!(db.find_user_credentials("nobody").unwrap().is_none());
    }
}
