// Credit Ledger - Rules as data: quality ratings mapped to credit deltas
//
// The award path is the ONLY writer of a complaint's rating/credit columns
// and of a profile's credit balance. Both sides of an award move in one
// storage transaction: either the complaint is marked rated AND the citizen's
// balance shifts, or neither happens.

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{insert_event, Event, Role};

/// Credits a citizen account starts with
pub const CITIZEN_STARTING_CREDITS: i64 = 100;

/// Starting credit stipend for a new account
pub fn starting_credits(role: Role) -> i64 {
    match role {
        Role::Citizen => CITIZEN_STARTING_CREDITS,
        Role::Admin => 0,
    }
}

// ============================================================================
// QUALITY RATING
// ============================================================================

/// Admin judgment of a resolved complaint's legitimacy and usefulness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityRating {
    Excellent,
    Good,
    Poor,
    Fake,
}

impl QualityRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityRating::Excellent => "excellent",
            QualityRating::Good => "good",
            QualityRating::Poor => "poor",
            QualityRating::Fake => "fake",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "excellent" => Some(QualityRating::Excellent),
            "good" => Some(QualityRating::Good),
            "poor" => Some(QualityRating::Poor),
            "fake" => Some(QualityRating::Fake),
            _ => None,
        }
    }

    /// Credit delta applied to the submitting citizen
    ///
    /// Fabricated reports cost far more than a poor-quality one earns.
    pub fn credit_delta(&self) -> i64 {
        match self {
            QualityRating::Excellent => 50,
            QualityRating::Good => 25,
            QualityRating::Poor => 5,
            QualityRating::Fake => -100,
        }
    }
}

// ============================================================================
// LEDGER ERRORS
// ============================================================================

/// Typed failures of the award path
///
/// None of these is fatal: callers branch on the variant (the API server maps
/// each to a status code).
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("complaint not found: {0}")]
    UnknownComplaint(String),

    #[error("complaint already rated: {0}")]
    AlreadyRated(String),

    #[error("complaint must be resolved before rating: {0}")]
    NotResolved(String),

    #[error("account not found: {0}")]
    UnknownAccount(String),

    #[error("storage busy after retry")]
    StorageContention,

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

// ============================================================================
// AWARD
// ============================================================================

/// Outcome of a successful award
#[derive(Debug, Clone, Serialize)]
pub struct Award {
    pub complaint_id: String,
    pub citizen_id: String,
    pub rating: QualityRating,
    pub delta: i64,
    pub new_balance: i64,
}

/// Rate a resolved complaint and move the citizen's credit balance
///
/// Runs as a single IMMEDIATE transaction: the write lock is taken up front,
/// so simultaneous admins rating the same complaint serialize and the loser
/// sees `AlreadyRated`. One transient busy/locked failure is retried before
/// giving up with `StorageContention`.
pub fn award(
    conn: &mut Connection,
    complaint_id: &str,
    rating: QualityRating,
    actor: &str,
) -> Result<Award, LedgerError> {
    match try_award(conn, complaint_id, rating, actor) {
        Err(LedgerError::Storage(e)) if is_transient(&e) => {
            match try_award(conn, complaint_id, rating, actor) {
                Err(LedgerError::Storage(e)) if is_transient(&e) => {
                    Err(LedgerError::StorageContention)
                }
                other => other,
            }
        }
        other => other,
    }
}

fn try_award(
    conn: &mut Connection,
    complaint_id: &str,
    rating: QualityRating,
    actor: &str,
) -> Result<Award, LedgerError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let row = tx
        .query_row(
            "SELECT citizen_id, status, quality_rating FROM complaints WHERE complaint_uuid = ?1",
            params![complaint_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            },
        )
        .optional()?;

    let Some((citizen_id, status, existing_rating)) = row else {
        return Err(LedgerError::UnknownComplaint(complaint_id.to_string()));
    };

    if existing_rating.is_some() {
        return Err(LedgerError::AlreadyRated(complaint_id.to_string()));
    }

    if status != "resolved" {
        return Err(LedgerError::NotResolved(complaint_id.to_string()));
    }

    let delta = rating.credit_delta();
    let now = chrono::Utc::now().to_rfc3339();

    // Guarded write: the NULL check makes rate-exactly-once hold even if a
    // competing transaction slipped in between the read above and this point
    let changed = tx.execute(
        "UPDATE complaints
         SET quality_rating = ?1, credits_awarded = ?2, updated_at = ?3
         WHERE complaint_uuid = ?4 AND quality_rating IS NULL",
        params![rating.as_str(), delta, now, complaint_id],
    )?;

    if changed == 0 {
        return Err(LedgerError::AlreadyRated(complaint_id.to_string()));
    }

    let changed = tx.execute(
        "UPDATE profiles SET credits = credits + ?1, updated_at = ?2 WHERE profile_uuid = ?3",
        params![delta, now, citizen_id],
    )?;

    if changed == 0 {
        // Dropping the transaction rolls the complaint write back too
        return Err(LedgerError::UnknownAccount(citizen_id));
    }

    let new_balance: i64 = tx.query_row(
        "SELECT credits FROM profiles WHERE profile_uuid = ?1",
        params![citizen_id],
        |row| row.get(0),
    )?;

    let event = Event::new(
        "credits_awarded",
        "complaint",
        complaint_id,
        serde_json::json!({
            "rating": rating.as_str(),
            "delta": delta,
            "citizen_id": citizen_id,
            "new_balance": new_balance,
        }),
        actor,
    );
    insert_event(&tx, &event)?;

    tx.commit()?;

    Ok(Award {
        complaint_id: complaint_id.to_string(),
        citizen_id,
        rating,
        delta,
        new_balance,
    })
}

fn is_transient(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::DatabaseBusy
                || e.code == rusqlite::ErrorCode::DatabaseLocked
    )
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        get_complaint, get_events_for_entity, get_profile, insert_complaint, insert_profile,
        setup_database, update_complaint, Complaint, ComplaintStatus, ComplaintUpdate,
        NewComplaint, Priority, Profile,
    };

    fn test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn seed_citizen(conn: &Connection, name: &str) -> Profile {
        let profile = Profile::new(name.to_string(), Role::Citizen, None, None, None);
        insert_profile(conn, &profile).unwrap();
        profile
    }

    fn seed_resolved_complaint(conn: &Connection, title: &str, citizen_id: &str) -> Complaint {
        let complaint = Complaint::from_new(NewComplaint {
            title: title.to_string(),
            description: format!("{} - details", title),
            department: "Transportation".to_string(),
            category: "Road Maintenance".to_string(),
            priority: Priority::Medium,
            citizen_id: citizen_id.to_string(),
            citizen_name: "Test Citizen".to_string(),
            address: None,
            coordinates: None,
            attachments: vec![],
        });
        insert_complaint(conn, &complaint).unwrap();

        update_complaint(
            conn,
            &complaint.id,
            &ComplaintUpdate {
                status: Some(ComplaintStatus::Resolved),
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap()
    }

    #[test]
    fn test_credit_delta_table() {
        assert_eq!(QualityRating::Excellent.credit_delta(), 50);
        assert_eq!(QualityRating::Good.credit_delta(), 25);
        assert_eq!(QualityRating::Poor.credit_delta(), 5);
        assert_eq!(QualityRating::Fake.credit_delta(), -100);
    }

    #[test]
    fn test_rating_parse_roundtrip() {
        for rating in [
            QualityRating::Excellent,
            QualityRating::Good,
            QualityRating::Poor,
            QualityRating::Fake,
        ] {
            assert_eq!(QualityRating::parse(rating.as_str()), Some(rating));
        }
        assert_eq!(QualityRating::parse("mediocre"), None);
    }

    #[test]
    fn test_starting_credits() {
        assert_eq!(starting_credits(Role::Citizen), 100);
        assert_eq!(starting_credits(Role::Admin), 0);
    }

    #[test]
    fn test_award_sets_both_sides() {
        let mut conn = test_connection();

        let citizen = seed_citizen(&conn, "Jane Smith");
        let complaint = seed_resolved_complaint(&conn, "Pothole on Main Street", &citizen.id);

        let outcome = award(&mut conn, &complaint.id, QualityRating::Good, "admin-1").unwrap();

        assert_eq!(outcome.delta, 25);
        assert_eq!(outcome.new_balance, 125);
        assert_eq!(outcome.citizen_id, citizen.id);

        let rated = get_complaint(&conn, &complaint.id).unwrap().unwrap();
        assert_eq!(rated.quality_rating, Some(QualityRating::Good));
        assert_eq!(rated.credits_awarded, Some(25));

        let balance = get_profile(&conn, &citizen.id).unwrap().unwrap().credits;
        assert_eq!(balance, 125);
    }

    #[test]
    fn test_award_fake_goes_negative() {
        let mut conn = test_connection();

        let citizen = seed_citizen(&conn, "Bad Actor");
        let first = seed_resolved_complaint(&conn, "Invented Pothole", &citizen.id);
        let second = seed_resolved_complaint(&conn, "Invented Streetlight", &citizen.id);

        award(&mut conn, &first.id, QualityRating::Fake, "admin-1").unwrap();
        let outcome = award(&mut conn, &second.id, QualityRating::Fake, "admin-1").unwrap();

        // 100 - 100 - 100: the balance is allowed below zero
        assert_eq!(outcome.new_balance, -100);
        assert_eq!(
            get_profile(&conn, &citizen.id).unwrap().unwrap().credits,
            -100
        );
    }

    #[test]
    fn test_award_twice_is_rejected() {
        let mut conn = test_connection();

        let citizen = seed_citizen(&conn, "Jane Smith");
        let complaint = seed_resolved_complaint(&conn, "Pothole on Main Street", &citizen.id);

        award(&mut conn, &complaint.id, QualityRating::Excellent, "admin-1").unwrap();

        let second = award(&mut conn, &complaint.id, QualityRating::Poor, "admin-2");
        assert!(matches!(second, Err(LedgerError::AlreadyRated(_))));

        // First award's values are untouched
        let rated = get_complaint(&conn, &complaint.id).unwrap().unwrap();
        assert_eq!(rated.quality_rating, Some(QualityRating::Excellent));
        assert_eq!(rated.credits_awarded, Some(50));
        assert_eq!(
            get_profile(&conn, &citizen.id).unwrap().unwrap().credits,
            150
        );
    }

    #[test]
    fn test_award_unknown_account_rolls_back_complaint() {
        let mut conn = test_connection();

        // Complaint from a citizen that has no profile row
        let complaint = seed_resolved_complaint(&conn, "Orphaned Report", "ghost-citizen");

        let result = award(&mut conn, &complaint.id, QualityRating::Good, "admin-1");
        assert!(matches!(result, Err(LedgerError::UnknownAccount(_))));

        // Neither side applied: the complaint is still unrated
        let loaded = get_complaint(&conn, &complaint.id).unwrap().unwrap();
        assert_eq!(loaded.quality_rating, None);
        assert_eq!(loaded.credits_awarded, None);
    }

    #[test]
    fn test_award_requires_resolved_status() {
        let mut conn = test_connection();

        let citizen = seed_citizen(&conn, "Jane Smith");
        let complaint = Complaint::from_new(NewComplaint {
            title: "Fresh Report".to_string(),
            description: "Still in intake".to_string(),
            department: "Utilities".to_string(),
            category: "Lighting".to_string(),
            priority: Priority::Low,
            citizen_id: citizen.id.clone(),
            citizen_name: citizen.name.clone(),
            address: None,
            coordinates: None,
            attachments: vec![],
        });
        insert_complaint(&conn, &complaint).unwrap();

        let result = award(&mut conn, &complaint.id, QualityRating::Good, "admin-1");
        assert!(matches!(result, Err(LedgerError::NotResolved(_))));

        // No credit movement either
        assert_eq!(
            get_profile(&conn, &citizen.id).unwrap().unwrap().credits,
            100
        );
    }

    #[test]
    fn test_award_unknown_complaint() {
        let mut conn = test_connection();

        let result = award(&mut conn, "no-such-uuid", QualityRating::Good, "admin-1");
        assert!(matches!(result, Err(LedgerError::UnknownComplaint(_))));
    }

    #[test]
    fn test_award_leaves_audit_event() {
        let mut conn = test_connection();

        let citizen = seed_citizen(&conn, "Jane Smith");
        let complaint = seed_resolved_complaint(&conn, "Pothole on Main Street", &citizen.id);

        award(&mut conn, &complaint.id, QualityRating::Good, "admin-1").unwrap();

        let events = get_events_for_entity(&conn, "complaint", &complaint.id).unwrap();
        let awarded: Vec<_> = events
            .iter()
            .filter(|e| e.event_type == "credits_awarded")
            .collect();

        assert_eq!(awarded.len(), 1);
        assert_eq!(awarded[0].actor, "admin-1");
        assert_eq!(awarded[0].data["rating"], "good");
        assert_eq!(awarded[0].data["delta"], 25);
    }
}
