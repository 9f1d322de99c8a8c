use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::geo::GeoPoint;
use crate::ledger::{starting_credits, QualityRating};

// ============================================================================
// COMPLAINT STATUS / PRIORITY
// ============================================================================

/// Workflow status of a complaint
///
/// Admins may set any status directly; the sequence below is the conventional
/// path, not an enforced one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComplaintStatus {
    Submitted,
    InReview,
    InProgress,
    Resolved,
    Closed,
}

impl ComplaintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Submitted => "submitted",
            ComplaintStatus::InReview => "in-review",
            ComplaintStatus::InProgress => "in-progress",
            ComplaintStatus::Resolved => "resolved",
            ComplaintStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "submitted" => Some(ComplaintStatus::Submitted),
            "in-review" => Some(ComplaintStatus::InReview),
            "in-progress" => Some(ComplaintStatus::InProgress),
            "resolved" => Some(ComplaintStatus::Resolved),
            "closed" => Some(ComplaintStatus::Closed),
            _ => None,
        }
    }
}

/// Citizen-assigned urgency of a complaint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            "urgent" => Some(Priority::Urgent),
            _ => None,
        }
    }
}

// ============================================================================
// COMPLAINT MODEL
// ============================================================================

/// Fields supplied by the submitting citizen (or a bulk import row)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComplaint {
    pub title: String,
    pub description: String,
    pub department: String,
    pub category: String,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    pub citizen_id: String,
    pub citizen_name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub coordinates: Option<GeoPoint>,
    #[serde(default)]
    pub attachments: Vec<String>,
}

fn default_priority() -> Priority {
    Priority::Medium
}

/// A tracked citizen complaint
///
/// `quality_rating` and `credits_awarded` are set together, exactly once,
/// and only through the credit ledger - never through `ComplaintUpdate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Complaint {
    /// Stable identity (UUID), assigned at creation
    pub id: String,

    pub title: String,
    pub description: String,
    pub department: String,
    pub category: String,
    pub priority: Priority,
    pub status: ComplaintStatus,

    pub citizen_id: String,
    pub citizen_name: String,

    /// Street address, when the citizen supplied one
    pub address: Option<String>,

    /// Captured device coordinates, when available
    pub coordinates: Option<GeoPoint>,

    /// Photo URLs, stored as a JSON array
    pub attachments: Vec<String>,

    pub assigned_to: Option<String>,
    pub resolution_notes: Option<String>,

    /// Credit delta applied to the citizen; present exactly when a rating is
    pub credits_awarded: Option<i64>,
    pub quality_rating: Option<QualityRating>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Complaint {
    /// Build a fresh complaint from submitted fields
    ///
    /// New complaints always start in `submitted` with no rating.
    pub fn from_new(new: NewComplaint) -> Self {
        let now = Utc::now();

        Complaint {
            id: uuid::Uuid::new_v4().to_string(),
            title: new.title,
            description: new.description,
            department: new.department,
            category: new.category,
            priority: new.priority,
            status: ComplaintStatus::Submitted,
            citizen_id: new.citizen_id,
            citizen_name: new.citizen_name,
            address: new.address,
            coordinates: new.coordinates,
            attachments: new.attachments,
            assigned_to: None,
            resolution_notes: None,
            credits_awarded: None,
            quality_rating: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Compute idempotency hash for duplicate-submission detection
    /// NOTE: deduplication key, not identity - identity is `id` (UUID)
    pub fn compute_idempotency_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "{}{}{}{}",
            self.citizen_id, self.title, self.description, self.department
        ));
        format!("{:x}", hasher.finalize())
    }
}

/// Explicit partial update for a complaint
///
/// Only the fields an admin may touch. Rating and credit columns are absent
/// on purpose: the credit ledger is the single write path for those.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComplaintUpdate {
    pub status: Option<ComplaintStatus>,
    pub priority: Option<Priority>,
    pub department: Option<String>,
    pub category: Option<String>,
    pub assigned_to: Option<String>,
    pub resolution_notes: Option<String>,
}

// ============================================================================
// PROFILE MODEL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Citizen,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Citizen => "citizen",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "citizen" => Some(Role::Citizen),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// A citizen or admin account
///
/// `credits` is a signed running total. It is seeded at creation and from
/// then on changes only through the credit ledger; fake-complaint penalties
/// can legitimately push it below zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub role: Role,
    /// Department an admin belongs to; unused for citizens
    pub department: Option<String>,
    pub credits: i64,
    pub address: Option<String>,
    pub coordinates: Option<GeoPoint>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Create a new account with the role's starting credit stipend
    pub fn new(
        name: String,
        role: Role,
        department: Option<String>,
        address: Option<String>,
        coordinates: Option<GeoPoint>,
    ) -> Self {
        let now = Utc::now();

        Profile {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            role,
            department,
            credits: starting_credits(role),
            address,
            coordinates,
            created_at: now,
            updated_at: now,
        }
    }
}

// ============================================================================
// AUDIT EVENTS
// ============================================================================

/// Append-only audit record; submissions, status changes, and credit awards
/// each leave one
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS complaints (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            idempotency_hash TEXT UNIQUE NOT NULL,
            complaint_uuid TEXT UNIQUE NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            department TEXT NOT NULL,
            category TEXT NOT NULL,
            priority TEXT NOT NULL,
            status TEXT NOT NULL,
            citizen_id TEXT NOT NULL,
            citizen_name TEXT NOT NULL,
            location_address TEXT,
            location_lat REAL,
            location_lng REAL,
            attachments TEXT NOT NULL DEFAULT '[]',
            assigned_to TEXT,
            resolution_notes TEXT,
            credits_awarded INTEGER,
            quality_rating TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS profiles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            profile_uuid TEXT UNIQUE NOT NULL,
            name TEXT NOT NULL,
            role TEXT NOT NULL,
            department TEXT,
            credits INTEGER NOT NULL,
            location_address TEXT,
            location_lat REAL,
            location_lng REAL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_complaints_status ON complaints(status)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_complaints_department ON complaints(department)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_complaints_citizen ON complaints(citizen_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// COMPLAINT STORAGE
// ============================================================================

const COMPLAINT_COLUMNS: &str = "complaint_uuid, title, description, department, category,
            priority, status, citizen_id, citizen_name, location_address,
            location_lat, location_lng, attachments, assigned_to, resolution_notes,
            credits_awarded, quality_rating, created_at, updated_at";

fn complaint_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Complaint> {
    let priority_str: String = row.get(5)?;
    let status_str: String = row.get(6)?;
    let attachments_json: String = row.get(12)?;
    let rating_str: Option<String> = row.get(16)?;
    let created_str: String = row.get(17)?;
    let updated_str: String = row.get(18)?;

    let lat: Option<f64> = row.get(10)?;
    let lng: Option<f64> = row.get(11)?;
    let coordinates = match (lat, lng) {
        (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
        _ => None,
    };

    let quality_rating = match rating_str {
        Some(s) => Some(QualityRating::parse(&s).ok_or(rusqlite::Error::InvalidQuery)?),
        None => None,
    };

    Ok(Complaint {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        department: row.get(3)?,
        category: row.get(4)?,
        priority: Priority::parse(&priority_str).ok_or(rusqlite::Error::InvalidQuery)?,
        status: ComplaintStatus::parse(&status_str).ok_or(rusqlite::Error::InvalidQuery)?,
        citizen_id: row.get(7)?,
        citizen_name: row.get(8)?,
        address: row.get(9)?,
        coordinates,
        attachments: serde_json::from_str(&attachments_json).unwrap_or_default(),
        assigned_to: row.get(13)?,
        resolution_notes: row.get(14)?,
        credits_awarded: row.get(15)?,
        quality_rating,
        created_at: DateTime::parse_from_rfc3339(&created_str)
            .map_err(|_| rusqlite::Error::InvalidQuery)?
            .with_timezone(&Utc),
        updated_at: DateTime::parse_from_rfc3339(&updated_str)
            .map_err(|_| rusqlite::Error::InvalidQuery)?
            .with_timezone(&Utc),
    })
}

/// Insert a single complaint
///
/// Returns true when inserted, false when the idempotency hash matched an
/// existing row (duplicate submission, skipped).
pub fn insert_complaint(conn: &Connection, complaint: &Complaint) -> Result<bool> {
    let hash = complaint.compute_idempotency_hash();
    let attachments_json = serde_json::to_string(&complaint.attachments)?;

    let result = conn.execute(
        &format!(
            "INSERT INTO complaints (idempotency_hash, {COMPLAINT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)"
        ),
        params![
            hash,
            complaint.id,
            complaint.title,
            complaint.description,
            complaint.department,
            complaint.category,
            complaint.priority.as_str(),
            complaint.status.as_str(),
            complaint.citizen_id,
            complaint.citizen_name,
            complaint.address,
            complaint.coordinates.map(|p| p.lat),
            complaint.coordinates.map(|p| p.lng),
            attachments_json,
            complaint.assigned_to,
            complaint.resolution_notes,
            complaint.credits_awarded,
            complaint.quality_rating.map(|r| r.as_str()),
            complaint.created_at.to_rfc3339(),
            complaint.updated_at.to_rfc3339(),
        ],
    );

    match result {
        Ok(_) => {
            // Log to audit trail
            let event = Event::new(
                "complaint_submitted",
                "complaint",
                &complaint.id,
                serde_json::json!({
                    "department": complaint.department,
                    "priority": complaint.priority.as_str(),
                    "citizen_id": complaint.citizen_id,
                }),
                "intake",
            );
            let _ = insert_event(conn, &event);

            Ok(true)
        }
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// Counts from a bulk insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub duplicates: usize,
}

/// Insert a batch of complaints, skipping duplicates
pub fn insert_complaints(conn: &Connection, complaints: &[Complaint]) -> Result<ImportSummary> {
    let mut summary = ImportSummary {
        inserted: 0,
        duplicates: 0,
    };

    for complaint in complaints {
        if insert_complaint(conn, complaint)? {
            summary.inserted += 1;
        } else {
            summary.duplicates += 1;
        }
    }

    Ok(summary)
}

/// Fetch a complaint by UUID
pub fn get_complaint(conn: &Connection, id: &str) -> Result<Option<Complaint>> {
    let complaint = conn
        .query_row(
            &format!("SELECT {COMPLAINT_COLUMNS} FROM complaints WHERE complaint_uuid = ?1"),
            params![id],
            complaint_from_row,
        )
        .optional()?;

    Ok(complaint)
}

/// Fetch all complaints in submission order
pub fn get_all_complaints(conn: &Connection) -> Result<Vec<Complaint>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COMPLAINT_COLUMNS} FROM complaints ORDER BY id ASC"
    ))?;

    let complaints = stmt
        .query_map([], complaint_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(complaints)
}

/// Fetch complaints routed to a department, in submission order
pub fn get_complaints_by_department(conn: &Connection, department: &str) -> Result<Vec<Complaint>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COMPLAINT_COLUMNS} FROM complaints WHERE department = ?1 ORDER BY id ASC"
    ))?;

    let complaints = stmt
        .query_map(params![department], complaint_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(complaints)
}

/// Fetch complaints in a given workflow status, in submission order
pub fn get_complaints_by_status(
    conn: &Connection,
    status: ComplaintStatus,
) -> Result<Vec<Complaint>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COMPLAINT_COLUMNS} FROM complaints WHERE status = ?1 ORDER BY id ASC"
    ))?;

    let complaints = stmt
        .query_map(params![status.as_str()], complaint_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(complaints)
}

/// Fetch the complaints a citizen has submitted, in submission order
pub fn get_complaints_by_citizen(conn: &Connection, citizen_id: &str) -> Result<Vec<Complaint>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COMPLAINT_COLUMNS} FROM complaints WHERE citizen_id = ?1 ORDER BY id ASC"
    ))?;

    let complaints = stmt
        .query_map(params![citizen_id], complaint_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(complaints)
}

/// Apply a partial update to a complaint
///
/// Returns the updated complaint, or None when the UUID is unknown. A status
/// change is recorded in the audit trail.
pub fn update_complaint(
    conn: &Connection,
    id: &str,
    update: &ComplaintUpdate,
) -> Result<Option<Complaint>> {
    let Some(mut complaint) = get_complaint(conn, id)? else {
        return Ok(None);
    };

    let previous_status = complaint.status;

    if let Some(status) = update.status {
        complaint.status = status;
    }
    if let Some(priority) = update.priority {
        complaint.priority = priority;
    }
    if let Some(department) = &update.department {
        complaint.department = department.clone();
    }
    if let Some(category) = &update.category {
        complaint.category = category.clone();
    }
    if let Some(assigned_to) = &update.assigned_to {
        complaint.assigned_to = Some(assigned_to.clone());
    }
    if let Some(resolution_notes) = &update.resolution_notes {
        complaint.resolution_notes = Some(resolution_notes.clone());
    }

    complaint.updated_at = Utc::now();

    conn.execute(
        "UPDATE complaints
         SET status = ?1, priority = ?2, department = ?3, category = ?4,
             assigned_to = ?5, resolution_notes = ?6, updated_at = ?7
         WHERE complaint_uuid = ?8",
        params![
            complaint.status.as_str(),
            complaint.priority.as_str(),
            complaint.department,
            complaint.category,
            complaint.assigned_to,
            complaint.resolution_notes,
            complaint.updated_at.to_rfc3339(),
            id,
        ],
    )?;

    if complaint.status != previous_status {
        let event = Event::new(
            "status_changed",
            "complaint",
            id,
            serde_json::json!({
                "from": previous_status.as_str(),
                "to": complaint.status.as_str(),
            }),
            "admin",
        );
        let _ = insert_event(conn, &event);
    }

    Ok(Some(complaint))
}

pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM complaints", [], |row| row.get(0))?;

    Ok(count)
}

// ============================================================================
// PROFILE STORAGE
// ============================================================================

const PROFILE_COLUMNS: &str = "profile_uuid, name, role, department, credits,
            location_address, location_lat, location_lng, created_at, updated_at";

fn profile_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Profile> {
    let role_str: String = row.get(2)?;
    let created_str: String = row.get(8)?;
    let updated_str: String = row.get(9)?;

    let lat: Option<f64> = row.get(6)?;
    let lng: Option<f64> = row.get(7)?;
    let coordinates = match (lat, lng) {
        (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
        _ => None,
    };

    Ok(Profile {
        id: row.get(0)?,
        name: row.get(1)?,
        role: Role::parse(&role_str).ok_or(rusqlite::Error::InvalidQuery)?,
        department: row.get(3)?,
        credits: row.get(4)?,
        address: row.get(5)?,
        coordinates,
        created_at: DateTime::parse_from_rfc3339(&created_str)
            .map_err(|_| rusqlite::Error::InvalidQuery)?
            .with_timezone(&Utc),
        updated_at: DateTime::parse_from_rfc3339(&updated_str)
            .map_err(|_| rusqlite::Error::InvalidQuery)?
            .with_timezone(&Utc),
    })
}

pub fn insert_profile(conn: &Connection, profile: &Profile) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO profiles ({PROFILE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
        ),
        params![
            profile.id,
            profile.name,
            profile.role.as_str(),
            profile.department,
            profile.credits,
            profile.address,
            profile.coordinates.map(|p| p.lat),
            profile.coordinates.map(|p| p.lng),
            profile.created_at.to_rfc3339(),
            profile.updated_at.to_rfc3339(),
        ],
    )?;

    Ok(())
}

pub fn get_profile(conn: &Connection, id: &str) -> Result<Option<Profile>> {
    let profile = conn
        .query_row(
            &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE profile_uuid = ?1"),
            params![id],
            profile_from_row,
        )
        .optional()?;

    Ok(profile)
}

pub fn get_all_profiles(conn: &Connection) -> Result<Vec<Profile>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY id ASC"
    ))?;

    let profiles = stmt
        .query_map([], profile_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(profiles)
}

pub fn count_profiles(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM profiles", [], |row| row.get(0))?;

    Ok(count)
}

// ============================================================================
// EVENT STORAGE
// ============================================================================

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            event.data.to_string(),
            event.actor,
        ],
    )?;

    Ok(())
}

/// Get events for a specific entity, newest first
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY timestamp DESC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], |row| {
            let timestamp_str: String = row.get(1)?;
            let data_json: String = row.get(5)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                    .map_err(|_| rusqlite::Error::InvalidQuery)?
                    .with_timezone(&Utc),
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json)
                    .map_err(|_| rusqlite::Error::InvalidQuery)?,
                actor: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

// ============================================================================
// CSV IMPORT
// ============================================================================

#[derive(Debug, Deserialize)]
struct ComplaintCsvRow {
    #[serde(rename = "Title")]
    title: String,

    #[serde(rename = "Description")]
    description: String,

    #[serde(rename = "Department")]
    department: String,

    #[serde(rename = "Category")]
    category: String,

    #[serde(rename = "Priority", default)]
    priority: String,

    #[serde(rename = "Citizen_ID")]
    citizen_id: String,

    #[serde(rename = "Citizen_Name")]
    citizen_name: String,

    #[serde(rename = "Address", default)]
    address: Option<String>,

    #[serde(rename = "Latitude", default)]
    latitude: Option<f64>,

    #[serde(rename = "Longitude", default)]
    longitude: Option<f64>,
}

/// Load legacy complaint records from a CSV export
///
/// Rows with an empty Priority column default to medium. A latitude without
/// a longitude (or vice versa) is treated as no coordinates.
pub fn load_complaints_csv(csv_path: &Path) -> Result<Vec<NewComplaint>> {
    let mut rdr = csv::Reader::from_path(csv_path).context("Failed to open CSV file")?;

    let mut complaints = Vec::new();

    for result in rdr.deserialize() {
        let row: ComplaintCsvRow = result.context("Failed to deserialize complaint row")?;

        let priority = if row.priority.trim().is_empty() {
            Priority::Medium
        } else {
            Priority::parse(row.priority.trim())
                .ok_or_else(|| anyhow!("Unknown priority '{}' in CSV", row.priority))?
        };

        let coordinates = match (row.latitude, row.longitude) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        };

        complaints.push(NewComplaint {
            title: row.title,
            description: row.description,
            department: row.department,
            category: row.category,
            priority,
            citizen_id: row.citizen_id,
            citizen_name: row.citizen_name,
            address: row.address.filter(|a| !a.trim().is_empty()),
            coordinates,
            attachments: vec![],
        });
    }

    Ok(complaints)
}

// ============================================================================
// TESTS
// ============================================================================
