// Civic Intake - Core Library
// Exposes all modules for use in the CLI, API server, and tests

pub mod db;
pub mod entities;
pub mod geo;
pub mod ledger;
pub mod validation;

// Re-export commonly used types
pub use db::{
    count_profiles, get_all_complaints, get_all_profiles, get_complaint,
    get_complaints_by_citizen, get_complaints_by_department, get_complaints_by_status,
    get_events_for_entity, get_profile, insert_complaint, insert_complaints, insert_event,
    insert_profile, load_complaints_csv, setup_database, update_complaint, verify_count,
    Complaint, ComplaintStatus, ComplaintUpdate, Event, ImportSummary, NewComplaint, Priority,
    Profile, Role,
};
pub use entities::{Department, DepartmentRegistry};
pub use geo::{
    bounding_box, haversine_distance, nearby_complaints, within_bounding_box, BoundingBox,
    GeoPoint, DEFAULT_RADIUS_KM, EARTH_RADIUS_KM,
};
pub use ledger::{
    award, starting_credits, Award, LedgerError, QualityRating, CITIZEN_STARTING_CREDITS,
};
pub use validation::{validate_new_complaint, ValidationIssue, ValidationReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
