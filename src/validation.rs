// Intake Validation - Field-level checks on incoming complaints
// Collects every problem instead of stopping at the first one

use crate::db::NewComplaint;
use crate::entities::DepartmentRegistry;

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// All issues found in one submission
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            field: field.to_string(),
            message: message.into(),
        });
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<String> = self.issues.iter().map(|i| i.to_string()).collect();
        write!(f, "{}", rendered.join("; "))
    }
}

// ============================================================================
// COMPLAINT VALIDATION
// ============================================================================

/// Validate a submission before it reaches storage
///
/// Checks: non-empty text fields, a known department, and coordinate ranges.
/// An address and coordinates are each optional and independent.
pub fn validate_new_complaint(
    new: &NewComplaint,
    departments: &DepartmentRegistry,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    if new.title.trim().is_empty() {
        report.push("title", "must not be empty");
    }

    if new.description.trim().is_empty() {
        report.push("description", "must not be empty");
    }

    if new.citizen_id.trim().is_empty() {
        report.push("citizen_id", "must not be empty");
    }

    if new.citizen_name.trim().is_empty() {
        report.push("citizen_name", "must not be empty");
    }

    if departments.find_by_name(&new.department).is_none() {
        report.push(
            "department",
            format!("unknown department '{}'", new.department),
        );
    }

    if let Some(point) = new.coordinates {
        if !(-90.0..=90.0).contains(&point.lat) {
            report.push("coordinates", format!("latitude {} out of range", point.lat));
        }
        if !(-180.0..=180.0).contains(&point.lng) {
            report.push(
                "coordinates",
                format!("longitude {} out of range", point.lng),
            );
        }
    }

    report
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Priority;
    use crate::geo::GeoPoint;

    fn valid_submission() -> NewComplaint {
        NewComplaint {
            title: "Pothole on Main Street".to_string(),
            description: "Large pothole causing damage to vehicles".to_string(),
            department: "Transportation".to_string(),
            category: "Road Maintenance".to_string(),
            priority: Priority::High,
            citizen_id: "citizen-1".to_string(),
            citizen_name: "John Doe".to_string(),
            address: Some("123 Main St".to_string()),
            coordinates: Some(GeoPoint::new(39.7392, -104.9903)),
            attachments: vec![],
        }
    }

    #[test]
    fn test_valid_submission_passes() {
        let registry = DepartmentRegistry::with_defaults();
        let report = validate_new_complaint(&valid_submission(), &registry);

        assert!(report.is_valid(), "unexpected issues: {}", report);
    }

    #[test]
    fn test_empty_title_and_description_rejected() {
        let registry = DepartmentRegistry::with_defaults();

        let mut submission = valid_submission();
        submission.title = "   ".to_string();
        submission.description = String::new();

        let report = validate_new_complaint(&submission, &registry);

        assert!(!report.is_valid());
        let fields: Vec<&str> = report.issues.iter().map(|i| i.field.as_str()).collect();
        assert!(fields.contains(&"title"));
        assert!(fields.contains(&"description"));
    }

    #[test]
    fn test_unknown_department_rejected() {
        let registry = DepartmentRegistry::with_defaults();

        let mut submission = valid_submission();
        submission.department = "Bureau of Nonsense".to_string();

        let report = validate_new_complaint(&submission, &registry);

        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].field, "department");
    }

    #[test]
    fn test_out_of_range_coordinates_rejected() {
        let registry = DepartmentRegistry::with_defaults();

        let mut submission = valid_submission();
        submission.coordinates = Some(GeoPoint::new(95.0, -200.0));

        let report = validate_new_complaint(&submission, &registry);

        // Latitude and longitude each reported separately
        assert_eq!(report.issues.len(), 2);
        assert!(report.issues.iter().all(|i| i.field == "coordinates"));
    }

    #[test]
    fn test_missing_location_is_fine() {
        let registry = DepartmentRegistry::with_defaults();

        let mut submission = valid_submission();
        submission.address = None;
        submission.coordinates = None;

        let report = validate_new_complaint(&submission, &registry);
        assert!(report.is_valid());
    }

    #[test]
    fn test_missing_citizen_fields_rejected() {
        let registry = DepartmentRegistry::with_defaults();

        let mut submission = valid_submission();
        submission.citizen_id = String::new();
        submission.citizen_name = " ".to_string();

        let report = validate_new_complaint(&submission, &registry);

        let fields: Vec<&str> = report.issues.iter().map(|i| i.field.as_str()).collect();
        assert!(fields.contains(&"citizen_id"));
        assert!(fields.contains(&"citizen_name"));
    }
}
