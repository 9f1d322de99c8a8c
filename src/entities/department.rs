// Department Entity - The fixed catalog of municipal departments
//
// Department ids are stable slugs, not UUIDs: the catalog is configuration,
// and complaints reference departments by display name.

use serde::{Deserialize, Serialize};

// ============================================================================
// DEPARTMENT ENTITY
// ============================================================================

/// A municipal department complaints are routed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    /// Stable slug identity (e.g. "transportation")
    pub id: String,

    /// Display name (e.g. "Transportation")
    pub name: String,

    /// Icon name for clients
    pub icon: String,

    /// What this department handles
    pub description: String,

    /// Display color token for clients
    pub color: String,
}

impl Department {
    pub fn new(id: &str, name: &str, icon: &str, description: &str, color: &str) -> Self {
        Department {
            id: id.to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
            description: description.to_string(),
            color: color.to_string(),
        }
    }
}

// ============================================================================
// DEPARTMENT REGISTRY
// ============================================================================

/// Registry of all departments complaints may be routed to
pub struct DepartmentRegistry {
    departments: Vec<Department>,
}

impl DepartmentRegistry {
    /// Create new empty registry
    pub fn new() -> Self {
        DepartmentRegistry {
            departments: Vec::new(),
        }
    }

    /// Create registry seeded with the standard municipal departments
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_default_departments();
        registry
    }

    fn register_default_departments(&mut self) {
        self.register(Department::new(
            "transportation",
            "Transportation",
            "Car",
            "Roads, traffic, public transit, parking",
            "bg-blue-500",
        ));
        self.register(Department::new(
            "education",
            "Education",
            "GraduationCap",
            "Schools, educational facilities, programs",
            "bg-green-500",
        ));
        self.register(Department::new(
            "health",
            "Health",
            "Heart",
            "Public health, sanitation, medical facilities",
            "bg-red-500",
        ));
        self.register(Department::new(
            "environment",
            "Environment",
            "Leaf",
            "Parks, pollution, waste management, conservation",
            "bg-emerald-500",
        ));
        self.register(Department::new(
            "infrastructure",
            "Infrastructure",
            "Building",
            "Buildings, construction, zoning, permits",
            "bg-gray-500",
        ));
        self.register(Department::new(
            "utilities",
            "Utilities",
            "Zap",
            "Water, electricity, gas, telecommunications",
            "bg-yellow-500",
        ));
    }

    /// Register a department
    pub fn register(&mut self, department: Department) {
        self.departments.push(department);
    }

    /// Find department by display name (case-insensitive)
    pub fn find_by_name(&self, name: &str) -> Option<&Department> {
        let lower_name = name.to_lowercase();
        self.departments
            .iter()
            .find(|dept| dept.name.to_lowercase() == lower_name)
    }

    /// Find department by slug id
    pub fn find_by_id(&self, id: &str) -> Option<&Department> {
        self.departments.iter().find(|dept| dept.id == id)
    }

    /// All registered departments, in registration order
    pub fn all(&self) -> &[Department] {
        &self.departments
    }

    /// Display names of all registered departments
    pub fn names(&self) -> Vec<&str> {
        self.departments.iter().map(|d| d.name.as_str()).collect()
    }

    /// Number of registered departments
    pub fn count(&self) -> usize {
        self.departments.len()
    }
}

impl Default for DepartmentRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_has_six_departments() {
        let registry = DepartmentRegistry::with_defaults();
        assert_eq!(registry.count(), 6);

        let names = registry.names();
        assert!(names.contains(&"Transportation"));
        assert!(names.contains(&"Education"));
        assert!(names.contains(&"Health"));
        assert!(names.contains(&"Environment"));
        assert!(names.contains(&"Infrastructure"));
        assert!(names.contains(&"Utilities"));
    }

    #[test]
    fn test_find_by_name_is_case_insensitive() {
        let registry = DepartmentRegistry::with_defaults();

        let dept = registry.find_by_name("transportation");
        assert!(dept.is_some());
        assert_eq!(dept.unwrap().id, "transportation");

        let dept2 = registry.find_by_name("TRANSPORTATION");
        assert!(dept2.is_some());

        assert!(registry.find_by_name("Bureau of Nonsense").is_none());
    }

    #[test]
    fn test_find_by_id() {
        let registry = DepartmentRegistry::with_defaults();

        let dept = registry.find_by_id("utilities").unwrap();
        assert_eq!(dept.name, "Utilities");

        assert!(registry.find_by_id("nope").is_none());
    }

    #[test]
    fn test_register_custom_department() {
        let mut registry = DepartmentRegistry::new();
        assert_eq!(registry.count(), 0);

        registry.register(Department::new(
            "animal-control",
            "Animal Control",
            "Paw",
            "Strays, wildlife, licensing",
            "bg-orange-500",
        ));

        assert_eq!(registry.count(), 1);
        assert!(registry.find_by_name("Animal Control").is_some());
    }
}
