// Entity Models
//
// The department catalog is the only registry-backed entity: complaints and
// profiles live in storage (see `db`), departments are fixed configuration.

pub mod department;

pub use department::{Department, DepartmentRegistry};
