// Civic Intake - CLI
// Bulk import of legacy complaint records and a quick status summary

use anyhow::{bail, Result};
use rusqlite::Connection;
use std::collections::HashMap;
use std::env;
use std::path::Path;

use civic_intake::{
    get_all_complaints, insert_complaints, load_complaints_csv, setup_database,
    validate_new_complaint, verify_count, Complaint, ComplaintStatus, DepartmentRegistry,
};

const DEFAULT_DB_PATH: &str = "complaints.db";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("import") => {
            let Some(csv_path) = args.get(2) else {
                bail!("Usage: civic-intake import <complaints.csv> [db-path]");
            };
            let db_path = args.get(3).map(String::as_str).unwrap_or(DEFAULT_DB_PATH);
            run_import(Path::new(csv_path), Path::new(db_path))?;
        }
        Some("stats") => {
            let db_path = args.get(2).map(String::as_str).unwrap_or(DEFAULT_DB_PATH);
            run_stats(Path::new(db_path))?;
        }
        _ => {
            print_usage();
        }
    }

    Ok(())
}

fn print_usage() {
    println!("Civic Intake v{}", civic_intake::VERSION);
    println!();
    println!("Usage:");
    println!("  civic-intake import <complaints.csv> [db-path]   Bulk-import legacy records");
    println!("  civic-intake stats [db-path]                     Show complaint statistics");
}

fn run_import(csv_path: &Path, db_path: &Path) -> Result<()> {
    println!("Civic Intake - Complaint Import");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // 1. Load CSV
    println!("\nLoading {:?}...", csv_path);
    let rows = load_complaints_csv(csv_path)?;
    println!("✓ Loaded {} complaint rows from CSV", rows.len());

    // 2. Validate against the department catalog
    let departments = DepartmentRegistry::with_defaults();
    let mut valid = Vec::new();
    let mut invalid = 0;

    for (i, row) in rows.into_iter().enumerate() {
        let report = validate_new_complaint(&row, &departments);
        if report.is_valid() {
            valid.push(Complaint::from_new(row));
        } else {
            invalid += 1;
            eprintln!("  ✗ Row {} skipped: {}", i + 1, report);
        }
    }
    println!("✓ Validated: {} usable, {} skipped", valid.len(), invalid);

    // 3. Setup database
    let conn = Connection::open(db_path)?;
    setup_database(&conn)?;
    println!("✓ Database initialized with WAL mode");

    // 4. Insert complaints
    let summary = insert_complaints(&conn, &valid)?;
    println!("✓ Inserted: {} complaints", summary.inserted);
    println!("✓ Skipped duplicates: {}", summary.duplicates);

    // 5. Verify count
    let count = verify_count(&conn)?;
    println!("\n✓ Database contains {} complaints", count);

    Ok(())
}

fn run_stats(db_path: &Path) -> Result<()> {
    if !db_path.exists() {
        bail!(
            "Database not found at {:?}. Run: civic-intake import <complaints.csv>",
            db_path
        );
    }

    let conn = Connection::open(db_path)?;
    let complaints = get_all_complaints(&conn)?;

    let mut by_status: HashMap<&'static str, usize> = HashMap::new();
    let mut by_department: HashMap<String, usize> = HashMap::new();
    let mut resolved = 0usize;

    for complaint in &complaints {
        *by_status.entry(complaint.status.as_str()).or_insert(0) += 1;
        *by_department.entry(complaint.department.clone()).or_insert(0) += 1;

        if matches!(
            complaint.status,
            ComplaintStatus::Resolved | ComplaintStatus::Closed
        ) {
            resolved += 1;
        }
    }

    println!("Civic Intake - Statistics");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("\nTotal complaints: {}", complaints.len());

    println!("\nBy status:");
    for status in ["submitted", "in-review", "in-progress", "resolved", "closed"] {
        println!("  {:<12} {}", status, by_status.get(status).unwrap_or(&0));
    }

    println!("\nBy department:");
    let mut departments: Vec<_> = by_department.into_iter().collect();
    departments.sort();
    for (department, count) in departments {
        println!("  {:<16} {}", department, count);
    }

    if !complaints.is_empty() {
        let rate = (resolved as f64 / complaints.len() as f64) * 100.0;
        println!("\nResolution rate: {:.0}%", rate);
    }

    Ok(())
}
