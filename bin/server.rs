// Civic Intake - API Server
// REST surface over the complaint store, credit ledger, and proximity query

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;

use civic_intake::{
    award, get_all_complaints, get_complaint, get_complaints_by_department,
    get_complaints_by_status, get_events_for_entity, get_profile, insert_complaint,
    insert_profile, nearby_complaints, setup_database, update_complaint, validate_new_complaint,
    Award, Complaint, ComplaintStatus, ComplaintUpdate, DepartmentRegistry, GeoPoint, LedgerError,
    NewComplaint, Profile, QualityRating, Role, DEFAULT_RADIUS_KM,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
    departments: Arc<DepartmentRegistry>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Stats response
#[derive(Serialize)]
struct StatsResponse {
    total_complaints: usize,
    pending: usize,
    in_progress: usize,
    resolved: usize,
    resolution_rate: f64,
    by_department: Vec<DepartmentStat>,
}

#[derive(Serialize)]
struct DepartmentStat {
    department: String,
    count: usize,
}

/// Body for POST /api/complaints/:id/rate
#[derive(Deserialize)]
struct RateRequest {
    rating: String,
}

/// Body for POST /api/profiles
#[derive(Deserialize)]
struct NewProfile {
    name: String,
    role: String,
    #[serde(default)]
    department: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    coordinates: Option<GeoPoint>,
}

/// Query string for GET /api/complaints/nearby
#[derive(Deserialize)]
struct NearbyParams {
    lat: Option<f64>,
    lng: Option<f64>,
    radius_km: Option<f64>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/complaints - All complaints in submission order
async fn list_complaints(State(state): State<AppState>) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    match get_all_complaints(&conn) {
        Ok(complaints) => (StatusCode::OK, Json(ApiResponse::ok(complaints))).into_response(),
        Err(e) => {
            eprintln!("Error listing complaints: {}", e);
            internal_error()
        }
    }
}

/// GET /api/complaints/:id - Single complaint
async fn get_complaint_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    match get_complaint(&conn, &id) {
        Ok(Some(complaint)) => (StatusCode::OK, Json(ApiResponse::ok(complaint))).into_response(),
        Ok(None) => not_found(&id),
        Err(e) => {
            eprintln!("Error getting complaint {}: {}", id, e);
            internal_error()
        }
    }
}

/// POST /api/complaints - Validated complaint intake
async fn create_complaint(
    State(state): State<AppState>,
    Json(new): Json<NewComplaint>,
) -> impl IntoResponse {
    let report = validate_new_complaint(&new, &state.departments);
    if !report.is_valid() {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::<Complaint>::err(report.to_string())),
        )
            .into_response();
    }

    let complaint = Complaint::from_new(new);
    let conn = state.db.lock().unwrap();

    match insert_complaint(&conn, &complaint) {
        Ok(true) => (StatusCode::CREATED, Json(ApiResponse::ok(complaint))).into_response(),
        Ok(false) => (
            StatusCode::CONFLICT,
            Json(ApiResponse::<Complaint>::err("duplicate submission")),
        )
            .into_response(),
        Err(e) => {
            eprintln!("Error creating complaint: {}", e);
            internal_error()
        }
    }
}

/// PUT /api/complaints/:id - Partial update (status, assignment, notes...)
async fn update_complaint_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<ComplaintUpdate>,
) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    match update_complaint(&conn, &id, &update) {
        Ok(Some(complaint)) => (StatusCode::OK, Json(ApiResponse::ok(complaint))).into_response(),
        Ok(None) => not_found(&id),
        Err(e) => {
            eprintln!("Error updating complaint {}: {}", id, e);
            internal_error()
        }
    }
}

/// POST /api/complaints/:id/rate - Rate a resolved complaint and move credits
async fn rate_complaint(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<RateRequest>,
) -> impl IntoResponse {
    let Some(rating) = QualityRating::parse(&request.rating) else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::<Award>::err(format!(
                "unknown rating '{}'",
                request.rating
            ))),
        )
            .into_response();
    };

    let mut conn = state.db.lock().unwrap();

    match award(&mut conn, &id, rating, "admin") {
        Ok(outcome) => (StatusCode::OK, Json(ApiResponse::ok(outcome))).into_response(),
        Err(e) => ledger_error_response(e),
    }
}

/// GET /api/complaints/nearby?lat=..&lng=..&radius_km=.. - Proximity query
async fn nearby(
    State(state): State<AppState>,
    Query(params): Query<NearbyParams>,
) -> impl IntoResponse {
    let (Some(lat), Some(lng)) = (params.lat, params.lng) else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::<Vec<Complaint>>::err(
                "lat and lng query parameters are required",
            )),
        )
            .into_response();
    };

    let center = GeoPoint::new(lat, lng);
    let radius_km = params.radius_km.unwrap_or(DEFAULT_RADIUS_KM);

    let conn = state.db.lock().unwrap();

    match get_all_complaints(&conn) {
        Ok(complaints) => {
            let hits = nearby_complaints(&complaints, center, radius_km);
            (StatusCode::OK, Json(ApiResponse::ok(hits))).into_response()
        }
        Err(e) => {
            eprintln!("Error running nearby query: {}", e);
            internal_error()
        }
    }
}

/// GET /api/complaints/department/:name - Complaints routed to a department
async fn complaints_by_department(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    // Decode URL-encoded department name
    let decoded_name = urlencoding::decode(&name)
        .unwrap_or_else(|_| name.clone().into())
        .into_owned();

    let conn = state.db.lock().unwrap();

    match get_complaints_by_department(&conn, &decoded_name) {
        Ok(complaints) => (StatusCode::OK, Json(ApiResponse::ok(complaints))).into_response(),
        Err(e) => {
            eprintln!("Error filtering by department {}: {}", decoded_name, e);
            internal_error()
        }
    }
}

/// GET /api/complaints/status/:status - Complaints in a workflow status
async fn complaints_by_status(
    State(state): State<AppState>,
    Path(status): Path<String>,
) -> impl IntoResponse {
    let Some(status) = ComplaintStatus::parse(&status) else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::<Vec<Complaint>>::err(format!(
                "unknown status '{}'",
                status
            ))),
        )
            .into_response();
    };

    let conn = state.db.lock().unwrap();

    match get_complaints_by_status(&conn, status) {
        Ok(complaints) => (StatusCode::OK, Json(ApiResponse::ok(complaints))).into_response(),
        Err(e) => {
            eprintln!("Error filtering by status: {}", e);
            internal_error()
        }
    }
}

/// GET /api/complaints/:id/events - Audit trail for one complaint
async fn complaint_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    match get_events_for_entity(&conn, "complaint", &id) {
        Ok(events) => (StatusCode::OK, Json(ApiResponse::ok(events))).into_response(),
        Err(e) => {
            eprintln!("Error getting events for {}: {}", id, e);
            internal_error()
        }
    }
}

/// GET /api/departments - The routing catalog
async fn list_departments(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.departments.all().to_vec()))
}

/// GET /api/profiles/:id - Single account
async fn get_profile_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    match get_profile(&conn, &id) {
        Ok(Some(profile)) => (StatusCode::OK, Json(ApiResponse::ok(profile))).into_response(),
        Ok(None) => not_found(&id),
        Err(e) => {
            eprintln!("Error getting profile {}: {}", id, e);
            internal_error()
        }
    }
}

/// POST /api/profiles - Create an account with its starting stipend
async fn create_profile(
    State(state): State<AppState>,
    Json(new): Json<NewProfile>,
) -> impl IntoResponse {
    let Some(role) = Role::parse(&new.role) else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiResponse::<Profile>::err(format!(
                "unknown role '{}'",
                new.role
            ))),
        )
            .into_response();
    };

    let profile = Profile::new(new.name, role, new.department, new.address, new.coordinates);
    let conn = state.db.lock().unwrap();

    match insert_profile(&conn, &profile) {
        Ok(()) => (StatusCode::CREATED, Json(ApiResponse::ok(profile))).into_response(),
        Err(e) => {
            eprintln!("Error creating profile: {}", e);
            internal_error()
        }
    }
}

/// GET /api/stats - Complaint totals and resolution rate
async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    let conn = state.db.lock().unwrap();

    match get_all_complaints(&conn) {
        Ok(complaints) => {
            let total = complaints.len();

            let mut pending = 0;
            let mut in_progress = 0;
            let mut resolved = 0;

            let mut department_counts: std::collections::HashMap<String, usize> =
                std::collections::HashMap::new();

            for complaint in &complaints {
                match complaint.status {
                    ComplaintStatus::Submitted | ComplaintStatus::InReview => pending += 1,
                    ComplaintStatus::InProgress => in_progress += 1,
                    ComplaintStatus::Resolved | ComplaintStatus::Closed => resolved += 1,
                }

                *department_counts
                    .entry(complaint.department.clone())
                    .or_insert(0) += 1;
            }

            let mut by_department: Vec<DepartmentStat> = department_counts
                .into_iter()
                .map(|(department, count)| DepartmentStat { department, count })
                .collect();
            by_department.sort_by(|a, b| a.department.cmp(&b.department));

            let resolution_rate = if total > 0 {
                (resolved as f64 / total as f64) * 100.0
            } else {
                0.0
            };

            let stats = StatsResponse {
                total_complaints: total,
                pending,
                in_progress,
                resolved,
                resolution_rate,
                by_department,
            };

            (StatusCode::OK, Json(ApiResponse::ok(stats))).into_response()
        }
        Err(e) => {
            eprintln!("Error getting stats: {}", e);
            internal_error()
        }
    }
}

// ============================================================================
// Error mapping
// ============================================================================

fn not_found(id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::err(format!("not found: {}", id))),
    )
        .into_response()
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::<()>::err("internal error")),
    )
        .into_response()
}

fn ledger_error_response(err: LedgerError) -> Response {
    let status = match &err {
        LedgerError::UnknownComplaint(_) | LedgerError::UnknownAccount(_) => StatusCode::NOT_FOUND,
        LedgerError::AlreadyRated(_) | LedgerError::NotResolved(_) => StatusCode::CONFLICT,
        LedgerError::StorageContention => StatusCode::SERVICE_UNAVAILABLE,
        LedgerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        eprintln!("Ledger storage error: {}", err);
    }

    (status, Json(ApiResponse::<Award>::err(err.to_string()))).into_response()
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() {
    println!("Civic Intake - API Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━");

    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "complaints.db".to_string());

    let conn = Connection::open(&db_path).expect("Failed to open database");
    setup_database(&conn).expect("Failed to initialize database");
    println!("✓ Database opened: {}", db_path);

    // Create shared state
    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
        departments: Arc::new(DepartmentRegistry::with_defaults()),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/complaints", get(list_complaints).post(create_complaint))
        .route("/complaints/nearby", get(nearby))
        .route(
            "/complaints/:id",
            get(get_complaint_by_id).put(update_complaint_by_id),
        )
        .route("/complaints/:id/rate", post(rate_complaint))
        .route("/complaints/:id/events", get(complaint_events))
        .route("/complaints/department/:name", get(complaints_by_department))
        .route("/complaints/status/:status", get(complaints_by_status))
        .route("/departments", get(list_departments))
        .route("/profiles", post(create_profile))
        .route("/profiles/:id", get(get_profile_by_id))
        .route("/stats", get(get_stats))
        .with_state(state);

    // Build main router
    let app = Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive());

    // Start server
    let addr = "0.0.0.0:3000";
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    println!("\n✓ Server running on http://localhost:3000");
    println!("  API: http://localhost:3000/api/complaints");
    println!("\n  Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
