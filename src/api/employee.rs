use super::store_failure;
use crate::model::employee::{EmployeeIdentity, EmployeeUpdate};
use crate::state::AppState;
use crate::utils::natural_sort::natural_cmp;
use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use serde_json::json;
use tracing::debug;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct EmployeeSyncResponse {
    #[schema(example = 3)]
    pub updated: usize,
}

/// List the employee directory
#[utoipa::path(
    get,
    path = "/api/employees",
    responses(
        (status = 200, description = "Employees in natural id order", body = [EmployeeIdentity]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn list_employees(state: web::Data<AppState>) -> actix_web::Result<impl Responder> {
    let mut employees = state
        .directory
        .list()
        .await
        .map_err(|e| store_failure(e, "list employees"))?;
    employees.sort_by(|a, b| natural_cmp(&a.id, &b.id));
    Ok(HttpResponse::Ok().json(employees))
}

/// Merge identities into the directory
///
/// Blank fields never overwrite stored ones.
#[utoipa::path(
    post,
    path = "/api/employees/sync",
    request_body = [EmployeeUpdate],
    responses(
        (status = 200, description = "Identities merged", body = EmployeeSyncResponse),
        (status = 400, description = "No identity carries an id"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn sync_employees(
    state: web::Data<AppState>,
    payload: web::Json<Vec<EmployeeUpdate>>,
) -> actix_web::Result<impl Responder> {
    let submitted = payload.len();
    let updates: Vec<EmployeeUpdate> = payload
        .into_inner()
        .into_iter()
        .filter(|u| !u.id.trim().is_empty())
        .collect();
    if updates.is_empty() && submitted > 0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "Every identity needs an id"
        })));
    }

    let updated = state
        .directory
        .upsert(updates)
        .await
        .map_err(|e| store_failure(e, "merge employees"))?;
    debug!(submitted, updated, "Employee identities merged");
    Ok(HttpResponse::Ok().json(EmployeeSyncResponse { updated }))
}
