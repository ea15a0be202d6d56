use crate::{
    auth::auth::AuthUser,
    error::HandoverError,
    handover::{HandoverCoordinator, HandoverRequest},
    model::handover::{HandoverStatus, HandoverView, LeaveHandover},
};
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateHandover {
    #[schema(example = 12)]
    pub leave_id: u64,
    #[schema(example = 1001)]
    pub to_employee_id: u64,
    #[schema(example = "Cover the weekly payroll export and vendor calls")]
    pub notes: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateAdminHandover {
    #[schema(example = 12)]
    pub leave_id: u64,
    #[schema(example = 1000)]
    pub from_employee_id: u64,
    #[schema(example = 1001)]
    pub to_employee_id: u64,
    #[schema(example = "Cover the weekly payroll export and vendor calls")]
    pub notes: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateHandoverStatus {
    /// accepted or rejected
    #[schema(example = "accepted")]
    pub status: String,
}

#[derive(Serialize, ToSchema)]
pub struct HandoverListResponse {
    pub data: Vec<HandoverView>,
    #[schema(example = 1)]
    pub total: usize,
}

impl From<Vec<HandoverView>> for HandoverListResponse {
    fn from(data: Vec<HandoverView>) -> Self {
        Self {
            total: data.len(),
            data,
        }
    }
}

/* =========================
Create handover (employee)
========================= */
#[utoipa::path(
    post,
    path = "/api/handover",
    request_body(
        content = CreateHandover,
        description = "Handover for one of the caller's approved leaves",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Handover created, waiting for the recipient", body = LeaveHandover),
        (status = 400, description = "Invalid input or leave not approved", body = Object, example = json!({
            "message": "handover only allowed for approved leave"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave or employee not found"),
        (status = 409, description = "Recipient unavailable", body = Object, example = json!({
            "message": "employee already has a handover during this period"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Handover"
)]
#[instrument(skip_all, fields(user_id = auth.user_id, username = %auth.username))]
pub async fn create_handover(
    auth: AuthUser,
    coordinator: web::Data<HandoverCoordinator>,
    payload: web::Json<CreateHandover>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    let payload = payload.into_inner();

    let handover = coordinator
        .create_handover(
            HandoverRequest {
                leave_id: payload.leave_id,
                from_employee_id: employee_id,
                to_employee_id: payload.to_employee_id,
                notes: payload.notes,
            },
            false,
        )
        .await?;

    Ok(HttpResponse::Created().json(handover))
}

/* =========================
Create handover (HR/Admin)
========================= */
#[utoipa::path(
    post,
    path = "/api/handover/admin",
    request_body = CreateAdminHandover,
    responses(
        (status = 201, description = "Handover assigned and accepted", body = LeaveHandover),
        (status = 400, description = "Invalid input or leave not approved"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "Leave or employee not found"),
        (status = 409, description = "Recipient unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Handover"
)]
#[instrument(skip_all, fields(user_id = auth.user_id, username = %auth.username))]
pub async fn create_admin_handover(
    auth: AuthUser,
    coordinator: web::Data<HandoverCoordinator>,
    payload: web::Json<CreateAdminHandover>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let payload = payload.into_inner();

    let handover = coordinator
        .create_admin_handover(HandoverRequest {
            leave_id: payload.leave_id,
            from_employee_id: payload.from_employee_id,
            to_employee_id: payload.to_employee_id,
            notes: payload.notes,
        })
        .await?;

    Ok(HttpResponse::Created().json(handover))
}

/* =========================
Accept / reject (recipient)
========================= */
#[utoipa::path(
    put,
    path = "/api/handover/{handover_id}/status",
    params(
        ("handover_id" = u64, Path, description = "ID of the handover to answer")
    ),
    request_body = UpdateHandoverStatus,
    responses(
        (status = 200, description = "Handover answered", body = LeaveHandover),
        (status = 400, description = "Bad status value or handover no longer pending", body = Object, example = json!({
            "message": "cannot modify admin-initiated handover"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is not the recipient"),
        (status = 404, description = "Handover not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Handover"
)]
#[instrument(skip_all, fields(user_id = auth.user_id, username = %auth.username))]
pub async fn update_handover_status(
    auth: AuthUser,
    coordinator: web::Data<HandoverCoordinator>,
    path: web::Path<u64>,
    payload: web::Json<UpdateHandoverStatus>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    let handover_id = path.into_inner();

    let status: HandoverStatus = payload.status.parse().map_err(|_| {
        debug!(value = %payload.status, "Unparsable handover status");
        HandoverError::invalid_input("status must be accepted or rejected")
    })?;

    let handover = coordinator
        .update_status(handover_id, status, employee_id)
        .await?;

    Ok(HttpResponse::Ok().json(handover))
}

/// Caller's own handover history, given and received
#[utoipa::path(
    get,
    path = "/api/handover/history",
    responses(
        (status = 200, description = "Handovers involving the caller, newest first", body = HandoverListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No employee profile")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Handover"
)]
#[instrument(skip_all, fields(user_id = auth.user_id, username = %auth.username))]
pub async fn handover_history(
    auth: AuthUser,
    coordinator: web::Data<HandoverCoordinator>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.require_employee()?;
    let history = coordinator.get_history(employee_id).await?;

    Ok(HttpResponse::Ok().json(HandoverListResponse::from(history)))
}

/// Every handover in the organisation (HR/Admin)
#[utoipa::path(
    get,
    path = "/api/handover",
    responses(
        (status = 200, description = "All handovers, newest first", body = HandoverListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR/Admin only")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Handover"
)]
#[instrument(skip_all, fields(user_id = auth.user_id, username = %auth.username))]
pub async fn handover_list(
    auth: AuthUser,
    coordinator: web::Data<HandoverCoordinator>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;
    let all = coordinator.get_all().await?;

    Ok(HttpResponse::Ok().json(HandoverListResponse::from(all)))
}

/// Single handover, visible to its two participants and to HR/Admin.
/// Anyone else sees 404, as for an id that does not exist.
#[utoipa::path(
    get,
    path = "/api/handover/{handover_id}",
    params(
        ("handover_id" = u64, Path, description = "ID of the handover to fetch")
    ),
    responses(
        (status = 200, description = "Handover found", body = HandoverView),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Handover not found or caller not a participant", body = Object, example = json!({
            "message": "handover not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Handover"
)]
#[instrument(skip_all, fields(user_id = auth.user_id, username = %auth.username))]
pub async fn get_handover(
    auth: AuthUser,
    coordinator: web::Data<HandoverCoordinator>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let view = coordinator.get_handover(path.into_inner()).await?;

    // Outsiders get the same answer for foreign and missing ids.
    let participant = auth
        .employee_id
        .is_some_and(|me| me == view.from_employee_id || me == view.to_employee_id);
    if !participant && !auth.role.is_privileged() {
        debug!(handover_id = view.id, "Handover read by non-participant");
        return Err(HandoverError::not_found("handover not found").into());
    }

    Ok(HttpResponse::Ok().json(view))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/handover")
            // /handover
            .service(
                web::resource("")
                    .route(web::get().to(handover_list))
                    .route(web::post().to(create_handover)),
            )
            // /handover/admin
            .service(web::resource("/admin").route(web::post().to(create_admin_handover)))
            // /handover/history
            .service(web::resource("/history").route(web::get().to(handover_history)))
            // /handover/{id}
            .service(web::resource("/{id}").route(web::get().to(get_handover)))
            // /handover/{id}/status
            .service(
                web::resource("/{id}/status").route(web::put().to(update_handover_status)),
            ),
    );
}
