use actix_web::{http::StatusCode, test};
use resa::database::models::{CreateEmployeeRequest, CreateRestaurantRequest, CreateRoleRequest};
use resa::database::repositories::{EmployeeRepository, RestaurantRepository, RoleRepository};
use serde_json::json;

#[macro_use]
mod common;
use common::TestApp;

struct Fixture {
    owner_token: String,
    restaurant_id: uuid::Uuid,
}

async fn setup_restaurant(ctx: &TestApp) -> Fixture {
    let (owner_id, owner_token) = ctx.active_user_with_token("owner@example.com").await;
    let restaurant = ctx
        .restaurant_repo
        .create(
            owner_id,
            &CreateRestaurantRequest {
                name: "Joe's Diner".to_string(),
                address: "1 Main St".to_string(),
                phone: None,
            },
        )
        .await
        .unwrap();
    Fixture {
        owner_token,
        restaurant_id: restaurant.id,
    }
}

/// Scenario 4 — assignment validity: an employee with no role granted
/// cannot be assigned a shift requiring that role.
#[actix_web::test]
async fn assign_employee_without_required_role_is_forbidden() {
    let ctx = TestApp::new();
    let app = test::init_service(full_app!(ctx)).await;
    let fx = setup_restaurant(&ctx).await;

    let cook_role = ctx
        .role_repo
        .create(
            fx.restaurant_id,
            &CreateRoleRequest {
                name: "Cook".to_string(),
                color: None,
            },
        )
        .await
        .unwrap();

    let employee = ctx
        .employee_repo
        .create(
            fx.restaurant_id,
            &CreateEmployeeRequest {
                full_name: "Alex Employee".to_string(),
                email: "alex@example.com".to_string(),
            },
        )
        .await
        .unwrap();

    let req = test::TestRequest::post()
        .uri(&format!(
            "/v1/restaurants/{}/schedules",
            fx.restaurant_id
        ))
        .insert_header(common::bearer(&fx.owner_token))
        .set_json(json!({"startDate": "2025-01-06", "endDate": "2025-01-12"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let schedule_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!(
            "/v1/restaurants/{}/schedules/{schedule_id}/shifts",
            fx.restaurant_id
        ))
        .insert_header(common::bearer(&fx.owner_token))
        .set_json(json!({
            "roleId": cook_role.id,
            "shiftDate": "2025-01-06",
            "startTime": "09:00",
            "endTime": "17:00"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let shift_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!(
            "/v1/restaurants/{}/schedules/{schedule_id}/shifts/{shift_id}/assign",
            fx.restaurant_id
        ))
        .insert_header(common::bearer(&fx.owner_token))
        .set_json(json!({"employeeId": employee.id}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(
        body["error"],
        "employee does not have the required role for this shift"
    );

    let req = test::TestRequest::get()
        .uri(&format!(
            "/v1/restaurants/{}/schedules/{schedule_id}/shifts/{shift_id}",
            fx.restaurant_id
        ))
        .insert_header(common::bearer(&fx.owner_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["data"]["employeeId"].is_null());
}

/// Granting the role first makes the same assignment succeed, and passing
/// `employeeId: null` always unassigns.
#[actix_web::test]
async fn assign_then_unassign_employee_with_role() {
    let ctx = TestApp::new();
    let app = test::init_service(full_app!(ctx)).await;
    let fx = setup_restaurant(&ctx).await;

    let cook_role = ctx
        .role_repo
        .create(
            fx.restaurant_id,
            &CreateRoleRequest {
                name: "Cook".to_string(),
                color: None,
            },
        )
        .await
        .unwrap();
    let employee = ctx
        .employee_repo
        .create(
            fx.restaurant_id,
            &CreateEmployeeRequest {
                full_name: "Alex Employee".to_string(),
                email: "alex@example.com".to_string(),
            },
        )
        .await
        .unwrap();

    let req = test::TestRequest::post()
        .uri(&format!(
            "/v1/restaurants/{}/employees/{}/roles/{}",
            fx.restaurant_id, employee.id, cook_role.id
        ))
        .insert_header(common::bearer(&fx.owner_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::post()
        .uri(&format!("/v1/restaurants/{}/schedules", fx.restaurant_id))
        .insert_header(common::bearer(&fx.owner_token))
        .set_json(json!({"startDate": "2025-01-06", "endDate": "2025-01-12"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    let schedule_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!(
            "/v1/restaurants/{}/schedules/{schedule_id}/shifts",
            fx.restaurant_id
        ))
        .insert_header(common::bearer(&fx.owner_token))
        .set_json(json!({
            "roleId": cook_role.id,
            "shiftDate": "2025-01-06",
            "startTime": "09:00",
            "endTime": "17:00"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    let shift_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!(
            "/v1/restaurants/{}/schedules/{schedule_id}/shifts/{shift_id}/assign",
            fx.restaurant_id
        ))
        .insert_header(common::bearer(&fx.owner_token))
        .set_json(json!({"employeeId": employee.id}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["employeeId"], employee.id.to_string());

    let req = test::TestRequest::post()
        .uri(&format!(
            "/v1/restaurants/{}/schedules/{schedule_id}/shifts/{shift_id}/assign",
            fx.restaurant_id
        ))
        .insert_header(common::bearer(&fx.owner_token))
        .set_json(json!({"employeeId": null}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert!(body["data"]["employeeId"].is_null());
}

/// An employee at a different restaurant can never be assigned, even when
/// granted the role — the restaurant-mismatch check wins the §4.6 tie-break
/// and is reported as `Forbidden`, not `InvalidAssignment`.
#[actix_web::test]
async fn assign_employee_from_another_restaurant_is_forbidden() {
    let ctx = TestApp::new();
    let app = test::init_service(full_app!(ctx)).await;
    let fx = setup_restaurant(&ctx).await;

    let (other_owner_id, _) = ctx.active_user_with_token("other-owner@example.com").await;
    let other_restaurant = ctx
        .restaurant_repo
        .create(
            other_owner_id,
            &CreateRestaurantRequest {
                name: "Other Place".to_string(),
                address: "2 Side St".to_string(),
                phone: None,
            },
        )
        .await
        .unwrap();
    let other_employee = ctx
        .employee_repo
        .create(
            other_restaurant.id,
            &CreateEmployeeRequest {
                full_name: "Someone Else".to_string(),
                email: "else@example.com".to_string(),
            },
        )
        .await
        .unwrap();

    let cook_role = ctx
        .role_repo
        .create(
            fx.restaurant_id,
            &CreateRoleRequest {
                name: "Cook".to_string(),
                color: None,
            },
        )
        .await
        .unwrap();
    // Grant the role anyway, to isolate the restaurant-membership check.
    ctx.employee_role_repo
        .grant(other_employee.id, cook_role.id)
        .await
        .unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/v1/restaurants/{}/schedules", fx.restaurant_id))
        .insert_header(common::bearer(&fx.owner_token))
        .set_json(json!({"startDate": "2025-01-06", "endDate": "2025-01-12"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    let schedule_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!(
            "/v1/restaurants/{}/schedules/{schedule_id}/shifts",
            fx.restaurant_id
        ))
        .insert_header(common::bearer(&fx.owner_token))
        .set_json(json!({
            "roleId": cook_role.id,
            "shiftDate": "2025-01-06",
            "startTime": "09:00",
            "endTime": "17:00"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    let shift_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!(
            "/v1/restaurants/{}/schedules/{schedule_id}/shifts/{shift_id}/assign",
            fx.restaurant_id
        ))
        .insert_header(common::bearer(&fx.owner_token))
        .set_json(json!({"employeeId": other_employee.id}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "employee does not belong to this restaurant");
}

/// Scenario 6 — auto-populate: one shift per (date, role) combination a
/// matching template's day-of-week produces, skipping non-matching days.
#[actix_web::test]
async fn auto_populate_expands_templates_into_scheduled_shifts() {
    let ctx = TestApp::new();
    let app = test::init_service(full_app!(ctx)).await;
    let fx = setup_restaurant(&ctx).await;

    let cook_role = ctx
        .role_repo
        .create(
            fx.restaurant_id,
            &CreateRoleRequest {
                name: "Cook".to_string(),
                color: None,
            },
        )
        .await
        .unwrap();
    let server_role = ctx
        .role_repo
        .create(
            fx.restaurant_id,
            &CreateRoleRequest {
                name: "Server".to_string(),
                color: None,
            },
        )
        .await
        .unwrap();
    let host_role = ctx
        .role_repo
        .create(
            fx.restaurant_id,
            &CreateRoleRequest {
                name: "Host".to_string(),
                color: None,
            },
        )
        .await
        .unwrap();

    // T1: Monday (dow=1), one role.
    let req = test::TestRequest::post()
        .uri(&format!(
            "/v1/restaurants/{}/shift-templates",
            fx.restaurant_id
        ))
        .insert_header(common::bearer(&fx.owner_token))
        .set_json(json!({
            "name": "Morning Cook",
            "dayOfWeek": 1,
            "startTime": "09:00",
            "endTime": "17:00",
            "roleIds": [cook_role.id]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // T2: Wednesday (dow=3), two roles -> two shifts.
    let req = test::TestRequest::post()
        .uri(&format!(
            "/v1/restaurants/{}/shift-templates",
            fx.restaurant_id
        ))
        .insert_header(common::bearer(&fx.owner_token))
        .set_json(json!({
            "name": "Midday Front of House",
            "dayOfWeek": 3,
            "startTime": "12:00",
            "endTime": "20:00",
            "roleIds": [server_role.id, host_role.id]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri(&format!("/v1/restaurants/{}/schedules", fx.restaurant_id))
        .insert_header(common::bearer(&fx.owner_token))
        .set_json(json!({"startDate": "2025-01-06", "endDate": "2025-01-12"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    let schedule_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!(
            "/v1/restaurants/{}/schedules/{schedule_id}/auto-populate",
            fx.restaurant_id
        ))
        .insert_header(common::bearer(&fx.owner_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let shifts = body["data"].as_array().unwrap();
    assert_eq!(shifts.len(), 3);
    assert!(shifts.iter().all(|s| s["employeeId"].is_null()));

    let mon = shifts
        .iter()
        .find(|s| s["shiftDate"] == "2025-01-06")
        .unwrap();
    assert_eq!(mon["roleId"], cook_role.id.to_string());
    assert_eq!(mon["startTime"], "09:00");
    assert_eq!(mon["endTime"], "17:00");

    let wed_roles: Vec<&str> = shifts
        .iter()
        .filter(|s| s["shiftDate"] == "2025-01-08")
        .map(|s| s["roleId"].as_str().unwrap())
        .collect();
    assert_eq!(wed_roles.len(), 2);
    assert!(wed_roles.contains(&server_role.id.to_string().as_str()));
    assert!(wed_roles.contains(&host_role.id.to_string().as_str()));
}

/// `endDate` before `startDate` violates the Schedule invariant and is
/// rejected at creation time, before auto-populate ever runs.
#[actix_web::test]
async fn schedule_create_rejects_end_date_before_start_date() {
    let ctx = TestApp::new();
    let app = test::init_service(full_app!(ctx)).await;
    let fx = setup_restaurant(&ctx).await;

    let req = test::TestRequest::post()
        .uri(&format!("/v1/restaurants/{}/schedules", fx.restaurant_id))
        .insert_header(common::bearer(&fx.owner_token))
        .set_json(json!({"startDate": "2025-01-06", "endDate": "2025-01-05"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

/// Auto-populate against a schedule with no matching templates yields `200`
/// with an empty array, not `201` — nothing was created.
#[actix_web::test]
async fn auto_populate_with_no_matching_templates_returns_200_with_empty_array() {
    let ctx = TestApp::new();
    let app = test::init_service(full_app!(ctx)).await;
    let fx = setup_restaurant(&ctx).await;

    let req = test::TestRequest::post()
        .uri(&format!("/v1/restaurants/{}/schedules", fx.restaurant_id))
        .insert_header(common::bearer(&fx.owner_token))
        .set_json(json!({"startDate": "2025-01-06", "endDate": "2025-01-12"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    let schedule_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!(
            "/v1/restaurants/{}/schedules/{schedule_id}/auto-populate",
            fx.restaurant_id
        ))
        .insert_header(common::bearer(&fx.owner_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

/// `endTime == startTime` on a shift template create is rejected.
#[actix_web::test]
async fn shift_template_rejects_zero_length_time_range() {
    let ctx = TestApp::new();
    let app = test::init_service(full_app!(ctx)).await;
    let fx = setup_restaurant(&ctx).await;

    let req = test::TestRequest::post()
        .uri(&format!(
            "/v1/restaurants/{}/shift-templates",
            fx.restaurant_id
        ))
        .insert_header(common::bearer(&fx.owner_token))
        .set_json(json!({
            "name": "Bad Template",
            "dayOfWeek": 1,
            "startTime": "09:00",
            "endTime": "09:00",
            "roleIds": []
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

/// `dayOfWeek = 7` is out of range and rejected.
#[actix_web::test]
async fn shift_template_rejects_day_of_week_seven() {
    let ctx = TestApp::new();
    let app = test::init_service(full_app!(ctx)).await;
    let fx = setup_restaurant(&ctx).await;

    let req = test::TestRequest::post()
        .uri(&format!(
            "/v1/restaurants/{}/shift-templates",
            fx.restaurant_id
        ))
        .insert_header(common::bearer(&fx.owner_token))
        .set_json(json!({
            "name": "Bad Template",
            "dayOfWeek": 7,
            "startTime": "09:00",
            "endTime": "17:00",
            "roleIds": []
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

/// The week-query read path returns shifts ordered by (date, start time)
/// and joins role/employee display names.
#[actix_web::test]
async fn week_query_returns_shifts_in_chronological_order() {
    let ctx = TestApp::new();
    let app = test::init_service(full_app!(ctx)).await;
    let fx = setup_restaurant(&ctx).await;

    let role = ctx
        .role_repo
        .create(
            fx.restaurant_id,
            &CreateRoleRequest {
                name: "Cook".to_string(),
                color: None,
            },
        )
        .await
        .unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/v1/restaurants/{}/schedules", fx.restaurant_id))
        .insert_header(common::bearer(&fx.owner_token))
        .set_json(json!({"startDate": "2025-01-06", "endDate": "2025-01-12"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    let schedule_id = body["data"]["id"].as_str().unwrap().to_string();

    for (date, start, end) in [
        ("2025-01-08", "14:00", "18:00"),
        ("2025-01-06", "09:00", "13:00"),
        ("2025-01-06", "13:00", "17:00"),
    ] {
        let req = test::TestRequest::post()
            .uri(&format!(
                "/v1/restaurants/{}/schedules/{schedule_id}/shifts",
                fx.restaurant_id
            ))
            .insert_header(common::bearer(&fx.owner_token))
            .set_json(json!({
                "roleId": role.id,
                "shiftDate": date,
                "startTime": start,
                "endTime": end
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get()
        .uri(&format!(
            "/v1/restaurants/{}/schedules/week?start=2025-01-06",
            fx.restaurant_id
        ))
        .insert_header(common::bearer(&fx.owner_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    let shifts = body["data"].as_array().unwrap();
    assert_eq!(shifts.len(), 3);
    assert_eq!(shifts[0]["shiftDate"], "2025-01-06");
    assert_eq!(shifts[0]["startTime"], "09:00");
    assert_eq!(shifts[1]["shiftDate"], "2025-01-06");
    assert_eq!(shifts[1]["startTime"], "13:00");
    assert_eq!(shifts[2]["shiftDate"], "2025-01-08");
}

/// Deleting a role still referenced by a scheduled shift is rejected
/// rather than cascading — mirrors the `ON DELETE RESTRICT` foreign key
/// Postgres enforces, simulated directly against the concrete in-memory
/// repository since `mark_referenced` isn't part of `RoleRepository`.
#[actix_web::test]
async fn deleting_referenced_role_is_rejected() {
    use resa::database::repositories::InMemoryRoleRepository;

    let roles = InMemoryRoleRepository::new();
    let restaurant_id = uuid::Uuid::new_v4();
    let role = roles
        .create(
            restaurant_id,
            &CreateRoleRequest {
                name: "Cook".to_string(),
                color: None,
            },
        )
        .await
        .unwrap();

    roles.mark_referenced(role.id);

    let err = roles.delete(role.id).await.unwrap_err();
    assert!(matches!(err, resa::error::AppError::BadRequest(_)));
}
