/// Integration tests for the OpsPortal API
///
/// These tests verify the full system works end-to-end:
/// - Login issues the session cookie only on success
/// - Role gates and client ownership scoping
/// - Budget totals derived from line items
/// - Webhook signature verification and order transitions
/// - Bounded-use download grants
/// - Audit events written by mutations

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use common::{assert_status, body_json, TestContext};
use opsportal_api::routes::webhooks::sign_payload;
use opsportal_shared::auth::password::hash_password;
use opsportal_shared::models::download_token::DownloadToken;
use opsportal_shared::models::notification::{CreateNotification, Notification};
use opsportal_shared::models::order::{CreateOrder, Order, OrderStatus};
use opsportal_shared::models::project::{CreateProject, Project};
use opsportal_shared::models::task::{CreateTask, Task, TaskPriority};
use opsportal_shared::models::user::{CreateUser, User};
use serde_json::json;
use tower::Service as _;
use uuid::Uuid;

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.get("/health", None).await;
    let body = assert_status(response, StatusCode::OK).await;
    assert_eq!(body["database"], "connected");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_login_sets_cookie_only_on_success() {
    let ctx = TestContext::new().await.unwrap();

    let email = format!("login-{}@example.com", ctx.run_id);
    let user = User::create(
        &ctx.db,
        CreateUser {
            email: email.clone(),
            password_hash: hash_password("CorrectHorse1").unwrap(),
            name: None,
            role: opsportal_shared::auth::authorization::Role::Client,
        },
    )
    .await
    .unwrap();

    // Wrong password: 401 and no cookie
    let response = ctx
        .post_json(
            "/api/auth/login",
            None,
            json!({ "email": email, "password": "WrongPassword1" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get("set-cookie").is_none());

    // Correct password: 200, cookie set, token in body
    let response = ctx
        .post_json(
            "/api/auth/login",
            None,
            json!({ "email": email, "password": "CorrectHorse1" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get("set-cookie")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("auth-token="));
    assert!(cookie.contains("HttpOnly"));

    let body = body_json(response).await;
    assert_eq!(body["role"], "client");
    assert!(body["token"].is_string());

    User::delete(&ctx.db, user.id).await.unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_deactivated_user_cannot_login() {
    let ctx = TestContext::new().await.unwrap();

    let email = format!("inactive-{}@example.com", ctx.run_id);
    let user = User::create(
        &ctx.db,
        CreateUser {
            email: email.clone(),
            password_hash: hash_password("CorrectHorse1").unwrap(),
            name: None,
            role: opsportal_shared::auth::authorization::Role::Client,
        },
    )
    .await
    .unwrap();

    sqlx::query("UPDATE users SET active = FALSE WHERE id = $1")
        .bind(user.id)
        .execute(&ctx.db)
        .await
        .unwrap();

    let response = ctx
        .post_json(
            "/api/auth/login",
            None,
            json!({ "email": email, "password": "CorrectHorse1" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    User::delete(&ctx.db, user.id).await.unwrap();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_unauthenticated_request_rejected() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx.get("/api/projects", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_budget_total_derived_from_items() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .post_json(
            "/api/budgets",
            Some(&ctx.admin_token),
            json!({
                "client_id": ctx.client.id,
                "title": "Website redesign",
                "items": [
                    { "description": "Design", "quantity": 2, "unit_price_cents": 50 }
                ]
            }),
        )
        .await;
    let body = assert_status(response, StatusCode::OK).await;
    assert_eq!(body["total_cents"], 100);
    let budget_id = body["id"].as_str().unwrap().to_string();

    // Replacing the items recomputes the total; a client-sent total would
    // be ignored because the field doesn't exist on the request
    let response = ctx
        .put_json(
            &format!("/api/budgets/{}", budget_id),
            Some(&ctx.admin_token),
            json!({
                "items": [
                    { "description": "Design", "quantity": 3, "unit_price_cents": 100 },
                    { "description": "Hosting", "quantity": 1, "unit_price_cents": 250 }
                ]
            }),
        )
        .await;
    let body = assert_status(response, StatusCode::OK).await;
    assert_eq!(body["total_cents"], 550);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_client_cannot_reach_other_clients_records() {
    let ctx = TestContext::new().await.unwrap();

    let project = Project::create(
        &ctx.db,
        CreateProject {
            client_id: ctx.client.id,
            assigned_to: None,
            name: "Private project".to_string(),
            description: None,
        },
    )
    .await
    .unwrap();

    // Owner reads it fine
    let response = ctx
        .get(
            &format!("/api/projects/{}", project.id),
            Some(&ctx.client_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Another client gets 403, never the data
    let response = ctx
        .get(
            &format!("/api/projects/{}", project.id),
            Some(&ctx.other_client_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // And their project listing doesn't include it
    let response = ctx.get("/api/projects", Some(&ctx.other_client_token)).await;
    let body = assert_status(response, StatusCode::OK).await;
    assert!(body.as_array().unwrap().is_empty());

    // Budgets are scoped the same way
    let response = ctx
        .post_json(
            "/api/budgets",
            Some(&ctx.admin_token),
            json!({
                "client_id": ctx.client.id,
                "title": "Private budget",
                "items": [{ "description": "Work", "quantity": 1, "unit_price_cents": 1000 }]
            }),
        )
        .await;
    let budget = assert_status(response, StatusCode::OK).await;

    let response = ctx
        .get(
            &format!("/api/budgets/{}", budget["id"].as_str().unwrap()),
            Some(&ctx.other_client_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_role_gates() {
    let ctx = TestContext::new().await.unwrap();

    // User management is admin-only
    let response = ctx.get("/api/users", Some(&ctx.client_token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx.get("/api/users", Some(&ctx.employee_token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx.get("/api/users", Some(&ctx.admin_token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Clients cannot create projects
    let response = ctx
        .post_json(
            "/api/projects",
            Some(&ctx.client_token),
            json!({ "client_id": ctx.client.id, "name": "Nope" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Audit logs are admin-only
    let response = ctx.get("/api/audit-logs", Some(&ctx.employee_token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_employee_limited_to_status_and_completion() {
    let ctx = TestContext::new().await.unwrap();

    let project = Project::create(
        &ctx.db,
        CreateProject {
            client_id: ctx.client.id,
            assigned_to: Some(ctx.employee.id),
            name: "Employee project".to_string(),
            description: None,
        },
    )
    .await
    .unwrap();

    // Renaming is an admin field
    let response = ctx
        .put_json(
            &format!("/api/projects/{}", project.id),
            Some(&ctx.employee_token),
            json!({ "name": "Renamed" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Progress updates are allowed
    let response = ctx
        .put_json(
            &format!("/api/projects/{}", project.id),
            Some(&ctx.employee_token),
            json!({ "status": "in_progress", "completion": 40 }),
        )
        .await;
    let body = assert_status(response, StatusCode::OK).await;
    assert_eq!(body["completion"], 40);
    assert_eq!(body["status"], "in_progress");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_download_token_enforces_max_uses() {
    let ctx = TestContext::new().await.unwrap();

    let order = Order::create(
        &ctx.db,
        CreateOrder {
            customer_name: "Ana".to_string(),
            customer_email: format!("dl-{}@example.com", ctx.run_id),
            amount_cents: 1000,
            currency: "eur".to_string(),
            payment_intent_id: None,
        },
    )
    .await
    .unwrap();

    let token = DownloadToken::mint(&ctx.db, order.id, Duration::hours(1), 2)
        .await
        .unwrap();

    let path = format!("/api/download/{}", token.token);

    let body = assert_status(ctx.get(&path, None).await, StatusCode::OK).await;
    assert_eq!(body["remaining_downloads"], 1);

    let body = assert_status(ctx.get(&path, None).await, StatusCode::OK).await;
    assert_eq!(body["remaining_downloads"], 0);

    // Third use: exhausted
    let response = ctx.get(&path, None).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().get("Retry-After").is_some());

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_download_token_expiry_and_unknown() {
    let ctx = TestContext::new().await.unwrap();

    let order = Order::create(
        &ctx.db,
        CreateOrder {
            customer_name: "Ana".to_string(),
            customer_email: format!("dl2-{}@example.com", ctx.run_id),
            amount_cents: 1000,
            currency: "eur".to_string(),
            payment_intent_id: None,
        },
    )
    .await
    .unwrap();

    // Already expired at mint time
    let expired = DownloadToken::mint(&ctx.db, order.id, Duration::hours(-1), 3)
        .await
        .unwrap();

    let response = ctx
        .get(&format!("/api/download/{}", expired.token), None)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .get(&format!("/api/download/{}", "0".repeat(64)), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_webhook_rejects_bad_signature() {
    let ctx = TestContext::new().await.unwrap();

    let payment_intent = format!("pi_{}", ctx.run_id.simple());
    let order = Order::create(
        &ctx.db,
        CreateOrder {
            customer_name: "Ana".to_string(),
            customer_email: format!("wh-{}@example.com", ctx.run_id),
            amount_cents: 2500,
            currency: "eur".to_string(),
            payment_intent_id: Some(payment_intent.clone()),
        },
    )
    .await
    .unwrap();

    let body = json!({
        "type": "payment_intent.succeeded",
        "data": { "payment_intent_id": payment_intent }
    })
    .to_string();

    // Signed with the wrong secret
    let bad_header = sign_payload("not-the-real-secret", Utc::now().timestamp(), &body);

    let request = Request::builder()
        .method("POST")
        .uri("/api/webhooks/payment")
        .header("content-type", "application/json")
        .header("Payment-Signature", bad_header)
        .body(Body::from(body.clone()))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Missing signature is also rejected
    let request = Request::builder()
        .method("POST")
        .uri("/api/webhooks/payment")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Order untouched in both cases
    let order = Order::find_by_id(&ctx.db, order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_webhook_success_marks_order_paid_and_mints_token() {
    let ctx = TestContext::new().await.unwrap();

    let payment_intent = format!("pi_ok_{}", ctx.run_id.simple());
    let order = Order::create(
        &ctx.db,
        CreateOrder {
            customer_name: "Ana".to_string(),
            customer_email: format!("whok-{}@example.com", ctx.run_id),
            amount_cents: 2500,
            currency: "eur".to_string(),
            payment_intent_id: Some(payment_intent.clone()),
        },
    )
    .await
    .unwrap();

    let body = json!({
        "type": "payment_intent.succeeded",
        "data": { "payment_intent_id": payment_intent }
    })
    .to_string();

    let header = sign_payload(
        &ctx.config.payment.webhook_secret,
        Utc::now().timestamp(),
        &body,
    );

    let request = Request::builder()
        .method("POST")
        .uri("/api/webhooks/payment")
        .header("content-type", "application/json")
        .header("Payment-Signature", header)
        .body(Body::from(body))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let order = Order::find_by_id(&ctx.db, order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Paid);

    // A download token was minted for the order
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM download_tokens WHERE order_id = $1")
            .bind(order.id)
            .fetch_one(&ctx.db)
            .await
            .unwrap();
    assert_eq!(count, 1);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_checkout_creates_pending_order() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .post_json(
            "/api/orders",
            None,
            json!({
                "customer_name": "Ana",
                "customer_email": format!("co-{}@example.com", ctx.run_id),
                "items": [
                    { "description": "Template", "quantity": 2, "unit_price_cents": 1250 }
                ]
            }),
        )
        .await;
    let body = assert_status(response, StatusCode::OK).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["amount_cents"], 2500);

    // Orders listing is admin-only
    let response = ctx.get("/api/orders", Some(&ctx.client_token)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx.get("/api/orders", Some(&ctx.admin_token)).await;
    assert_eq!(response.status(), StatusCode::OK);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_notifications_scoped_to_recipient() {
    let ctx = TestContext::new().await.unwrap();

    let notification = Notification::create(
        &ctx.db,
        CreateNotification {
            user_id: ctx.client.id,
            title: "Hello".to_string(),
            message: "A message for you".to_string(),
        },
    )
    .await
    .unwrap();

    // Someone else can't mark it read
    let response = ctx
        .post_json(
            &format!("/api/notifications/{}/read", notification.id),
            Some(&ctx.other_client_token),
            json!({}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The recipient can
    let response = ctx
        .post_json(
            &format!("/api/notifications/{}/read", notification.id),
            Some(&ctx.client_token),
            json!({}),
        )
        .await;
    let body = assert_status(response, StatusCode::OK).await;
    assert_eq!(body["read"], true);

    let response = ctx
        .get("/api/notifications/unread-count", Some(&ctx.client_token))
        .await;
    let body = assert_status(response, StatusCode::OK).await;
    assert_eq!(body["unread"], 0);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_mutations_append_audit_events() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .post_json(
            "/api/projects",
            Some(&ctx.admin_token),
            json!({ "client_id": ctx.client.id, "name": "Audited project" }),
        )
        .await;
    let project = assert_status(response, StatusCode::OK).await;
    let project_id = Uuid::parse_str(project["id"].as_str().unwrap()).unwrap();

    let response = ctx
        .get(
            &format!(
                "/api/audit-logs?table_name=projects&actor_id={}",
                ctx.admin.id
            ),
            Some(&ctx.admin_token),
        )
        .await;
    let body = assert_status(response, StatusCode::OK).await;

    let events = body["events"].as_array().unwrap();
    let created = events.iter().any(|e| {
        e["action"] == "create" && e["record_id"] == json!(project_id.to_string())
    });
    assert!(created, "expected a create event for the new project");

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_task_crud_under_project() {
    let ctx = TestContext::new().await.unwrap();

    let project = Project::create(
        &ctx.db,
        CreateProject {
            client_id: ctx.client.id,
            assigned_to: Some(ctx.employee.id),
            name: "Task project".to_string(),
            description: None,
        },
    )
    .await
    .unwrap();

    // Employee creates a task under the project
    let response = ctx
        .post_json(
            &format!("/api/projects/{}/tasks", project.id),
            Some(&ctx.employee_token),
            json!({ "title": "Wire the login form" }),
        )
        .await;
    let task = assert_status(response, StatusCode::OK).await;
    assert_eq!(task["status"], "todo");
    assert_eq!(task["priority"], "medium");
    let task_id = task["id"].as_str().unwrap().to_string();

    // The listing includes it
    let response = ctx
        .get(
            &format!("/api/projects/{}/tasks", project.id),
            Some(&ctx.employee_token),
        )
        .await;
    let body = assert_status(response, StatusCode::OK).await;
    assert!(body
        .as_array()
        .unwrap()
        .iter()
        .any(|t| t["id"] == json!(task_id)));

    // The owning client can read the list too
    let response = ctx
        .get(
            &format!("/api/projects/{}/tasks", project.id),
            Some(&ctx.client_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Status update
    let response = ctx
        .put_json(
            &format!("/api/tasks/{}", task_id),
            Some(&ctx.employee_token),
            json!({ "status": "done" }),
        )
        .await;
    let body = assert_status(response, StatusCode::OK).await;
    assert_eq!(body["status"], "done");

    // Delete, then the task is gone
    let response = ctx
        .request(
            "DELETE",
            &format!("/api/tasks/{}", task_id),
            Some(&ctx.employee_token),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .get(&format!("/api/tasks/{}", task_id), Some(&ctx.employee_token))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_client_task_access_scoped() {
    let ctx = TestContext::new().await.unwrap();

    let own = Project::create(
        &ctx.db,
        CreateProject {
            client_id: ctx.client.id,
            assigned_to: None,
            name: "Own project".to_string(),
            description: None,
        },
    )
    .await
    .unwrap();

    let foreign = Project::create(
        &ctx.db,
        CreateProject {
            client_id: ctx.other_client.id,
            assigned_to: None,
            name: "Foreign project".to_string(),
            description: None,
        },
    )
    .await
    .unwrap();

    let foreign_task = Task::create(
        &ctx.db,
        CreateTask {
            project_id: foreign.id,
            assigned_to: None,
            title: "Private task".to_string(),
            description: None,
            priority: TaskPriority::Medium,
            due_date: None,
        },
    )
    .await
    .unwrap();

    // Another client's task list is off limits
    let response = ctx
        .get(
            &format!("/api/projects/{}/tasks", foreign.id),
            Some(&ctx.client_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Same for reading one of its tasks directly
    let response = ctx
        .get(
            &format!("/api/tasks/{}", foreign_task.id),
            Some(&ctx.client_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Clients cannot create tasks, even on their own projects
    let response = ctx
        .post_json(
            &format!("/api/projects/{}/tasks", own.id),
            Some(&ctx.client_token),
            json!({ "title": "Nope" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Unknown parent project is a 404
    let response = ctx
        .get(
            &format!("/api/projects/{}/tasks", Uuid::new_v4()),
            Some(&ctx.admin_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_audit_events_carry_network_metadata() {
    let ctx = TestContext::new().await.unwrap();

    let response = ctx
        .request_with_headers(
            "POST",
            "/api/projects",
            Some(&ctx.admin_token),
            &[
                ("x-forwarded-for", "203.0.113.9, 10.0.0.1"),
                ("user-agent", "integration-suite/1.0"),
            ],
            Some(json!({ "client_id": ctx.client.id, "name": "Traced project" })),
        )
        .await;
    let project = assert_status(response, StatusCode::OK).await;
    let project_id = Uuid::parse_str(project["id"].as_str().unwrap()).unwrap();

    let (ip, user_agent): (Option<String>, Option<String>) = sqlx::query_as(
        "SELECT ip_address, user_agent FROM audit_logs WHERE record_id = $1 AND action = 'create'",
    )
    .bind(project_id)
    .fetch_one(&ctx.db)
    .await
    .unwrap();

    assert_eq!(ip.as_deref(), Some("203.0.113.9"));
    assert_eq!(user_agent.as_deref(), Some("integration-suite/1.0"));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_duplicate_payment_webhook_mints_single_token() {
    let ctx = TestContext::new().await.unwrap();

    let payment_intent = format!("pi_dup_{}", ctx.run_id.simple());
    let order = Order::create(
        &ctx.db,
        CreateOrder {
            customer_name: "Ana".to_string(),
            customer_email: format!("dup-{}@example.com", ctx.run_id),
            amount_cents: 2500,
            currency: "eur".to_string(),
            payment_intent_id: Some(payment_intent.clone()),
        },
    )
    .await
    .unwrap();

    let body = json!({
        "type": "payment_intent.succeeded",
        "data": { "payment_intent_id": payment_intent }
    })
    .to_string();

    // The provider redelivers; both deliveries are acknowledged
    for _ in 0..2 {
        let header = sign_payload(
            &ctx.config.payment.webhook_secret,
            Utc::now().timestamp(),
            &body,
        );

        let request = Request::builder()
            .method("POST")
            .uri("/api/webhooks/payment")
            .header("content-type", "application/json")
            .header("Payment-Signature", header)
            .body(Body::from(body.clone()))
            .unwrap();

        let response = ctx.app.clone().call(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let order = Order::find_by_id(&ctx.db, order.id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Paid);

    // But only the first one minted a token
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM download_tokens WHERE order_id = $1")
            .bind(order.id)
            .fetch_one(&ctx.db)
            .await
            .unwrap();
    assert_eq!(count, 1);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
async fn test_admin_provisions_and_deactivates_users() {
    let ctx = TestContext::new().await.unwrap();

    let email = format!("new-{}@example.com", ctx.run_id);
    let response = ctx
        .post_json(
            "/api/users",
            Some(&ctx.admin_token),
            json!({
                "email": email,
                "password": "InitialPass1",
                "name": "New Person",
                "role": "employee"
            }),
        )
        .await;
    let body = assert_status(response, StatusCode::OK).await;
    assert_eq!(body["role"], "employee");
    assert_eq!(body["active"], true);
    let user_id = body["id"].as_str().unwrap().to_string();

    // Duplicate email conflicts
    let response = ctx
        .post_json(
            "/api/users",
            Some(&ctx.admin_token),
            json!({
                "email": format!("new-{}@example.com", ctx.run_id),
                "password": "InitialPass1",
                "role": "employee"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Deactivate
    let response = ctx
        .put_json(
            &format!("/api/users/{}", user_id),
            Some(&ctx.admin_token),
            json!({ "active": false }),
        )
        .await;
    let body = assert_status(response, StatusCode::OK).await;
    assert_eq!(body["active"], false);

    User::delete(&ctx.db, Uuid::parse_str(&user_id).unwrap())
        .await
        .unwrap();
    ctx.cleanup().await.unwrap();
}
