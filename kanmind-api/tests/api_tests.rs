/// Integration tests for the KanMind API
///
/// These tests drive the full router end-to-end: registration and login,
/// board membership and aggregates, task assignment validation, and the
/// author-only comment rules.
///
/// They require a PostgreSQL database via DATABASE_URL and skip themselves
/// when it is not set.

mod common;

use axum::http::StatusCode;
use common::{json_request, TestContext};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_registration_login_and_token_reuse() {
    let Some(ctx) = TestContext::try_new().await else { return };

    let user = ctx.register_user("Alice").await;

    // Duplicate email is a validation error
    let (status, body) = ctx
        .send(json_request(
            "POST",
            "/api/registration/",
            None,
            Some(json!({
                "fullname": "Alice Again",
                "email": &user.email,
                "password": "test-password-123",
                "repeated_password": "test-password-123"
            })),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    // Mismatched password confirmation is a validation error
    let (status, _) = ctx
        .send(json_request(
            "POST",
            "/api/registration/",
            None,
            Some(json!({
                "fullname": "Bob",
                "email": format!("bob-{}@example.com", Uuid::new_v4()),
                "password": "test-password-123",
                "repeated_password": "different-password"
            })),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Login issues a fresh token; the registration token stays valid
    let (status, body) = ctx
        .send(json_request(
            "POST",
            "/api/login/",
            None,
            Some(json!({ "email": &user.email, "password": "test-password-123" })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let second_token = body["token"].as_str().unwrap().to_string();
    assert_ne!(second_token, user.token);

    for token in [&user.token, &second_token] {
        let (status, _) = ctx
            .send(json_request("GET", "/api/boards/", Some(token), None))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    // Wrong password is 400 and does not reveal which part was wrong
    let (status, body) = ctx
        .send(json_request(
            "POST",
            "/api/login/",
            None,
            Some(json!({ "email": &user.email, "password": "wrong-password-123" })),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid email or password.");
}

#[tokio::test]
async fn test_email_check() {
    let Some(ctx) = TestContext::try_new().await else { return };

    let user = ctx.register_user("Carol").await;

    let (status, _) = ctx
        .send(json_request("GET", "/api/email-check/", None, None))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .send(json_request(
            "GET",
            "/api/email-check/?email=nobody@example.com",
            None,
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx
        .send(json_request(
            "GET",
            &format!("/api/email-check/?email={}", user.email),
            None,
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fullname"], "Carol");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_token_middleware_rejections() {
    let Some(ctx) = TestContext::try_new().await else { return };

    // Missing header
    let (status, _) = ctx
        .send(json_request("GET", "/api/boards/", None, None))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Wrong scheme
    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/api/boards/")
        .header("authorization", "Bearer some-jwt")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, _) = ctx.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown token
    let (status, _) = ctx
        .send(json_request(
            "GET",
            "/api/boards/",
            Some("0000000000000000000000000000000000000000"),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

/// The end-to-end scenario: board with two members, a high-priority to-do
/// task, aggregate counts, and the author-only comment rule.
#[tokio::test]
async fn test_board_task_comment_scenario() {
    let Some(ctx) = TestContext::try_new().await else { return };

    let a = ctx.register_user("Anna").await;
    let b = ctx.register_user("Ben").await;

    let board_id = ctx.create_board(&a, "Sprint 1", &[b.user_id]).await;

    let task_id = ctx
        .create_task(
            &a,
            json!({
                "board": board_id,
                "title": "Ship the login page",
                "status": "to-do",
                "priority": "high",
                "assignee_id": b.user_id
            }),
        )
        .await;

    // Summary counts reflect the membership and the one high-prio to-do task
    let (status, body) = ctx
        .send(json_request("GET", "/api/boards/", Some(&a.token), None))
        .await;
    assert_eq!(status, StatusCode::OK);
    let summary = body
        .as_array()
        .unwrap()
        .iter()
        .find(|b| b["id"] == json!(board_id))
        .expect("board in listing");
    assert_eq!(summary["member_count"], 2);
    assert_eq!(summary["ticket_count"], 1);
    assert_eq!(summary["tasks_to_do_count"], 1);
    assert_eq!(summary["tasks_high_prio_count"], 1);

    // Detail expands members and nests the task with its assignee
    let (status, body) = ctx
        .send(json_request(
            "GET",
            &format!("/api/boards/{board_id}/"),
            Some(&b.token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["members"].as_array().unwrap().len(), 2);
    assert_eq!(body["tasks"][0]["assignee"]["fullname"], "Ben");
    assert_eq!(body["tasks"][0]["comments_count"], 0);

    // B comments on the task
    let (status, body) = ctx
        .send(json_request(
            "POST",
            &format!("/api/tasks/{task_id}/comments/"),
            Some(&b.token),
            Some(json!({ "content": "On it." })),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let comment_id = body["id"].as_str().unwrap().to_string();
    assert_eq!(body["author"], "Ben");

    let (status, body) = ctx
        .send(json_request(
            "GET",
            &format!("/api/tasks/{task_id}/comments/"),
            Some(&a.token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["author"], "Ben");

    // comments_count follows the comment rows
    let (_, body) = ctx
        .send(json_request(
            "GET",
            &format!("/api/tasks/{task_id}/"),
            Some(&a.token),
            None,
        ))
        .await;
    assert_eq!(body["comments_count"], 1);

    // A is not the author: deletion is forbidden and the comment survives
    let (status, _) = ctx
        .send(json_request(
            "DELETE",
            &format!("/api/tasks/{task_id}/comments/{comment_id}/"),
            Some(&a.token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = ctx
        .send(json_request(
            "GET",
            &format!("/api/tasks/{task_id}/comments/"),
            Some(&a.token),
            None,
        ))
        .await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    // The author may delete; the list is empty afterwards
    let (status, _) = ctx
        .send(json_request(
            "DELETE",
            &format!("/api/tasks/{task_id}/comments/{comment_id}/"),
            Some(&b.token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = ctx
        .send(json_request(
            "GET",
            &format!("/api/tasks/{task_id}/comments/"),
            Some(&a.token),
            None,
        ))
        .await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_non_member_access_is_hidden_or_forbidden() {
    let Some(ctx) = TestContext::try_new().await else { return };

    let owner = ctx.register_user("Dana").await;
    let outsider = ctx.register_user("Eve").await;

    let board_id = ctx.create_board(&owner, "Private", &[]).await;
    let task_id = ctx
        .create_task(&owner, json!({ "board": board_id, "title": "Secret work" }))
        .await;

    // Reads hide existence
    let (status, _) = ctx
        .send(json_request(
            "GET",
            &format!("/api/boards/{board_id}/"),
            Some(&outsider.token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .send(json_request(
            "GET",
            &format!("/api/tasks/{task_id}/"),
            Some(&outsider.token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The board never shows up in the outsider's listings
    let (_, body) = ctx
        .send(json_request("GET", "/api/boards/", Some(&outsider.token), None))
        .await;
    assert!(!body
        .as_array()
        .unwrap()
        .iter()
        .any(|b| b["id"] == json!(board_id)));

    let (_, body) = ctx
        .send(json_request("GET", "/api/tasks/", Some(&outsider.token), None))
        .await;
    assert!(!body
        .as_array()
        .unwrap()
        .iter()
        .any(|t| t["id"] == json!(task_id)));

    // Writes on a known-to-exist resource are forbidden
    let (status, _) = ctx
        .send(json_request(
            "PATCH",
            &format!("/api/boards/{board_id}/"),
            Some(&outsider.token),
            Some(json!({ "title": "Hijacked" })),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send(json_request(
            "DELETE",
            &format!("/api/boards/{board_id}/"),
            Some(&outsider.token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send(json_request(
            "POST",
            "/api/tasks/",
            Some(&outsider.token),
            Some(json!({ "board": board_id, "title": "Sneaky" })),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send(json_request(
            "GET",
            &format!("/api/tasks/{task_id}/comments/"),
            Some(&outsider.token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_member_ids_rejected() {
    let Some(ctx) = TestContext::try_new().await else { return };

    let owner = ctx.register_user("Fred").await;

    let (status, body) = ctx
        .send(json_request(
            "POST",
            "/api/boards/",
            Some(&owner.token),
            Some(json!({ "title": "Sprint 1", "members": [Uuid::new_v4()] })),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "members");
}

#[tokio::test]
async fn test_assignee_must_be_board_member() {
    let Some(ctx) = TestContext::try_new().await else { return };

    let owner = ctx.register_user("Gina").await;
    let stranger = ctx.register_user("Hugo").await;

    let board_id = ctx.create_board(&owner, "Sprint 1", &[]).await;

    // A registered user who is not on the board is not a valid assignee
    let (status, body) = ctx
        .send(json_request(
            "POST",
            "/api/tasks/",
            Some(&owner.token),
            Some(json!({
                "board": board_id,
                "title": "Misassigned",
                "assignee_id": stranger.user_id
            })),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "assignee_id");

    // The owner is in the allowed set even without an explicit member row
    let (status, body) = ctx
        .send(json_request(
            "POST",
            "/api/tasks/",
            Some(&owner.token),
            Some(json!({
                "board": board_id,
                "title": "Self-assigned",
                "assignee_id": owner.user_id,
                "reviewer_id": owner.user_id
            })),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["assignee"]["fullname"], "Gina");
    assert_eq!(body["reviewer"]["fullname"], "Gina");
}

#[tokio::test]
async fn test_membership_update_preserves_owner() {
    let Some(ctx) = TestContext::try_new().await else { return };

    let owner = ctx.register_user("Ivy").await;
    let member = ctx.register_user("Jack").await;

    let board_id = ctx.create_board(&owner, "Sprint 1", &[member.user_id]).await;

    // Replace the member set without listing the owner
    let (status, body) = ctx
        .send(json_request(
            "PATCH",
            &format!("/api/boards/{board_id}/"),
            Some(&owner.token),
            Some(json!({ "members": [member.user_id] })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let member_ids: Vec<&str> = body["members"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert!(member_ids.contains(&owner.user_id.to_string().as_str()));

    // Even an empty list keeps the owner
    let (status, body) = ctx
        .send(json_request(
            "PUT",
            &format!("/api/boards/{board_id}/"),
            Some(&owner.token),
            Some(json!({ "members": [] })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["members"].as_array().unwrap().len(), 1);
    assert_eq!(body["members"][0]["id"], json!(owner.user_id));
}

#[tokio::test]
async fn test_task_update_clear_and_board_immutability() {
    let Some(ctx) = TestContext::try_new().await else { return };

    let owner = ctx.register_user("Kira").await;
    let board_id = ctx.create_board(&owner, "Sprint 1", &[]).await;
    let other_board_id = ctx.create_board(&owner, "Sprint 2", &[]).await;

    let task_id = ctx
        .create_task(
            &owner,
            json!({
                "board": board_id,
                "title": "Polish the UI",
                "assignee_id": owner.user_id,
                "due_date": "2025-06-01"
            }),
        )
        .await;

    // Partial update: status flips, everything else untouched
    let (status, body) = ctx
        .send(json_request(
            "PATCH",
            &format!("/api/tasks/{task_id}/"),
            Some(&owner.token),
            Some(json!({ "status": "done" })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "done");
    assert_eq!(body["assignee"]["id"], json!(owner.user_id));
    assert_eq!(body["due_date"], "2025-06-01");

    // Explicit null clears the assignee and the due date
    let (status, body) = ctx
        .send(json_request(
            "PUT",
            &format!("/api/tasks/{task_id}/"),
            Some(&owner.token),
            Some(json!({ "assignee_id": null, "due_date": null })),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["assignee"].is_null());
    assert!(body["due_date"].is_null());

    // Moving the task between boards is rejected
    let (status, body) = ctx
        .send(json_request(
            "PATCH",
            &format!("/api/tasks/{task_id}/"),
            Some(&owner.token),
            Some(json!({ "board": other_board_id })),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "board");
}

#[tokio::test]
async fn test_filtered_views_pagination() {
    let Some(ctx) = TestContext::try_new().await else { return };

    let owner = ctx.register_user("Luka").await;
    let board_id = ctx.create_board(&owner, "Sprint 1", &[]).await;

    for i in 0..5 {
        ctx.create_task(
            &owner,
            json!({
                "board": board_id,
                "title": format!("Task {i}"),
                "assignee_id": owner.user_id,
                "reviewer_id": owner.user_id
            }),
        )
        .await;
    }

    let (status, body) = ctx
        .send(json_request(
            "GET",
            "/api/tasks/assigned_to_me/?page=2&page_size=2",
            Some(&owner.token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 5);
    assert_eq!(body["page"], 2);
    assert_eq!(body["page_size"], 2);
    assert_eq!(body["results"].as_array().unwrap().len(), 2);

    // A page past the end is empty but keeps the true count
    let (_, body) = ctx
        .send(json_request(
            "GET",
            "/api/tasks/reviewing/?page=9&page_size=2",
            Some(&owner.token),
            None,
        ))
        .await;
    assert_eq!(body["count"], 5);
    assert!(body["results"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_comment_delete_not_found_cases() {
    let Some(ctx) = TestContext::try_new().await else { return };

    let owner = ctx.register_user("Mona").await;
    let board_id = ctx.create_board(&owner, "Sprint 1", &[]).await;
    let task_id = ctx
        .create_task(&owner, json!({ "board": board_id, "title": "Task A" }))
        .await;
    let other_task_id = ctx
        .create_task(&owner, json!({ "board": board_id, "title": "Task B" }))
        .await;

    let (_, body) = ctx
        .send(json_request(
            "POST",
            &format!("/api/tasks/{task_id}/comments/"),
            Some(&owner.token),
            Some(json!({ "content": "note" })),
        ))
        .await;
    let comment_id = body["id"].as_str().unwrap().to_string();

    // Comment under the wrong task reads as absent
    let (status, _) = ctx
        .send(json_request(
            "DELETE",
            &format!("/api/tasks/{other_task_id}/comments/{comment_id}/"),
            Some(&owner.token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Unknown comment id
    let (status, _) = ctx
        .send(json_request(
            "DELETE",
            &format!("/api/tasks/{task_id}/comments/{}/", Uuid::new_v4()),
            Some(&owner.token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Unknown task id
    let (status, _) = ctx
        .send(json_request(
            "DELETE",
            &format!("/api/tasks/{}/comments/{comment_id}/", Uuid::new_v4()),
            Some(&owner.token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_board_delete_cascades() {
    let Some(ctx) = TestContext::try_new().await else { return };

    let owner = ctx.register_user("Nora").await;
    let board_id = ctx.create_board(&owner, "Doomed", &[]).await;
    let task_id = ctx
        .create_task(&owner, json!({ "board": board_id, "title": "Doomed task" }))
        .await;

    let (status, _) = ctx
        .send(json_request(
            "DELETE",
            &format!("/api/boards/{board_id}/"),
            Some(&owner.token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx
        .send(json_request(
            "GET",
            &format!("/api/tasks/{task_id}/"),
            Some(&owner.token),
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_endpoint() {
    let Some(ctx) = TestContext::try_new().await else { return };

    let (status, body) = ctx.send(json_request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}
