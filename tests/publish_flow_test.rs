mod common;

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use common::{TestApp, send, signed_in};
use masterplan::hosted::memory::Op;

async fn build_draft(test: &TestApp) -> Value {
    let (status, _, _) = send(
        &test.app,
        Method::PUT,
        "/app/create-course",
        Some(json!({
            "title": "Growing on YouTube",
            "description": "From the first upload to a steady audience",
            "price": 29.99,
            "image_url": "https://images.example.com/cover.png"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    for title in ["Getting started", "Editing"] {
        let (status, _, _) = send(
            &test.app,
            Method::POST,
            "/app/create-course/sections",
            Some(json!({ "title": title })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, _, body) = send(&test.app, Method::GET, "/app/create-course", None).await;
    let first = body["draft"]["sections"][0]["id"].as_str().unwrap().to_string();
    let second = body["draft"]["sections"][1]["id"].as_str().unwrap().to_string();

    for (section, title, preview) in [
        (&first, "Channel setup", false),
        (&first, "Your first video", true),
        (&second, "Cutting footage", false),
    ] {
        let (status, _, _) = send(
            &test.app,
            Method::POST,
            &format!("/app/create-course/sections/{}/lessons", section),
            Some(json!({
                "title": title,
                "video_url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
                "duration": "12:00",
                "is_preview": preview
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, _, body) = send(
        &test.app,
        Method::POST,
        &format!("/app/create-course/sections/{}/move", second),
        Some(json!({ "direction": "up" })),
    )
    .await;
    body
}

#[tokio::test]
async fn test_reorder_keeps_contiguous_numbers() {
    let test = signed_in().await;
    let body = build_draft(&test).await;

    let sections = body["draft"]["sections"].as_array().unwrap();
    assert_eq!(sections[0]["title"], "Editing");
    assert_eq!(sections[0]["order_number"], 1);
    assert_eq!(sections[1]["order_number"], 2);
    assert_eq!(body["total_lessons"], 3);
}

#[tokio::test]
async fn test_publish_requires_creator() {
    let test = signed_in().await;
    build_draft(&test).await;
    let before = test.hosted.calls();

    let (status, _, body) = send(&test.app, Method::POST, "/app/create-course/publish", None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You need to be a creator to publish courses");
    assert_eq!(test.hosted.calls(), before);
}

#[tokio::test]
async fn test_publish_empty_draft_makes_no_calls() {
    let test = signed_in().await;
    send(&test.app, Method::POST, "/app/profile/creator", None).await;
    let (status, _, _) = send(
        &test.app,
        Method::PUT,
        "/app/create-course",
        Some(json!({
            "title": "Growing on YouTube",
            "description": "From the first upload to a steady audience"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let before = test.hosted.calls();

    let (status, _, body) = send(&test.app, Method::POST, "/app/create-course/publish", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["title"], "Failed to publish course");
    assert_eq!(body["message"], "Please add at least one section with lessons");

    let (status, _, _) = send(
        &test.app,
        Method::POST,
        "/app/create-course/sections",
        Some(json!({ "title": "Getting started" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, body) = send(&test.app, Method::POST, "/app/create-course/publish", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please add at least one lesson to your sections");

    assert_eq!(test.hosted.calls(), before);
}

#[tokio::test]
async fn test_publish_then_watch() {
    let test = signed_in().await;
    let (_, _, body) = send(&test.app, Method::POST, "/app/profile/creator", None).await;
    assert_eq!(body["notification"]["title"], "You're now a creator!");
    build_draft(&test).await;

    let (status, _, body) = send(&test.app, Method::POST, "/app/create-course/publish", None).await;
    assert_eq!(status, StatusCode::OK);
    let course_id = body["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["redirect"], format!("/app/course/{}", course_id));

    let (_, _, draft) = send(&test.app, Method::GET, "/app/create-course", None).await;
    assert_eq!(draft["total_lessons"], 0);

    let (status, _, body) = send(&test.app, Method::GET, &format!("/app/course/{}", course_id), None).await;
    assert_eq!(status, StatusCode::OK);
    let page = &body["page"];
    assert_eq!(page["price_label"], "$29.99");
    assert_eq!(page["is_owner"], true);
    assert_eq!(page["sections"][0]["title"], "Editing");
    assert_eq!(page["active_lesson"]["title"], "Your first video");
    assert_eq!(
        page["active_lesson"]["embed_url"],
        "https://www.youtube.com/embed/dQw4w9WgXcQ"
    );

    let (_, _, body) = send(&test.app, Method::GET, "/app/explore?q=youtube", None).await;
    let courses = body["page"]["courses"].as_array().unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0]["lesson_count"], 3);

    let (_, _, body) = send(&test.app, Method::GET, "/app/dashboard", None).await;
    assert_eq!(body["page"]["courses"].as_array().map(|c| c.len()), Some(1));
}

#[tokio::test]
async fn test_failed_publish_leaves_nothing_behind() {
    let test = signed_in().await;
    send(&test.app, Method::POST, "/app/profile/creator", None).await;
    build_draft(&test).await;
    test.hosted.fail(Op::InsertLessons, 1);

    let (status, _, body) = send(&test.app, Method::POST, "/app/create-course/publish", None).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["title"], "Failed to publish course");
    assert_eq!(body["retryable"], true);
    assert!(test.hosted.courses().is_empty());
    assert!(test.hosted.sections().is_empty());
    assert!(test.hosted.lessons().is_empty());

    let (_, _, draft) = send(&test.app, Method::GET, "/app/create-course", None).await;
    assert_eq!(draft["total_lessons"], 3);
}

#[tokio::test]
async fn test_missing_course_is_not_found() {
    let test = signed_in().await;

    let (status, _, body) = send(&test.app, Method::GET, "/app/course/does-not-exist", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["title"], "Not found");
}
