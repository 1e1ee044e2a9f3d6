//! Integration tests for recipe routes.
//!
//! Run with: cargo test -p recipe-book-integration-tests -- --include-ignored

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use recipe_book_integration_tests::{TestContext, names, png_bytes, recipe_payload};

fn ids(value: &Value) -> Vec<i64> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_i64().unwrap())
        .collect()
}

// ============================================================================
// Auth (no database)
// ============================================================================

#[tokio::test]
async fn test_list_requires_authentication() {
    let ctx = TestContext::new();
    let (status, _) = ctx
        .json(Method::GET, "/api/recipe/recipes", None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_requires_authentication() {
    let ctx = TestContext::new();
    let (status, _) = ctx
        .json(
            Method::POST,
            "/api/recipe/recipes",
            None,
            Some(recipe_payload("Sample recipe")),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_detail_requires_authentication() {
    let ctx = TestContext::new();
    for method in [Method::GET, Method::PATCH, Method::PUT, Method::DELETE] {
        let (status, _) = ctx
            .json(method.clone(), "/api/recipe/recipes/1", None, Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method}");
    }
}

// ============================================================================
// CRUD
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (RECIPE_API_TEST_DATABASE_URL)"]
async fn test_create_and_retrieve_recipe() {
    let ctx = TestContext::with_database().await;
    let (_, token) = ctx.user_with_token().await;

    let created = ctx
        .create_recipe(
            &token,
            json!({
                "title": "Sample recipe",
                "time_minutes": 30,
                "price": "5.99",
                "description": "Sample description",
                "link": "https://example.com/recipe.pdf"
            }),
        )
        .await;
    assert_eq!(created["title"], "Sample recipe");
    assert_eq!(created["price"], "5.99");
    assert_eq!(created["image"], Value::Null);

    let id = created["id"].as_i64().unwrap();
    let (status, detail) = ctx.get(&format!("/api/recipe/recipes/{id}"), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["description"], "Sample description");
    assert_eq!(detail["link"], "https://example.com/recipe.pdf");
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (RECIPE_API_TEST_DATABASE_URL)"]
async fn test_list_is_limited_to_owner_and_newest_first() {
    let ctx = TestContext::with_database().await;
    let (_, token) = ctx.user_with_token().await;
    let (_, other) = ctx.user_with_token().await;

    let first = ctx.create_recipe(&token, recipe_payload("First")).await;
    let second = ctx.create_recipe(&token, recipe_payload("Second")).await;
    ctx.create_recipe(&other, recipe_payload("Not mine")).await;

    let (status, body) = ctx.get("/api/recipe/recipes", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        ids(&body),
        [second["id"].as_i64().unwrap(), first["id"].as_i64().unwrap()]
    );
    assert!(body[0].get("description").is_none());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (RECIPE_API_TEST_DATABASE_URL)"]
async fn test_partial_update_ignores_owner_field() {
    let ctx = TestContext::with_database().await;
    let (_, token) = ctx.user_with_token().await;
    let recipe = ctx.create_recipe(&token, recipe_payload("Original")).await;
    let id = recipe["id"].as_i64().unwrap();

    let (status, body) = ctx
        .json(
            Method::PATCH,
            &format!("/api/recipe/recipes/{id}"),
            Some(&token),
            Some(json!({"title": "New title", "user": 999_999})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "New title");
    assert_eq!(body["price"], "5.25");

    let (status, _) = ctx.get(&format!("/api/recipe/recipes/{id}"), &token).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (RECIPE_API_TEST_DATABASE_URL)"]
async fn test_full_update_requires_core_fields() {
    let ctx = TestContext::with_database().await;
    let (_, token) = ctx.user_with_token().await;
    let recipe = ctx.create_recipe(&token, recipe_payload("Original")).await;
    let id = recipe["id"].as_i64().unwrap();

    let (status, body) = ctx
        .json(
            Method::PUT,
            &format!("/api/recipe/recipes/{id}"),
            Some(&token),
            Some(json!({"title": "Only title"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["price"].is_array());

    let (status, body) = ctx
        .json(
            Method::PUT,
            &format!("/api/recipe/recipes/{id}"),
            Some(&token),
            Some(json!({
                "title": "Replaced",
                "time_minutes": 10,
                "price": "1.50",
                "link": null
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["time_minutes"], 10);
    assert_eq!(body["link"], Value::Null);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (RECIPE_API_TEST_DATABASE_URL)"]
async fn test_delete_recipe() {
    let ctx = TestContext::with_database().await;
    let (_, token) = ctx.user_with_token().await;
    let recipe = ctx.create_recipe(&token, recipe_payload("Doomed")).await;
    let id = recipe["id"].as_i64().unwrap();

    let (status, _) = ctx
        .json(Method::DELETE, &format!("/api/recipe/recipes/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx.get(&format!("/api/recipe/recipes/{id}"), &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (RECIPE_API_TEST_DATABASE_URL)"]
async fn test_other_users_recipe_is_not_found() {
    let ctx = TestContext::with_database().await;
    let (_, owner) = ctx.user_with_token().await;
    let (_, intruder) = ctx.user_with_token().await;
    let recipe = ctx.create_recipe(&owner, recipe_payload("Private")).await;
    let id = recipe["id"].as_i64().unwrap();
    let uri = format!("/api/recipe/recipes/{id}");

    let (status, _) = ctx.get(&uri, &intruder).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .json(Method::PATCH, &uri, Some(&intruder), Some(json!({"title": "Mine now"})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.json(Method::DELETE, &uri, Some(&intruder), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = ctx.get("/api/recipe/recipes", &owner).await;
    assert_eq!(ids(&body), [id]);
    let (_, body) = ctx.get(&uri, &owner).await;
    assert_eq!(body["title"], "Private");
}

// ============================================================================
// Nested attributes
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (RECIPE_API_TEST_DATABASE_URL)"]
async fn test_create_with_new_tags_then_reuse() {
    let ctx = TestContext::with_database().await;
    let (_, token) = ctx.user_with_token().await;

    let mut payload = recipe_payload("Thai Prawn Curry");
    payload["tags"] = json!([{"name": "Thai"}, {"name": "Dinner"}]);
    let first = ctx.create_recipe(&token, payload).await;
    assert_eq!(names(&first["tags"]), ["Thai", "Dinner"]);

    let (_, tags) = ctx.get("/api/recipe/tags", &token).await;
    assert_eq!(tags.as_array().unwrap().len(), 2);

    let mut payload = recipe_payload("Pongal");
    payload["tags"] = json!([{"name": "Thai"}, {"name": "Breakfast"}, {"name": "Thai"}]);
    let second = ctx.create_recipe(&token, payload).await;
    assert_eq!(names(&second["tags"]), ["Thai", "Breakfast"]);
    assert_eq!(first["tags"][0]["id"], second["tags"][0]["id"]);

    let (_, tags) = ctx.get("/api/recipe/tags", &token).await;
    assert_eq!(names(&tags), ["Thai", "Dinner", "Breakfast"]);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (RECIPE_API_TEST_DATABASE_URL)"]
async fn test_tags_are_not_shared_between_users() {
    let ctx = TestContext::with_database().await;
    let (_, token) = ctx.user_with_token().await;
    let (_, other) = ctx.user_with_token().await;

    let mut payload = recipe_payload("Curry");
    payload["tags"] = json!([{"name": "Thai"}]);
    let mine = ctx.create_recipe(&token, payload.clone()).await;
    let theirs = ctx.create_recipe(&other, payload).await;

    assert_ne!(mine["tags"][0]["id"], theirs["tags"][0]["id"]);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (RECIPE_API_TEST_DATABASE_URL)"]
async fn test_update_tags_replaces_and_clear_keeps_rows() {
    let ctx = TestContext::with_database().await;
    let (_, token) = ctx.user_with_token().await;

    let mut payload = recipe_payload("Curry");
    payload["tags"] = json!([{"name": "Breakfast"}]);
    payload["ingredients"] = json!([{"name": "Rice"}]);
    let recipe = ctx.create_recipe(&token, payload).await;
    let uri = format!("/api/recipe/recipes/{}", recipe["id"]);

    let (status, body) = ctx
        .json(Method::PATCH, &uri, Some(&token), Some(json!({"tags": [{"name": "Lunch"}]})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body["tags"]), ["Lunch"]);
    assert_eq!(names(&body["ingredients"]), ["Rice"]);

    let (status, body) = ctx
        .json(Method::PATCH, &uri, Some(&token), Some(json!({"tags": []})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["tags"].as_array().unwrap().is_empty());
    assert_eq!(names(&body["ingredients"]), ["Rice"]);

    let (_, tags) = ctx.get("/api/recipe/tags", &token).await;
    assert_eq!(names(&tags), ["Lunch", "Breakfast"]);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (RECIPE_API_TEST_DATABASE_URL)"]
async fn test_invalid_nested_name_leaves_recipe_unchanged() {
    let ctx = TestContext::with_database().await;
    let (_, token) = ctx.user_with_token().await;

    let mut payload = recipe_payload("Curry");
    payload["tags"] = json!([{"name": "Thai"}]);
    let recipe = ctx.create_recipe(&token, payload).await;
    let uri = format!("/api/recipe/recipes/{}", recipe["id"]);

    let (status, body) = ctx
        .json(
            Method::PATCH,
            &uri,
            Some(&token),
            Some(json!({"title": "Changed", "tags": [{"name": "  "}]})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["tags"].is_array());

    let (_, body) = ctx.get(&uri, &token).await;
    assert_eq!(body["title"], "Curry");
    assert_eq!(names(&body["tags"]), ["Thai"]);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (RECIPE_API_TEST_DATABASE_URL)"]
async fn test_nested_names_keep_request_order() {
    let ctx = TestContext::with_database().await;
    let (_, token) = ctx.user_with_token().await;

    let mut payload = recipe_payload("Curry");
    payload["ingredients"] = json!([{"name": "Salt"}, {"name": "Basil"}, {"name": "Rice"}]);
    let recipe = ctx.create_recipe(&token, payload).await;
    assert_eq!(names(&recipe["ingredients"]), ["Salt", "Basil", "Rice"]);

    let uri = format!("/api/recipe/recipes/{}", recipe["id"]);
    let (status, body) = ctx
        .json(
            Method::PATCH,
            &uri,
            Some(&token),
            Some(json!({"ingredients": [{"name": "Rice"}, {"name": "Salt"}]})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body["ingredients"]), ["Rice", "Salt"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "Requires PostgreSQL (RECIPE_API_TEST_DATABASE_URL)"]
async fn test_concurrent_creates_share_tags() {
    const REQUESTS: usize = 40;
    let ctx = Arc::new(TestContext::with_database().await);
    let (_, token) = ctx.user_with_token().await;

    let tag_names = [
        "Thai", "Dinner", "Spicy", "Quick", "Vegan", "Lunch", "Curry", "Rice",
    ];
    let mut seed = recipe_payload("Seed");
    seed["tags"] = json!(tag_names.map(|name| json!({"name": name})));
    ctx.create_recipe(&token, seed).await;

    let mut handles = Vec::with_capacity(REQUESTS);
    for i in 0..REQUESTS {
        let ctx = Arc::clone(&ctx);
        let token = token.clone();
        let mut order = tag_names.to_vec();
        if i % 2 == 1 {
            order.reverse();
        }
        // Every fourth request also introduces the same new tag
        if i % 4 == 0 {
            order.push("Fresh");
        }
        handles.push(tokio::spawn(async move {
            let mut payload = recipe_payload(&format!("Recipe {i}"));
            payload["tags"] = json!(order
                .iter()
                .map(|name| json!({"name": name}))
                .collect::<Vec<_>>());
            ctx.json(Method::POST, "/api/recipe/recipes", Some(&token), Some(payload))
                .await
        }));
    }

    for handle in handles {
        let (status, body) = handle.await.unwrap();
        assert_eq!(status, StatusCode::CREATED, "unexpected body: {body}");
    }

    let (_, tags) = ctx.get("/api/recipe/tags", &token).await;
    assert_eq!(tags.as_array().unwrap().len(), tag_names.len() + 1);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (RECIPE_API_TEST_DATABASE_URL)"]
async fn test_wrongly_typed_fields_are_field_errors() {
    let ctx = TestContext::with_database().await;
    let (_, token) = ctx.user_with_token().await;

    let mut payload = recipe_payload("Curry");
    payload["time_minutes"] = json!("abc");
    let (status, body) = ctx
        .json(Method::POST, "/api/recipe/recipes", Some(&token), Some(payload))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["time_minutes"].is_array());

    let mut payload = recipe_payload("Curry");
    payload["tags"] = json!(["Thai"]);
    let (status, body) = ctx
        .json(Method::POST, "/api/recipe/recipes", Some(&token), Some(payload))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["tags[0]"].is_array());

    let (_, recipes) = ctx.get("/api/recipe/recipes", &token).await;
    assert!(recipes.as_array().unwrap().is_empty());
}

// ============================================================================
// Filtering
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (RECIPE_API_TEST_DATABASE_URL)"]
async fn test_filter_by_tags_and_ingredients() {
    let ctx = TestContext::with_database().await;
    let (_, token) = ctx.user_with_token().await;

    let mut payload = recipe_payload("Thai Vegetable Curry");
    payload["tags"] = json!([{"name": "Vegan"}, {"name": "Vegetarian"}]);
    payload["ingredients"] = json!([{"name": "Tofu"}]);
    let curry = ctx.create_recipe(&token, payload).await;

    let mut payload = recipe_payload("Aubergine with Tahini");
    payload["tags"] = json!([{"name": "Vegetarian"}]);
    let aubergine = ctx.create_recipe(&token, payload).await;

    ctx.create_recipe(&token, recipe_payload("Fish and chips")).await;

    let vegan = &curry["tags"][0]["id"];
    let vegetarian = &curry["tags"][1]["id"];
    let tofu = &curry["ingredients"][0]["id"];

    let (status, body) = ctx
        .get(&format!("/api/recipe/recipes?tags={vegan},{vegetarian}"), &token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        ids(&body),
        [aubergine["id"].as_i64().unwrap(), curry["id"].as_i64().unwrap()]
    );

    let (_, body) = ctx
        .get(
            &format!("/api/recipe/recipes?tags={vegan},{vegetarian}&ingredients={tofu}"),
            &token,
        )
        .await;
    assert_eq!(ids(&body), [curry["id"].as_i64().unwrap()]);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (RECIPE_API_TEST_DATABASE_URL)"]
async fn test_filter_rejects_malformed_ids() {
    let ctx = TestContext::with_database().await;
    let (_, token) = ctx.user_with_token().await;

    let (status, body) = ctx.get("/api/recipe/recipes?tags=1,abc", &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["tags"].is_array());
}

// ============================================================================
// Images
// ============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (RECIPE_API_TEST_DATABASE_URL)"]
async fn test_upload_image() {
    let ctx = TestContext::with_database().await;
    let (_, token) = ctx.user_with_token().await;
    let recipe = ctx.create_recipe(&token, recipe_payload("Photogenic")).await;
    let id = recipe["id"].as_i64().unwrap();

    let (status, body) = ctx
        .upload(
            &format!("/api/recipe/recipes/{id}/upload-image"),
            &token,
            "image",
            "photo.png",
            &png_bytes(),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "unexpected body: {body}");
    assert_eq!(body["id"], id);
    let url = body["image"].as_str().unwrap().to_owned();
    assert!(url.starts_with("/media/uploads/recipe/"));

    let relative = url.trim_start_matches("/media/");
    assert!(ctx.media.path().join(relative).exists());

    let (status, served) = ctx
        .send_raw(
            axum::http::Request::get(url.as_str())
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(served, png_bytes());

    let (_, detail) = ctx.get(&format!("/api/recipe/recipes/{id}"), &token).await;
    assert_eq!(detail["image"], url.as_str());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (RECIPE_API_TEST_DATABASE_URL)"]
async fn test_upload_rejects_non_image() {
    let ctx = TestContext::with_database().await;
    let (_, token) = ctx.user_with_token().await;
    let recipe = ctx.create_recipe(&token, recipe_payload("Photogenic")).await;
    let id = recipe["id"].as_i64().unwrap();

    let (status, body) = ctx
        .upload(
            &format!("/api/recipe/recipes/{id}/upload-image"),
            &token,
            "image",
            "notes.txt",
            b"notimage",
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["image"].is_array());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (RECIPE_API_TEST_DATABASE_URL)"]
async fn test_upload_requires_image_field() {
    let ctx = TestContext::with_database().await;
    let (_, token) = ctx.user_with_token().await;
    let recipe = ctx.create_recipe(&token, recipe_payload("Photogenic")).await;
    let id = recipe["id"].as_i64().unwrap();

    let (status, body) = ctx
        .upload(
            &format!("/api/recipe/recipes/{id}/upload-image"),
            &token,
            "file",
            "photo.png",
            &png_bytes(),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["image"].is_array());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (RECIPE_API_TEST_DATABASE_URL)"]
async fn test_upload_to_other_users_recipe_is_not_found() {
    let ctx = TestContext::with_database().await;
    let (_, owner) = ctx.user_with_token().await;
    let (_, intruder) = ctx.user_with_token().await;
    let recipe = ctx.create_recipe(&owner, recipe_payload("Private")).await;
    let id = recipe["id"].as_i64().unwrap();

    let (status, _) = ctx
        .upload(
            &format!("/api/recipe/recipes/{id}/upload-image"),
            &intruder,
            "image",
            "photo.png",
            &png_bytes(),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
