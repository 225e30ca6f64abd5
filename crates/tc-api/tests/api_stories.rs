mod common;

use actix_web::http::{header, StatusCode};
use actix_web::{test, App};
use serde_json::{json, Value};
use tc_api::configure_routes;
use tc_core::models::TownSettings;
use tc_core::CrestCatalog;

#[actix_web::test]
async fn guest_story_updates_the_town() {
    let state = common::state();
    let (owner, _) = common::user();
    let town = state.chronicle.create_town(owner, "Cobblecreek").await.unwrap();
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/api/stories")
        .set_json(json!({
            "author": "  Pip ",
            "content": "happy happy sad",
            "location": "bakery",
            "share_id": town.share_id,
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["story"]["author"], "Pip");
    assert_eq!(body["story"]["sentiment"], 1);
    assert_eq!(body["story"]["is_guest"], true);
    assert_eq!(body["story"]["location"], "bakery");

    let stored = state.chronicle.my_towns(owner).await.unwrap().remove(0);
    assert_eq!(stored.stats.total_stories, 1);
    assert_eq!(stored.stats.contributors, 1);
    assert_eq!(stored.stats.locations_with_stories, 1);
}

#[actix_web::test]
async fn owner_story_is_not_a_guest_story() {
    let state = common::state();
    let (owner, auth) = common::user();
    let town = state.chronicle.create_town(owner, "Cobblecreek").await.unwrap();
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/api/stories")
        .insert_header((header::AUTHORIZATION, auth))
        .set_json(json!({
            "author": "Founder",
            "content": "I love to bake bread",
            "location": "town-square",
            "town_id": town.id,
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["story"]["is_guest"], false);
    assert_eq!(body["story"]["user_id"], owner.to_string());
    assert_eq!(body["story"]["themes"], json!(["cooking"]));
}

#[actix_web::test]
async fn malformed_story_requests_are_rejected() {
    let state = common::state();
    let (owner, _) = common::user();
    let town = state.chronicle.create_town(owner, "Cobblecreek").await.unwrap();
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;

    let cases = [
        json!({ "author": "Pip", "content": "hi", "location": "dungeon", "town_id": town.id }),
        json!({ "author": "Pip", "content": "hi", "location": "park" }),
        json!({ "author": "", "content": "hi", "location": "park", "town_id": town.id }),
        json!({ "author": "Pip", "content": "   ", "location": "park", "town_id": town.id }),
    ];
    for case in cases {
        let req = test::TestRequest::post().uri("/api/stories").set_json(case).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    let req = test::TestRequest::post()
        .uri("/api/stories")
        .set_json(json!({ "author": "Pip", "content": "hi", "location": "park", "share_id": "nope" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn unreadable_bodies_get_a_json_message() {
    let app = test::init_service(App::new().app_data(common::state()).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/api/stories")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{ not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"].as_str().unwrap().contains("invalid request body"));

    let req = test::TestRequest::delete()
        .uri("/api/stories/not-a-uuid")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"].as_str().unwrap().contains("invalid path"));
}

#[actix_web::test]
async fn closed_towns_refuse_guests() {
    let state = common::state();
    let (owner, _) = common::user();
    let town = state.chronicle.create_town(owner, "Cobblecreek").await.unwrap();
    state
        .chronicle
        .update_settings(
            town.id,
            owner,
            TownSettings {
                allow_guest_entries: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/api/stories")
        .set_json(json!({ "author": "Pip", "content": "hi", "location": "park", "town_id": town.id }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn location_listing_and_owner_delete() {
    let state = common::state();
    let (owner, auth) = common::user();
    let (_, stranger) = common::user();
    let town = state.chronicle.create_town(owner, "Cobblecreek").await.unwrap();
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure_routes)).await;

    let mut ids = Vec::new();
    for (author, location) in [("Al", "library"), ("Bo", "library"), ("Cy", "theater")] {
        let req = test::TestRequest::post()
            .uri("/api/stories")
            .set_json(json!({
                "author": author,
                "content": "a hidden puzzle",
                "location": location,
                "town_id": town.id,
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        ids.push(body["story"]["id"].as_str().unwrap().to_string());
    }

    let req = test::TestRequest::get()
        .uri(&format!("/api/stories/town/{}/location/library", town.id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let authors: Vec<&str> = body["stories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["author"].as_str().unwrap())
        .collect();
    assert_eq!(authors, vec!["Bo", "Al"]);

    let req = test::TestRequest::get()
        .uri(&format!("/api/stories/town/{}/location/cellar", town.id))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/stories/{}", ids[0]))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/stories/{}", ids[0]))
        .insert_header((header::AUTHORIZATION, stranger))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    for id in &ids {
        let req = test::TestRequest::delete()
            .uri(&format!("/api/stories/{id}"))
            .insert_header((header::AUTHORIZATION, auth.clone()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    let stored = state.chronicle.my_towns(owner).await.unwrap().remove(0);
    assert_eq!(stored.stats.total_stories, 0);
    assert_eq!(stored.crest, CrestCatalog::builtin().default_pattern());
    assert_eq!(stored.motto, "A town waiting to be discovered");
}
