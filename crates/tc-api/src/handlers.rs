//! # tc-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the Chronicle
//! service. Handlers only translate: identity from the bearer token, request
//! bodies into core types, core results into JSON.

use std::str::FromStr;

use actix_web::{http::header, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tc_core::models::{Location, NewStory, TownRef, TownSettings};
use tc_core::traits::AuthProvider;
use tc_core::{AppError, Chronicle};
use uuid::Uuid;

use crate::error::ApiError;

type HandlerResult = Result<HttpResponse, ApiError>;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub chronicle: Chronicle,
    pub auth: Box<dyn AuthProvider>,
}

impl AppState {
    /// Identity behind the request's bearer token, if it verifies.
    fn viewer(&self, req: &HttpRequest) -> Option<Uuid> {
        let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
        let token = value.strip_prefix("Bearer ")?;
        self.auth.authenticate(token)
    }

    fn require_user(&self, req: &HttpRequest) -> Result<Uuid, ApiError> {
        self.viewer(req)
            .ok_or_else(|| AppError::Unauthorized("a valid bearer token is required".into()).into())
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateTownRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateStoryRequest {
    pub author: String,
    pub content: String,
    pub location: String,
    pub town_id: Option<Uuid>,
    pub share_id: Option<String>,
}

fn parse_location(raw: &str) -> Result<Location, ApiError> {
    Ok(Location::from_str(raw)?)
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

// Towns

pub async fn create_town(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateTownRequest>,
) -> HandlerResult {
    let owner = data.require_user(&req)?;
    let town = data.chronicle.create_town(owner, &body.name).await?;
    Ok(HttpResponse::Created().json(json!({ "town": town })))
}

pub async fn my_towns(data: web::Data<AppState>, req: HttpRequest) -> HandlerResult {
    let owner = data.require_user(&req)?;
    let towns = data.chronicle.my_towns(owner).await?;
    Ok(HttpResponse::Ok().json(json!({ "towns": towns })))
}

/// Public view of a town by share link. Non-owner reads bump the visitor count.
pub async fn shared_town(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> HandlerResult {
    let share_id = path.into_inner();
    let (town, stories) = data.chronicle.view_shared(&share_id, data.viewer(&req)).await?;
    let crest_rarity = data.chronicle.crests().rarity_of(&town.crest);
    Ok(HttpResponse::Ok().json(json!({
        "town": town,
        "stories": stories,
        "crest_rarity": crest_rarity,
    })))
}

pub async fn update_town(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<TownSettings>,
) -> HandlerResult {
    let owner = data.require_user(&req)?;
    let town = data
        .chronicle
        .update_settings(path.into_inner(), owner, body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "town": town })))
}

pub async fn delete_town(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> HandlerResult {
    let owner = data.require_user(&req)?;
    data.chronicle.delete_town(path.into_inner(), owner).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Town deleted successfully" })))
}

pub async fn regenerate_town(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> HandlerResult {
    let owner = data.require_user(&req)?;
    let town = data.chronicle.regenerate(path.into_inner(), owner).await?;
    Ok(HttpResponse::Ok().json(json!({ "town": town })))
}

pub async fn town_crests(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> HandlerResult {
    let crests = data
        .chronicle
        .unlocked_crests(path.into_inner(), data.viewer(&req))
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "crests": crests })))
}

// Stories

/// Adds a story by town id or share id. Anonymous callers write as guests.
pub async fn create_story(
    data: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateStoryRequest>,
) -> HandlerResult {
    let body = body.into_inner();
    let target = match (body.town_id, body.share_id) {
        (Some(id), _) => TownRef::Id(id),
        (None, Some(share_id)) => TownRef::Share(share_id),
        (None, None) => {
            return Err(AppError::ValidationError("town_id or share_id is required".into()).into())
        }
    };
    let submission = NewStory {
        author: body.author,
        content: body.content,
        location: parse_location(&body.location)?,
    };

    let story = data
        .chronicle
        .add_story(target, submission, data.viewer(&req))
        .await?;
    Ok(HttpResponse::Created().json(json!({ "story": story })))
}

pub async fn stories_at_location(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<(Uuid, String)>,
) -> HandlerResult {
    let (town_id, location) = path.into_inner();
    let location = parse_location(&location)?;
    let stories = data
        .chronicle
        .stories_at(town_id, location, data.viewer(&req))
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "stories": stories })))
}

pub async fn delete_story(
    data: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> HandlerResult {
    let requester = data.require_user(&req)?;
    data.chronicle.delete_story(path.into_inner(), requester).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Story deleted successfully" })))
}
