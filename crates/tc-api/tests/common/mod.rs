use std::sync::Arc;

use actix_web::web;
use tc_api::handlers::AppState;
use tc_auth_simple::SimpleAuthProvider;
use tc_core::Chronicle;
use tc_storage_local::LocalTownStore;
use uuid::Uuid;

pub const SECRET: &str = "test-secret";

pub fn state() -> web::Data<AppState> {
    let repo = Arc::new(LocalTownStore::in_memory());
    web::Data::new(AppState {
        chronicle: Chronicle::new(repo),
        auth: Box::new(SimpleAuthProvider::new(SECRET)),
    })
}

/// A fresh user id and the `Authorization` header value for it.
pub fn user() -> (Uuid, String) {
    let id = Uuid::now_v7();
    let token = SimpleAuthProvider::new(SECRET).issue_token(id);
    (id, format!("Bearer {token}"))
}
