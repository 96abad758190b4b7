use axum::{
    extract::FromRequest,
    http::{HeaderMap, header},
};

use crate::error::Error;

pub mod auth;
pub mod favorites;
pub mod home;
pub mod ingredients;
pub mod recipes;
pub mod shopping_cart;
pub mod subscriptions;
pub mod tags;
pub mod users;

/// Host the client addressed, used to build absolute pagination links.
pub(crate) fn request_host(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::HOST).and_then(|h| h.to_str().ok())
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct UrlPath {
    pub id: i64,
}

/// `axum::Json` whose rejections go through [`Error`], so a malformed or
/// incomplete body is a 400 like any other invalid input.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct JsonBody<T>(pub T);
