//! `Json` and `Query` extractors whose rejections render through [`AppError`],
//! so malformed input gets the same `{success: false, message}` body as every
//! other client error.

use crate::api::error::AppError;
use axum::extract::{FromRequest, FromRequestParts};

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);
