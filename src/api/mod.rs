//! Clients for the budget backend and the GoCardless proxy

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::types::{BudgetError, BudgetResult};

pub mod client;
pub mod gocardless;

pub use client::*;
pub use gocardless::*;

/// Decode a backend response, mapping error statuses onto [`BudgetError`]
///
/// 401 means the session is gone and the caller must re-authenticate; 409
/// means another session decided first and the caller must discard its
/// optimistic state.
pub(crate) async fn decode_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> BudgetResult<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let message = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::UNAUTHORIZED => BudgetError::Unauthorized,
        StatusCode::CONFLICT => BudgetError::Conflict(message),
        _ => BudgetError::Api {
            status: status.as_u16(),
            message,
        },
    })
}
