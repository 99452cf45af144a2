//! GoCardless institution listing and account-link flow
//!
//! Almost the entire GoCardless integration lives in the backend; this client
//! only lists institutions for the link picker and opens requisitions through
//! the backend proxy.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::decode_response;
use crate::types::BudgetResult;

/// GoCardless sandbox institution, always surfaced in listings so linking can
/// be exercised without a real bank
pub const SANDBOX_INSTITUTION_ID: &str = "SANDBOX_FINANCE_SFIN_0000";

/// A bank institution available for linking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Institution {
    /// GoCardless institution identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Bank identifier code, if published
    #[serde(default)]
    pub bic: Option<String>,
    /// ISO country codes the institution serves
    #[serde(default)]
    pub countries: Vec<String>,
    /// Logo URL for the link picker
    #[serde(default)]
    pub logo_url: Option<String>,
}

impl Institution {
    /// The sandbox institution record
    pub fn sandbox() -> Self {
        Self {
            id: SANDBOX_INSTITUTION_ID.to_string(),
            name: "Sandbox Finance".to_string(),
            bic: Some("SFIN0000".to_string()),
            countries: vec!["XX".to_string()],
            logo_url: None,
        }
    }
}

/// An opened requisition the user follows to grant consent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequisitionLink {
    /// Requisition identifier
    pub id: String,
    /// Consent URL to redirect the user to
    pub link: String,
    /// Institution the requisition is for
    pub institution_id: String,
}

/// Client for the backend's GoCardless proxy endpoints
pub struct GoCardlessClient {
    http: Client,
    base_url: String,
    token: String,
}

impl GoCardlessClient {
    /// Create a new client against the backend proxy
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// List institutions for a country, sandbox included
    pub async fn list_institutions(&self, country: &str) -> BudgetResult<Vec<Institution>> {
        let response = self
            .http
            .get(format!("{}/gocardless/institutions", self.base_url))
            .bearer_auth(&self.token)
            .query(&[("country", country)])
            .send()
            .await?;
        let mut institutions: Vec<Institution> = decode_response(response).await?;

        if !institutions.iter().any(|i| i.id == SANDBOX_INSTITUTION_ID) {
            institutions.push(Institution::sandbox());
        }

        Ok(institutions)
    }

    /// Open a requisition for an institution; the user completes consent at
    /// the returned link
    pub async fn create_requisition(
        &self,
        institution_id: &str,
        redirect_url: &str,
    ) -> BudgetResult<RequisitionLink> {
        #[derive(Serialize)]
        struct CreateRequisitionRequest<'a> {
            institution_id: &'a str,
            redirect_url: &'a str,
        }

        let response = self
            .http
            .post(format!("{}/gocardless/requisitions", self.base_url))
            .bearer_auth(&self.token)
            .json(&CreateRequisitionRequest {
                institution_id,
                redirect_url,
            })
            .send()
            .await?;

        let requisition: RequisitionLink = decode_response(response).await?;
        info!(
            requisition_id = %requisition.id,
            institution_id,
            "requisition opened"
        );
        Ok(requisition)
    }
}
