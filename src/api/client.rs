//! Typed client for the FINVO HTTP API
//!
//! One method per endpoint. Session identity (bearer token, user id) is
//! handed in explicitly via [`FinvoClient::with_session`].

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::api::errors::ApiError;
use crate::configure::AppConfig;
use crate::models::{
    Account, ApiErrorBody, Beneficiary, BeneficiaryRequest, ChangeEmailRequest,
    ChangePasswordRequest, CloseAccountRequest, DashboardStats, LoginRequest, LoginResponse,
    MessageResponse, NewAccountRequest, RegisterRequest, Session, Transaction, TransferBody,
    TransferResponse, User,
};
use crate::transfer::types::{TransactionId, TransferRequest};

#[derive(Clone)]
pub struct FinvoClient {
    http: Client,
    base_url: String,
    session: Option<Session>,
}

/// Map a non-2xx response to an [`ApiError`], preferring the server's `detail`
pub fn rejection_from_body(status: StatusCode, body: &str, fallback: &str) -> ApiError {
    let parsed: ApiErrorBody = serde_json::from_str(body).unwrap_or_default();
    ApiError::Rejected {
        status: status.as_u16(),
        detail: parsed.detail_text().unwrap_or_else(|| fallback.to_string()),
        code: parsed.code,
    }
}

impl FinvoClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session: None,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        let client = Self::new(
            &config.api_base_url,
            Duration::from_millis(config.request_timeout_ms),
        )?;

        Ok(match (&config.access_token, config.user_id) {
            (Some(token), Some(user_id)) => client.with_session(Session {
                access_token: token.clone(),
                user_id,
            }),
            _ => client,
        })
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn session_or_err(&self) -> Result<&Session, ApiError> {
        self.session.as_ref().ok_or(ApiError::MissingSession)
    }

    fn authorized(&self, rb: RequestBuilder) -> RequestBuilder {
        match &self.session {
            Some(session) => rb.bearer_auth(&session.access_token),
            None => rb,
        }
    }

    async fn check(resp: reqwest::Response, fallback: &str) -> Result<reqwest::Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let err = rejection_from_body(status, &body, fallback);
        log::debug!("API rejected request: status={} body={}", status, body);
        Err(err)
    }

    async fn send_json<T: DeserializeOwned>(&self, rb: RequestBuilder, fallback: &str) -> Result<T, ApiError> {
        let resp = self.authorized(rb).send().await?;
        let resp = Self::check(resp, fallback).await?;
        let text = resp.text().await?;
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn send_unit(&self, rb: RequestBuilder, fallback: &str) -> Result<(), ApiError> {
        let resp = self.authorized(rb).send().await?;
        Self::check(resp, fallback).await?;
        Ok(())
    }

    // ===== Authentication =====

    /// Log in and return a client carrying the new session
    pub async fn login(&self, email: &str, password: &str) -> Result<(Self, LoginResponse), ApiError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp: LoginResponse = self
            .send_json(self.http.post(self.url("/login/")).json(&body), "Erreur de connexion")
            .await?;

        log::info!("Logged in as user {}", resp.user.id);
        let client = self.clone().with_session(Session::from(&resp));
        Ok((client, resp))
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<User, ApiError> {
        self.send_json(
            self.http.post(self.url("/users/")).json(req),
            "Erreur lors de l'inscription",
        )
        .await
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.session_or_err()?;
        self.send_json(
            self.http.get(self.url("/users/me/")),
            "Erreur lors de la récupération de l'utilisateur",
        )
        .await
    }

    pub async fn change_password(&self, current_password: &str, new_password: &str) -> Result<MessageResponse, ApiError> {
        self.session_or_err()?;
        let body = ChangePasswordRequest {
            current_password: current_password.to_string(),
            new_password: new_password.to_string(),
        };
        self.send_json(
            self.http.put(self.url("/users/me/password/")).json(&body),
            "Erreur lors de la modification du mot de passe",
        )
        .await
    }

    pub async fn change_email(&self, new_email: &str) -> Result<MessageResponse, ApiError> {
        self.session_or_err()?;
        let body = ChangeEmailRequest {
            new_email: new_email.to_string(),
        };
        self.send_json(
            self.http.put(self.url("/users/me/email/")).json(&body),
            "Erreur lors de la modification de l'email",
        )
        .await
    }

    // ===== Accounts =====

    pub async fn user_accounts(&self) -> Result<Vec<Account>, ApiError> {
        let user_id = self.session_or_err()?.user_id;
        self.send_json(
            self.http.get(self.url(&format!("/users/{}/accounts/", user_id))),
            "Erreur lors de la récupération des comptes",
        )
        .await
    }

    pub async fn account(&self, account_id: u64) -> Result<Account, ApiError> {
        self.session_or_err()?;
        self.send_json(
            self.http.get(self.url(&format!("/accounts/{}/", account_id))),
            "Erreur lors de la récupération du compte",
        )
        .await
    }

    pub async fn create_account(&self, req: &NewAccountRequest) -> Result<Account, ApiError> {
        self.session_or_err()?;
        self.send_json(
            self.http.post(self.url("/accounts/")).json(req),
            "Erreur lors de la création du compte",
        )
        .await
    }

    pub async fn close_account(&self, account_id: u64, password: &str) -> Result<MessageResponse, ApiError> {
        self.session_or_err()?;
        let body = CloseAccountRequest {
            password: password.to_string(),
        };
        self.send_json(
            self.http.post(self.url(&format!("/accounts/{}/close/", account_id))).json(&body),
            "Erreur lors de la clôture du compte",
        )
        .await
    }

    // ===== Beneficiaries =====

    pub async fn beneficiaries(&self) -> Result<Vec<Beneficiary>, ApiError> {
        self.session_or_err()?;
        self.send_json(
            self.http.get(self.url("/user_beneficiaries/")),
            "Erreur lors de la récupération des bénéficiaires",
        )
        .await
    }

    pub async fn add_beneficiary(&self, req: &BeneficiaryRequest) -> Result<Beneficiary, ApiError> {
        self.session_or_err()?;
        self.send_json(
            self.http.post(self.url("/beneficiaries/")).json(req),
            "Erreur lors de l'ajout du bénéficiaire",
        )
        .await
    }

    pub async fn update_beneficiary(&self, beneficiary_id: u64, req: &BeneficiaryRequest) -> Result<Beneficiary, ApiError> {
        self.session_or_err()?;
        self.send_json(
            self.http.put(self.url(&format!("/beneficiaries/{}/", beneficiary_id))).json(req),
            "Erreur lors de la modification du bénéficiaire",
        )
        .await
    }

    pub async fn delete_beneficiary(&self, beneficiary_id: u64) -> Result<(), ApiError> {
        self.session_or_err()?;
        self.send_unit(
            self.http.delete(self.url(&format!("/beneficiaries/{}/", beneficiary_id))),
            "Erreur lors de la suppression du bénéficiaire",
        )
        .await
    }

    // ===== Dashboard & history =====

    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        self.session_or_err()?;
        self.send_json(
            self.http.get(self.url("/dashboard/stats/")),
            "Erreur lors de la récupération des statistiques du dashboard",
        )
        .await
    }

    pub async fn all_transactions(&self) -> Result<Vec<Transaction>, ApiError> {
        self.session_or_err()?;
        self.send_json(
            self.http.get(self.url("/show_all_user_transactions/")),
            "Erreur lors de la récupération des transactions",
        )
        .await
    }

    // ===== Transfers =====

    pub async fn transfer(&self, req: &TransferRequest) -> Result<TransferResponse, ApiError> {
        self.session_or_err()?;
        let body = TransferBody {
            destination_account_number: req.destination_account_number().to_string(),
            amount: req.amount(),
            description: req.description().unwrap_or_default().to_string(),
        };
        self.send_json(
            self.http
                .post(self.url(&format!("/accounts/{}/transfer/", req.source_account_id())))
                .json(&body),
            "Erreur lors du virement",
        )
        .await
    }

    pub async fn cancel_transaction(&self, transaction_id: TransactionId) -> Result<(), ApiError> {
        self.session_or_err()?;
        self.send_unit(
            self.http.post(self.url(&format!("/transactions/{}/cancel/", transaction_id))),
            "Erreur lors de l'annulation",
        )
        .await
    }
}
