use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::app::EmulatorApp;
use crate::auth::error::{
    internal_error, map_http_error, network_error, user_not_found, AuthResult,
};
use crate::auth::model::{
    CreateAccountBody, CreateAccountResponse, CreateUserRequest, DeleteAccountBody,
    IdTokenResponse, LookupBody, LookupResponse, SignInWithCustomTokenBody, UserRecord,
};
use crate::auth::token::create_custom_token;
use crate::credential::EMULATOR_OWNER_TOKEN;
use crate::emulator::EmulatorHost;

pub const DEFAULT_API_KEY: &str = "fake-api-key";

const IDENTITY_TOOLKIT_PATH: &str = "identitytoolkit.googleapis.com";

/// Admin client for the Authentication emulator.
#[derive(Clone, Debug)]
pub struct AuthAdmin {
    app: EmulatorApp,
    host: EmulatorHost,
    api_key: String,
    client: Client,
}

impl AuthAdmin {
    pub fn new(app: &EmulatorApp, host: EmulatorHost) -> Self {
        let api_key = app
            .options()
            .api_key
            .clone()
            .unwrap_or_else(|| DEFAULT_API_KEY.to_string());
        Self {
            app: app.clone(),
            host,
            api_key,
            client: Client::new(),
        }
    }

    /// Replaces the HTTP client, e.g. with one that carries a request timeout.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn host(&self) -> &EmulatorHost {
        &self.host
    }

    pub fn app(&self) -> &EmulatorApp {
        &self.app
    }

    fn toolkit_base(&self) -> String {
        format!("{}/{IDENTITY_TOOLKIT_PATH}", self.host.base_url())
    }

    fn project_url(&self, path: &str) -> String {
        format!(
            "{}/v1/projects/{}/{path}",
            self.toolkit_base(),
            self.app.project_id()
        )
    }

    fn admin_request(&self, method: Method, url: &str) -> RequestBuilder {
        log::debug!("auth emulator {method} {url}");
        self.client
            .request(method, url)
            .bearer_auth(EMULATOR_OWNER_TOKEN)
    }

    async fn admin_post<B, R>(&self, path: &str, body: &B) -> AuthResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.project_url(path);
        let response = self
            .admin_request(Method::POST, &url)
            .json(body)
            .send()
            .await
            .map_err(|err| network_error(format!("Request to {url} failed: {err}")))?;
        read_json(response).await
    }

    /// Creates an account and returns it as the emulator stores it.
    pub async fn create_user(&self, request: &CreateUserRequest) -> AuthResult<UserRecord> {
        let created: CreateAccountResponse = self
            .admin_post("accounts", &CreateAccountBody::from(request))
            .await?;
        self.get_user(&created.local_id).await
    }

    pub async fn get_user(&self, uid: &str) -> AuthResult<UserRecord> {
        let body = LookupBody {
            local_id: Some([uid]),
            email: None,
        };
        self.lookup(&body)
            .await?
            .ok_or_else(|| user_not_found(format!("No user record found for uid: {uid}")))
    }

    pub async fn get_user_by_email(&self, email: &str) -> AuthResult<UserRecord> {
        let body = LookupBody {
            local_id: None,
            email: Some([email]),
        };
        self.lookup(&body)
            .await?
            .ok_or_else(|| user_not_found(format!("No user record found for email: {email}")))
    }

    async fn lookup(&self, body: &LookupBody<'_>) -> AuthResult<Option<UserRecord>> {
        let response: LookupResponse = self.admin_post("accounts:lookup", body).await?;
        Ok(response.users.and_then(|users| users.into_iter().next()))
    }

    pub async fn delete_user(&self, uid: &str) -> AuthResult<()> {
        let _: Value = self
            .admin_post("accounts:delete", &DeleteAccountBody { local_id: uid })
            .await?;
        Ok(())
    }

    /// Mints an emulator custom token for `uid`, issued by the app's service account.
    pub fn create_custom_token(
        &self,
        uid: &str,
        developer_claims: Option<&Map<String, Value>>,
    ) -> AuthResult<String> {
        let issuer = self.app.credential().service_account_email();
        create_custom_token(&issuer, uid, developer_claims)
    }

    /// Exchanges a custom token for an ID token through the client-side endpoint.
    pub async fn sign_in_with_custom_token(&self, token: &str) -> AuthResult<IdTokenResponse> {
        let url = format!("{}/v1/accounts:signInWithCustomToken", self.toolkit_base());
        log::debug!("auth emulator POST {url}");
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&SignInWithCustomTokenBody {
                token,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|err| network_error(format!("Request to {url} failed: {err}")))?;
        read_json(response).await
    }

    /// Removes every account of the project from the emulator.
    pub async fn clear_accounts(&self) -> AuthResult<()> {
        let url = format!(
            "{}/emulator/v1/projects/{}/accounts",
            self.host.base_url(),
            self.app.project_id()
        );
        let response = self
            .admin_request(Method::DELETE, &url)
            .send()
            .await
            .map_err(|err| network_error(format!("Request to {url} failed: {err}")))?;
        let _: Value = read_json(response).await?;
        Ok(())
    }
}

async fn read_json<R: DeserializeOwned>(response: Response) -> AuthResult<R> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|err| network_error(format!("Failed to read auth response: {err}")))?;

    if !status.is_success() {
        return Err(map_http_error(status.as_u16(), &text));
    }

    // Some emulator endpoints answer with an empty body.
    let text = if text.trim().is_empty() { "{}" } else { text.as_str() };
    serde_json::from_str(text)
        .map_err(|err| internal_error(format!("Failed to parse auth response: {err}")))
}
