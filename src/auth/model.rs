use serde::{Deserialize, Serialize};

/// Properties of an account to create. Unset fields are left to the emulator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreateUserRequest {
    pub uid: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub display_name: Option<String>,
    pub email_verified: Option<bool>,
    pub disabled: Option<bool>,
}

impl CreateUserRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_email_password(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            password: Some(password.into()),
            ..Self::default()
        }
    }

    pub fn uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn email_verified(mut self, verified: bool) -> Self {
        self.email_verified = Some(verified);
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(disabled);
        self
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateAccountBody<'a> {
    #[serde(rename = "localId", skip_serializing_if = "Option::is_none")]
    pub local_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<&'a str>,
    #[serde(rename = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<&'a str>,
    #[serde(rename = "emailVerified", skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    #[serde(rename = "disabled", skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

impl<'a> From<&'a CreateUserRequest> for CreateAccountBody<'a> {
    fn from(request: &'a CreateUserRequest) -> Self {
        Self {
            local_id: request.uid.as_deref(),
            email: request.email.as_deref(),
            password: request.password.as_deref(),
            display_name: request.display_name.as_deref(),
            email_verified: request.email_verified,
            disabled: request.disabled,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateAccountResponse {
    #[serde(rename = "localId")]
    pub local_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct LookupBody<'a> {
    #[serde(rename = "localId", skip_serializing_if = "Option::is_none")]
    pub local_id: Option<[&'a str; 1]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<[&'a str; 1]>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LookupResponse {
    #[serde(default)]
    pub users: Option<Vec<UserRecord>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeleteAccountBody<'a> {
    #[serde(rename = "localId")]
    pub local_id: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct SignInWithCustomTokenBody<'a> {
    pub token: &'a str,
    #[serde(rename = "returnSecureToken")]
    pub return_secure_token: bool,
}

/// Account as reported by `accounts:lookup`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    #[serde(rename = "localId")]
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "emailVerified", default)]
    pub email_verified: bool,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    /// Milliseconds since the epoch, as a decimal string.
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
    #[serde(rename = "lastLoginAt", default)]
    pub last_login_at: Option<String>,
    /// JSON-encoded custom claims.
    #[serde(rename = "customAttributes", default)]
    pub custom_attributes: Option<String>,
    #[serde(rename = "providerUserInfo", default)]
    pub provider_user_info: Vec<ProviderUserInfo>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct ProviderUserInfo {
    #[serde(rename = "providerId")]
    pub provider_id: String,
    #[serde(rename = "rawId", default)]
    pub raw_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Tokens returned by `accounts:signInWithCustomToken`.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct IdTokenResponse {
    #[serde(rename = "idToken")]
    pub id_token: String,
    #[serde(rename = "refreshToken", default)]
    pub refresh_token: Option<String>,
    #[serde(rename = "expiresIn", default)]
    pub expires_in: Option<String>,
    #[serde(rename = "isNewUser", default)]
    pub is_new_user: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_body_skips_unset_fields() {
        let request = CreateUserRequest::with_email_password("test@example.com", "testpass123");
        let body = serde_json::to_value(CreateAccountBody::from(&request)).unwrap();
        assert_eq!(
            body,
            json!({ "email": "test@example.com", "password": "testpass123" })
        );
    }

    #[test]
    fn create_body_carries_optional_fields() {
        let request = CreateUserRequest::new()
            .uid("user-1")
            .display_name("Test User")
            .email_verified(true)
            .disabled(false);
        let body = serde_json::to_value(CreateAccountBody::from(&request)).unwrap();
        assert_eq!(body["localId"], json!("user-1"));
        assert_eq!(body["displayName"], json!("Test User"));
        assert_eq!(body["emailVerified"], json!(true));
        assert_eq!(body["disabled"], json!(false));
    }

    #[test]
    fn user_record_reads_lookup_entry() {
        let user: UserRecord = serde_json::from_value(json!({
            "localId": "abc",
            "email": "test@example.com",
            "emailVerified": false,
            "createdAt": "1700000000000",
            "providerUserInfo": [{ "providerId": "password", "rawId": "test@example.com" }]
        }))
        .unwrap();
        assert_eq!(user.uid, "abc");
        assert_eq!(user.email.as_deref(), Some("test@example.com"));
        assert!(!user.disabled);
        assert_eq!(user.provider_user_info[0].provider_id, "password");
    }
}
