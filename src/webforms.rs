//! Hosted Web Forms instance creation.
//!
//! The Web Forms product lives on its own host, derived from the configured
//! auth environment: a demo auth host (`account-d.`) routes to the demo
//! apps host, anything else to production. Creating an instance returns a
//! one-time instance token; the composed redirect URL carries it in the
//! fragment.
//!
//! Requires the `webforms_read`, `webforms_instance_read`, and
//! `webforms_instance_write` scopes on the JWT grant in addition to the
//! defaults.

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{Client, ClientError};
use crate::secret::Secret;
use crate::urlenc::encode_component;

/// Web Forms API base for the demo environment.
pub const DEMO_WEB_FORMS_BASE: &str = "https://apps-d.docusign.com/api/webforms/v1.1";

/// Web Forms API base for production.
pub const PROD_WEB_FORMS_BASE: &str = "https://apps.docusign.com/api/webforms/v1.1";

/// Pick the Web Forms base matching the auth environment.
pub(crate) fn web_forms_base_for_host(auth_host: &str) -> &'static str {
    if auth_host.contains("account-d.") {
        DEMO_WEB_FORMS_BASE
    } else {
        PROD_WEB_FORMS_BASE
    }
}

/// Options for creating a web-form instance. All fields are optional and
/// omitted from the request body when unset.
#[derive(Debug, Clone, Default)]
pub struct WebFormInstanceOptions {
    /// Routes the form session to a known client user.
    pub client_user_id: Option<String>,
    /// Redirect after form completion.
    pub return_url: Option<String>,
    /// Pre-filled form field values.
    pub form_values: Option<serde_json::Map<String, Value>>,
    /// Free-form tags attached to the instance.
    pub tags: Option<Vec<String>>,
    /// Instance-token lifetime offset, in seconds.
    pub expiration_offset: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateInstanceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    client_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    return_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    form_values: Option<serde_json::Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expiration_offset: Option<i64>,
}

impl From<WebFormInstanceOptions> for CreateInstanceRequest {
    fn from(opts: WebFormInstanceOptions) -> Self {
        Self {
            client_user_id: opts.client_user_id,
            return_url: opts.return_url,
            form_values: opts.form_values,
            tags: opts.tags,
            expiration_offset: opts.expiration_offset,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateInstanceResponse {
    id: String,
    form_url: String,
    instance_token: String,
    token_expiration_date_time: DateTime<Utc>,
}

/// A created web-form instance and its ready-to-open URL.
#[derive(Debug, Clone)]
pub struct WebFormInstance {
    /// `{formUrl}#instanceToken={token}` - open or redirect to this.
    pub url: String,
    pub instance_id: String,
    /// Absolute expiry of the one-time instance token.
    pub token_expires_at: DateTime<Utc>,
    pub form_url: String,
    /// The one-time instance token itself.
    pub instance_token: Secret,
}

impl Client {
    fn web_forms_base(&self) -> String {
        if let Some(base) = &self.web_forms_base {
            return base.clone();
        }
        let host = self.auth.auth_base_url().host_str().unwrap_or_default();
        web_forms_base_for_host(host).to_string()
    }

    /// Create a web-form instance and compose its hosted signing URL.
    pub async fn create_web_form_instance_url(
        &self,
        form_id: &str,
        options: WebFormInstanceOptions,
    ) -> Result<WebFormInstance, ClientError> {
        let account_id = self.account().await?.account_id.clone();
        let token = self.auth.get_access_token().await?;

        let path = format!(
            "/accounts/{account_id}/forms/{}/instances",
            encode_component(form_id)
        );
        let url = format!("{}{}", self.web_forms_base(), path);

        let response = self
            .http
            .post(&url)
            .bearer_auth(token.token.expose())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&CreateInstanceRequest::from(options))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(path = %path, status = status.as_u16(), "web-form instance creation failed");
            return Err(ClientError::Api {
                method: Method::POST,
                path,
                status: status.as_u16(),
                body,
            });
        }

        let body: CreateInstanceResponse = response.json().await?;
        let url = format!(
            "{}#instanceToken={}",
            body.form_url,
            encode_component(&body.instance_token)
        );
        tracing::info!(instance_id = %body.id, "created web-form instance");

        Ok(WebFormInstance {
            url,
            instance_id: body.id,
            token_expires_at: body.token_expiration_date_time,
            form_url: body.form_url,
            instance_token: Secret::new(body.instance_token),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_host_routes_to_demo_base() {
        assert_eq!(
            web_forms_base_for_host("account-d.docusign.com"),
            DEMO_WEB_FORMS_BASE
        );
        assert_eq!(
            web_forms_base_for_host("account-d.example.com"),
            DEMO_WEB_FORMS_BASE
        );
    }

    #[test]
    fn test_other_hosts_route_to_production() {
        assert_eq!(
            web_forms_base_for_host("account.docusign.com"),
            PROD_WEB_FORMS_BASE
        );
        assert_eq!(web_forms_base_for_host("example.com"), PROD_WEB_FORMS_BASE);
    }

    #[test]
    fn test_request_body_omits_unset_options() {
        let request = CreateInstanceRequest::from(WebFormInstanceOptions {
            client_user_id: Some("u1".into()),
            ..Default::default()
        });
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["clientUserId"], "u1");
        assert!(value.get("returnUrl").is_none());
        assert!(value.get("formValues").is_none());
        assert!(value.get("expirationOffset").is_none());
    }
}
