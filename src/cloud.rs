//! Account status over HTTP.
//!
//! The endpoint answers `GET` with a JSON body like `{"status": "available"}`.

#[cfg(feature = "app")]
use std::future::Future;

#[cfg(feature = "app")]
use crate::models::Settings;
use crate::sync::AccountStatus;
#[cfg(feature = "app")]
use crate::sync::AccountStatusProvider;

/// Parses an endpoint response body. Anything unreadable counts as undetermined.
pub fn parse_account_status(body: &str) -> AccountStatus {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(err) => {
            return AccountStatus::CouldNotDetermine {
                error: Some(format!("invalid account status json: {err}")),
            }
        }
    };
    match value["status"].as_str() {
        Some(status) => AccountStatus::from_wire(status),
        None => AccountStatus::CouldNotDetermine {
            error: Some("account status response has no status field".to_string()),
        },
    }
}

#[cfg(feature = "app")]
pub struct HttpAccountStatus {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

#[cfg(feature = "app")]
impl HttpAccountStatus {
    pub fn new(url: &str, api_key: &str) -> Result<Self, String> {
        let url = url.trim();
        if url.is_empty() {
            return Err("missing sync status url".to_string());
        }
        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| format!("failed to build http client: {err}"))?;
        Ok(Self {
            client,
            url: url.to_string(),
            api_key: api_key.trim().to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, String> {
        let url = settings.sync_status_url.as_deref().unwrap_or("");
        Self::new(url, &settings.sync_api_key)
    }

    async fn fetch(&self) -> Result<String, String> {
        let mut request = self.client.get(&self.url);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let resp = request
            .send()
            .await
            .map_err(|err| format!("account status request failed: {err}"))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|err| format!("failed to read account status response: {err}"))?;

        if !status.is_success() {
            return Err(format!("account status http {status}: {text}"));
        }
        Ok(text)
    }
}

#[cfg(feature = "app")]
impl AccountStatusProvider for HttpAccountStatus {
    fn account_status(&self) -> impl Future<Output = AccountStatus> + Send {
        async move {
            match self.fetch().await {
                Ok(body) => parse_account_status(&body),
                Err(error) => AccountStatus::CouldNotDetermine { error: Some(error) },
            }
        }
    }
}
