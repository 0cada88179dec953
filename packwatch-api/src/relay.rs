//! Pass-through relay to the device's own `/config` endpoint.
//!
//! The relay never interprets the configuration it carries; shape belongs
//! to the device firmware. Reachability failures surface as `502` at the
//! API boundary.

use std::time::Duration;

use serde_json::Value;

pub struct DeviceRelay {
    client: reqwest::Client,
    url: String,
}

impl DeviceRelay {
    /// `url` is the device's full config endpoint, e.g.
    /// `http://192.168.100.65:80/config`.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Mirrors the device's current configuration.
    pub async fn fetch_config(&self) -> Result<Value, reqwest::Error> {
        self.client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }

    /// Forwards operator-submitted configuration and returns the device's
    /// acknowledgment (JSON if it is, plain text wrapped otherwise).
    pub async fn push_config(&self, config: &Value) -> Result<Value, reqwest::Error> {
        let response = self
            .client
            .post(&self.url)
            .json(config)
            .send()
            .await?
            .error_for_status()?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}
