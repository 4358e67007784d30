//! HTTP client for the modem's management API.
//!
//! Every endpoint speaks XML-tagged plain text over HTTP. Fetches return
//! the raw body; callers pull individual fields out with
//! [`crate::xml::extract_tag`] so one malformed field never poisons the
//! rest of a poll cycle. The one write operation — the band-lock POST —
//! must carry a fresh anti-forgery token scraped from the management page.

use std::time::Duration;

use reqwest::{Client, StatusCode};

/// Device endpoints, relative to the management base URL.
const ANTENNA_PATH: &str = "/api/device/antenna_type";
const NET_MODE_PATH: &str = "/api/net/net-mode";
const STATUS_PATH: &str = "/api/monitoring/status";
const SIGNAL_PATH: &str = "/api/device/signal";
const HOME_PATH: &str = "/html/home.html";

/// Marker preceding the session token in the management page.
const TOKEN_MARKER: &str = "name=\"csrf_token\" content=\"";

/// Header carrying the session token on configuration submissions.
const TOKEN_HEADER: &str = "__RequestVerificationToken";

/// Errors from device requests.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The device answered with a non-success status.
    #[error("request failed with status {0}")]
    RequestFailed(StatusCode),
    /// The bounded request timeout elapsed.
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// The management page carried no session token marker.
    #[error("session token not found in management page")]
    TokenNotFound,
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Transport(err)
        }
    }
}

/// Client for one modem. Cheap to clone; the underlying pool is shared.
#[derive(Debug, Clone)]
pub struct ModemClient {
    http: Client,
    base_url: String,
}

impl ModemClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        ModemClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Live signal readings (`rsrp`, `rsrq`, `sinr`, NR variants, `band`,
    /// `cell_id`, `plmn`, ...).
    pub async fn fetch_signal(&self) -> Result<String, ClientError> {
        self.get_text(SIGNAL_PATH).await
    }

    /// Allowed network mode and band mask (`LTEBand`).
    pub async fn fetch_net_mode(&self) -> Result<String, ClientError> {
        self.get_text(NET_MODE_PATH).await
    }

    /// Monitoring status (`CurrentNetworkTypeEx`).
    pub async fn fetch_status(&self) -> Result<String, ClientError> {
        self.get_text(STATUS_PATH).await
    }

    /// Antenna configuration (`antenna1type`, `antenna2type`).
    pub async fn fetch_antenna(&self) -> Result<String, ClientError> {
        self.get_text(ANTENNA_PATH).await
    }

    /// Fetch a fresh anti-forgery token from the management page.
    ///
    /// The token is valid for exactly one submission and is never cached
    /// across orchestration runs.
    pub async fn fetch_session_token(&self) -> Result<String, ClientError> {
        let page = self.get_text(HOME_PATH).await?;
        extract_csrf_token(&page)
            .map(str::to_string)
            .ok_or(ClientError::TokenNotFound)
    }

    /// Submit a band-lock configuration change.
    ///
    /// `network_mode` is `"00"` (auto) or `"03"` (LTE only); `lte_band_hex`
    /// is the lowercase hex band mask. The `NetworkBand` selector is the
    /// fixed full-band placeholder the device expects.
    pub async fn submit_band_lock(
        &self,
        network_mode: &str,
        lte_band_hex: &str,
        token: &str,
    ) -> Result<(), ClientError> {
        let body = format!(
            "<request><NetworkMode>{network_mode}</NetworkMode>\
             <NetworkBand>3FFFFFFF</NetworkBand>\
             <LTEBand>{lte_band_hex}</LTEBand></request>"
        );
        let response = self
            .http
            .post(format!("{}{NET_MODE_PATH}", self.base_url))
            .header("Content-Type", "application/json; charset=UTF-8")
            .header(TOKEN_HEADER, token)
            .body(body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::RequestFailed(response.status()));
        }
        Ok(())
    }

    async fn get_text(&self, path: &str) -> Result<String, ClientError> {
        let response = self
            .http
            .get(format!("{}{path}", self.base_url))
            .header("Content-Type", "application/json; charset=UTF-8")
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::RequestFailed(response.status()));
        }
        Ok(response.text().await?)
    }
}

/// Pull the anti-forgery token out of the management page.
///
/// The page may embed the marker more than once; the device's own UI reads
/// the last occurrence, so we do too.
fn extract_csrf_token(page: &str) -> Option<&str> {
    let start = page.rfind(TOKEN_MARKER)? + TOKEN_MARKER.len();
    let rest = &page[start..];
    rest.find('"').map(|end| &rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_extracted_from_marker() {
        let page = r#"<meta name="csrf_token" content="abc123">"#;
        assert_eq!(extract_csrf_token(page), Some("abc123"));
    }

    #[test]
    fn last_marker_occurrence_wins() {
        let page = r#"
            <meta name="csrf_token" content="stale">
            <meta name="csrf_token" content="fresh">
        "#;
        assert_eq!(extract_csrf_token(page), Some("fresh"));
    }

    #[test]
    fn missing_marker_is_none() {
        assert_eq!(extract_csrf_token("<html></html>"), None);
    }

    #[test]
    fn unterminated_token_is_none() {
        assert_eq!(extract_csrf_token(r#"name="csrf_token" content="abc"#), None);
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let client = ModemClient::new("http://192.168.8.1/", Duration::from_secs(1));
        assert_eq!(client.base_url, "http://192.168.8.1");
    }
}
