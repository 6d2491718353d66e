//! HTTP transport backed by `reqwest`.

use crate::error::WebhookError;
use crate::render::PreparedRequest;
use crate::worker::Transport;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How the receiver's certificate is checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum TlsMode {
    /// System roots.
    Verify,
    /// Only certificates chaining to this CA bundle.
    CaFile(String),
    /// Anything goes.
    Insecure,
}

impl TlsMode {
    /// A CA bundle takes precedence over `ssl_verification`.
    fn for_request(request: &PreparedRequest) -> Self {
        match (&request.ca_file_path, request.verify_ssl) {
            (Some(path), _) => Self::CaFile(path.clone()),
            (None, true) => Self::Verify,
            (None, false) => Self::Insecure,
        }
    }
}

/// Sends webhook requests over HTTP(S).
///
/// One client is kept per TLS mode, so connections are pooled across
/// deliveries to webhooks with the same certificate settings.
pub struct HttpTransport {
    timeout: Duration,
    clients: Mutex<HashMap<TlsMode, reqwest::Client>>,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            clients: Mutex::new(HashMap::new()),
        }
    }

    fn client_for(&self, mode: TlsMode) -> Result<reqwest::Client, WebhookError> {
        let mut clients = self
            .clients
            .lock()
            .map_err(|_| WebhookError::Delivery("HTTP client cache poisoned".to_string()))?;
        if let Some(client) = clients.get(&mode) {
            return Ok(client.clone());
        }

        let mut builder = reqwest::Client::builder().timeout(self.timeout);
        match &mode {
            TlsMode::Verify => {}
            TlsMode::CaFile(path) => {
                let pem = std::fs::read(path).map_err(|e| {
                    WebhookError::Delivery(format!("cannot read CA file {path}: {e}"))
                })?;
                let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                    WebhookError::Delivery(format!("invalid CA file {path}: {e}"))
                })?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::Insecure => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }
        let client = builder
            .build()
            .map_err(|e| WebhookError::Delivery(format!("cannot build HTTP client: {e}")))?;

        clients.insert(mode, client.clone());
        Ok(client)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &PreparedRequest) -> Result<u16, WebhookError> {
        let client = self.client_for(TlsMode::for_request(request))?;
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|_| WebhookError::InvalidMethod(request.method.clone()))?;

        let mut builder = client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .body(request.body.clone())
            .send()
            .await
            .map_err(|e| WebhookError::Delivery(e.to_string()))?;
        Ok(response.status().as_u16())
    }
}
