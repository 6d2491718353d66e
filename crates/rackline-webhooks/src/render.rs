//! Webhook request rendering and signing.

use crate::error::WebhookError;
use crate::task::{Snapshots, WebhookTask};
use hmac::{Hmac, Mac};
use rackline_core::{ChoiceSet, WebhookDefinition, WebhookHttpMethodChoices};
use regex::Regex;
use serde::Serialize;
use sha2::Sha512;
use std::sync::LazyLock;

/// Header carrying the hex HMAC-SHA512 of the request body.
pub const SIGNATURE_HEADER: &str = "X-Hook-Signature";

static TEMPLATE_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid pattern"));

/// Variables available to header and body templates. Serialized as the
/// default request body.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookContext {
    pub event: String,
    pub timestamp: String,
    pub model: String,
    pub username: String,
    pub request_id: String,
    pub data: serde_json::Value,
    pub snapshots: Snapshots,
}

impl WebhookContext {
    pub fn from_task(task: &WebhookTask) -> Self {
        Self {
            event: task.action.event_name(),
            timestamp: task.triggered_at.to_rfc3339(),
            model: task.entity_type.model.clone(),
            username: task.actor.username.clone(),
            request_id: task.request_id.to_string(),
            data: task.data.clone(),
            snapshots: task.snapshots.clone(),
        }
    }
}

/// A fully rendered HTTP request, ready for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub webhook: String,
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub verify_ssl: bool,
    pub ca_file_path: Option<String>,
}

impl PreparedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Hex HMAC-SHA512 of `body` keyed with `secret`.
pub fn generate_signature(body: &[u8], secret: &str) -> String {
    let mut mac = Hmac::<Sha512>::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Substitute `{{ var }}` placeholders with top-level context fields.
/// Strings are inserted raw; other values as JSON.
fn render_template(
    webhook: &str,
    template: &str,
    context: &serde_json::Value,
) -> Result<String, WebhookError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in TEMPLATE_VAR.captures_iter(template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = context
            .get(name.as_str())
            .ok_or_else(|| WebhookError::Template {
                webhook: webhook.to_string(),
                variable: name.as_str().to_string(),
            })?;
        out.push_str(&template[last..whole.start()]);
        match value {
            serde_json::Value::String(s) => out.push_str(s),
            other => out.push_str(&other.to_string()),
        }
        last = whole.end();
    }
    out.push_str(&template[last..]);
    Ok(out)
}

/// Parse `additional_headers`: one `Name: value` per non-blank line.
pub fn render_headers(
    webhook: &WebhookDefinition,
    context: &serde_json::Value,
) -> Result<Vec<(String, String)>, WebhookError> {
    let rendered = render_template(&webhook.name, &webhook.additional_headers, context)?;
    let mut headers = Vec::new();
    for line in rendered.lines().filter(|l| !l.trim().is_empty()) {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| WebhookError::InvalidHeader {
                webhook: webhook.name.clone(),
                line: line.to_string(),
            })?;
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }
    Ok(headers)
}

/// Render the request body: the body template if set, else the JSON context.
pub fn render_body(
    webhook: &WebhookDefinition,
    context: &serde_json::Value,
) -> Result<String, WebhookError> {
    match &webhook.body_template {
        Some(template) => render_template(&webhook.name, template, context),
        None => Ok(serde_json::to_string(context)?),
    }
}

/// Build the HTTP request a webhook sends for a task.
pub fn render_request(
    webhook: &WebhookDefinition,
    task: &WebhookTask,
) -> Result<PreparedRequest, WebhookError> {
    let method = webhook.http_method.to_uppercase();
    if !WebhookHttpMethodChoices.contains(&method) {
        return Err(WebhookError::InvalidMethod(webhook.http_method.clone()));
    }

    let context = serde_json::to_value(WebhookContext::from_task(task))?;

    let mut headers = vec![("Content-Type".to_string(), webhook.http_content_type.clone())];
    headers.extend(render_headers(webhook, &context)?);

    let body = render_body(webhook, &context)?;

    if !webhook.secret.is_empty() {
        headers.push((
            SIGNATURE_HEADER.to_string(),
            generate_signature(body.as_bytes(), &webhook.secret),
        ));
    }

    Ok(PreparedRequest {
        webhook: webhook.name.clone(),
        method,
        url: webhook.payload_url.clone(),
        headers,
        body,
        verify_ssl: webhook.ssl_verification,
        ca_file_path: webhook.ca_file_path.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rackline_core::{Actor, EntityType, ObjectChangeAction, RequestId};
    use serde_json::json;

    fn webhook() -> WebhookDefinition {
        serde_json::from_value(json!({
            "name": "sites",
            "entity_types": ["dcim.site"],
            "type_create": true,
            "payload_url": "https://hooks.example.com/sites",
        }))
        .unwrap()
    }

    fn task() -> WebhookTask {
        WebhookTask {
            entity_type: EntityType::new("dcim", "site"),
            entity_id: 1,
            actor: Actor::new(1, "admin"),
            request_id: RequestId::new(),
            action: ObjectChangeAction::Create,
            data: json!({ "id": 1, "name": "DC1" }),
            snapshots: Snapshots {
                prechange: None,
                postchange: Some(json!({ "name": "DC1" })),
            },
            triggered_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        }
    }

    #[test]
    fn test_signature_vector() {
        assert_eq!(
            generate_signature(b"The quick brown fox jumps over the lazy dog", "key"),
            "b42af09057bac1e2d41708e48a902e09b5ff7f12ab428a4fe86653c73dd248fb\
             82f948a549f7b791a5b41915ee4d1ec3935357e4e2317250d0372afa2ebeeb3a"
        );
    }

    #[test]
    fn test_default_body_is_context() {
        let request = render_request(&webhook(), &task()).unwrap();
        assert_eq!(request.method, "POST");
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert!(request.header(SIGNATURE_HEADER).is_none());

        let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(body["event"], "created");
        assert_eq!(body["model"], "site");
        assert_eq!(body["username"], "admin");
        assert_eq!(body["data"]["name"], "DC1");
        assert_eq!(body["snapshots"]["prechange"], serde_json::Value::Null);
    }

    #[test]
    fn test_signed_request() {
        let mut hook = webhook();
        hook.secret = "secret".to_string();
        let request = render_request(&hook, &task()).unwrap();
        assert_eq!(
            request.header(SIGNATURE_HEADER),
            Some(generate_signature(request.body.as_bytes(), "secret").as_str())
        );
    }

    #[test]
    fn test_templates() {
        let mut hook = webhook();
        hook.additional_headers = "X-Event: {{ event }}\n\nX-Model:{{model}}".to_string();
        hook.body_template = Some("{\"text\": \"{{ username }} {{ event }} {{ model }} {{ data }}\"}".to_string());

        let request = render_request(&hook, &task()).unwrap();
        assert_eq!(request.header("X-Event"), Some("created"));
        assert_eq!(request.header("X-Model"), Some("site"));
        assert!(request.body.starts_with("{\"text\": \"admin created site {"));
    }

    #[test]
    fn test_template_errors() {
        let mut hook = webhook();
        hook.body_template = Some("{{ nope }}".to_string());
        assert!(matches!(
            render_request(&hook, &task()),
            Err(WebhookError::Template { ref variable, .. }) if variable == "nope"
        ));

        let mut hook = webhook();
        hook.additional_headers = "not a header".to_string();
        assert!(matches!(
            render_request(&hook, &task()),
            Err(WebhookError::InvalidHeader { .. })
        ));

        let mut hook = webhook();
        hook.http_method = "TRACE".to_string();
        assert!(matches!(
            render_request(&hook, &task()),
            Err(WebhookError::InvalidMethod(_))
        ));
    }
}
