//! `rackline webhooks` commands.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rackline_core::{Actor, ObjectChangeAction, RacklineConfig, RequestId, WebhookDefinition};
use rackline_webhooks::{HttpTransport, Snapshots, Transport, WebhookTask, WebhookWorker};
use serde_json::json;
use tracing::info;

/// A sample task that the named webhook fires for.
fn sample_task(webhook: &WebhookDefinition) -> Result<WebhookTask> {
    let entity_type = webhook
        .entity_types
        .first()
        .cloned()
        .with_context(|| format!("Webhook {} has no entity types", webhook.name))?;
    let action = [
        (webhook.type_create, ObjectChangeAction::Create),
        (webhook.type_update, ObjectChangeAction::Update),
        (webhook.type_delete, ObjectChangeAction::Delete),
    ]
    .into_iter()
    .find_map(|(enabled, action)| enabled.then_some(action))
    .with_context(|| format!("Webhook {} has no event types", webhook.name))?;

    let data = json!({ "id": 0, "display": format!("{entity_type} test object") });
    let postchange = (action != ObjectChangeAction::Delete).then(|| data.clone());
    Ok(WebhookTask {
        entity_type,
        entity_id: 0,
        actor: Actor::new(0, "rackline"),
        request_id: RequestId::new(),
        action,
        data: data.clone(),
        snapshots: Snapshots {
            prechange: (action != ObjectChangeAction::Create).then_some(data),
            postchange,
        },
        triggered_at: Utc::now(),
    })
}

/// Send a sample notification to one configured webhook.
pub async fn send_test<T: Transport>(
    config: &RacklineConfig,
    name: &str,
    transport: T,
) -> Result<()> {
    let Some(webhook) = config.webhooks.definitions.iter().find(|w| w.name == name) else {
        bail!("No webhook named {name:?} in the configuration");
    };
    if !webhook.enabled {
        bail!("Webhook {name} is disabled");
    }

    let task = sample_task(webhook)?;
    info!(
        webhook = %webhook.name,
        model = %task.entity_type,
        event = %task.action.event_name(),
        "Sending test notification"
    );
    let worker = WebhookWorker::new(vec![webhook.clone()], transport);
    if worker.deliver(&task).await == 0 {
        bail!("Webhook {name} did not accept the test notification; see the log for details");
    }
    Ok(())
}

pub async fn run_test(config: &RacklineConfig, name: &str) -> Result<()> {
    send_test(config, name, HttpTransport::default()).await?;
    println!("Webhook {name} accepted the test notification");
    Ok(())
}
