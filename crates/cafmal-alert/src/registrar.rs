use cafmal_common::types::{Alerter, AlerterUpsert};
use cafmal_store::error::Result;
use cafmal_store::AlertStore;
use chrono::{DateTime, Utc};

/// Upserts the heartbeat record for the alerter identified by `uuid`.
///
/// An existing record with the same uuid is refreshed in place; otherwise
/// a new one is created.
pub async fn register_alerter(
    store: &dyn AlertStore,
    uuid: &str,
    team_id: i64,
    now: DateTime<Utc>,
) -> Result<Alerter> {
    let existing_id = store
        .list_alerters()
        .await?
        .into_iter()
        .find(|a| a.uuid == uuid)
        .map(|a| a.id);

    let upsert = AlerterUpsert {
        id: existing_id,
        uuid: uuid.to_string(),
        team_id,
        heartbeat_received_at: now,
    };

    let alerter = match existing_id {
        Some(_) => store.update_alerter(&upsert).await?,
        None => store.create_alerter(&upsert).await?,
    };

    tracing::info!(
        uuid,
        team_id,
        alerter_id = alerter.id,
        created = existing_id.is_none(),
        "Registered alerter"
    );
    Ok(alerter)
}
