use crate::model::punch::{RawPunchEvent, parse_punch};
use crate::store::{PunchStore, StoreResult};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct IngestOutcome {
    /// Records in the batch as delivered
    pub received: usize,
    /// Records without a usable `user_id`/`time`
    pub rejected: usize,
    /// Records newly persisted
    pub inserted: usize,
}

/// Turns raw terminal punch payloads into stored [`RawPunchEvent`]s.
pub struct LogIngestor {
    store: Arc<dyn PunchStore>,
}

impl LogIngestor {
    pub fn new(store: Arc<dyn PunchStore>) -> Self {
        Self { store }
    }

    /// Persists one batch as a unit. Returns only after the store confirmed the write.
    pub async fn ingest(&self, device_id: &str, payloads: &[Value]) -> StoreResult<IngestOutcome> {
        let received_at = Utc::now();
        let mut seen = HashSet::with_capacity(payloads.len());
        let mut events = Vec::with_capacity(payloads.len());
        let mut rejected = 0usize;

        for payload in payloads {
            let Some((device_user_id, timestamp)) = parse_punch(payload) else {
                warn!(device_id, payload = %payload, "Dropping punch without user_id/time");
                rejected += 1;
                continue;
            };

            let event = RawPunchEvent {
                id: uuid::Uuid::new_v4().to_string(),
                device_id: device_id.to_string(),
                device_user_id,
                timestamp,
                received_at,
                source_payload: payload.clone(),
            };
            // duplicates inside one delivery
            if seen.insert(event.key()) {
                events.push(event);
            }
        }

        let inserted = if events.is_empty() {
            0
        } else {
            self.store.append(events).await?
        };

        let outcome = IngestOutcome {
            received: payloads.len(),
            rejected,
            inserted,
        };
        if inserted > 0 {
            info!(device_id, received = outcome.received, inserted, rejected, "Ingested punch batch");
        } else {
            debug!(device_id, received = outcome.received, rejected, "Punch batch held nothing new");
        }
        Ok(outcome)
    }
}
