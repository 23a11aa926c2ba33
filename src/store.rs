//! The selector data store.
//!
//! Holds the service and instance option lists behind the selector widgets
//! and refreshes them from the query backend. The currently selected service
//! and the current time range are borrowed from injected holders at call
//! time, never cached here.

use std::sync::{Arc, PoisonError, RwLock};

use color_eyre::Result;
use serde_json::json;
use tracing::debug;

use crate::model::SelectorOption;
use crate::query::Operation;
use crate::scope::{DurationHolder, ScopeHolder};
use crate::transport::{Envelope, QueryTransport};

/// Session-scoped store for the two selector lists.
///
/// Both lists start out as the one-element "All" sentinel and are replaced
/// wholesale on each successful refresh. Overlapping refreshes race and the
/// last response to resolve wins; callers wanting ordering must sequence
/// their calls.
pub struct SelectorStore {
    transport: Arc<dyn QueryTransport>,
    scope: Arc<dyn ScopeHolder>,
    duration: Arc<dyn DurationHolder>,
    services: RwLock<Vec<SelectorOption>>,
    instances: RwLock<Vec<SelectorOption>>,
}

impl SelectorStore {
    pub fn new(
        transport: Arc<dyn QueryTransport>,
        scope: Arc<dyn ScopeHolder>,
        duration: Arc<dyn DurationHolder>,
    ) -> Self {
        Self {
            transport,
            scope,
            duration,
            services: RwLock::new(vec![SelectorOption::all()]),
            instances: RwLock::new(vec![SelectorOption::all()]),
        }
    }

    /// Snapshot of the current service options.
    #[must_use]
    pub fn services(&self) -> Vec<SelectorOption> {
        self.services
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of the current instance options.
    #[must_use]
    pub fn instances(&self) -> Vec<SelectorOption> {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Refresh the service list for a layer.
    ///
    /// On an error envelope the list is left untouched; the envelope is
    /// returned either way so the caller can branch on it.
    ///
    /// # Errors
    /// Returns an error on transport failure or an undecodable payload.
    pub async fn refresh_services(&self, layer: &str) -> Result<Envelope> {
        let envelope = self
            .transport
            .query(Operation::Services, json!({ "layer": layer }))
            .await?;

        if envelope.is_error() {
            debug!(layer, "service refresh returned an error envelope");
            return Ok(envelope);
        }

        let services = envelope.field(Operation::Services.payload_key())?;
        *self
            .services
            .write()
            .unwrap_or_else(PoisonError::into_inner) = services;
        Ok(envelope)
    }

    /// Refresh the instance list for the effective service.
    ///
    /// The ambient selection wins over `fallback_id`: when the scope holder
    /// reports a current service, its id is used regardless of the argument.
    /// The current time range is read fresh on every call.
    ///
    /// # Errors
    /// Returns an error on transport failure or an undecodable payload.
    pub async fn refresh_instances(&self, fallback_id: &str) -> Result<Envelope> {
        let service_id = self
            .scope
            .current_service()
            .map_or_else(|| fallback_id.to_string(), |service| service.id);
        let duration = self.duration.duration_time();

        let envelope = self
            .transport
            .query(
                Operation::Instances,
                json!({ "serviceId": service_id, "duration": duration }),
            )
            .await?;

        if envelope.is_error() {
            debug!(service_id, "instance refresh returned an error envelope");
            return Ok(envelope);
        }

        let instances = envelope.field(Operation::Instances.payload_key())?;
        *self
            .instances
            .write()
            .unwrap_or_else(PoisonError::into_inner) = instances;
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{Value, json};
    use tokio::sync::oneshot;

    use super::*;
    use crate::duration::Duration;
    use crate::model::SelectedService;
    use crate::scope::{SharedDuration, SharedScope};
    use crate::transport::ErrorDetail;

    /// Transport that replays queued envelopes and records every request.
    struct MockTransport {
        responses: Mutex<VecDeque<Envelope>>,
        requests: Mutex<Vec<(Operation, Value)>>,
    }

    impl MockTransport {
        fn with_responses(responses: impl IntoIterator<Item = Envelope>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<(Operation, Value)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl QueryTransport for MockTransport {
        async fn query(&self, operation: Operation, variables: Value) -> Result<Envelope> {
            self.requests.lock().unwrap().push((operation, variables));
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("no queued response"))
        }
    }

    /// Transport whose responses are released by the test, one channel per
    /// call in issue order.
    struct GatedTransport {
        gates: Mutex<VecDeque<oneshot::Receiver<Envelope>>>,
    }

    impl GatedTransport {
        fn with_gates(gates: impl IntoIterator<Item = oneshot::Receiver<Envelope>>) -> Self {
            Self {
                gates: Mutex::new(gates.into_iter().collect()),
            }
        }
    }

    #[async_trait]
    impl QueryTransport for GatedTransport {
        async fn query(&self, _operation: Operation, _variables: Value) -> Result<Envelope> {
            let gate = self.gates.lock().unwrap().pop_front().expect("no gate left");
            Ok(gate.await.expect("gate dropped"))
        }
    }

    fn services_envelope(options: &[(&str, &str)]) -> Envelope {
        let entries: Vec<Value> = options
            .iter()
            .map(|(value, label)| json!({"value": value, "label": label}))
            .collect();
        serde_json::from_value(json!({"data": {"services": entries}})).unwrap()
    }

    fn store_with(transport: Arc<dyn QueryTransport>) -> SelectorStore {
        SelectorStore::new(
            transport,
            Arc::new(SharedScope::new()),
            Arc::new(SharedDuration::default()),
        )
    }

    #[test]
    fn test_initial_state_is_all_sentinel() {
        let transport = Arc::new(MockTransport::with_responses([]));
        let store = store_with(transport);

        assert_eq!(store.services(), [SelectorOption::all()]);
        assert_eq!(store.instances(), [SelectorOption::all()]);
    }

    #[tokio::test]
    async fn test_refresh_services_replaces_list() {
        let envelope = services_envelope(&[("1", "svcA")]);
        let transport = Arc::new(MockTransport::with_responses([envelope.clone()]));
        let store = store_with(transport.clone());

        let returned = store.refresh_services("infra").await.unwrap();

        assert_eq!(returned, envelope);
        assert_eq!(store.services(), [SelectorOption::new("1", "svcA")]);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, Operation::Services);
        assert_eq!(requests[0].1, json!({"layer": "infra"}));
    }

    #[tokio::test]
    async fn test_refresh_services_error_envelope_keeps_list() {
        let error: Envelope =
            serde_json::from_value(json!({"errors": [{"message": "boom"}]})).unwrap();
        let transport = Arc::new(MockTransport::with_responses([error]));
        let store = store_with(transport);

        let returned = store.refresh_services("infra").await.unwrap();

        assert_eq!(returned.errors(), Some(&[ErrorDetail::new("boom")][..]));
        assert_eq!(store.services(), [SelectorOption::all()]);
    }

    #[tokio::test]
    async fn test_refresh_instances_uses_fallback_without_selection() {
        let envelope: Envelope =
            serde_json::from_value(json!({"data": {"pods": []}})).unwrap();
        let transport = Arc::new(MockTransport::with_responses([envelope]));
        let store = store_with(transport.clone());

        store.refresh_instances("42").await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].0, Operation::Instances);
        assert_eq!(requests[0].1["serviceId"], "42");
    }

    #[tokio::test]
    async fn test_refresh_instances_prefers_ambient_selection() {
        let envelope: Envelope = serde_json::from_value(
            json!({"data": {"pods": [{"value": "p1", "label": "pod-1"}]}}),
        )
        .unwrap();
        let transport = Arc::new(MockTransport::with_responses([envelope]));
        let scope = Arc::new(SharedScope::new());
        scope.select(SelectedService::new("99", "cart"));
        let store = SelectorStore::new(
            transport.clone(),
            scope,
            Arc::new(SharedDuration::default()),
        );

        store.refresh_instances("42").await.unwrap();

        assert_eq!(transport.requests()[0].1["serviceId"], "99");
        assert_eq!(store.instances(), [SelectorOption::new("p1", "pod-1")]);
    }

    #[tokio::test]
    async fn test_refresh_instances_error_envelope_keeps_list() {
        let error: Envelope =
            serde_json::from_value(json!({"errors": [{"message": "down"}]})).unwrap();
        let transport = Arc::new(MockTransport::with_responses([error]));
        let store = store_with(transport);

        let returned = store.refresh_instances("42").await.unwrap();

        assert!(returned.is_error());
        assert_eq!(store.instances(), [SelectorOption::all()]);
    }

    #[tokio::test]
    async fn test_duration_is_read_at_call_time() {
        let envelope: Envelope =
            serde_json::from_value(json!({"data": {"pods": []}})).unwrap();
        let transport = Arc::new(MockTransport::with_responses([
            envelope.clone(),
            envelope,
        ]));
        let duration = Arc::new(SharedDuration::new(Duration {
            start: "2024-03-09 1400".into(),
            end: "2024-03-09 1415".into(),
            step: crate::duration::Step::Minute,
        }));
        let store = SelectorStore::new(
            transport.clone(),
            Arc::new(SharedScope::new()),
            duration.clone(),
        );

        store.refresh_instances("42").await.unwrap();
        duration.set(Duration {
            start: "2024-03-09 1500".into(),
            end: "2024-03-09 1515".into(),
            step: crate::duration::Step::Minute,
        });
        store.refresh_instances("42").await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].1["duration"]["start"], "2024-03-09 1400");
        assert_eq!(requests[1].1["duration"]["start"], "2024-03-09 1500");
    }

    #[tokio::test]
    async fn test_overlapping_refreshes_last_resolved_wins() {
        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();
        let transport = Arc::new(GatedTransport::with_gates([first_rx, second_rx]));
        let store = Arc::new(store_with(transport));

        let first = tokio::spawn({
            let store = store.clone();
            async move { store.refresh_services("infra").await }
        });
        tokio::task::yield_now().await;
        let second = tokio::spawn({
            let store = store.clone();
            async move { store.refresh_services("infra").await }
        });
        tokio::task::yield_now().await;

        // The second-issued call resolves first; the first call's response
        // lands last and must win.
        second_tx
            .send(services_envelope(&[("2", "svcB")]))
            .unwrap();
        second.await.unwrap().unwrap();
        assert_eq!(store.services(), [SelectorOption::new("2", "svcB")]);

        first_tx.send(services_envelope(&[("1", "svcA")])).unwrap();
        first.await.unwrap().unwrap();
        assert_eq!(store.services(), [SelectorOption::new("1", "svcA")]);
    }
}
