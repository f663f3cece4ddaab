//! Fixed-interval refresh of session status and pairing QR codes
//!
//! Every fetch takes a sequence number when it is issued. A result is only
//! displayed if no newer fetch has already landed, so a slow poll can never
//! overwrite a fresher manual refresh. Cancelling a poller stops new fetches;
//! fetches already in flight complete and their results are dropped.

use crate::api::{self, GatewayClient, QrCode, SessionStatus};
use crate::auth::HydrationSync;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Default interval for both the status poll and the QR refresh.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub seq: u64,
    pub value: T,
    pub received_at: DateTime<Utc>,
}

/// Latest accepted result plus the sequence counter shared by every fetch
/// that feeds it.
#[derive(Debug)]
pub struct SnapshotSlot<T> {
    next_seq: AtomicU64,
    tx: watch::Sender<Option<Snapshot<T>>>,
}

impl<T> Default for SnapshotSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SnapshotSlot<T> {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            next_seq: AtomicU64::new(0),
            tx,
        }
    }

    /// Take the sequence number for a fetch about to be issued.
    pub fn begin(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Offer a result. Returns false (and drops it) when a result from a
    /// later fetch is already displayed.
    pub fn offer(&self, seq: u64, value: T) -> bool {
        self.tx.send_if_modified(|current| {
            let newer = current.as_ref().is_none_or(|shown| seq > shown.seq);
            if newer {
                *current = Some(Snapshot {
                    seq,
                    value,
                    received_at: Utc::now(),
                });
            }
            newer
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Snapshot<T>>> {
        self.tx.subscribe()
    }

    pub fn current_seq(&self) -> Option<u64> {
        self.tx.borrow().as_ref().map(|s| s.seq)
    }
}

impl<T: Clone> SnapshotSlot<T> {
    pub fn latest(&self) -> Option<Snapshot<T>> {
        self.tx.borrow().clone()
    }
}

/// Run `fetch` every `every` until `cancel` fires, feeding `slot`.
///
/// Each fetch runs in its own task so a slow response never delays the next
/// tick.
pub fn spawn_poll<T, F, Fut>(
    slot: Arc<SnapshotSlot<T>>,
    every: Duration,
    cancel: CancellationToken,
    hydration: Option<HydrationSync>,
    fetch: F,
) -> JoinHandle<()>
where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = api::Result<T>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Some(mut hydration) = hydration {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = hydration.wait_hydrated() => {}
            }
        }

        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Poller stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let seq = slot.begin();
                    let request = fetch();
                    let slot = slot.clone();
                    let cancel = cancel.clone();
                    tokio::spawn(async move {
                        let result = request.await;
                        if cancel.is_cancelled() {
                            tracing::debug!("Dropping response #{} after teardown", seq);
                            return;
                        }
                        match result {
                            Ok(value) => {
                                if !slot.offer(seq, value) {
                                    tracing::debug!("Discarding stale response #{}", seq);
                                }
                            }
                            Err(e) => tracing::warn!("Poll #{} failed: {}", seq, e),
                        }
                    });
                }
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Session status
// ---------------------------------------------------------------------------

/// Polls `GET /session/status` for a dashboard or `status --watch`.
pub struct StatusPoller {
    client: GatewayClient,
    every: Duration,
    slot: Arc<SnapshotSlot<SessionStatus>>,
}

impl StatusPoller {
    pub fn new(client: GatewayClient, every: Duration) -> Self {
        Self {
            client,
            every,
            slot: Arc::new(SnapshotSlot::new()),
        }
    }

    pub fn slot(&self) -> Arc<SnapshotSlot<SessionStatus>> {
        self.slot.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Snapshot<SessionStatus>>> {
        self.slot.subscribe()
    }

    /// Manual refresh. Shares the sequence with the poll; returns whether
    /// the result was displayed.
    pub async fn refresh(&self) -> api::Result<bool> {
        let seq = self.slot.begin();
        let status = self.client.session_status().await?;
        Ok(self.slot.offer(seq, status))
    }

    pub fn spawn(&self, cancel: CancellationToken, hydration: Option<HydrationSync>) -> JoinHandle<()> {
        let client = self.client.clone();
        spawn_poll(self.slot.clone(), self.every, cancel, hydration, move || {
            let client = client.clone();
            async move { client.session_status().await }
        })
    }
}

// ---------------------------------------------------------------------------
// QR pairing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum PairingState {
    /// Not paired yet; scan this code.
    Waiting(QrCode),
    /// The session is connected; no more codes will be fetched.
    Paired,
}

/// Fetches a fresh QR code on every tick until the session is connected.
pub struct QrRefresher {
    client: GatewayClient,
    every: Duration,
    slot: Arc<SnapshotSlot<PairingState>>,
}

impl QrRefresher {
    pub fn new(client: GatewayClient, every: Duration) -> Self {
        Self {
            client,
            every,
            slot: Arc::new(SnapshotSlot::new()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Snapshot<PairingState>>> {
        self.slot.subscribe()
    }

    async fn fetch(client: &GatewayClient) -> api::Result<PairingState> {
        let status = client.session_status().await?;
        if status.connected {
            return Ok(PairingState::Paired);
        }
        Ok(PairingState::Waiting(client.qr_code().await?))
    }

    /// Start refreshing. The refresher cancels itself once paired.
    pub fn spawn(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let client = self.client.clone();
        let handle = spawn_poll(self.slot.clone(), self.every, cancel.clone(), None, move || {
            let client = client.clone();
            async move { Self::fetch(&client).await }
        });

        let mut updates = self.slot.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    changed = updates.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let paired = matches!(
                            updates.borrow_and_update().as_ref().map(|s| &s.value),
                            Some(PairingState::Paired)
                        );
                        if paired {
                            tracing::info!("Session paired; stopping QR refresh");
                            cancel.cancel();
                            break;
                        }
                    }
                }
            }
        });

        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::i18n::Locale;

    fn client(url: &str) -> GatewayClient {
        let api = GatewayClient::new(url).unwrap().with_locale(Locale::En);
        api.set_token("inst-tok");
        api
    }

    #[test]
    fn test_older_response_is_discarded() {
        let slot = SnapshotSlot::new();
        let first = slot.begin();
        let second = slot.begin();
        assert!(second > first);

        assert!(slot.offer(second, "fresh"));
        assert!(!slot.offer(first, "stale"));
        assert_eq!(slot.latest().unwrap().value, "fresh");
        assert_eq!(slot.current_seq(), Some(second));
    }

    #[test]
    fn test_in_order_responses_replace() {
        let slot = SnapshotSlot::new();
        let a = slot.begin();
        assert!(slot.offer(a, 1));
        let b = slot.begin();
        assert!(slot.offer(b, 2));
        assert_eq!(slot.latest().unwrap().value, 2);
    }

    #[tokio::test]
    async fn test_late_response_after_cancel_is_dropped() {
        let slot = Arc::new(SnapshotSlot::<u32>::new());
        let cancel = CancellationToken::new();
        let handle = spawn_poll(
            slot.clone(),
            Duration::from_secs(60),
            cancel.clone(),
            None,
            || async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok::<_, ApiError>(7)
            },
        );

        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();
        handle.await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(slot.latest().is_none());
    }

    #[tokio::test]
    async fn test_status_poller_publishes_snapshots() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/session/status")
            .match_header("token", "inst-tok")
            .with_status(200)
            .with_body(r#"{"code": 200, "success": true, "data": {"name": "Loja", "connected": true}}"#)
            .expect_at_least(1)
            .create_async()
            .await;

        let poller = StatusPoller::new(client(&server.url()), Duration::from_millis(50));
        let mut rx = poller.subscribe();
        let cancel = CancellationToken::new();
        let handle = poller.spawn(cancel.clone(), None);

        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .unwrap()
            .unwrap();
        let snapshot = rx.borrow().clone().unwrap();
        assert_eq!(snapshot.value.name, "Loja");
        assert!(snapshot.value.connected);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_manual_refresh_shares_sequence() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/session/status")
            .with_status(200)
            .with_body(r#"{"name": "Loja"}"#)
            .create_async()
            .await;

        let poller = StatusPoller::new(client(&server.url()), DEFAULT_INTERVAL);
        let stale = poller.slot().begin();
        assert!(poller.refresh().await.unwrap());
        assert!(!poller.slot().offer(stale, SessionStatus::default()));
        assert_eq!(poller.slot().latest().unwrap().value.name, "Loja");
    }

    #[tokio::test]
    async fn test_qr_refresher_stops_when_paired() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/session/status")
            .with_status(200)
            .with_body(r#"{"connected": true, "loggedIn": true}"#)
            .create_async()
            .await;
        let qr = server
            .mock("GET", "/session/qr")
            .expect(0)
            .create_async()
            .await;

        let refresher = QrRefresher::new(client(&server.url()), Duration::from_millis(50));
        let mut rx = refresher.subscribe();
        let cancel = CancellationToken::new();
        let handle = refresher.spawn(cancel.clone());

        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rx.borrow().as_ref().unwrap().value, PairingState::Paired);

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(cancel.is_cancelled());
        qr.assert_async().await;
    }

    #[tokio::test]
    async fn test_qr_refresher_stops_when_connected_before_login() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/session/status")
            .with_status(200)
            .with_body(r#"{"connected": true, "loggedIn": false}"#)
            .create_async()
            .await;
        let qr = server
            .mock("GET", "/session/qr")
            .expect(0)
            .create_async()
            .await;

        let refresher = QrRefresher::new(client(&server.url()), Duration::from_millis(40));
        let mut rx = refresher.subscribe();
        let cancel = CancellationToken::new();
        let handle = refresher.spawn(cancel.clone());

        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rx.borrow().as_ref().unwrap().value, PairingState::Paired);

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(cancel.is_cancelled());
        qr.assert_async().await;
    }
}
