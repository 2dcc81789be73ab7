use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Display state of the cloud sync banner.
///
/// Variant order matches `STATUS_ATTRIBUTES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Checking,
    Available,
    Unavailable,
    Restricted,
    TemporarilyUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusAttributes {
    pub icon: &'static str,
    pub color: &'static str,
    pub description: &'static str,
}

const STATUS_ATTRIBUTES: [StatusAttributes; 5] = [
    StatusAttributes {
        icon: "cloud.and.arrow.down",
        color: "gray",
        description: "Checking Cloud Status...",
    },
    StatusAttributes {
        icon: "cloud",
        color: "blue",
        description: "Cloud Sync Enabled",
    },
    StatusAttributes {
        icon: "cloud.slash",
        color: "orange",
        description: "Cloud Sync Not Available",
    },
    StatusAttributes {
        icon: "exclamationmark.cloud",
        color: "red",
        description: "Cloud Sync Restricted",
    },
    StatusAttributes {
        icon: "cloud.slash",
        color: "orange",
        description: "Cloud Sync Temporarily Unavailable",
    },
];

impl SyncStatus {
    pub fn attributes(self) -> &'static StatusAttributes {
        &STATUS_ATTRIBUTES[self as usize]
    }

    pub fn icon(self) -> &'static str {
        self.attributes().icon
    }

    pub fn color(self) -> &'static str {
        self.attributes().color
    }

    pub fn description(self) -> &'static str {
        self.attributes().description
    }

    /// Everything but a working account gets a banner above the list.
    pub fn shows_banner(self) -> bool {
        self != SyncStatus::Available
    }

    pub fn offers_settings_link(self) -> bool {
        matches!(
            self,
            SyncStatus::Unavailable | SyncStatus::TemporarilyUnavailable
        )
    }
}

/// Serializable view of a status for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SyncStatusDisplay {
    pub status: SyncStatus,
    pub icon: &'static str,
    pub color: &'static str,
    pub description: &'static str,
    pub show_banner: bool,
    pub offer_settings: bool,
}

impl From<SyncStatus> for SyncStatusDisplay {
    fn from(status: SyncStatus) -> Self {
        let attributes = status.attributes();
        Self {
            status,
            icon: attributes.icon,
            color: attributes.color,
            description: attributes.description,
            show_banner: status.shows_banner(),
            offer_settings: status.offers_settings_link(),
        }
    }
}

/// Reply of the external account service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountStatus {
    Available,
    NoAccount,
    Restricted,
    CouldNotDetermine { error: Option<String> },
    TemporarilyUnavailable,
    /// A value this crate does not know about yet.
    Unrecognized(String),
}

impl AccountStatus {
    pub fn from_wire(value: &str) -> Self {
        match value.trim() {
            "available" => AccountStatus::Available,
            "no_account" => AccountStatus::NoAccount,
            "restricted" => AccountStatus::Restricted,
            "could_not_determine" => AccountStatus::CouldNotDetermine { error: None },
            "temporarily_unavailable" => AccountStatus::TemporarilyUnavailable,
            other => AccountStatus::Unrecognized(other.to_string()),
        }
    }
}

/// Maps an account reply to the display state, logging the outcome.
pub fn map_account_status(reply: &AccountStatus) -> SyncStatus {
    match reply {
        AccountStatus::Available => {
            log::info!("cloud account available; sync enabled");
            SyncStatus::Available
        }
        AccountStatus::NoAccount => {
            log::warn!("no cloud account configured; sign in to enable sync");
            SyncStatus::Unavailable
        }
        AccountStatus::Restricted => {
            log::warn!("cloud account access is restricted");
            SyncStatus::Restricted
        }
        AccountStatus::CouldNotDetermine { error } => {
            log::warn!(
                "could not determine cloud account status: {}",
                error.as_deref().unwrap_or("unknown error")
            );
            SyncStatus::Unavailable
        }
        AccountStatus::TemporarilyUnavailable => {
            log::warn!("cloud account temporarily unavailable");
            SyncStatus::TemporarilyUnavailable
        }
        AccountStatus::Unrecognized(raw) => {
            log::warn!("unrecognized cloud account status raw={raw}");
            SyncStatus::Unavailable
        }
    }
}

/// External service answering "is cloud sync usable right now".
///
/// Each call must resolve at most once. It may also never resolve, in which
/// case the monitor stays in `Checking`.
pub trait AccountStatusProvider: Send + Sync + 'static {
    fn account_status(&self) -> impl Future<Output = AccountStatus> + Send;
}

struct Shared<P> {
    provider: P,
    generation: AtomicU64,
    status: watch::Sender<SyncStatus>,
}

/// Tracks the sync display state across caller-initiated checks.
///
/// Every read and write of the status goes through one watch cell. Each check
/// takes a new generation, and a reply is only applied while its generation
/// is still the latest, so an older check finishing late cannot overwrite a
/// newer one.
pub struct SyncStatusMonitor<P> {
    inner: Arc<Shared<P>>,
}

impl<P> Clone for SyncStatusMonitor<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: AccountStatusProvider> SyncStatusMonitor<P> {
    pub fn new(provider: P) -> Self {
        let (status, _) = watch::channel(SyncStatus::Checking);
        Self {
            inner: Arc::new(Shared {
                provider,
                generation: AtomicU64::new(0),
                status,
            }),
        }
    }

    pub fn status(&self) -> SyncStatus {
        *self.inner.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.inner.status.subscribe()
    }

    pub fn provider(&self) -> &P {
        &self.inner.provider
    }

    /// Queries the provider once and returns the status its reply maps to.
    ///
    /// The returned value is what this check observed; it is only published
    /// if no newer check started in the meantime.
    pub async fn check(&self) -> SyncStatus {
        let generation = self.begin_check();
        log::debug!("sync status check started generation={generation}");
        let reply = self.inner.provider.account_status().await;
        let next = map_account_status(&reply);
        self.finish_check(generation, next);
        next
    }

    pub fn spawn_check(&self) -> JoinHandle<SyncStatus> {
        let monitor = self.clone();
        tokio::spawn(async move { monitor.check().await })
    }

    fn begin_check(&self) -> u64 {
        let mut generation = 0;
        self.inner.status.send_modify(|status| {
            generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *status = SyncStatus::Checking;
        });
        generation
    }

    fn finish_check(&self, generation: u64, next: SyncStatus) -> bool {
        self.inner.status.send_if_modified(|status| {
            let latest = self.inner.generation.load(Ordering::SeqCst);
            if latest != generation {
                log::debug!(
                    "dropping stale sync status reply generation={generation} latest={latest}"
                );
                return false;
            }
            if *status == next {
                return false;
            }
            *status = next;
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    struct FixedProvider(AccountStatus);

    impl AccountStatusProvider for FixedProvider {
        fn account_status(&self) -> impl Future<Output = AccountStatus> + Send {
            let reply = self.0.clone();
            async move { reply }
        }
    }

    /// Hands out replies that the test resolves by hand, in call order.
    #[derive(Default)]
    struct ManualProvider {
        pending: Mutex<VecDeque<oneshot::Receiver<AccountStatus>>>,
    }

    impl ManualProvider {
        fn expect_call(&self) -> oneshot::Sender<AccountStatus> {
            let (tx, rx) = oneshot::channel();
            self.pending.lock().unwrap().push_back(rx);
            tx
        }
    }

    impl AccountStatusProvider for ManualProvider {
        fn account_status(&self) -> impl Future<Output = AccountStatus> + Send {
            let rx = self.pending.lock().unwrap().pop_front();
            async move {
                match rx {
                    Some(rx) => rx.await.unwrap_or(AccountStatus::CouldNotDetermine {
                        error: Some("reply dropped".to_string()),
                    }),
                    None => AccountStatus::CouldNotDetermine { error: None },
                }
            }
        }
    }

    #[test]
    fn account_replies_map_to_display_states() {
        let cases = [
            (AccountStatus::Available, SyncStatus::Available),
            (AccountStatus::NoAccount, SyncStatus::Unavailable),
            (AccountStatus::Restricted, SyncStatus::Restricted),
            (
                AccountStatus::CouldNotDetermine { error: None },
                SyncStatus::Unavailable,
            ),
            (
                AccountStatus::CouldNotDetermine {
                    error: Some("network down".to_string()),
                },
                SyncStatus::Unavailable,
            ),
            (
                AccountStatus::TemporarilyUnavailable,
                SyncStatus::TemporarilyUnavailable,
            ),
            (
                AccountStatus::Unrecognized("future".to_string()),
                SyncStatus::Unavailable,
            ),
        ];
        for (reply, expected) in cases {
            assert_eq!(map_account_status(&reply), expected, "{reply:?}");
        }
    }

    #[test]
    fn attribute_table_matches_each_variant() {
        assert_eq!(SyncStatus::Checking.icon(), "cloud.and.arrow.down");
        assert_eq!(SyncStatus::Checking.color(), "gray");
        assert_eq!(SyncStatus::Available.icon(), "cloud");
        assert_eq!(SyncStatus::Available.color(), "blue");
        assert_eq!(SyncStatus::Available.description(), "Cloud Sync Enabled");
        assert_eq!(SyncStatus::Unavailable.icon(), "cloud.slash");
        assert_eq!(SyncStatus::Restricted.color(), "red");
        assert_eq!(
            SyncStatus::TemporarilyUnavailable.description(),
            "Cloud Sync Temporarily Unavailable"
        );
    }

    #[test]
    fn banner_and_settings_link_rules() {
        assert!(!SyncStatus::Available.shows_banner());
        assert!(SyncStatus::Checking.shows_banner());
        assert!(SyncStatus::Restricted.shows_banner());

        assert!(SyncStatus::Unavailable.offers_settings_link());
        assert!(SyncStatus::TemporarilyUnavailable.offers_settings_link());
        assert!(!SyncStatus::Restricted.offers_settings_link());
        assert!(!SyncStatus::Checking.offers_settings_link());

        let display = SyncStatusDisplay::from(SyncStatus::Unavailable);
        let value = serde_json::to_value(&display).expect("serialize display");
        assert_eq!(
            value,
            serde_json::json!({
              "status": "unavailable",
              "icon": "cloud.slash",
              "color": "orange",
              "description": "Cloud Sync Not Available",
              "show_banner": true,
              "offer_settings": true
            })
        );
    }

    #[test]
    fn wire_values_parse_into_account_status() {
        assert_eq!(AccountStatus::from_wire("available"), AccountStatus::Available);
        assert_eq!(AccountStatus::from_wire(" no_account "), AccountStatus::NoAccount);
        assert_eq!(
            AccountStatus::from_wire("could_not_determine"),
            AccountStatus::CouldNotDetermine { error: None }
        );
        assert_eq!(
            AccountStatus::from_wire("quantum"),
            AccountStatus::Unrecognized("quantum".to_string())
        );
    }

    #[tokio::test]
    async fn monitor_starts_checking_and_settles_on_reply() {
        let monitor = SyncStatusMonitor::new(FixedProvider(AccountStatus::NoAccount));
        assert_eq!(monitor.status(), SyncStatus::Checking);
        assert_eq!(monitor.check().await, SyncStatus::Unavailable);
        assert_eq!(monitor.status(), SyncStatus::Unavailable);

        let monitor = SyncStatusMonitor::new(FixedProvider(AccountStatus::Restricted));
        assert_eq!(monitor.check().await, SyncStatus::Restricted);
        assert_eq!(monitor.status(), SyncStatus::Restricted);
    }

    #[tokio::test]
    async fn new_check_reenters_checking_until_reply_arrives() {
        let monitor = SyncStatusMonitor::new(ManualProvider::default());

        let reply = monitor.provider().expect_call();
        let handle = monitor.spawn_check();
        reply.send(AccountStatus::Available).unwrap();
        assert_eq!(handle.await.unwrap(), SyncStatus::Available);
        assert_eq!(monitor.status(), SyncStatus::Available);

        let mut rx = monitor.subscribe();
        let reply = monitor.provider().expect_call();
        let handle = monitor.spawn_check();
        rx.wait_for(|status| *status == SyncStatus::Checking)
            .await
            .unwrap();
        assert_eq!(monitor.status(), SyncStatus::Checking);

        reply.send(AccountStatus::TemporarilyUnavailable).unwrap();
        assert_eq!(handle.await.unwrap(), SyncStatus::TemporarilyUnavailable);
        assert_eq!(monitor.status(), SyncStatus::TemporarilyUnavailable);
    }

    #[tokio::test]
    async fn stale_reply_does_not_overwrite_newer_check() {
        let monitor = SyncStatusMonitor::new(ManualProvider::default());

        let first_reply = monitor.provider().expect_call();
        let first = monitor.spawn_check();
        // Let the first check take its generation before starting the second.
        while monitor.inner.generation.load(Ordering::SeqCst) < 1 {
            tokio::task::yield_now().await;
        }

        let second_reply = monitor.provider().expect_call();
        let second = monitor.spawn_check();
        while monitor.inner.generation.load(Ordering::SeqCst) < 2 {
            tokio::task::yield_now().await;
        }

        second_reply.send(AccountStatus::Restricted).unwrap();
        assert_eq!(second.await.unwrap(), SyncStatus::Restricted);
        assert_eq!(monitor.status(), SyncStatus::Restricted);

        first_reply.send(AccountStatus::Available).unwrap();
        assert_eq!(first.await.unwrap(), SyncStatus::Available);
        assert_eq!(monitor.status(), SyncStatus::Restricted);
    }

    #[tokio::test]
    async fn subscribers_see_published_status() {
        let monitor = SyncStatusMonitor::new(FixedProvider(AccountStatus::Available));
        let mut rx = monitor.subscribe();
        monitor.check().await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), SyncStatus::Available);
    }
}
