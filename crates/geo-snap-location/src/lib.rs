#![warn(missing_docs)]
//! # geo-snap-location
//!
//! ## Purpose
//! Resolves a best-effort location tag for each capture record.
//!
//! ## Responsibilities
//! - Define a backend-agnostic location provider trait (cached last-known query,
//!   bounded update subscription, explicit unsubscribe).
//! - Implement the resolver state machine: denied short-circuit, cached fast
//!   path, single-delivery subscription fallback.
//! - Route asynchronous deliveries by explicit record identity, never by gallery
//!   position.
//! - Expose a deterministic synthetic provider for CI and unit tests.
//!
//! ## Data flow
//! Coordinator calls [`LocationResolver::resolve`] with a fresh record id ->
//! resolver answers synchronously or subscribes -> the host loop forwards the
//! first update through [`LocationResolver::deliver_update`] -> resolver returns
//! the terminal tag for the routed record and tears the subscription down.
//!
//! ## Ownership and lifetimes
//! The resolver shares the provider behind `Arc<dyn LocationProvider>`; routing
//! state is owned by the resolver so provider implementations stay stateless
//! about records.
//!
//! ## Error model
//! Invalid update configuration and provider failures are reported as
//! [`LocationError`]. A missing fix is not an error; it is the `Unavailable`
//! terminal tag.
//!
//! ## Security and privacy notes
//! Log lines mention record and subscription identities, never coordinates.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use geo_snap_core::{Coordinates, LocationTag, RecordId};
use geo_snap_permissions::PermissionStatus;
use log::{debug, warn};
use thiserror::Error;

/// Measurement priority requested from the platform provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// Most accurate fix available, highest power cost.
    HighAccuracy,
    /// Balanced accuracy and power usage.
    Balanced,
    /// Coarse, low-power fixes.
    LowPower,
}

/// Bounded configuration for one location update subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateConfig {
    /// Desired delivery interval in milliseconds.
    pub interval_ms: u64,
    /// Fastest delivery interval the subscriber can absorb.
    pub fastest_interval_ms: u64,
    /// Requested measurement priority.
    pub priority: Priority,
    /// Maximum delivery batching delay in milliseconds.
    pub max_wait_ms: u64,
}

impl UpdateConfig {
    /// Creates a validated update configuration.
    ///
    /// # Errors
    /// Returns [`LocationError::InvalidConfig`] when `fastest_interval_ms`
    /// exceeds `interval_ms` or any interval is zero.
    pub fn new(
        interval_ms: u64,
        fastest_interval_ms: u64,
        priority: Priority,
        max_wait_ms: u64,
    ) -> Result<Self, LocationError> {
        if interval_ms == 0 || fastest_interval_ms == 0 {
            return Err(LocationError::InvalidConfig(
                "update intervals must be greater than zero".to_string(),
            ));
        }
        if fastest_interval_ms > interval_ms {
            return Err(LocationError::InvalidConfig(
                "fastest interval must not exceed the base interval".to_string(),
            ));
        }

        Ok(Self {
            interval_ms,
            fastest_interval_ms,
            priority,
            max_wait_ms,
        })
    }
}

impl Default for UpdateConfig {
    /// Default request shape: 10s interval, 5s fastest, high accuracy, 15s max
    /// batching delay.
    fn default() -> Self {
        Self {
            interval_ms: 10_000,
            fastest_interval_ms: 5_000,
            priority: Priority::HighAccuracy,
            max_wait_ms: 15_000,
        }
    }
}

/// Identity of one live update subscription, assigned by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(
    /// Provider-assigned subscription sequence number.
    pub u64,
);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "subscription-{}", self.0)
    }
}

/// Trait implemented by concrete location providers.
pub trait LocationProvider: Send + Sync {
    /// Returns the cached last-known fix without starting new measurement.
    ///
    /// # Errors
    /// Returns [`LocationError::Provider`] on backend failure.
    fn last_known(&self) -> Result<Option<Coordinates>, LocationError>;

    /// Starts a live update subscription with the given bounds.
    ///
    /// # Errors
    /// Returns [`LocationError::Provider`] on backend failure.
    fn subscribe(&self, config: &UpdateConfig) -> Result<SubscriptionId, LocationError>;

    /// Stops a live update subscription.
    ///
    /// # Errors
    /// Returns [`LocationError::Provider`] on backend failure.
    fn unsubscribe(&self, subscription: SubscriptionId) -> Result<(), LocationError>;
}

/// Synchronous answer from starting one resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolveOutcome {
    /// Resolution finished synchronously with a terminal tag.
    Tagged(LocationTag),
    /// Resolution is waiting on the first delivery of this subscription.
    Subscribed(SubscriptionId),
}

/// Resolver state machine for per-record location tags.
///
/// Each record's resolution runs `Pending -> Resolved | Unavailable | Denied`
/// with no retries; the resolver holds the `subscription -> record` routing that
/// makes asynchronous deliveries land on the record that started them.
pub struct LocationResolver {
    provider: Arc<dyn LocationProvider>,
    config: UpdateConfig,
    routes: HashMap<SubscriptionId, RecordId>,
}

impl LocationResolver {
    /// Creates a resolver over the given provider and subscription bounds.
    pub fn new(provider: Arc<dyn LocationProvider>, config: UpdateConfig) -> Self {
        Self {
            provider,
            config,
            routes: HashMap::new(),
        }
    }

    /// Starts location resolution for one freshly appended record.
    ///
    /// # Semantics
    /// - Permission absent: answers `Denied` without touching the provider.
    /// - Cached fix present: answers `Resolved` without subscribing.
    /// - Cache miss: subscribes once and routes the subscription to `record_id`.
    ///
    /// # Errors
    /// Returns [`LocationError::AlreadyResolving`] when the record already has a
    /// live subscription. Propagates provider failures for the caller to map
    /// into a terminal tag.
    pub fn resolve(
        &mut self,
        record_id: RecordId,
        permission: PermissionStatus,
    ) -> Result<ResolveOutcome, LocationError> {
        if !permission.is_granted() {
            debug!("{record_id}: location permission absent, tagging denied");
            return Ok(ResolveOutcome::Tagged(LocationTag::Denied));
        }

        if self.routes.values().any(|routed| *routed == record_id) {
            return Err(LocationError::AlreadyResolving(record_id));
        }

        if let Some(fix) = self.provider.last_known()? {
            debug!("{record_id}: resolved from cached fix");
            return Ok(ResolveOutcome::Tagged(LocationTag::Resolved(fix)));
        }

        let subscription = self.provider.subscribe(&self.config)?;
        self.routes.insert(subscription, record_id);
        debug!("{record_id}: no cached fix, waiting on {subscription}");
        Ok(ResolveOutcome::Subscribed(subscription))
    }

    /// Applies the first delivery of a subscription.
    ///
    /// # Returns
    /// The routed record and its terminal tag, or `None` for subscriptions this
    /// resolver no longer tracks (late or duplicate deliveries).
    ///
    /// # Side effects
    /// The subscription is unsubscribed on first delivery. An unsubscribe
    /// failure is logged and does not discard the already-delivered tag.
    pub fn deliver_update(
        &mut self,
        subscription: SubscriptionId,
        fix: Option<Coordinates>,
    ) -> Option<(RecordId, LocationTag)> {
        let Some(record_id) = self.routes.remove(&subscription) else {
            debug!("{subscription}: delivery for unknown subscription ignored");
            return None;
        };

        if let Err(error) = self.provider.unsubscribe(subscription) {
            warn!("{subscription}: unsubscribe after first delivery failed: {error}");
        }

        let tag = match fix {
            Some(fix) => LocationTag::Resolved(fix),
            None => LocationTag::Unavailable,
        };
        debug!("{record_id}: {subscription} delivered terminal tag '{}'", tag.state_name());
        Some((record_id, tag))
    }

    /// Returns the number of resolutions waiting on a delivery.
    pub fn outstanding(&self) -> usize {
        self.routes.len()
    }
}

#[derive(Debug, Default)]
struct ProviderCounters {
    last_known_calls: u64,
    subscribe_calls: u64,
}

/// Deterministic provider for test and CI usage.
///
/// Holds an optional cached fix, a scripted queue of update deliveries, and
/// call counters so tests can assert which provider paths were exercised.
#[derive(Debug, Default)]
pub struct SyntheticLocationProvider {
    cached: Option<Coordinates>,
    scripted_fixes: Mutex<Vec<Option<Coordinates>>>,
    active: Mutex<Vec<u64>>,
    next_subscription: Mutex<u64>,
    counters: Mutex<ProviderCounters>,
}

impl SyntheticLocationProvider {
    /// Creates a provider with no cached fix and no scripted deliveries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cached last-known fix.
    pub fn with_cached(mut self, fix: Coordinates) -> Self {
        self.cached = Some(fix);
        self
    }

    /// Queues update deliveries, oldest first. `None` entries model the
    /// platform answering without a usable fix.
    pub fn with_update_fixes(self, fixes: Vec<Option<Coordinates>>) -> Self {
        {
            let mut scripted = lock_unpoisoned(&self.scripted_fixes);
            let mut reversed = fixes;
            reversed.reverse();
            *scripted = reversed;
        }
        self
    }

    /// Pops the next platform delivery for the oldest live subscription.
    ///
    /// Returns `None` when no subscription is live or the script is exhausted;
    /// the host loop uses this to drain deliveries in completion order.
    pub fn take_pending_delivery(&self) -> Option<(SubscriptionId, Option<Coordinates>)> {
        let active = lock_unpoisoned(&self.active);
        let subscription = *active.first()?;
        drop(active);

        let fix = lock_unpoisoned(&self.scripted_fixes).pop()?;
        Some((SubscriptionId(subscription), fix))
    }

    /// Returns how many times the cached fix was queried.
    pub fn last_known_calls(&self) -> u64 {
        lock_unpoisoned(&self.counters).last_known_calls
    }

    /// Returns how many subscriptions were started.
    pub fn subscribe_calls(&self) -> u64 {
        lock_unpoisoned(&self.counters).subscribe_calls
    }

    /// Returns the number of currently live subscriptions.
    pub fn active_subscriptions(&self) -> usize {
        lock_unpoisoned(&self.active).len()
    }
}

impl LocationProvider for SyntheticLocationProvider {
    fn last_known(&self) -> Result<Option<Coordinates>, LocationError> {
        lock_unpoisoned(&self.counters).last_known_calls += 1;
        Ok(self.cached)
    }

    fn subscribe(&self, _config: &UpdateConfig) -> Result<SubscriptionId, LocationError> {
        lock_unpoisoned(&self.counters).subscribe_calls += 1;

        let mut next = lock_unpoisoned(&self.next_subscription);
        let id = *next;
        *next += 1;
        lock_unpoisoned(&self.active).push(id);
        Ok(SubscriptionId(id))
    }

    fn unsubscribe(&self, subscription: SubscriptionId) -> Result<(), LocationError> {
        let mut active = lock_unpoisoned(&self.active);
        let before = active.len();
        active.retain(|id| *id != subscription.0);
        if active.len() == before {
            return Err(LocationError::Provider(format!(
                "{subscription} is not live"
            )));
        }
        Ok(())
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Location layer error type.
#[derive(Debug, Error)]
pub enum LocationError {
    /// Update configuration bounds are inconsistent.
    #[error("invalid update config: {0}")]
    InvalidConfig(String),
    /// Provider runtime failure.
    #[error("location provider failure: {0}")]
    Provider(String),
    /// The record already has a live subscription.
    #[error("{0} already has an outstanding resolution")]
    AlreadyResolving(RecordId),
}

#[cfg(test)]
mod tests {
    //! Unit tests for resolver short-circuits, routing, and teardown.

    use super::*;

    fn resolver_with(provider: Arc<SyntheticLocationProvider>) -> LocationResolver {
        LocationResolver::new(provider, UpdateConfig::default())
    }

    #[test]
    fn update_config_validates_interval_bounds() {
        assert!(UpdateConfig::new(10_000, 5_000, Priority::HighAccuracy, 15_000).is_ok());
        assert!(UpdateConfig::new(5_000, 10_000, Priority::HighAccuracy, 15_000).is_err());
        assert!(UpdateConfig::new(0, 0, Priority::Balanced, 15_000).is_err());
    }

    #[test]
    fn denied_permission_never_touches_the_provider() {
        let provider = Arc::new(SyntheticLocationProvider::new());
        let mut resolver = resolver_with(Arc::clone(&provider));

        let outcome = resolver
            .resolve(RecordId(0), PermissionStatus::Denied)
            .expect("resolve should not fail");

        assert_eq!(outcome, ResolveOutcome::Tagged(LocationTag::Denied));
        assert_eq!(provider.last_known_calls(), 0);
        assert_eq!(provider.subscribe_calls(), 0);
    }

    #[test]
    fn cached_fix_skips_the_subscription_path() {
        let fix = Coordinates::new(37.0, -122.0);
        let provider = Arc::new(SyntheticLocationProvider::new().with_cached(fix));
        let mut resolver = resolver_with(Arc::clone(&provider));

        let outcome = resolver
            .resolve(RecordId(0), PermissionStatus::Granted)
            .expect("resolve should not fail");

        assert_eq!(outcome, ResolveOutcome::Tagged(LocationTag::Resolved(fix)));
        assert_eq!(provider.subscribe_calls(), 0);
    }

    #[test]
    fn cache_miss_subscribes_and_first_delivery_tears_down() {
        let fix = Coordinates::new(1.5, 2.5);
        let provider = Arc::new(
            SyntheticLocationProvider::new().with_update_fixes(vec![Some(fix)]),
        );
        let mut resolver = resolver_with(Arc::clone(&provider));

        let ResolveOutcome::Subscribed(subscription) = resolver
            .resolve(RecordId(3), PermissionStatus::Granted)
            .expect("resolve should not fail")
        else {
            panic!("cache miss should subscribe");
        };
        assert_eq!(resolver.outstanding(), 1);
        assert_eq!(provider.active_subscriptions(), 1);

        let delivered = resolver.deliver_update(subscription, Some(fix));
        assert_eq!(delivered, Some((RecordId(3), LocationTag::Resolved(fix))));
        assert_eq!(resolver.outstanding(), 0);
        assert_eq!(provider.active_subscriptions(), 0);

        // Duplicate delivery after teardown is ignored.
        assert_eq!(resolver.deliver_update(subscription, Some(fix)), None);
    }

    #[test]
    fn null_delivery_marks_record_unavailable() {
        let provider = Arc::new(SyntheticLocationProvider::new());
        let mut resolver = resolver_with(provider);

        let ResolveOutcome::Subscribed(subscription) = resolver
            .resolve(RecordId(7), PermissionStatus::Granted)
            .expect("resolve should not fail")
        else {
            panic!("cache miss should subscribe");
        };

        let delivered = resolver.deliver_update(subscription, None);
        assert_eq!(delivered, Some((RecordId(7), LocationTag::Unavailable)));
    }

    #[test]
    fn one_record_cannot_hold_two_subscriptions() {
        let provider = Arc::new(SyntheticLocationProvider::new());
        let mut resolver = resolver_with(provider);

        resolver
            .resolve(RecordId(1), PermissionStatus::Granted)
            .expect("first resolve should subscribe");
        assert!(matches!(
            resolver.resolve(RecordId(1), PermissionStatus::Granted),
            Err(LocationError::AlreadyResolving(RecordId(1)))
        ));
    }
}
