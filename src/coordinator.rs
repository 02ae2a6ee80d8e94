//! Per-worker correlation of page-load requests with their responses.
//!
//! The coordinator keeps at most one outstanding `LoadRequest` per page.
//! Callers asking for a page that is already in flight join the existing
//! entry as waiters; the eventual outcome is fanned out to every waiter in
//! the order they joined.
//!
//! All table mutations happen under one mutex. Transport sends and waiter
//! wake-ups happen after it is released, so a transport that answers
//! synchronously (loopback, tests) can call straight back into
//! [`LoadCoordinator::on_response`].

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::Rng;
use tracing::{debug, info, instrument, trace, warn};

use crate::cache::ResidentPageCache;
use crate::config::CoordinatorConfig;
use crate::error::{ConfigError, LoadError, StaleToken};
use crate::future::{PageFuture, PageResult, Waiter};
use crate::message::{FailureReason, LoadRequest, LoadResponse, Message};
use crate::page::{RequestToken, ResidentPageHandle, VectorPageId, WorkerId};
use crate::registry::TypeRegistry;
use crate::transport::Transport;
use crate::wire::Frame;

/// Counters for one coordinator. Snapshot via [`LoadCoordinator::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    /// Every `LoadRequest` handed to the transport, retries included.
    pub requests_sent: u64,
    pub retries: u64,
    /// Callers that joined an in-flight request.
    pub coalesced: u64,
    pub resident_hits: u64,
    pub failure_cache_hits: u64,
    pub responses_accepted: u64,
    pub stale_discarded: u64,
    pub malformed_dropped: u64,
    pub timeouts: u64,
    pub terminal_failures: u64,
}

/// What an accepted response (or timeout) did to its request chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// Page is resident; `delivered` waiters were still listening.
    Loaded {
        handle: ResidentPageHandle,
        delivered: usize,
    },
    /// A fresh request went out for the same page.
    Retrying { token: RequestToken, attempt: u32 },
    /// Retry limit reached; waiters got `LoadFailed(reason)`.
    Exhausted {
        reason: FailureReason,
        delivered: usize,
    },
}

struct OutstandingRequest {
    token: RequestToken,
    requester: WorkerId,
    waiters: Vec<Waiter>,
    issued_at: Instant,
    attempts: u32,
}

struct CachedFailure {
    reason: FailureReason,
    until: Instant,
}

struct TokenAllocator {
    next: u64,
}

impl TokenAllocator {
    fn next(&mut self) -> RequestToken {
        let token = RequestToken(self.next);
        self.next = self.next.wrapping_add(1);
        token
    }
}

/// Work decided under the lock, carried out after it is released.
enum Effect {
    Reissue {
        request: LoadRequest,
        attempt: u32,
    },
    Loaded {
        waiters: Vec<Waiter>,
        handle: ResidentPageHandle,
    },
    Exhausted {
        waiters: Vec<Waiter>,
        reason: FailureReason,
    },
}

struct State {
    outstanding: BTreeMap<VectorPageId, OutstandingRequest>,
    failures: BTreeMap<VectorPageId, CachedFailure>,
    tokens: TokenAllocator,
    stats: CoordinatorStats,
    closed: bool,
}

impl State {
    /// One attempt of `page`'s chain failed: reissue or give up.
    fn fail_attempt(
        &mut self,
        page: VectorPageId,
        reason: FailureReason,
        now: Instant,
        config: &CoordinatorConfig,
    ) -> Option<Effect> {
        let entry = self.outstanding.get_mut(&page)?;

        if entry.attempts < config.retry_limit {
            let token = self.tokens.next();
            entry.token = token;
            entry.attempts += 1;
            entry.issued_at = now;
            self.stats.retries += 1;
            self.stats.requests_sent += 1;
            debug!(%page, %token, attempt = entry.attempts, %reason, "reissuing load request");
            return Some(Effect::Reissue {
                request: LoadRequest {
                    page,
                    requester: entry.requester,
                    token,
                },
                attempt: entry.attempts,
            });
        }

        let entry = self.outstanding.remove(&page)?;
        self.stats.terminal_failures += 1;
        if !config.failure_ttl().is_zero() {
            self.failures.insert(
                page,
                CachedFailure {
                    reason: reason.clone(),
                    until: now + config.failure_ttl(),
                },
            );
        }
        info!(%page, attempts = entry.attempts, %reason, "page load failed");
        Some(Effect::Exhausted {
            waiters: entry.waiters,
            reason,
        })
    }

    fn expire(
        &mut self,
        page: VectorPageId,
        now: Instant,
        config: &CoordinatorConfig,
    ) -> Option<Effect> {
        if !self.outstanding.contains_key(&page) {
            return None;
        }
        self.stats.timeouts += 1;
        self.fail_attempt(page, FailureReason::Timeout, now, config)
    }
}

/// Resolves every waiter in join order. Returns how many were still listening.
fn deliver(waiters: Vec<Waiter>, result: PageResult) -> usize {
    waiters
        .into_iter()
        .map(|waiter| waiter.send(result.clone()).is_ok())
        .filter(|delivered| *delivered)
        .count()
}

pub struct LoadCoordinator<T, C> {
    config: CoordinatorConfig,
    transport: T,
    cache: Arc<C>,
    registry: TypeRegistry,
    state: Mutex<State>,
}

impl<T, C> LoadCoordinator<T, C>
where
    T: Transport,
    C: ResidentPageCache,
{
    pub fn new(
        config: CoordinatorConfig,
        transport: T,
        cache: Arc<C>,
        registry: TypeRegistry,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let seed = config
            .token_seed
            .unwrap_or_else(|| rand::thread_rng().gen());

        Ok(Self {
            config,
            transport,
            cache,
            registry,
            state: Mutex::new(State {
                outstanding: BTreeMap::new(),
                failures: BTreeMap::new(),
                tokens: TokenAllocator { next: seed },
                stats: CoordinatorStats::default(),
                closed: false,
            }),
        })
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Ask for `page` to be resident.
    ///
    /// Resolves at once for resident pages and for pages whose last chain
    /// failed within the failure TTL. Otherwise joins the in-flight request
    /// for `page`, or issues a new one on behalf of `requester`.
    #[instrument(level = "trace", skip(self))]
    pub fn request_page(&self, page: VectorPageId, requester: WorkerId) -> PageFuture {
        let now = Instant::now();

        let (request, future) = {
            let mut state = self.state.lock();
            if state.closed {
                return PageFuture::ready(Err(LoadError::Shutdown));
            }

            // Checked under the table lock so a concurrent Loaded cannot slip
            // between the cache miss and the entry lookup.
            if let Some(handle) = self.cache.get(&page) {
                state.stats.resident_hits += 1;
                return PageFuture::ready(Ok(handle));
            }

            if let Some(failure) = state.failures.get(&page) {
                if failure.until > now {
                    let reason = failure.reason.clone();
                    state.stats.failure_cache_hits += 1;
                    return PageFuture::ready(Err(LoadError::LoadFailed(reason)));
                }
                state.failures.remove(&page);
            }

            let (waiter, future) = PageFuture::pending();

            if let Some(entry) = state.outstanding.get_mut(&page) {
                entry.waiters.push(waiter);
                let (token, waiters) = (entry.token, entry.waiters.len());
                state.stats.coalesced += 1;
                trace!(%token, waiters, "joined in-flight request");
                return future;
            }

            let token = state.tokens.next();
            state.outstanding.insert(
                page,
                OutstandingRequest {
                    token,
                    requester,
                    waiters: vec![waiter],
                    issued_at: now,
                    attempts: 1,
                },
            );
            state.stats.requests_sent += 1;
            debug!(%token, %requester, "issuing load request");

            (
                LoadRequest {
                    page,
                    requester,
                    token,
                },
                future,
            )
        };

        self.dispatch(&request, 1);
        future
    }

    /// Apply a response from the transport.
    ///
    /// Responses that match no outstanding `(page, token)` are stale
    /// (duplicates, answers to superseded attempts, foreign tokens) and change
    /// nothing.
    pub fn on_response(&self, response: LoadResponse) -> Result<ResponseOutcome, StaleToken> {
        let now = Instant::now();
        let page = response.page();
        let token = response.token();

        let effect = {
            let mut state = self.state.lock();
            let current = state
                .outstanding
                .get(&page)
                .is_some_and(|entry| entry.token == token);
            if !current {
                state.stats.stale_discarded += 1;
                debug!(%page, %token, "discarding stale response");
                return Err(StaleToken { page, token });
            }
            state.stats.responses_accepted += 1;

            match response {
                LoadResponse::Loaded { handle, .. } => {
                    let waiters = state
                        .outstanding
                        .remove(&page)
                        .map(|entry| entry.waiters)
                        .unwrap_or_default();
                    state.failures.remove(&page);
                    self.cache.put(page, handle);
                    debug!(%page, %token, %handle, waiters = waiters.len(), "page resident");
                    Effect::Loaded { waiters, handle }
                }
                LoadResponse::Failed { reason, .. } => {
                    match state.fail_attempt(page, reason, now, &self.config) {
                        Some(effect) => effect,
                        None => return Err(StaleToken { page, token }),
                    }
                }
            }
        };

        Ok(self.apply(effect))
    }

    /// No response arrived in time for `page`'s current attempt.
    ///
    /// Counts as a `Failed(Timeout)` for retry purposes. `None` when nothing
    /// is outstanding for `page`.
    pub fn on_timeout(&self, page: VectorPageId) -> Option<ResponseOutcome> {
        let effect = self
            .state
            .lock()
            .expire(page, Instant::now(), &self.config)?;
        Some(self.apply(effect))
    }

    /// Time out every attempt issued at least `request_timeout` before `now`.
    ///
    /// Also drops cached failures whose TTL has passed.
    pub fn poll_timeouts(&self, now: Instant) -> Vec<(VectorPageId, ResponseOutcome)> {
        let timeout = self.config.request_timeout();

        let effects: Vec<(VectorPageId, Effect)> = {
            let mut state = self.state.lock();
            state.failures.retain(|_, failure| failure.until > now);
            let expired: Vec<VectorPageId> = state
                .outstanding
                .iter()
                .filter(|(_, entry)| now.saturating_duration_since(entry.issued_at) >= timeout)
                .map(|(page, _)| *page)
                .collect();

            expired
                .into_iter()
                .filter_map(|page| {
                    state
                        .expire(page, now, &self.config)
                        .map(|effect| (page, effect))
                })
                .collect()
        };

        effects
            .into_iter()
            .map(|(page, effect)| {
                warn!(%page, "load request timed out");
                (page, self.apply(effect))
            })
            .collect()
    }

    /// Feed raw bytes from the transport.
    ///
    /// Malformed frames are logged and dropped. Request frames are not this
    /// side's business and are ignored.
    pub fn on_frame(&self, bytes: &[u8]) -> Option<ResponseOutcome> {
        let frame = match Frame::decode(bytes, &self.registry) {
            Ok(frame) => frame,
            Err(err) => {
                self.state.lock().stats.malformed_dropped += 1;
                warn!(error = %err, len = bytes.len(), "dropping malformed frame");
                return None;
            }
        };

        match frame.message {
            Message::LoadResponse(response) => self.on_response(response).ok(),
            Message::LoadRequest(request) => {
                debug!(%request, "ignoring load request frame");
                None
            }
        }
    }

    /// Fail every pending waiter with `Shutdown` and refuse new requests.
    /// Returns how many waiters were notified.
    pub fn shutdown(&self) -> usize {
        let entries = {
            let mut state = self.state.lock();
            state.closed = true;
            std::mem::take(&mut state.outstanding)
        };

        let notified = entries
            .into_values()
            .map(|entry| deliver(entry.waiters, Err(LoadError::Shutdown)))
            .sum::<usize>();
        info!(notified, "load coordinator shut down");
        notified
    }

    /// Pages currently answered from the failure cache.
    pub fn cached_failure_count(&self) -> usize {
        self.state.lock().failures.len()
    }

    pub fn outstanding_count(&self) -> usize {
        self.state.lock().outstanding.len()
    }

    /// Token of the current attempt for `page`, if one is in flight.
    pub fn outstanding_token(&self, page: &VectorPageId) -> Option<RequestToken> {
        self.state.lock().outstanding.get(page).map(|e| e.token)
    }

    /// Waiters on `page` that have not dropped their future.
    pub fn waiter_count(&self, page: &VectorPageId) -> usize {
        self.state
            .lock()
            .outstanding
            .get(page)
            .map(|e| e.waiters.iter().filter(|w| !w.is_canceled()).count())
            .unwrap_or(0)
    }

    /// Age of the current attempt for `page`.
    pub fn attempt_age(&self, page: &VectorPageId, now: Instant) -> Option<Duration> {
        self.state
            .lock()
            .outstanding
            .get(page)
            .map(|e| now.saturating_duration_since(e.issued_at))
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.state.lock().stats
    }

    fn dispatch(&self, request: &LoadRequest, attempt: u32) {
        if let Err(err) = self.transport.send_request(request, attempt) {
            // The entry stays outstanding; the timeout drives the next attempt.
            warn!(page = %request.page, token = %request.token, attempt, error = %err, "failed to send load request");
        }
    }

    fn apply(&self, effect: Effect) -> ResponseOutcome {
        match effect {
            Effect::Reissue { request, attempt } => {
                self.dispatch(&request, attempt);
                ResponseOutcome::Retrying {
                    token: request.token,
                    attempt,
                }
            }
            Effect::Loaded { waiters, handle } => ResponseOutcome::Loaded {
                handle,
                delivered: deliver(waiters, Ok(handle)),
            },
            Effect::Exhausted { waiters, reason } => {
                let delivered = deliver(waiters, Err(LoadError::LoadFailed(reason.clone())));
                ResponseOutcome::Exhausted { reason, delivered }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryPageCache;
    use crate::error::TransportError;
    use crate::page::VectorId;
    use crate::registry;
    use futures::executor::block_on;
    use futures::task::{self, ArcWake};
    use futures::FutureExt;
    use std::task::Context;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<(LoadRequest, u32)>>,
    }

    impl Transport for Recorder {
        fn send_request(&self, request: &LoadRequest, attempt: u32) -> Result<(), TransportError> {
            self.sent.lock().push((request.clone(), attempt));
            Ok(())
        }
    }

    struct Unreachable;

    impl Transport for Unreachable {
        fn send_request(&self, _: &LoadRequest, _: u32) -> Result<(), TransportError> {
            Err(TransportError::Other("no route".to_string()))
        }
    }

    fn coordinator(retry_limit: u32) -> LoadCoordinator<Arc<Recorder>, InMemoryPageCache> {
        let config = CoordinatorConfig {
            retry_limit,
            token_seed: Some(100),
            ..CoordinatorConfig::default()
        };
        LoadCoordinator::new(
            config,
            Arc::new(Recorder::default()),
            Arc::new(InMemoryPageCache::new()),
            registry::init(),
        )
        .unwrap()
    }

    fn page(low: u64, high: u64) -> VectorPageId {
        VectorPageId::new(VectorId(1), low, high).unwrap()
    }

    #[test]
    fn test_tokens_come_from_seed() {
        let c = coordinator(3);
        let _a = c.request_page(page(0, 10), WorkerId(1));
        let _b = c.request_page(page(10, 20), WorkerId(1));
        assert_eq!(c.outstanding_token(&page(0, 10)), Some(RequestToken(100)));
        assert_eq!(c.outstanding_token(&page(10, 20)), Some(RequestToken(101)));
    }

    struct OrderedWake {
        index: usize,
        log: Arc<Mutex<Vec<usize>>>,
    }

    impl ArcWake for OrderedWake {
        fn wake_by_ref(arc_self: &Arc<Self>) {
            arc_self.log.lock().push(arc_self.index);
        }
    }

    #[test]
    fn test_waiters_resolve_in_join_order() {
        let c = coordinator(3);
        let p = page(0, 10);
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut futures: Vec<_> = (0..4).map(|_| c.request_page(p, WorkerId(1))).collect();

        for (index, future) in futures.iter_mut().enumerate() {
            let waker = task::waker(Arc::new(OrderedWake {
                index,
                log: log.clone(),
            }));
            let mut cx = Context::from_waker(&waker);
            assert!(future.poll_unpin(&mut cx).is_pending());
        }

        let token = c.outstanding_token(&p).unwrap();
        c.on_response(LoadResponse::Loaded {
            page: p,
            token,
            handle: ResidentPageHandle(9),
        })
        .unwrap();

        assert_eq!(*log.lock(), vec![0, 1, 2, 3]);
        for future in futures {
            assert_eq!(block_on(future), Ok(ResidentPageHandle(9)));
        }
    }

    struct ResidentOnWake {
        page: VectorPageId,
        cache: Arc<InMemoryPageCache>,
        seen: Arc<Mutex<Option<ResidentPageHandle>>>,
    }

    impl ArcWake for ResidentOnWake {
        fn wake_by_ref(arc_self: &Arc<Self>) {
            *arc_self.seen.lock() = arc_self.cache.get(&arc_self.page);
        }
    }

    #[test]
    fn test_page_is_resident_before_waiters_wake() {
        let cache = Arc::new(InMemoryPageCache::new());
        let c = LoadCoordinator::new(
            CoordinatorConfig::default(),
            Arc::new(Recorder::default()),
            cache.clone(),
            registry::init(),
        )
        .unwrap();
        let p = page(0, 10);
        let seen = Arc::new(Mutex::new(None));
        let mut future = c.request_page(p, WorkerId(1));

        let waker = task::waker(Arc::new(ResidentOnWake {
            page: p,
            cache,
            seen: seen.clone(),
        }));
        assert!(future.poll_unpin(&mut Context::from_waker(&waker)).is_pending());

        let token = c.outstanding_token(&p).unwrap();
        c.on_response(LoadResponse::Loaded {
            page: p,
            token,
            handle: ResidentPageHandle(4),
        })
        .unwrap();

        assert_eq!(*seen.lock(), Some(ResidentPageHandle(4)));
    }

    #[test]
    fn test_waiters_share_one_handle() {
        let c = coordinator(3);
        let p = page(0, 10);
        let mut futures: Vec<_> = (0..3).map(|_| c.request_page(p, WorkerId(1))).collect();
        assert_eq!(c.waiter_count(&p), 3);

        let token = c.outstanding_token(&p).unwrap();
        let outcome = c
            .on_response(LoadResponse::Loaded {
                page: p,
                token,
                handle: ResidentPageHandle(9),
            })
            .unwrap();

        assert_eq!(
            outcome,
            ResponseOutcome::Loaded {
                handle: ResidentPageHandle(9),
                delivered: 3
            }
        );
        for f in futures.iter_mut() {
            assert_eq!(f.try_take(), Some(Ok(ResidentPageHandle(9))));
        }
        assert_eq!(c.outstanding_count(), 0);
    }

    #[test]
    fn test_duplicate_delivery_first_wins() {
        let c = coordinator(3);
        let p = page(0, 10);
        let future = c.request_page(p, WorkerId(1));
        let token = c.outstanding_token(&p).unwrap();

        c.on_response(LoadResponse::Loaded {
            page: p,
            token,
            handle: ResidentPageHandle(1),
        })
        .unwrap();
        let second = c.on_response(LoadResponse::Failed {
            page: p,
            token,
            reason: FailureReason::NotFound,
        });

        assert_eq!(second, Err(StaleToken { page: p, token }));
        assert_eq!(block_on(future), Ok(ResidentPageHandle(1)));
        assert_eq!(c.cache().get(&p), Some(ResidentPageHandle(1)));
        assert_eq!(c.stats().stale_discarded, 1);
    }

    #[test]
    fn test_response_for_superseded_attempt_is_stale() {
        let c = coordinator(3);
        let p = page(0, 10);
        let _future = c.request_page(p, WorkerId(1));
        let first = c.outstanding_token(&p).unwrap();

        c.on_timeout(p).unwrap();
        let late = c.on_response(LoadResponse::Loaded {
            page: p,
            token: first,
            handle: ResidentPageHandle(4),
        });

        assert!(late.is_err());
        assert!(c.cache().get(&p).is_none());
        assert_eq!(c.outstanding_count(), 1);
    }

    #[test]
    fn test_cancelled_waiter_still_populates_cache() {
        let c = coordinator(3);
        let p = page(0, 10);
        let future = c.request_page(p, WorkerId(1));
        let token = c.outstanding_token(&p).unwrap();
        drop(future);
        assert_eq!(c.waiter_count(&p), 0);
        assert_eq!(c.outstanding_count(), 1);

        let outcome = c
            .on_response(LoadResponse::Loaded {
                page: p,
                token,
                handle: ResidentPageHandle(2),
            })
            .unwrap();
        assert_eq!(
            outcome,
            ResponseOutcome::Loaded {
                handle: ResidentPageHandle(2),
                delivered: 0
            }
        );

        let again = c.request_page(p, WorkerId(2));
        assert_eq!(block_on(again), Ok(ResidentPageHandle(2)));
        assert_eq!(c.transport().sent.lock().len(), 1);
    }

    #[test]
    fn test_poll_timeouts_respects_deadline() {
        let c = coordinator(2);
        let p = page(0, 10);
        let _future = c.request_page(p, WorkerId(1));
        let now = Instant::now();

        assert!(c.poll_timeouts(now).is_empty());

        let later = now + c.config().request_timeout() + Duration::from_millis(1);
        let fired = c.poll_timeouts(later);
        assert_eq!(fired.len(), 1);
        assert!(matches!(
            fired[0].1,
            ResponseOutcome::Retrying { attempt: 2, .. }
        ));
        assert_eq!(c.stats().timeouts, 1);
    }

    #[test]
    fn test_failure_cache_answers_promptly() {
        let c = coordinator(1);
        let p = page(0, 10);
        let first = c.request_page(p, WorkerId(1));
        let token = c.outstanding_token(&p).unwrap();

        c.on_response(LoadResponse::Failed {
            page: p,
            token,
            reason: FailureReason::other("vector dropped").unwrap(),
        })
        .unwrap();

        let reason = FailureReason::other("vector dropped").unwrap();
        assert_eq!(
            block_on(first),
            Err(LoadError::LoadFailed(reason.clone()))
        );
        assert_eq!(
            block_on(c.request_page(p, WorkerId(1))),
            Err(LoadError::LoadFailed(reason))
        );
        assert_eq!(c.transport().sent.lock().len(), 1);
        assert_eq!(c.stats().failure_cache_hits, 1);
    }

    #[test]
    fn test_expired_failures_are_swept() {
        let config = CoordinatorConfig {
            retry_limit: 1,
            failure_ttl_ms: 60_000,
            token_seed: Some(1),
            ..CoordinatorConfig::default()
        };
        let c = LoadCoordinator::new(
            config,
            Arc::new(Recorder::default()),
            Arc::new(InMemoryPageCache::new()),
            registry::init(),
        )
        .unwrap();

        for i in 0..50 {
            let p = page(i * 10, i * 10 + 10);
            let _waiter = c.request_page(p, WorkerId(1));
            let token = c.outstanding_token(&p).unwrap();
            c.on_response(LoadResponse::Failed {
                page: p,
                token,
                reason: FailureReason::NotFound,
            })
            .unwrap();
        }
        assert_eq!(c.cached_failure_count(), 50);

        c.poll_timeouts(Instant::now());
        assert_eq!(c.cached_failure_count(), 50);

        c.poll_timeouts(Instant::now() + Duration::from_secs(120));
        assert_eq!(c.cached_failure_count(), 0);
    }

    #[test]
    fn test_send_failure_keeps_entry_for_timeout() {
        let c = LoadCoordinator::new(
            CoordinatorConfig::default(),
            Unreachable,
            Arc::new(InMemoryPageCache::new()),
            registry::init(),
        )
        .unwrap();
        let p = page(0, 10);
        let mut future = c.request_page(p, WorkerId(1));

        assert_eq!(c.outstanding_count(), 1);
        assert_eq!(future.try_take(), None);
    }

    #[test]
    fn test_shutdown_fails_pending_waiters() {
        let c = coordinator(3);
        let p = page(0, 10);
        let a = c.request_page(p, WorkerId(1));
        let b = c.request_page(page(10, 20), WorkerId(1));

        assert_eq!(c.shutdown(), 2);
        assert_eq!(block_on(a), Err(LoadError::Shutdown));
        assert_eq!(block_on(b), Err(LoadError::Shutdown));
        assert_eq!(
            block_on(c.request_page(p, WorkerId(1))),
            Err(LoadError::Shutdown)
        );
    }

    #[test]
    fn test_malformed_frame_is_counted_and_dropped() {
        let c = coordinator(3);
        assert_eq!(c.on_frame(&[1, 2, 3]), None);
        assert_eq!(c.stats().malformed_dropped, 1);
    }
}
