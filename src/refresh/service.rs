//! Scheduled route refresh.
//!
//! [`RefreshService`] owns two background tasks:
//!
//! - the refresh task fetches and plans a route immediately, then on every
//!   timer tick, on endpoint changes (which also restart the timer) and on
//!   explicit requests;
//! - the jitter task moves the endpoints randomly around their base positions
//!   on its own timer.
//!
//! Each task has its own shutdown channel and can be stopped independently.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::geo::ArrowPlanner;
use crate::refresh::events::{EndpointSource, RefreshTrigger, RouteEvent};
use crate::refresh::jitter::EndpointJitter;
use crate::refresh::state::{Endpoints, RoutePlan, RouteSnapshot, RouteStore};
use crate::routing::{RouteFetcher, RouteResult};

/// Commands accepted by the refresh task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshCommand {
    RefreshNow,
    EndpointsChanged,
}

/// Fetches a route for the store's current endpoints, plans its arrows and
/// commits the result.
///
/// On error nothing is committed and the previous snapshot stays current.
pub async fn refresh_route(
    fetcher: &dyn RouteFetcher,
    planner: &ArrowPlanner,
    store: &RouteStore,
) -> RouteResult<Arc<RouteSnapshot>> {
    let endpoints = store.endpoints();
    let fetched = fetcher
        .fetch(endpoints.start.position, endpoints.end.position)
        .await?;

    let arrows = planner.plan(&fetched.route);

    Ok(store.commit(RoutePlan {
        endpoints,
        route: fetched.route,
        arrows,
        service_distance_meters: fetched.distance_meters,
        duration_seconds: fetched.duration_seconds,
    }))
}

/// State shared between the refresh task and its handles.
struct RefreshContext {
    fetcher: Arc<dyn RouteFetcher>,
    planner: ArrowPlanner,
    store: Arc<RouteStore>,
    events: broadcast::Sender<RouteEvent>,
}

impl RefreshContext {
    async fn refresh(&self, trigger: RefreshTrigger) {
        debug!("Refreshing route via {} ({})", self.fetcher.name(), trigger);

        match refresh_route(self.fetcher.as_ref(), &self.planner, &self.store).await {
            Ok(snapshot) => {
                info!(
                    "Route revision {} published: {} points, {} arrows, {:.0}m",
                    snapshot.revision,
                    snapshot.route.len(),
                    snapshot.arrows.len(),
                    snapshot.distance_meters
                );
                let _ = self.events.send(RouteEvent::RouteUpdated {
                    revision: snapshot.revision,
                    trigger,
                    point_count: snapshot.route.len(),
                    arrow_count: snapshot.arrows.len(),
                    distance_meters: snapshot.distance_meters,
                });
            }
            Err(e) => {
                warn!("Route refresh ({}) failed, keeping previous route: {}", trigger, e);
                let _ = self.events.send(RouteEvent::RefreshFailed {
                    trigger,
                    message: e.to_string(),
                });
            }
        }
    }
}

/// Cheap, cloneable control surface for a running [`RefreshService`].
#[derive(Clone)]
pub struct RefreshHandle {
    commands: mpsc::Sender<RefreshCommand>,
    store: Arc<RouteStore>,
    events: broadcast::Sender<RouteEvent>,
}

impl RefreshHandle {
    /// Asks for an immediate refresh. Returns false if the request queue is
    /// full or the service is gone.
    pub fn request_refresh(&self) -> bool {
        self.commands.try_send(RefreshCommand::RefreshNow).is_ok()
    }

    /// Replaces the base endpoints and triggers a refresh.
    pub fn set_endpoints(&self, endpoints: Endpoints) {
        self.store.set_endpoints(endpoints.clone());
        self.announce(&endpoints, EndpointSource::Api);
    }

    /// Moves the current endpoints without changing the base.
    fn set_jittered_endpoints(&self, endpoints: Endpoints) {
        self.store.set_current_endpoints(endpoints.clone());
        self.announce(&endpoints, EndpointSource::Jitter);
    }

    fn announce(&self, endpoints: &Endpoints, source: EndpointSource) {
        let _ = self.events.send(RouteEvent::EndpointsChanged {
            start: endpoints.start.position,
            end: endpoints.end.position,
            source,
        });
        // A refresh already queued reads the new endpoints, but the timer is not reset
        if let Err(e) = self.commands.try_send(RefreshCommand::EndpointsChanged) {
            debug!("Endpoint change not queued ({}), periodic timer keeps its phase", e);
        }
    }

    pub fn store(&self) -> &Arc<RouteStore> {
        &self.store
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RouteEvent> {
        self.events.subscribe()
    }
}

/// A running background task with its own shutdown signal.
struct ScheduledTask {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ScheduledTask {
    async fn stop(self, name: &str) {
        let _ = self.shutdown_tx.send(true);
        let mut handle = self.handle;

        tokio::select! {
            _ = &mut handle => {
                debug!("{} task stopped", name);
            }
            _ = tokio::time::sleep(Duration::from_secs(5)) => {
                warn!("{} task shutdown timed out, aborting", name);
                handle.abort();
            }
        }
    }
}

/// Jitter schedule settings.
#[derive(Debug, Clone)]
pub struct JitterSchedule {
    pub interval: Duration,
    pub jitter: EndpointJitter,
}

/// Owner of the refresh and jitter tasks.
pub struct RefreshService {
    context: Arc<RefreshContext>,
    refresh_interval: Duration,
    jitter: Option<JitterSchedule>,
    command_tx: mpsc::Sender<RefreshCommand>,
    command_rx: Arc<Mutex<mpsc::Receiver<RefreshCommand>>>,
    refresh_task: Option<ScheduledTask>,
    jitter_task: Option<ScheduledTask>,
}

impl RefreshService {
    /// Creates a service with the given fetcher, planner and refresh interval.
    /// Jitter is disabled until [`RefreshService::with_jitter`] is called.
    pub fn new(
        fetcher: Arc<dyn RouteFetcher>,
        planner: ArrowPlanner,
        store: Arc<RouteStore>,
        refresh_interval: Duration,
    ) -> Self {
        let (events, _) = broadcast::channel(256);
        let (command_tx, command_rx) = mpsc::channel(16);

        Self {
            context: Arc::new(RefreshContext {
                fetcher,
                planner,
                store,
                events,
            }),
            refresh_interval,
            jitter: None,
            command_tx,
            command_rx: Arc::new(Mutex::new(command_rx)),
            refresh_task: None,
            jitter_task: None,
        }
    }

    /// Builds a service from settings.
    pub fn from_settings(fetcher: Arc<dyn RouteFetcher>, settings: &Settings) -> Self {
        let store = Arc::new(RouteStore::new(Endpoints::from_settings(settings)));
        let service = Self::new(
            fetcher,
            settings.arrow_planner(),
            store,
            Duration::from_millis(settings.refresh_interval_ms),
        );

        if settings.jitter_enabled {
            service.with_jitter(JitterSchedule {
                interval: Duration::from_millis(settings.jitter_interval_ms),
                jitter: EndpointJitter::new(settings.jitter_span_degrees),
            })
        } else {
            service
        }
    }

    /// Enables endpoint jitter.
    pub fn with_jitter(mut self, schedule: JitterSchedule) -> Self {
        self.jitter = Some(schedule);
        self
    }

    pub fn handle(&self) -> RefreshHandle {
        RefreshHandle {
            commands: self.command_tx.clone(),
            store: self.context.store.clone(),
            events: self.context.events.clone(),
        }
    }

    pub fn store(&self) -> Arc<RouteStore> {
        self.context.store.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RouteEvent> {
        self.context.events.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.refresh_task.is_some()
    }

    /// Runs a single refresh without starting any task.
    pub async fn refresh_once(&self) -> RouteResult<Arc<RouteSnapshot>> {
        refresh_route(
            self.context.fetcher.as_ref(),
            &self.context.planner,
            &self.context.store,
        )
        .await
    }

    /// Starts the refresh task and, if configured, the jitter task.
    pub fn start(&mut self) {
        if self.is_running() {
            warn!("Refresh service is already running");
            return;
        }

        info!(
            "Starting route refresh every {}s",
            self.refresh_interval.as_secs()
        );
        self.refresh_task = Some(self.spawn_refresh_task());

        if let Some(schedule) = self.jitter.clone() {
            info!(
                "Starting endpoint jitter every {}s (span {} deg)",
                schedule.interval.as_secs(),
                schedule.jitter.span_degrees()
            );
            self.jitter_task = Some(self.spawn_jitter_task(schedule));
        }
    }

    /// Stops the jitter task only; periodic refreshes continue.
    pub async fn stop_jitter(&mut self) {
        if let Some(task) = self.jitter_task.take() {
            task.stop("Jitter").await;
        }
    }

    /// Stops both tasks.
    pub async fn stop(&mut self) {
        self.stop_jitter().await;

        if let Some(task) = self.refresh_task.take() {
            info!("Stopping route refresh...");
            task.stop("Refresh").await;
        }
    }

    fn spawn_refresh_task(&self) -> ScheduledTask {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let context = self.context.clone();
        let commands = self.command_rx.clone();
        let period = self.refresh_interval;

        let handle = tokio::spawn(async move {
            let mut commands = commands.lock().await;

            // First tick completes immediately
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                let trigger = tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => RefreshTrigger::Timer,
                    command = commands.recv() => match command {
                        Some(RefreshCommand::RefreshNow) => RefreshTrigger::Manual,
                        Some(RefreshCommand::EndpointsChanged) => {
                            ticker.reset();
                            RefreshTrigger::Endpoints
                        }
                        None => break,
                    },
                };

                // Shutdown cancels an in-flight fetch before anything is committed
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = context.refresh(trigger) => {}
                }
            }
        });

        ScheduledTask {
            shutdown_tx,
            handle,
        }
    }

    fn spawn_jitter_task(&self, schedule: JitterSchedule) -> ScheduledTask {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let control = self.handle();
        let JitterSchedule {
            interval: period,
            mut jitter,
        } = schedule;

        let handle = tokio::spawn(async move {
            // Unlike refreshes, the first perturbation waits a full period
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        let base = control.store().base_endpoints();
                        let moved = jitter.perturb_endpoints(&base);
                        debug!(
                            "Jittered endpoints to {} -> {}",
                            moved.start.position, moved.end.position
                        );
                        control.set_jittered_endpoints(moved);
                    }
                }
            }
        });

        ScheduledTask {
            shutdown_tx,
            handle,
        }
    }
}

impl Drop for RefreshService {
    fn drop(&mut self) {
        for task in [self.refresh_task.take(), self.jitter_task.take()].into_iter().flatten() {
            let _ = task.shutdown_tx.send(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{Coordinate, Route};
    use crate::routing::mock::{MockOutcome, MockRouteFetcher};

    fn store() -> Arc<RouteStore> {
        Arc::new(RouteStore::new(Endpoints::unlabeled(
            Coordinate::new(28.60, 77.20),
            Coordinate::new(28.62, 77.22),
        )))
    }

    #[tokio::test]
    async fn test_refresh_route_commits_snapshot() {
        let fetcher = MockRouteFetcher::with_script([MockOutcome::Route(Route::new(vec![
            Coordinate::new(28.60, 77.20),
            Coordinate::new(28.61, 77.21),
            Coordinate::new(28.62, 77.22),
        ]))]);
        let store = store();

        let snapshot = refresh_route(&fetcher, &ArrowPlanner::new(1.0e9), &store)
            .await
            .unwrap();

        assert_eq!(snapshot.revision, 1);
        assert_eq!(snapshot.route.len(), 3);
        assert_eq!(snapshot.arrows.len(), 1);
        assert!(store.snapshot().is_some());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let fetcher = MockRouteFetcher::with_script([
            MockOutcome::Route(Route::new(vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.1)])),
            MockOutcome::Status(502),
        ]);
        let store = store();
        let planner = ArrowPlanner::default();

        let first = refresh_route(&fetcher, &planner, &store).await.unwrap();
        assert!(refresh_route(&fetcher, &planner, &store).await.is_err());

        let current = store.snapshot().unwrap();
        assert_eq!(current.id, first.id);
        assert_eq!(store.revision(), 1);
    }

    #[tokio::test]
    async fn test_request_refresh_without_running_task_queues() {
        let service = RefreshService::new(
            Arc::new(MockRouteFetcher::new()),
            ArrowPlanner::default(),
            store(),
            Duration::from_secs(600),
        );
        assert!(!service.is_running());
        assert!(service.handle().request_refresh());
    }

    #[tokio::test]
    async fn test_set_endpoints_with_full_queue_still_applies() {
        let service = RefreshService::new(
            Arc::new(MockRouteFetcher::new()),
            ArrowPlanner::default(),
            store(),
            Duration::from_secs(600),
        );
        let handle = service.handle();
        let mut events = service.subscribe();

        while handle.request_refresh() {}

        let moved = Endpoints::unlabeled(Coordinate::new(19.07, 72.87), Coordinate::new(18.52, 73.85));
        handle.set_endpoints(moved.clone());

        assert_eq!(service.store().endpoints(), moved);
        assert_eq!(service.store().base_endpoints(), moved);
        assert!(matches!(
            events.try_recv(),
            Ok(RouteEvent::EndpointsChanged {
                source: EndpointSource::Api,
                ..
            })
        ));
    }
}
