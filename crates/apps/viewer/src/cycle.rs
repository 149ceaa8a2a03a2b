//! Render cycle orchestration.
//!
//! A cycle is `derender` followed by `render`. The render half awaits the
//! point provider, so it is split into three steps that never hold a borrow
//! across the await:
//!
//! 1. [`RenderCycle::begin`] derenders and snapshots the query (sync).
//! 2. [`PendingFetch::fetch`] awaits the provider.
//! 3. [`RenderCycle::complete`] applies the result (sync).
//!
//! [`perform_render_cycle`] chains the three for a shared `Rc<RefCell<_>>`.

use std::cell::RefCell;
use std::rc::Rc;

use foundation::{CycleId, GeoBounds, LatLng, Site};
use layers::symbology::{CellStyle, MarkerStyle};
use layers::{LayerId, MapHost, MarkerSet, OverlayLifecycleManager, VoronoiOverlay};
use runtime::{Admission, CycleTracker, EventBus, EventKind, StalePolicy};
use sources::{GeocodeError, GeocodeProvider, PointDataProvider, ProviderError};
use tracing::{debug, info, warn};

/// Cycles whose events the trace keeps.
pub const TRACE_CYCLES: u64 = 16;

/// User-visible message left by the last cycle or search.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Notice {
    NoResults,
    QueryError,
    GeocodeError,
}

impl Notice {
    pub fn text(self) -> &'static str {
        match self {
            Notice::NoResults => "No results found in this area.",
            Notice::QueryError => "Could not load places. Please try again.",
            Notice::GeocodeError => "Location not found.",
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}

/// Everything a render cycle mutates.
pub struct RenderContext<H: MapHost> {
    host: H,
    overlay: OverlayLifecycleManager<H>,
    markers: MarkerSet<H::Marker>,
    cell_style: CellStyle,
    notice: Option<Notice>,
    events: EventBus,
}

impl<H: MapHost + 'static> RenderContext<H> {
    pub fn new(host: H) -> Self {
        Self::with_styles(host, CellStyle::default(), MarkerStyle::default())
    }

    pub fn with_styles(host: H, cell_style: CellStyle, marker_style: MarkerStyle) -> Self {
        Self {
            host,
            overlay: OverlayLifecycleManager::new(),
            markers: MarkerSet::new(marker_style),
            cell_style,
            notice: None,
            events: EventBus::bounded(TRACE_CYCLES),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn notice(&self) -> Option<Notice> {
        self.notice
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay.is_attached()
    }

    pub fn overlay_id(&self) -> Option<LayerId> {
        self.overlay.active_id()
    }

    pub fn markers(&self) -> &MarkerSet<H::Marker> {
        &self.markers
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    fn is_rendered(&self) -> bool {
        self.overlay.is_attached() || !self.markers.is_empty() || self.notice.is_some()
    }

    /// Clears the notice, detaches the overlay and clears markers.
    fn derender(&mut self, cycle: CycleId) {
        self.notice = None;
        let detached = self.overlay.detach(&mut self.host);
        let cleared = self.markers.len();
        self.markers.clear(&mut self.host);
        self.events.emit(
            cycle,
            EventKind::Derender,
            format!("overlay_detached={detached} markers_cleared={cleared}"),
        );
        if detached {
            self.events.emit(cycle, EventKind::Detach, "overlay released");
        }
    }

    fn set_notice(&mut self, cycle: CycleId, notice: Notice) {
        self.notice = Some(notice);
        self.events.emit(cycle, EventKind::Notice, notice.text());
    }

    fn render_sites(&mut self, cycle: CycleId, sites: Vec<Site>) {
        self.markers.populate(&mut self.host, &sites);
        self.events
            .emit(cycle, EventKind::Markers, format!("{} markers", sites.len()));

        let overlay = Box::new(VoronoiOverlay::<H::Surface>::new(
            LayerId(cycle.0),
            sites,
            self.cell_style,
        ));
        match self.overlay.attach(&mut self.host, overlay) {
            Ok(()) => {
                self.events
                    .emit(cycle, EventKind::Attach, format!("layer {}", cycle.0));
            }
            Err(err) => {
                warn!(%cycle, error = %err, "overlay attach failed");
                self.markers.clear(&mut self.host);
                self.set_notice(cycle, Notice::QueryError);
            }
        }
    }
}

/// Query snapshot taken by [`RenderCycle::begin`].
pub struct PendingFetch {
    pub cycle: CycleId,
    bounds: Option<GeoBounds>,
    category: String,
    provider: Rc<dyn PointDataProvider>,
}

impl PendingFetch {
    pub async fn fetch(self) -> FetchOutcome {
        let result = match self.bounds {
            Some(bounds) => self.provider.query(bounds, &self.category).await,
            None => Err(ProviderError::Query("viewport unavailable".to_string())),
        };
        FetchOutcome {
            cycle: self.cycle,
            result,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub cycle: CycleId,
    pub result: Result<Vec<Site>, ProviderError>,
}

pub struct RenderCycle<H: MapHost> {
    ctx: RenderContext<H>,
    tracker: CycleTracker,
    category: String,
    provider: Rc<dyn PointDataProvider>,
    geocoder: Option<Rc<dyn GeocodeProvider>>,
}

impl<H: MapHost + 'static> RenderCycle<H> {
    pub fn new(
        ctx: RenderContext<H>,
        provider: Rc<dyn PointDataProvider>,
        category: impl Into<String>,
        policy: StalePolicy,
    ) -> Self {
        Self {
            ctx,
            tracker: CycleTracker::new(policy),
            category: category.into(),
            provider,
            geocoder: None,
        }
    }

    pub fn with_geocoder(mut self, geocoder: Rc<dyn GeocodeProvider>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    pub fn context(&self) -> &RenderContext<H> {
        &self.ctx
    }

    pub fn tracker(&self) -> &CycleTracker {
        &self.tracker
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn set_category(&mut self, category: impl Into<String>) {
        self.category = category.into();
    }

    /// Starts a cycle: derenders, then snapshots bounds and category.
    pub fn begin(&mut self) -> PendingFetch {
        let cycle = self.tracker.start();
        self.ctx.derender(cycle);

        let bounds = self.ctx.host.viewport().map(|vp| vp.bounds);
        info!(%cycle, category = %self.category, "render cycle started");
        self.ctx
            .events
            .emit(cycle, EventKind::Fetch, format!("category={}", self.category));
        PendingFetch {
            cycle,
            bounds,
            category: self.category.clone(),
            provider: self.provider.clone(),
        }
    }

    /// Applies a fetch result, subject to the stale policy.
    pub fn complete(&mut self, outcome: FetchOutcome) {
        let FetchOutcome { cycle, result } = outcome;
        if let Admission::Discard { newest } = self.tracker.resolve(cycle) {
            debug!(%cycle, %newest, "discarding superseded result");
            self.ctx
                .events
                .emit(cycle, EventKind::Discard, format!("superseded by {newest}"));
            return;
        }

        // A later cycle may already have rendered; keep a single overlay.
        if self.ctx.is_rendered() {
            self.ctx.derender(cycle);
        }

        match result {
            Ok(sites) if !sites.is_empty() => {
                info!(%cycle, sites = sites.len(), "fetch resolved");
                self.ctx.render_sites(cycle, sites);
            }
            Ok(_) | Err(ProviderError::Empty) => {
                info!(%cycle, "fetch returned no results");
                self.ctx.set_notice(cycle, Notice::NoResults);
            }
            Err(err) => {
                warn!(%cycle, error = %err, "fetch failed");
                self.ctx.set_notice(cycle, Notice::QueryError);
            }
        }
    }

    /// Runs a whole cycle with exclusive access.
    pub async fn perform_render_cycle(&mut self) -> CycleId {
        let pending = self.begin();
        let cycle = pending.cycle;
        let outcome = pending.fetch().await;
        self.complete(outcome);
        cycle
    }

    fn geocode_failed(&mut self, address: &str, err: &GeocodeError) {
        warn!(address, error = %err, "location search failed");
        let cycle = self.tracker.current().unwrap_or_default();
        self.ctx.set_notice(cycle, Notice::GeocodeError);
    }
}

/// Runs one cycle against a shared orchestrator.
pub async fn perform_render_cycle<H: MapHost + 'static>(
    cycle: Rc<RefCell<RenderCycle<H>>>,
) -> CycleId {
    let pending = cycle.borrow_mut().begin();
    let id = pending.cycle;
    let outcome = pending.fetch().await;
    cycle.borrow_mut().complete(outcome);
    id
}

/// Geocodes `address` and pans there.
///
/// The host reports the pan as a settle event, which triggers the next cycle.
/// The pan goes through a clone of the host handle with no borrow of `cycle`
/// held, so settle hooks may read the shared cycle. On failure the viewport is
/// left unchanged and a notice is shown.
pub async fn search_location<H: MapHost + Clone + 'static>(
    cycle: Rc<RefCell<RenderCycle<H>>>,
    address: String,
) -> Result<LatLng, GeocodeError> {
    let geocoder = cycle.borrow().geocoder.clone();
    let result = match geocoder {
        Some(geocoder) => geocoder.resolve(&address).await,
        None => Err(GeocodeError::Query("no geocoder configured".to_string())),
    };

    match &result {
        Ok(target) => {
            let mut host = cycle.borrow().ctx.host.clone();
            info!(lat = target.lat, lng = target.lng, "panning to search result");
            host.pan_to(*target);
        }
        Err(err) => cycle.borrow_mut().geocode_failed(&address, err),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::{Notice, RenderContext, RenderCycle};
    use foundation::{CycleId, GeoBounds, LatLng, Site};
    use layers::headless::HeadlessMap;
    use runtime::{EventKind, StalePolicy};
    use sources::StaticPointProvider;
    use sources::fixture::PoiRecord;
    use std::rc::Rc;

    fn map() -> HeadlessMap {
        HeadlessMap::fit_bounds(
            GeoBounds::new(LatLng::new(48.130, 11.570), LatLng::new(48.140, 11.590)),
            800.0,
        )
    }

    fn provider(points: &[(f64, f64, &str)]) -> Rc<StaticPointProvider> {
        Rc::new(StaticPointProvider::new(
            points
                .iter()
                .map(|&(lat, lng, name)| PoiRecord {
                    lat,
                    lng,
                    name: name.to_string(),
                    category: None,
                })
                .collect(),
        ))
    }

    #[test]
    fn notice_texts_are_distinct() {
        assert_ne!(Notice::NoResults.text(), Notice::QueryError.text());
        assert_eq!(Notice::GeocodeError.to_string(), "Location not found.");
    }

    #[tokio::test]
    async fn second_cycle_replaces_first() {
        let host = map();
        let p = provider(&[(48.1372, 11.5755, "a"), (48.1335, 11.5840, "b")]);
        let ctx = RenderContext::new(host.clone());
        let mut rc = RenderCycle::new(ctx, p, "cafe", StalePolicy::default());

        let first = rc.perform_render_cycle().await;
        let second = rc.perform_render_cycle().await;
        assert_eq!((first, second), (CycleId(1), CycleId(2)));
        assert_eq!(host.live_surfaces(), 1);
        assert_eq!(host.peak_surfaces(), 1);
        assert_eq!(host.live_markers(), 2);
        assert_eq!(rc.context().overlay_id(), Some(layers::LayerId(2)));

        let kinds = rc.context().events().kinds_for(second);
        assert_eq!(
            kinds,
            vec![
                EventKind::Derender,
                EventKind::Detach,
                EventKind::Fetch,
                EventKind::Markers,
                EventKind::Attach
            ]
        );
    }

    #[tokio::test]
    async fn empty_ok_result_counts_as_no_results() {
        let host = map();
        let ctx = RenderContext::new(host.clone());
        let mut rc = RenderCycle::new(ctx, provider(&[]), "cafe", StalePolicy::default());
        let pending = rc.begin();
        rc.complete(super::FetchOutcome {
            cycle: pending.cycle,
            result: Ok(Vec::<Site>::new()),
        });
        assert_eq!(rc.context().notice(), Some(Notice::NoResults));
        assert!(!rc.context().has_overlay());
    }
}
