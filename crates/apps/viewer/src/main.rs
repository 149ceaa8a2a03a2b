use std::cell::RefCell;
use std::rc::Rc;

use foundation::LatLng;
use layers::headless::HeadlessMap;
use sources::nominatim::NominatimGeocoder;
use sources::{
    GeocodeProvider, OverpassProvider, PointDataProvider, StaticGeocoder, StaticPointProvider,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use viewer::{HostEvent, RenderContext, RenderCycle, ViewerConfig, ViewportController};

const DEMO_SITES: &str = include_str!("../data/munich_cafes.json");

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ViewerConfig::from_env()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local = tokio::task::LocalSet::new();
    local.block_on(&runtime, run(config))
}

fn point_provider(
    config: &ViewerConfig,
) -> Result<Rc<dyn PointDataProvider>, Box<dyn std::error::Error>> {
    if let Some(url) = &config.overpass_url {
        info!(%url, "using Overpass provider");
        return Ok(Rc::new(OverpassProvider::new(url.clone())));
    }
    let provider = match &config.sites_path {
        Some(path) => {
            info!(path = %path.display(), "using site fixture");
            StaticPointProvider::from_path(path)?
        }
        None => StaticPointProvider::from_json(DEMO_SITES)?,
    };
    Ok(Rc::new(provider))
}

fn geocoder(config: &ViewerConfig) -> Rc<dyn GeocodeProvider> {
    match &config.nominatim_url {
        Some(url) => Rc::new(NominatimGeocoder::new(
            url.clone(),
            concat!("voronoi-viewer/", env!("CARGO_PKG_VERSION")),
        )),
        None => Rc::new(
            StaticGeocoder::new()
                .with_entry("Marienplatz", LatLng::new(48.1374, 11.5755))
                .with_entry("Hofgarten", LatLng::new(48.1429, 11.5802))
                .with_entry("Gärtnerplatz", LatLng::new(48.1318, 11.5766)),
        ),
    }
}

async fn run(config: ViewerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let map = HeadlessMap::new(config.center, config.zoom, config.size);
    let cycle = RenderCycle::new(
        RenderContext::new(map.clone()),
        point_provider(&config)?,
        config.category.clone(),
        config.stale_policy,
    )
    .with_geocoder(geocoder(&config));

    let (mut controller, events) = ViewportController::new(Rc::new(RefCell::new(cycle)));
    let settled = events.clone();
    map.set_settle_hook(move |_| {
        let _ = settled.send(HostEvent::Idle);
    });
    if let Some(address) = &config.search {
        let _ = events.send(HostEvent::SearchLocation(address.clone()));
    }

    let handled = controller.drain().await;
    info!(handled, cycles = controller.cycles_spawned(), "event queue drained");

    if let Some(notice) = controller.render_cycle().borrow().context().notice() {
        warn!(%notice, "render finished with notice");
    }

    std::fs::write(&config.out_path, map.to_svg())?;
    info!(
        path = %config.out_path.display(),
        surfaces = map.live_surfaces(),
        markers = map.live_markers(),
        "svg written"
    );
    Ok(())
}
