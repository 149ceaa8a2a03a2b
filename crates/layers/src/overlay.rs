//! Overlay lifecycle: at most one live overlay, fully released on detach.

use foundation::Site;
use foundation::math::{CoordinateTransformer, Vec2};
use tracing::debug;

use crate::diagram::{Diagram, DiagramBuilder, DiagramError};
use crate::host::{RenderLayer, Viewport, ViewportState};
use crate::layer::{Layer, LayerId, OverlayView};
use crate::symbology::CellStyle;

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayError {
    /// `attach` was called while an overlay is live.
    AlreadyAttached,
    ViewportUnavailable,
    ProjectionUnavailable,
    Diagram(DiagramError),
}

impl std::fmt::Display for OverlayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverlayError::AlreadyAttached => write!(f, "an overlay is already attached"),
            OverlayError::ViewportUnavailable => write!(f, "map viewport not ready"),
            OverlayError::ProjectionUnavailable => write!(f, "map projection not ready"),
            OverlayError::Diagram(e) => write!(f, "diagram construction failed: {e}"),
        }
    }
}

impl std::error::Error for OverlayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OverlayError::Diagram(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DiagramError> for OverlayError {
    fn from(e: DiagramError) -> Self {
        OverlayError::Diagram(e)
    }
}

/// Host resources and derived state of an attached overlay.
///
/// The transformer lives here so it cannot outlive the viewport it was bound to.
#[derive(Debug)]
struct Attached<S> {
    surface: S,
    transformer: CoordinateTransformer,
    viewport: ViewportState,
    diagram: Diagram,
}

/// Voronoi overlay for one site set.
#[derive(Debug)]
pub struct VoronoiOverlay<S> {
    id: LayerId,
    sites: Vec<Site>,
    style: CellStyle,
    builder: DiagramBuilder,
    attached: Option<Attached<S>>,
}

impl<S> VoronoiOverlay<S> {
    pub fn new(id: LayerId, sites: Vec<Site>, style: CellStyle) -> Self {
        Self {
            id,
            sites,
            style,
            builder: DiagramBuilder::new(),
            attached: None,
        }
    }

    pub fn with_builder(mut self, builder: DiagramBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn diagram(&self) -> Option<&Diagram> {
        self.attached.as_ref().map(|a| &a.diagram)
    }

    pub fn transformer(&self) -> Option<&CoordinateTransformer> {
        self.attached.as_ref().map(|a| &a.transformer)
    }

    pub fn viewport(&self) -> Option<&ViewportState> {
        self.attached.as_ref().map(|a| &a.viewport)
    }
}

impl<S> Layer for VoronoiOverlay<S> {
    fn id(&self) -> LayerId {
        self.id
    }
}

impl<H> OverlayView<H> for VoronoiOverlay<H::Surface>
where
    H: Viewport + RenderLayer + ?Sized,
{
    fn on_attach(&mut self, host: &mut H) -> Result<(), OverlayError> {
        if self.attached.is_some() {
            return Err(OverlayError::AlreadyAttached);
        }
        let viewport = host.viewport().ok_or(OverlayError::ViewportUnavailable)?;
        let projection = host.projection().ok_or(OverlayError::ProjectionUnavailable)?;
        let transformer = CoordinateTransformer::new(projection);

        // Everything fallible happens before the surface exists.
        let clip = transformer.container_rect(viewport.bounds);
        let sites_px: Vec<Vec2> = self
            .sites
            .iter()
            .map(|s| transformer.to_container_pixel(s.position))
            .collect();
        let diagram = self.builder.build(&sites_px, clip)?;

        let placement = transformer.div_rect(viewport.bounds);
        let surface = host.insert_surface(placement);
        if self.style.visible {
            host.draw_diagram(&surface, &diagram, &self.style);
        }
        debug!(
            layer = self.id.0,
            sites = self.sites.len(),
            cells = diagram.non_empty_cells().count(),
            "voronoi overlay attached"
        );

        self.attached = Some(Attached {
            surface,
            transformer,
            viewport,
            diagram,
        });
        Ok(())
    }

    fn on_detach(&mut self, host: &mut H) {
        if let Some(attached) = self.attached.take() {
            host.remove_surface(attached.surface);
            debug!(layer = self.id.0, "voronoi overlay detached");
        }
    }

    fn is_attached(&self) -> bool {
        self.attached.is_some()
    }
}

/// Owns the single active overlay.
pub struct OverlayLifecycleManager<H: ?Sized> {
    active: Option<Box<dyn OverlayView<H>>>,
}

impl<H: ?Sized> Default for OverlayLifecycleManager<H> {
    fn default() -> Self {
        Self { active: None }
    }
}

impl<H: ?Sized> std::fmt::Debug for OverlayLifecycleManager<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayLifecycleManager")
            .field("active", &self.active.as_ref().map(|o| o.id()))
            .finish()
    }
}

impl<H: ?Sized> OverlayLifecycleManager<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_attached(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_id(&self) -> Option<LayerId> {
        self.active.as_ref().map(|o| o.id())
    }

    /// Attaches `overlay`. Fails without side effects if one is already live.
    pub fn attach(
        &mut self,
        host: &mut H,
        mut overlay: Box<dyn OverlayView<H>>,
    ) -> Result<(), OverlayError> {
        if self.active.is_some() {
            return Err(OverlayError::AlreadyAttached);
        }
        overlay.on_attach(host)?;
        self.active = Some(overlay);
        Ok(())
    }

    /// Releases the live overlay, if any. Returns whether one was detached.
    pub fn detach(&mut self, host: &mut H) -> bool {
        match self.active.take() {
            Some(mut overlay) => {
                overlay.on_detach(host);
                true
            }
            None => false,
        }
    }
}
