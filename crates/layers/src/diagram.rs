//! Voronoi diagram clipped to an axis-aligned rectangle.
//!
//! Cells are derived from the Delaunay triangulation: the Voronoi cell of a
//! site is the clip rectangle intersected with the half-planes bounded by the
//! perpendicular bisectors towards each Delaunay neighbour. Hull cells come
//! out closed because the clip rectangle is the starting polygon.

use std::collections::BTreeSet;

use delaunator::{next_halfedge, triangulate};
use foundation::Aabb2;
use foundation::math::{Vec2, quantize_f64};

/// Sites closer than this (in pixels) are treated as one location.
pub const DEFAULT_COINCIDENT_EPS: f64 = 1e-6;

/// Decimal places kept when serializing path data.
const PATH_DECIMALS: u32 = 3;

/// Vertices closer than this after clipping are merged.
const VERTEX_MERGE_EPS: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub enum DiagramError {
    InvalidClip([f64; 4]),
    NonFiniteSite { index: usize },
}

impl std::fmt::Display for DiagramError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagramError::InvalidClip(extent) => {
                write!(f, "clip rectangle must be finite with min < max: {extent:?}")
            }
            DiagramError::NonFiniteSite { index } => {
                write!(f, "site {index} has a non-finite coordinate")
            }
        }
    }
}

impl std::error::Error for DiagramError {}

/// One Voronoi cell. `polygon` is empty when the cell has no area inside the
/// clip rectangle (duplicate sites, sites far outside the rectangle).
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub site: usize,
    pub polygon: Vec<Vec2>,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        self.polygon.len() < 3
    }

    /// Unsigned shoelace area.
    pub fn area(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let n = self.polygon.len();
        let twice: f64 = (0..n)
            .map(|i| self.polygon[i].cross(self.polygon[(i + 1) % n]))
            .sum();
        twice.abs() * 0.5
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagram {
    clip: Aabb2,
    sites: Vec<Vec2>,
    cells: Vec<Cell>,
}

impl Diagram {
    pub fn clip(&self) -> Aabb2 {
        self.clip
    }

    pub fn sites(&self) -> &[Vec2] {
        &self.sites
    }

    /// One entry per input site, in input order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn non_empty_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| !c.is_empty())
    }

    /// Index of the site whose cell contains `p`, i.e. the nearest site.
    pub fn find(&self, p: Vec2) -> Option<usize> {
        self.non_empty_cells()
            .map(|c| (c.site, self.sites[c.site].distance(p)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(site, _)| site)
    }

    /// Cell boundaries as SVG path data: `M x,y L x,y … Z` per non-empty cell.
    pub fn render_path(&self) -> String {
        let mut out = String::new();
        for cell in self.non_empty_cells() {
            push_ring(&mut out, &cell.polygon);
        }
        out
    }
}

fn push_ring(out: &mut String, ring: &[Vec2]) {
    use std::fmt::Write as _;

    for (i, p) in ring.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        let _ = write!(
            out,
            "{cmd}{},{}",
            quantize_f64(p.x, PATH_DECIMALS),
            quantize_f64(p.y, PATH_DECIMALS)
        );
    }
    out.push('Z');
}

/// Builds clipped Voronoi diagrams. Pure: no state survives a call.
#[derive(Debug, Copy, Clone)]
pub struct DiagramBuilder {
    coincident_eps: f64,
}

impl Default for DiagramBuilder {
    fn default() -> Self {
        Self {
            coincident_eps: DEFAULT_COINCIDENT_EPS,
        }
    }
}

impl DiagramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_coincident_eps(mut self, eps: f64) -> Self {
        self.coincident_eps = eps.max(0.0);
        self
    }

    pub fn build(&self, sites: &[Vec2], clip: Aabb2) -> Result<Diagram, DiagramError> {
        if !clip.is_valid() {
            return Err(DiagramError::InvalidClip(clip.extent()));
        }
        if let Some(index) = sites.iter().position(|s| !s.is_finite()) {
            return Err(DiagramError::NonFiniteSite { index });
        }

        let canonical = self.canonical_sites(sites);
        let unique: Vec<usize> = (0..sites.len()).filter(|&i| canonical[i] == i).collect();
        let neighbors = delaunay_neighbors(sites, &unique);

        let cells = (0..sites.len())
            .map(|i| {
                let polygon = if canonical[i] == i {
                    clip_cell(i, sites, &neighbors[i], clip)
                } else {
                    Vec::new()
                };
                Cell { site: i, polygon }
            })
            .collect();

        Ok(Diagram {
            clip,
            sites: sites.to_vec(),
            cells,
        })
    }

    /// Maps each site to the first earlier site it coincides with (or itself).
    fn canonical_sites(&self, sites: &[Vec2]) -> Vec<usize> {
        let mut canonical: Vec<usize> = Vec::with_capacity(sites.len());
        for (i, s) in sites.iter().enumerate() {
            let first = (0..i)
                .find(|&j| canonical[j] == j && sites[j].distance(*s) <= self.coincident_eps)
                .unwrap_or(i);
            canonical.push(first);
        }
        canonical
    }
}

/// Delaunay neighbours per site index. Non-unique sites get an empty set.
///
/// Sites the triangulation leaves without edges (all sites collinear, or
/// duplicates below delaunator's own tolerance) fall back to every other
/// unique site, which still yields the exact cell.
fn delaunay_neighbors(sites: &[Vec2], unique: &[usize]) -> Vec<BTreeSet<usize>> {
    let mut neighbors = vec![BTreeSet::new(); sites.len()];
    if unique.len() < 2 {
        return neighbors;
    }

    let points: Vec<delaunator::Point> = unique
        .iter()
        .map(|&i| delaunator::Point {
            x: sites[i].x,
            y: sites[i].y,
        })
        .collect();
    let tri = triangulate(&points);

    for e in 0..tri.triangles.len() {
        let a = unique[tri.triangles[e]];
        let b = unique[tri.triangles[next_halfedge(e)]];
        if a != b {
            neighbors[a].insert(b);
            neighbors[b].insert(a);
        }
    }

    for &i in unique {
        if neighbors[i].is_empty() {
            neighbors[i] = unique.iter().copied().filter(|&j| j != i).collect();
        }
    }
    neighbors
}

fn clip_cell(site: usize, sites: &[Vec2], neighbors: &BTreeSet<usize>, clip: Aabb2) -> Vec<Vec2> {
    let mut polygon: Vec<Vec2> = clip.corners().to_vec();
    for &n in neighbors {
        polygon = clip_to_bisector(&polygon, sites[site], sites[n]);
        if polygon.len() < 3 {
            return Vec::new();
        }
    }
    polygon
}

/// Keeps the part of `polygon` that is at least as close to `a` as to `b`
/// (Sutherland-Hodgman against one half-plane).
fn clip_to_bisector(polygon: &[Vec2], a: Vec2, b: Vec2) -> Vec<Vec2> {
    let mid = (a + b) * 0.5;
    let dir = b - a;
    let side = |p: Vec2| (p - mid).dot(dir);

    let mut out: Vec<Vec2> = Vec::with_capacity(polygon.len() + 1);
    let Some(&last) = polygon.last() else {
        return out;
    };
    let mut prev = last;
    let mut prev_d = side(prev);
    for &curr in polygon {
        let curr_d = side(curr);
        let prev_in = prev_d <= 0.0;
        let curr_in = curr_d <= 0.0;
        if prev_in != curr_in {
            let t = prev_d / (prev_d - curr_d);
            push_vertex(&mut out, prev.lerp(curr, t));
        }
        if curr_in {
            push_vertex(&mut out, curr);
        }
        prev = curr;
        prev_d = curr_d;
    }

    if out.len() > 1 && out[0].distance(out[out.len() - 1]) <= VERTEX_MERGE_EPS {
        out.pop();
    }
    out
}

fn push_vertex(out: &mut Vec<Vec2>, p: Vec2) {
    if out
        .last()
        .is_none_or(|last| last.distance(p) > VERTEX_MERGE_EPS)
    {
        out.push(p);
    }
}
