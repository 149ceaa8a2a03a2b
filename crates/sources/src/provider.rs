//! External collaborator interfaces.
//!
//! Providers are dyn-compatible: methods return boxed futures. The futures are
//! local (not `Send`) because every render cycle runs on one thread.

use foundation::{GeoBounds, LatLng, Site};
use futures_util::future::LocalBoxFuture;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The query succeeded but matched nothing.
    Empty,
    /// Transport, status or decoding failure.
    Query(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Empty => write!(f, "query returned no results"),
            ProviderError::Query(msg) => write!(f, "point query failed: {msg}"),
        }
    }
}

impl std::error::Error for ProviderError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeocodeError {
    NotFound,
    Query(String),
}

impl std::fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeocodeError::NotFound => write!(f, "address not found"),
            GeocodeError::Query(msg) => write!(f, "geocode failed: {msg}"),
        }
    }
}

impl std::error::Error for GeocodeError {}

/// Source of points of interest for a viewport.
pub trait PointDataProvider {
    /// Sites of `category` inside `bounds`.
    ///
    /// Returns `Err(ProviderError::Empty)` rather than an empty vector when
    /// nothing matches. Rate limiting is the provider's concern.
    fn query<'a>(
        &'a self,
        bounds: GeoBounds,
        category: &'a str,
    ) -> LocalBoxFuture<'a, Result<Vec<Site>, ProviderError>>;
}

/// Resolves free-text addresses to coordinates.
pub trait GeocodeProvider {
    fn resolve<'a>(&'a self, address: &'a str) -> LocalBoxFuture<'a, Result<LatLng, GeocodeError>>;
}

impl<P: PointDataProvider + ?Sized> PointDataProvider for std::rc::Rc<P> {
    fn query<'a>(
        &'a self,
        bounds: GeoBounds,
        category: &'a str,
    ) -> LocalBoxFuture<'a, Result<Vec<Site>, ProviderError>> {
        (**self).query(bounds, category)
    }
}

impl<G: GeocodeProvider + ?Sized> GeocodeProvider for std::rc::Rc<G> {
    fn resolve<'a>(&'a self, address: &'a str) -> LocalBoxFuture<'a, Result<LatLng, GeocodeError>> {
        (**self).resolve(address)
    }
}
