use crate::overlay::OverlayError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

pub trait Layer {
    fn id(&self) -> LayerId;
}

/// Something that can be attached to and detached from a host's render layer.
///
/// The lifecycle manager depends only on this capability, never on a concrete
/// overlay type.
pub trait OverlayView<H: ?Sized>: Layer {
    /// Acquires host resources and draws. On error nothing may stay attached.
    fn on_attach(&mut self, host: &mut H) -> Result<(), OverlayError>;

    /// Releases every host resource acquired by `on_attach`. Must be a no-op
    /// when not attached.
    fn on_detach(&mut self, host: &mut H);

    fn is_attached(&self) -> bool;
}
