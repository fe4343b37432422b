use crate::{alert::AlertEvent, reading::Sample};

/// Source of battery readings.
///
/// Implementations must return quickly and never block on slow I/O; a
/// sensor that cannot be read reports [`Sample::Unavailable`] rather than
/// failing.
pub trait BatterySampler: Send + std::fmt::Debug {
    fn sample(&mut self) -> Sample;
}

/// Destination for alert events.
///
/// Fire-and-forget: delivery failures are the implementation's concern and
/// are never reported back to the engine.
pub trait Notifier: Send + Sync + std::fmt::Debug {
    fn send(&self, event: AlertEvent);
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    fn send(&self, event: AlertEvent) {
        (**self).send(event);
    }
}

impl<S: BatterySampler + ?Sized> BatterySampler for Box<S> {
    fn sample(&mut self) -> Sample {
        (**self).sample()
    }
}
