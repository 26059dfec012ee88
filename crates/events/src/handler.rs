use crate::{Event, EventEnvelope};

/// Reacts to a published event (consumer abstraction).
///
/// Handlers run independently of each other and of the publisher: a failure
/// in one handler never blocks another, and the same event may be delivered
/// more than once. Implementations must therefore be **idempotent** keyed on
/// a business identifier carried by the event (e.g. the invoice voucher
/// number), treating an already-applied delivery as success.
pub trait EventHandler<E: Event>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    /// Stable handler name, used when reporting failures to the operator.
    fn name(&self) -> &'static str;

    fn handle(&self, envelope: &EventEnvelope<E>) -> Result<(), Self::Error>;
}
