//! Integration-event mechanics (framework only, no business rules).
//!
//! Invoice lifecycle events are published here after the originating use case
//! commits; stock consumption and ledger posting subscribe as independent
//! idempotent handlers. The bus is the coupling point — the inventory ledger
//! and the journal never call each other directly.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod handler;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use handler::EventHandler;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
