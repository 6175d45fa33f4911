//! The activation engine: registries, the asset loader, the FIFO activation
//! queue and its drain scheduler, the stall reporter, and the envelope
//! ingestor that feeds it all from the host document. See
//! [`ComponentManager`] for the crate's single entry point.

mod assets;
mod error;
mod host;
mod ingestor;
mod manager;
mod queue;
mod registry;
mod stall;

#[cfg(test)]
mod testutil;

pub use assets::WaitFuture;
pub use error::EngineError;
pub use host::Host;
pub use ingestor::run_ingestor;
pub use manager::ComponentManager;
pub use registry::{ActivationContext, CallbackFn, DataFactoryFn};
pub use stall::{StallReport, StallReporterConfig};
