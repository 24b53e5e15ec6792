//! `argus-middleware` – Coordination primitives
//!
//! The only state shared between execution contexts lives here:
//!
//! - [`slot`] – [`HandoffSlot`][slot::HandoffSlot]: a bounded, latest-wins,
//!   non-blocking hand-off cell connecting the detector thread to the bridge
//!   loop without propagating backpressure.
//! - [`shutdown`] – [`Shutdown`][shutdown::Shutdown]: the injected
//!   cooperative-cancellation token every loop polls at its checkpoint.

pub mod shutdown;
pub mod slot;

pub use shutdown::Shutdown;
pub use slot::HandoffSlot;
