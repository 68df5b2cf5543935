//! Core systems for Enhanced Grid.
//!
//! This crate provides the foundational pieces shared by the grid controller:
//!
//! - **Signal/Slot System**: Type-safe change notification
//! - **Property System**: Values with change detection
//! - **Errors**: The [`GridError`] taxonomy and [`Result`] alias
//! - **Logging**: `tracing` targets for each grid subsystem
//!
//! # Signal/Slot Example
//!
//! ```
//! use enhanced_grid_core::Signal;
//!
//! // Create a signal that notifies when a value changes
//! let value_changed = Signal::<i32>::new();
//!
//! // Connect a slot to handle the signal
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! // Emit the signal
//! value_changed.emit(42);
//!
//! // Disconnect when done
//! value_changed.disconnect(conn_id);
//! ```
//!
//! # Property Example
//!
//! ```
//! use enhanced_grid_core::{Property, Signal};
//!
//! struct FilterButton {
//!     active: Property<bool>,
//!     active_changed: Signal<bool>,
//! }
//!
//! impl FilterButton {
//!     fn set_active(&self, active: bool) {
//!         if self.active.set(active) {
//!             self.active_changed.emit(active);
//!         }
//!     }
//! }
//! ```

mod error;
pub mod logging;
pub mod property;
pub mod signal;

pub use error::{BackendError, GridError, Result};
pub use property::Property;
pub use signal::{ConnectionId, Signal};
