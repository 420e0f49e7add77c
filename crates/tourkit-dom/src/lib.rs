#![forbid(unsafe_code)]

//! Host document model for TourKit.
//!
//! # Role in TourKit
//! The tour engine never talks to a browser directly. It talks to a
//! [`Document`]: a live element tree with viewport-relative geometry, a
//! scrollable window and a click side effect. A browser binding implements
//! the trait over the real DOM; [`MemoryDocument`] implements it in memory for
//! tests, demos and headless hosts.
//!
//! # Primary responsibilities
//! - **Selectors**: CSS selector parsing and matching against any document.
//! - **Document**: the host trait plus provided queries (`query_selector`,
//!   `closest`, `descendants`).
//! - **Mutations**: records a change observer filters.
//! - **Fixtures**: a representative construction dashboard document.

pub mod document;
pub mod fixture;
pub mod memory;
pub mod mutation;
pub mod selector;

pub use document::{Document, DomError, NodeId};
pub use memory::{MemoryDocument, NodeSpec};
pub use mutation::{MutationKind, MutationRecord};
pub use selector::{Selector, SelectorError};
