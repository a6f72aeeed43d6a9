//! Rendering seam.
//!
//! # Responsibilities
//! - Describe output as opaque [`Template`] values
//! - Hold the live output of one position in a [`RenderSlot`]
//! - Drive a slot from a reactive source ([`AsyncBinding`])
//! - Run mount-time interactions on a freshly committed element
//!
//! # Data Flow
//! ```text
//! Widget / matcher ──► Render ──► RenderSlot::commit ──► watch subscribers
//!                                      ▲
//! Source<T> ──► AsyncBinding (mapper) ─┘
//! ```

pub mod bridge;
pub mod interact;
pub mod slot;
pub mod template;

use thiserror::Error;

pub use bridge::{AsyncBinding, BindingStatus, Mapper};
pub use interact::{interact, Interaction};
pub use slot::{RenderSlot, SlotSnapshot};
pub use template::{Render, Template};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The template has no element to attach an interaction to.
    #[error("template did not produce an element to mount")]
    MalformedMount,
}
