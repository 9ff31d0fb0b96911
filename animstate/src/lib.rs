//! Single-track skeletal animation state.
//!
//! [`AnimationState`] plays one animation at a time on a [`Skeleton`], cross-fades out of the
//! animation it replaced, activates queued animations after a delay, and notifies listeners when
//! tracks start, end, complete a loop or cross a keyed event.
//!
//! Loading exported assets and rendering are out of scope; setup data is built directly from the
//! types in this crate (or deserialized with the `serde` feature).

#![forbid(unsafe_code)]

mod error;
mod model;
mod runtime;

pub use error::*;
pub use model::*;
pub use runtime::*;
