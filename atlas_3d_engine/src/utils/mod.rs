//! Small shared building blocks: touch tracking, listener registries,
//! typed factories, unique indices and lock helpers.

mod emitter;
mod factory;
mod sync;
mod touchable;
mod unique_index;

pub use emitter::{Emitter, ListenerKey};
pub use factory::{Constructor, Factory};
pub use touchable::Touchable;
pub use unique_index::IndexCounter;

pub(crate) use sync::{lock, read, write};
