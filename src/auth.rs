//! Repository identifiers, object reference parsing, and caller identity resolution.

pub mod id;
pub mod key;
pub mod reference;
pub mod secret;

pub use id::*;
pub use key::*;
pub use reference::*;
pub use secret::*;
