//! Usage registration: the local resource record, its normalization, the repository usage
//! API, and the registrar that keeps both in sync.

pub mod normalize;
pub mod record;
pub mod registrar;
#[cfg(feature = "reqwest")] pub mod rest;
pub mod service;

pub use normalize::*;
pub use record::*;
pub use registrar::*;
#[cfg(feature = "reqwest")] pub use rest::*;
pub use service::*;
