//! Request extractors shared by the route modules.

pub mod client;
pub mod path_id;
pub mod principal;

pub use client::ClientInfo;
pub use path_id::PathId;
pub use principal::{AdminToken, MaybePrincipal, Principal};
