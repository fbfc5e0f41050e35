#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod listener;
mod reason;
pub mod routes;
mod store;

pub use self::{
    backend::{Backend, BackendTarget, Resolution},
    listener::{ControllerClass, Listener, NamespacePolicy, Protocol},
    reason::Reason,
    routes::{Route, RouteId, RouteKind},
    store::ResourceStore,
};
