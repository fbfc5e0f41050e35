//! Compiles a Gateway and the routes that reference it into ordered load
//! balancer rule tables.
//!
//! A compilation pass runs the following stages for a single Gateway:
//!
//! 1. [`listeners`] validates the Gateway's listeners for the controller
//!    class;
//! 2. [`attachment`] decides which routes attach to which listeners;
//! 3. [`loader`] materializes each attached route's rules, resolving backends
//!    through [`backend`];
//! 4. [`classify`] sizes target group demand;
//! 5. [`precedence`] orders every rule match into the final table, with
//!    [`transform`] producing request rewrites for each entry.
//!
//! All state is owned by the pass; nothing is shared between invocations.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod attachment;
pub mod backend;
pub mod classify;
mod compiler;
mod error;
pub mod hostname;
pub mod listeners;
pub mod loader;
pub mod precedence;
mod store;
pub mod transform;


pub use self::{
    attachment::{Attachments, NamespaceLabels, RouteFailure},
    classify::{RuleClass, TargetGroupDemand},
    compiler::{compile, Compiled},
    error::LoadError,
    listeners::{ListenerStatus, ValidatedListeners},
    loader::{LoadedRoute, LoadedRule, RawRule},
    precedence::RulePrecedence,
    store::MemoryStore,
    transform::{Transform, TransformKind},
};
