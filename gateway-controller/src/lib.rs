#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub use lb_gateway_controller_core as core;
pub use lb_gateway_controller_k8s_api as k8s;
pub use lb_gateway_controller_routing as routing;

mod args;
mod cluster;
pub mod manifests;
pub mod output;

pub use self::{
    args::{Args, GatewayRef},
    cluster::ClusterStore,
    manifests::ManifestError,
    output::Report,
};
