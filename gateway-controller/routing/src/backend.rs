//! Resolves route backend references into forwarding targets.
//!
//! References into another namespace must be permitted by a ReferenceGrant in
//! the target namespace. A reference that is not permitted resolves exactly
//! like one whose target does not exist, so that route authors cannot discover
//! resources in namespaces they have no access to.

use crate::LoadError;
use anyhow::Result;
use lb_gateway_controller_core::{
    Backend, BackendTarget, Reason, ResourceStore, Resolution, RouteId,
};
use lb_gateway_controller_k8s_api::{
    self as k8s, BackendRef, Gateway, ReferenceGrant, Service, TargetGroupConfiguration,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum TargetKind {
    Service,
    Gateway,
}

/// Resolves a single backend reference of the route `route`.
///
/// Returns `Ok(None)` when the reference produces no backend: its weight is
/// zero, it is not permitted, or its target does not exist.
pub async fn resolve<S>(
    store: &S,
    route: &RouteId,
    backend_ref: &BackendRef,
) -> Result<Option<Backend>, LoadError>
where
    S: ResourceStore + ?Sized,
{
    let kind = if k8s::targets_kind::<Service>(backend_ref.group.as_deref(), backend_ref.kind()) {
        TargetKind::Service
    } else if k8s::targets_kind::<Gateway>(backend_ref.group.as_deref(), backend_ref.kind()) {
        TargetKind::Gateway
    } else {
        return Err(LoadError::invalid(
            Reason::UnsupportedValue,
            format!("unsupported backend kind {}", backend_ref.kind()),
        ));
    };

    let weight = match backend_ref.weight {
        None => 1,
        Some(0) => return Ok(None),
        Some(w) => u32::try_from(w).map_err(|_| {
            LoadError::invalid(
                Reason::UnsupportedValue,
                format!("backend {} has a negative weight", backend_ref.name),
            )
        })?,
    };

    let port = backend_ref
        .port
        .ok_or_else(|| {
            LoadError::invalid(
                Reason::UnsupportedValue,
                format!("backend {} does not specify a port", backend_ref.name),
            )
        })
        .and_then(|port| {
            u16::try_from(port).ok().filter(|p| *p != 0).ok_or_else(|| {
                LoadError::invalid(
                    Reason::UnsupportedValue,
                    format!("backend {} port {port} is invalid", backend_ref.name),
                )
            })
        })?;

    let namespace = backend_ref.namespace.as_deref().unwrap_or(&route.namespace);
    let target = if namespace != route.namespace
        && !is_permitted(store, route, kind, namespace, &backend_ref.name).await?
    {
        Resolution::NotAuthorizedOrAbsent
    } else {
        match kind {
            TargetKind::Service => {
                service_target(store, namespace, &backend_ref.name, port).await?
            }
            TargetKind::Gateway => {
                gateway_target(store, namespace, &backend_ref.name, port).await?
            }
        }
    };
    let Some(target) = target.into_option() else {
        tracing::debug!(
            route = %route,
            %namespace,
            name = %backend_ref.name,
            kind = ?kind,
            "Backend reference is not permitted or does not exist"
        );
        return Ok(None);
    };

    let target_group_configuration = match kind {
        TargetKind::Service => {
            target_group_configuration(store, namespace, &backend_ref.name).await?
        }
        TargetKind::Gateway => None,
    };

    Ok(Some(Backend {
        target,
        weight,
        target_group_configuration,
    }))
}

/// Checks the ReferenceGrants in `namespace` for one that lets `route`
/// reference the named target.
async fn is_permitted<S>(
    store: &S,
    route: &RouteId,
    kind: TargetKind,
    namespace: &str,
    name: &str,
) -> Result<bool>
where
    S: ResourceStore + ?Sized,
{
    let grants = store.list_reference_grants(namespace).await?;
    Ok(grants.iter().any(|grant| permits(grant, route, kind, name)))
}

async fn service_target<S>(
    store: &S,
    namespace: &str,
    name: &str,
    port: u16,
) -> Result<Resolution<BackendTarget>, LoadError>
where
    S: ResourceStore + ?Sized,
{
    let Some(service) = store.get_service(namespace, name).await? else {
        return Ok(Resolution::NotAuthorizedOrAbsent);
    };

    let service_port = service
        .spec
        .iter()
        .flat_map(|spec| spec.ports.iter().flatten())
        .find(|sp| sp.port == i32::from(port))
        .cloned()
        .ok_or_else(|| {
            LoadError::invalid(
                Reason::BackendNotFound,
                format!("service {namespace}/{name} has no port {port}"),
            )
        })?;

    Ok(Resolution::Resolved(BackendTarget::Service {
        service,
        port: service_port,
    }))
}

async fn gateway_target<S>(
    store: &S,
    namespace: &str,
    name: &str,
    port: u16,
) -> Result<Resolution<BackendTarget>, LoadError>
where
    S: ResourceStore + ?Sized,
{
    let Some(gateway) = store.get_gateway(namespace, name).await? else {
        return Ok(Resolution::NotAuthorizedOrAbsent);
    };

    let address = k8s::gateway_addresses(&gateway)
        .next()
        .map(str::to_string)
        .ok_or_else(|| {
            LoadError::invalid(
                Reason::BackendNotFound,
                format!("gateway {namespace}/{name} has no provisioned address"),
            )
        })?;

    Ok(Resolution::Resolved(BackendTarget::Gateway {
        gateway,
        port,
        address,
    }))
}

/// Finds the TargetGroupConfiguration for a Service.
///
/// At most one configuration may reference a Service. If several do, the
/// first one listed is used.
async fn target_group_configuration<S>(
    store: &S,
    namespace: &str,
    service: &str,
) -> Result<Option<TargetGroupConfiguration>>
where
    S: ResourceStore + ?Sized,
{
    let mut matching = store
        .list_target_group_configurations(namespace)
        .await?
        .into_iter()
        .filter(|tgc| tgc.spec.target_reference.targets_service(service));

    let first = matching.next();
    let extra = matching.count();
    if extra > 0 {
        tracing::warn!(
            %namespace,
            %service,
            count = extra + 1,
            "Multiple TargetGroupConfigurations reference the same service"
        );
    }
    Ok(first)
}

/// Returns true if `grant` permits routes of the given kind in the route's
/// namespace to reference the named target.
fn permits(grant: &ReferenceGrant, route: &RouteId, kind: TargetKind, name: &str) -> bool {
    let from = grant.spec.from.iter().any(|from| {
        from.group == k8s::GATEWAY_API_GROUP
            && from.kind == route.kind.kind_name()
            && from.namespace == route.namespace
    });
    if !from {
        return false;
    }

    grant.spec.to.iter().any(|to| {
        let kind_matches = match kind {
            TargetKind::Service => k8s::targets_kind::<Service>(Some(&to.group), &to.kind),
            TargetKind::Gateway => k8s::targets_kind::<Gateway>(Some(&to.group), &to.kind),
        };
        kind_matches && to.name.as_deref().is_none_or(|n| n == name)
    })
}
