//! Loads resources from YAML manifests so a Gateway can be compiled without
//! a cluster.
//!
//! Each file may hold several documents. `List` documents, as written by
//! `kubectl get -o yaml`, are flattened. Documents of kinds the compiler
//! does not read are skipped.

use crate::{
    k8s::{
        GRPCRoute, Gateway, HTTPRoute, Namespace, ReferenceGrant, Resource, Service,
        TargetGroupConfiguration, TCPRoute, TLSRoute, UDPRoute,
    },
    routing::MemoryStore,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_yaml::Value;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{}: document {index} has no kind", .path.display())]
    MissingKind { path: PathBuf, index: usize },
}

/// Loads every manifest under `paths`.
///
/// Directories are read recursively in file name order; only files with a
/// `yaml`, `yml` or `json` extension are considered.
pub fn load(paths: &[PathBuf]) -> Result<MemoryStore, ManifestError> {
    let mut store = MemoryStore::default();
    for path in paths {
        store = load_path(store, path)?;
    }
    Ok(store)
}

fn load_path(mut store: MemoryStore, path: &Path) -> Result<MemoryStore, ManifestError> {
    let read_error = |source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    };

    if path.is_dir() {
        let mut entries = std::fs::read_dir(path)
            .map_err(read_error)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(read_error)?;
        entries.sort();
        for entry in entries {
            if entry.is_dir() || is_manifest(&entry) {
                store = load_path(store, &entry)?;
            }
        }
        return Ok(store);
    }

    let contents = std::fs::read_to_string(path).map_err(read_error)?;
    parse(store, &contents).map_err(|error| match error {
        ParseError::Yaml(source) => ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        },
        ParseError::MissingKind(index) => ManifestError::MissingKind {
            path: path.to_path_buf(),
            index,
        },
    })
}

fn is_manifest(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml" | "json")
    )
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error("document {0} has no kind")]
    MissingKind(usize),
}

/// Adds the resources in a multi-document YAML string to `store`.
pub fn parse(mut store: MemoryStore, contents: &str) -> Result<MemoryStore, ParseError> {
    for (index, document) in serde_yaml::Deserializer::from_str(contents).enumerate() {
        let value = Value::deserialize(document)?;
        if value.is_null() {
            continue;
        }
        store = add(store, value, index)?;
    }
    Ok(store)
}

fn add(store: MemoryStore, value: Value, index: usize) -> Result<MemoryStore, ParseError> {
    let kind = value
        .get("kind")
        .and_then(Value::as_str)
        .ok_or(ParseError::MissingKind(index))?
        .to_string();
    let group = value
        .get("apiVersion")
        .and_then(Value::as_str)
        .and_then(|v| v.rsplit_once('/'))
        .map(|(group, _)| group.to_string())
        .unwrap_or_default();

    if kind == "List" {
        let items = match value.get("items") {
            Some(Value::Sequence(items)) => items.clone(),
            _ => vec![],
        };
        return items
            .into_iter()
            .try_fold(store, |store, item| add(store, item, index));
    }

    let store = match (group.as_str(), kind.as_str()) {
        ("", "Namespace") => store.with_namespace(decode::<Namespace>(value, false)?),
        ("", "Service") => store.with_service(decode::<Service>(value, true)?),
        _ if is::<Gateway>(&group, &kind) => store.with_gateway(decode::<Gateway>(value, true)?),
        _ if is::<HTTPRoute>(&group, &kind) => store.with_route(decode::<HTTPRoute>(value, true)?),
        _ if is::<GRPCRoute>(&group, &kind) => store.with_route(decode::<GRPCRoute>(value, true)?),
        _ if is::<TCPRoute>(&group, &kind) => store.with_route(decode::<TCPRoute>(value, true)?),
        _ if is::<TLSRoute>(&group, &kind) => store.with_route(decode::<TLSRoute>(value, true)?),
        _ if is::<UDPRoute>(&group, &kind) => store.with_route(decode::<UDPRoute>(value, true)?),
        _ if is::<ReferenceGrant>(&group, &kind) => {
            store.with_reference_grant(decode::<ReferenceGrant>(value, true)?)
        }
        _ if is::<TargetGroupConfiguration>(&group, &kind) => {
            store.with_target_group_configuration(decode::<TargetGroupConfiguration>(value, true)?)
        }
        _ => {
            tracing::debug!(%group, %kind, document = index, "Skipping unsupported resource");
            store
        }
    };
    Ok(store)
}

/// Matches on group and kind; any version of a kind is decoded with the
/// same bindings.
fn is<T: Resource<DynamicType = ()>>(group: &str, kind: &str) -> bool {
    T::group(&()) == group && T::kind(&()) == kind
}

/// Decodes a resource, placing namespaced resources without a namespace in
/// `default` as `kubectl apply` would.
fn decode<T>(value: Value, namespaced: bool) -> Result<T, serde_yaml::Error>
where
    T: Resource + DeserializeOwned,
{
    let mut resource = serde_yaml::from_value::<T>(value)?;
    if namespaced {
        resource
            .meta_mut()
            .namespace
            .get_or_insert_with(|| "default".to_string());
    }
    Ok(resource)
}
