//! Compiles URL rewrite filters into regex transforms applied by the load
//! balancer to matching requests.

use crate::LoadError;
use lb_gateway_controller_core::Reason;
use lb_gateway_controller_k8s_api::httproutes::{
    HTTPRouteRulesFiltersUrlRewrite, HTTPRouteRulesFiltersUrlRewritePathType as RewriteType,
    HTTPRouteRulesMatchesPath, HTTPRouteRulesMatchesPathType as PathType,
};

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transform {
    pub kind: TransformKind,

    /// Matched against the transformed value.
    pub regex: String,

    /// Replacement template. `$$` denotes a literal `$` and `${1}` the first
    /// capture group.
    pub replacement: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub enum TransformKind {
    #[serde(rename = "url-rewrite")]
    UrlRewrite,
    #[serde(rename = "host-header-rewrite")]
    HostHeaderRewrite,
}

/// Compiles a URL rewrite filter for a rule match with the given path.
///
/// A prefix replacement requires a prefix path match; a match without a path
/// matches the `/` prefix.
pub fn url_rewrite(
    filter: &HTTPRouteRulesFiltersUrlRewrite,
    path: Option<&HTTPRouteRulesMatchesPath>,
) -> Result<Vec<Transform>, LoadError> {
    let mut transforms = Vec::new();

    if let Some(modifier) = &filter.path {
        match modifier.r#type {
            RewriteType::ReplaceFullPath => {
                let full_path = modifier.replace_full_path.as_deref().ok_or_else(|| {
                    LoadError::invalid(
                        Reason::UnsupportedValue,
                        "ReplaceFullPath requires replaceFullPath",
                    )
                })?;
                transforms.push(replace_full_path_transform(full_path));
            }
            RewriteType::ReplacePrefixMatch => {
                let prefix = match path {
                    None => "/",
                    Some(HTTPRouteRulesMatchesPath {
                        r#type: None | Some(PathType::PathPrefix),
                        value,
                    }) => value.as_deref().unwrap_or("/"),
                    Some(_) => {
                        return Err(LoadError::invalid(
                            Reason::UnsupportedValue,
                            "ReplacePrefixMatch requires a PathPrefix match",
                        ))
                    }
                };
                let replacement = modifier.replace_prefix_match.as_deref().unwrap_or_default();
                transforms.push(replace_prefix_transform(prefix, replacement));
            }
        }
    }

    if let Some(hostname) = &filter.hostname {
        transforms.push(replace_host_transform(hostname));
    }

    Ok(transforms)
}

/// Replaces the path, preserving any query string.
pub fn replace_full_path_transform(path: &str) -> Transform {
    Transform {
        kind: TransformKind::UrlRewrite,
        regex: "^([^?]*)".to_string(),
        replacement: literal(path),
    }
}

/// Replaces the matched `prefix` with `replacement`, keeping the remainder
/// of the path.
pub fn replace_prefix_transform(prefix: &str, replacement: &str) -> Transform {
    let prefix = prefix.trim_end_matches('/');
    let regex = format!("^{}(/?)", regex::escape(prefix));

    let replacement = if replacement.is_empty() {
        "/"
    } else {
        replacement
    };
    let mut template = literal(replacement);
    if !replacement.ends_with('/') {
        template.push_str("${1}");
    }

    Transform {
        kind: TransformKind::UrlRewrite,
        regex,
        replacement: template,
    }
}

/// Replaces the whole Host header.
pub fn replace_host_transform(hostname: &str) -> Transform {
    Transform {
        kind: TransformKind::HostHeaderRewrite,
        regex: "^.*$".to_string(),
        replacement: literal(hostname),
    }
}

fn literal(s: &str) -> String {
    s.replace('$', "$$")
}
