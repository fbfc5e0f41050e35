//! Kubernetes label selectors, as used by a listener's
//! `allowedRoutes.namespaces.selector`.

use crate::gateways::GatewayListenersAllowedRoutesNamespacesSelector as ListenerSelector;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub type Map = BTreeMap<String, String>;

/// The labels of a single resource.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Labels(Map);

/// A label query over a set of resources.
///
/// The requirements of `matchLabels` and `matchExpressions` are ANDed; a
/// selector without requirements selects everything.
#[derive(Clone, Debug, Eq, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_labels: Option<Map>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_expressions: Option<Vec<Requirement>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Requirement {
    pub key: String,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<BTreeSet<String>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum Operator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid label selector operator: {0:?}")]
pub struct InvalidOperator(String);

// === impl Selector ===

impl Selector {
    pub fn matches(&self, labels: &Labels) -> bool {
        let labels_match = self
            .match_labels
            .iter()
            .flatten()
            .all(|(key, value)| labels.get(key) == Some(value.as_str()));

        labels_match
            && self
                .match_expressions
                .iter()
                .flatten()
                .all(|req| req.matches(labels))
    }
}

impl<K: ToString, V: ToString> FromIterator<(K, V)> for Selector {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            match_labels: Some(
                iter.into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            match_expressions: None,
        }
    }
}

/// Converts a listener's namespace selector. The Gateway API types carry the
/// operator as a plain string, so an unknown operator fails the conversion.
impl TryFrom<&ListenerSelector> for Selector {
    type Error = InvalidOperator;

    fn try_from(selector: &ListenerSelector) -> Result<Self, Self::Error> {
        let match_expressions = selector
            .match_expressions
            .as_ref()
            .map(|exprs| {
                exprs
                    .iter()
                    .map(|expr| {
                        Ok(Requirement {
                            key: expr.key.clone(),
                            operator: expr.operator.parse()?,
                            values: expr.values.as_ref().map(|vs| vs.iter().cloned().collect()),
                        })
                    })
                    .collect::<Result<Vec<_>, InvalidOperator>>()
            })
            .transpose()?;

        Ok(Self {
            match_labels: selector.match_labels.clone(),
            match_expressions,
        })
    }
}

impl FromIterator<Requirement> for Selector {
    fn from_iter<T: IntoIterator<Item = Requirement>>(iter: T) -> Self {
        Self {
            match_labels: None,
            match_expressions: Some(iter.into_iter().collect()),
        }
    }
}

// === impl Requirement ===

impl Requirement {
    pub fn new<'v>(
        key: impl ToString,
        operator: Operator,
        values: impl IntoIterator<Item = &'v str>,
    ) -> Self {
        let values = values
            .into_iter()
            .map(str::to_string)
            .collect::<BTreeSet<_>>();
        Self {
            key: key.to_string(),
            operator,
            values: (!values.is_empty()).then_some(values),
        }
    }

    fn matches(&self, labels: &Labels) -> bool {
        let value = labels.get(&self.key);
        let listed = |v: &str| self.values.as_ref().is_some_and(|vs| vs.contains(v));
        match self.operator {
            Operator::In => value.is_some_and(listed),
            Operator::NotIn => !value.is_some_and(listed),
            Operator::Exists => value.is_some(),
            Operator::DoesNotExist => value.is_none(),
        }
    }
}

// === impl Operator ===

impl std::str::FromStr for Operator {
    type Err = InvalidOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "In" => Ok(Self::In),
            "NotIn" => Ok(Self::NotIn),
            "Exists" => Ok(Self::Exists),
            "DoesNotExist" => Ok(Self::DoesNotExist),
            _ => Err(InvalidOperator(s.to_string())),
        }
    }
}

// === impl Labels ===

impl Labels {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

impl From<Option<Map>> for Labels {
    fn from(labels: Option<Map>) -> Self {
        Self(labels.unwrap_or_default())
    }
}

impl<K: ToString, V: ToString> FromIterator<(K, V)> for Labels {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}
