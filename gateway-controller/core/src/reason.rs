use std::fmt;

/// Condition reasons published on listener and route status.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub enum Reason {
    InvalidRouteKinds,
    PortUnavailable,
    UnsupportedProtocol,
    ProtocolConflict,
    HostnameConflict,
    NoMatchingParent,
    NotAllowedByListeners,
    NoMatchingListenerHostname,
    RefNotPermitted,
    BackendNotFound,
    UnsupportedValue,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRouteKinds => "InvalidRouteKinds",
            Self::PortUnavailable => "PortUnavailable",
            Self::UnsupportedProtocol => "UnsupportedProtocol",
            Self::ProtocolConflict => "ProtocolConflict",
            Self::HostnameConflict => "HostnameConflict",
            Self::NoMatchingParent => "NoMatchingParent",
            Self::NotAllowedByListeners => "NotAllowedByListeners",
            Self::NoMatchingListenerHostname => "NoMatchingListenerHostname",
            Self::RefNotPermitted => "RefNotPermitted",
            Self::BackendNotFound => "BackendNotFound",
            Self::UnsupportedValue => "UnsupportedValue",
        }
    }

    /// The status condition type a reason is reported under.
    pub fn condition_type(&self) -> &'static str {
        match self {
            Self::ProtocolConflict | Self::HostnameConflict => "Conflicted",
            Self::InvalidRouteKinds | Self::RefNotPermitted | Self::BackendNotFound => {
                "ResolvedRefs"
            }
            Self::PortUnavailable
            | Self::UnsupportedProtocol
            | Self::NoMatchingParent
            | Self::NotAllowedByListeners
            | Self::NoMatchingListenerHostname
            | Self::UnsupportedValue => "Accepted",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
