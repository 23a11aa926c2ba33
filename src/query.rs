//! Named query operations and their GraphQL documents.
//!
//! Each operation carries the document the backend expects, with response
//! fields aliased into the `{value, label}` shape selector widgets consume.

use std::fmt;

/// A named query operation against the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// List services in a layer.
    Services,
    /// List the instances of a service within a time range.
    Instances,
}

const QUERY_SERVICES: &str = "\
query queryServices($layer: String!) {
  services: listServices(layer: $layer) {
    value: id
    label: name
  }
}";

const QUERY_INSTANCES: &str = "\
query queryInstances($serviceId: ID!, $duration: Duration!) {
  pods: listInstances(duration: $duration, serviceId: $serviceId) {
    value: id
    label: name
  }
}";

impl Operation {
    /// The operation name, as it appears in the document.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Services => "queryServices",
            Self::Instances => "queryInstances",
        }
    }

    /// The GraphQL document sent for this operation.
    pub const fn document(self) -> &'static str {
        match self {
            Self::Services => QUERY_SERVICES,
            Self::Instances => QUERY_INSTANCES,
        }
    }

    /// The key under `data` the success payload lives at.
    pub const fn payload_key(self) -> &'static str {
        match self {
            Self::Services => "services",
            Self::Instances => "pods",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
