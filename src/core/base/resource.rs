//! Resource Wrappers
use serde::{Deserialize, Serialize};
use std::fmt;

/// `Level` is the granularity a circuit breaking rule protects.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    Service,
    Method,
    Instance,
}

impl Default for Level {
    fn default() -> Level {
        Level::Service
    }
}

impl Level {
    pub const ALL: [Level; 3] = [Level::Service, Level::Method, Level::Instance];
}

/// `ServiceKey` identifies a service inside a namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceKey {
    pub namespace: String,
    pub service: String,
}

impl ServiceKey {
    pub fn new<N: Into<String>, S: Into<String>>(namespace: N, service: S) -> Self {
        ServiceKey {
            namespace: namespace.into(),
            service: service.into(),
        }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.service)
    }
}

/// `Resource` is the identity of a protectable unit, it is also the key of the circuit state caches.
/// Equality and hashing are derived from the fields only,
/// so two logically equal resources always land on the same circuit state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    Service {
        service: ServiceKey,
    },
    Method {
        service: ServiceKey,
        path: String,
    },
    Instance {
        service: ServiceKey,
        host: String,
        port: u32,
    },
}

impl Resource {
    pub fn service<N: Into<String>, S: Into<String>>(namespace: N, service: S) -> Self {
        Resource::Service {
            service: ServiceKey::new(namespace, service),
        }
    }

    pub fn method<N: Into<String>, S: Into<String>, P: Into<String>>(
        namespace: N,
        service: S,
        path: P,
    ) -> Self {
        Resource::Method {
            service: ServiceKey::new(namespace, service),
            path: path.into(),
        }
    }

    pub fn instance<N: Into<String>, S: Into<String>, H: Into<String>>(
        namespace: N,
        service: S,
        host: H,
        port: u32,
    ) -> Self {
        Resource::Instance {
            service: ServiceKey::new(namespace, service),
            host: host.into(),
            port,
        }
    }

    pub fn level(&self) -> Level {
        match self {
            Resource::Service { .. } => Level::Service,
            Resource::Method { .. } => Level::Method,
            Resource::Instance { .. } => Level::Instance,
        }
    }

    /// the destination service this resource belongs to
    pub fn service_key(&self) -> &ServiceKey {
        match self {
            Resource::Service { service }
            | Resource::Method { service, .. }
            | Resource::Instance { service, .. } => service,
        }
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            Resource::Method { path, .. } => Some(path),
            _ => None,
        }
    }

    /// `parents` returns the coarser resources whose circuit also guards this resource,
    /// from the most specific one to the least specific one.
    pub fn parents(&self) -> Vec<Resource> {
        match self {
            Resource::Service { .. } => Vec::new(),
            Resource::Method { service, .. } | Resource::Instance { service, .. } => {
                vec![Resource::Service {
                    service: service.clone(),
                }]
            }
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Service { service } => write!(f, "service({})", service),
            Resource::Method { service, path } => write!(f, "method({}#{})", service, path),
            Resource::Instance {
                service,
                host,
                port,
            } => write!(f, "instance({}@{}:{})", service, host, port),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(res: &Resource) -> u64 {
        let mut hasher = DefaultHasher::new();
        res.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn equal_resources_hash_equal() {
        let a = Resource::method("default", "echo", "/echo");
        let b = Resource::Method {
            path: String::from("/echo"),
            service: ServiceKey {
                service: "echo".into(),
                namespace: "default".into(),
            },
        };
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a, Resource::method("default", "echo", "/other"));
        assert_ne!(
            Resource::service("default", "echo"),
            Resource::service("test", "echo")
        );
    }

    #[test]
    fn levels_and_parents() {
        let ins = Resource::instance("default", "echo", "127.0.0.1", 8080);
        assert_eq!(ins.level(), Level::Instance);
        assert_eq!(ins.parents(), vec![Resource::service("default", "echo")]);
        assert_eq!(ins.path(), None);
        let svc = Resource::service("default", "echo");
        assert!(svc.parents().is_empty());
        assert_eq!(svc.service_key(), ins.service_key());
        assert_eq!(
            format!("{}", Resource::method("default", "echo", "/ping")),
            "method(default/echo#/ping)"
        );
    }
}
