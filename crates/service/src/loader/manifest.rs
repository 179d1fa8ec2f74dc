use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Opaque service object owned by the loader; business modules downcast to
/// their concrete type at the call site.
pub type ServiceInstance = Arc<dyn Any + Send + Sync>;

/// Collaborating services handed to a factory on first construction.
pub type ServiceDeps = HashMap<String, ServiceInstance>;

/// Constructor for a module service; errors become `ConstructionFailure`s.
pub type ServiceFactory =
    Arc<dyn Fn(&ServiceDeps) -> Result<ServiceInstance, String> + Send + Sync>;

/// Invocable unit backing a route or middleware component. The surrounding
/// HTTP layer adapts these to its own request/response types.
pub type HandlerRef = Arc<dyn Fn(serde_json::Value) -> serde_json::Value + Send + Sync>;

pub struct ServiceSpec {
    pub name: String,
    pub factory: ServiceFactory,
}

pub struct RouteComponentSpec {
    pub name: String,
    pub path: String,
    pub handler: HandlerRef,
}

pub struct MiddlewareSpec {
    pub name: String,
    pub handler: HandlerRef,
}

/// Explicit component manifest a module registers at its own initialization.
/// The loader materializes only what a manifest declares; no directory scans.
pub struct ModuleManifest {
    pub module_code: String,
    pub models: Vec<String>,
    pub services: Vec<ServiceSpec>,
    pub routes: Vec<RouteComponentSpec>,
    pub middleware: Vec<MiddlewareSpec>,
}

impl ModuleManifest {
    pub fn new(module_code: impl Into<String>) -> Self {
        Self {
            module_code: module_code.into(),
            models: Vec::new(),
            services: Vec::new(),
            routes: Vec::new(),
            middleware: Vec::new(),
        }
    }

    pub fn with_model(mut self, name: impl Into<String>) -> Self {
        self.models.push(name.into());
        self
    }

    pub fn with_service(mut self, name: impl Into<String>, factory: ServiceFactory) -> Self {
        self.services.push(ServiceSpec { name: name.into(), factory });
        self
    }

    pub fn with_route(
        mut self,
        name: impl Into<String>,
        path: impl Into<String>,
        handler: HandlerRef,
    ) -> Self {
        self.routes.push(RouteComponentSpec { name: name.into(), path: path.into(), handler });
        self
    }

    pub fn with_middleware(mut self, name: impl Into<String>, handler: HandlerRef) -> Self {
        self.middleware.push(MiddlewareSpec { name: name.into(), handler });
        self
    }
}
