use crate::function::Function;

/// CORS policy applied to every route of the API
#[derive(Debug, Clone, PartialEq)]
pub struct Cors {
    pub allow_origins: Vec<String>,
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
    pub allow_credentials: bool,
}

/// Managed HTTP entry point forwarding requests to the compute resource
///
/// The API declares a single catch-all route: any method on any path is
/// proxied to the target function.
#[derive(Debug, Clone)]
pub struct RestApi {
    pub logical_id: String,
    pub name: String,
    pub cors: Cors,
    proxy_target: Option<String>,
}

impl RestApi {
    pub fn new(logical_id: impl Into<String>, name: impl Into<String>, cors: Cors) -> Self {
        RestApi {
            logical_id: logical_id.into(),
            name: name.into(),
            cors,
            proxy_target: None,
        }
    }

    /// Forward every method and path to the function
    pub fn add_proxy(&mut self, function: &Function) {
        self.proxy_target = Some(function.logical_id.clone());
    }

    /// Logical id of the integrated function, if a proxy route was added
    pub fn proxy_target(&self) -> Option<&str> {
        self.proxy_target.as_deref()
    }
}
