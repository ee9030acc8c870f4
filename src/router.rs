//! Radix-tree request router with route groups.
//!
//! One tree per HTTP method, O(path-length) lookup. Routes either live at
//! the top level or inside a [`Group`] that shares a path prefix, an optional
//! basic-auth account and a list of middlewares.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};
use crate::middleware::{BasicAuth, BasicAuthAccount, BoxedMiddleware, Middleware};

/// Per-group settings: path prefix, basic auth and scoped middlewares.
#[derive(Clone, Default)]
pub struct RouterInfo {
    group_path: String,
    basic_auth: Option<BasicAuthAccount>,
    middlewares: Vec<BoxedMiddleware>,
}

impl RouterInfo {
    pub fn new(group_path: impl Into<String>) -> Self {
        Self { group_path: group_path.into(), ..Self::default() }
    }

    /// Requires this account on every route of the group.
    pub fn basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic_auth = Some(BasicAuthAccount::new(username, password));
        self
    }

    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn group_path(&self) -> &str { &self.group_path }
    pub fn account(&self) -> Option<&BasicAuthAccount> { self.basic_auth.as_ref() }
}

#[derive(Clone)]
pub(crate) struct Route {
    pub(crate) handler: BoxedHandler,
    pub(crate) middlewares: Arc<[BoxedMiddleware]>,
}

/// Routes sharing a [`RouterInfo`]. Mount with [`Router::mount`].
///
/// ```rust,no_run
/// # use rampart::{BoxError, Group, Request, Response, Router, RouterInfo};
/// # async fn invoke(_: Request) -> Result<Response, BoxError> { Ok(Response::text("")) }
/// let auth = Group::new(RouterInfo::new("auth").basic_auth("acexy", "acexy"))
///     .get("invoke", invoke);
///
/// let app = Router::new().mount(auth);
/// ```
pub struct Group {
    prefix: String,
    middlewares: Arc<[BoxedMiddleware]>,
    routes: Vec<(Method, String, BoxedHandler)>,
}

impl Group {
    pub fn new(info: RouterInfo) -> Self {
        let mut middlewares: Vec<BoxedMiddleware> = Vec::with_capacity(info.middlewares.len() + 1);
        if let Some(account) = info.basic_auth {
            middlewares.push(Arc::new(BasicAuth::new([account])));
        }
        middlewares.extend(info.middlewares);
        Self { prefix: info.group_path, middlewares: middlewares.into(), routes: Vec::new() }
    }

    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.on_many(&[method], path, handler)
    }

    /// Registers one handler for several methods.
    pub fn on_many(mut self, methods: &[Method], path: &str, handler: impl Handler) -> Self {
        let handler = handler.into_boxed_handler();
        for method in methods {
            self.routes.push((method.clone(), path.to_owned(), Arc::clone(&handler)));
        }
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self { self.on(Method::GET, path, handler) }
    pub fn post(self, path: &str, handler: impl Handler) -> Self { self.on(Method::POST, path, handler) }
    pub fn put(self, path: &str, handler: impl Handler) -> Self { self.on(Method::PUT, path, handler) }
    pub fn delete(self, path: &str, handler: impl Handler) -> Self { self.on(Method::DELETE, path, handler) }
    pub fn patch(self, path: &str, handler: impl Handler) -> Self { self.on(Method::PATCH, path, handler) }
    pub fn head(self, path: &str, handler: impl Handler) -> Self { self.on(Method::HEAD, path, handler) }
    pub fn options(self, path: &str, handler: impl Handler) -> Self { self.on(Method::OPTIONS, path, handler) }
    pub fn trace(self, path: &str, handler: impl Handler) -> Self { self.on(Method::TRACE, path, handler) }
}

pub(crate) enum Lookup {
    Found(Route, HashMap<String, String>),
    MethodNotAllowed,
    NotFound,
}

/// The application router.
///
/// Build it once at startup and hand it to [`App::new`](crate::App::new).
/// Registration methods return `self` so they chain.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<Route>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Registers a top-level handler. Path parameters use `{name}` syntax.
    ///
    /// # Panics
    ///
    /// Panics if the path is malformed or conflicts with an existing route.
    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.on_many(&[method], path, handler)
    }

    pub fn on_many(self, methods: &[Method], path: &str, handler: impl Handler) -> Self {
        self.mount(Group::new(RouterInfo::default()).on_many(methods, path, handler))
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self { self.on(Method::GET, path, handler) }
    pub fn post(self, path: &str, handler: impl Handler) -> Self { self.on(Method::POST, path, handler) }
    pub fn put(self, path: &str, handler: impl Handler) -> Self { self.on(Method::PUT, path, handler) }
    pub fn delete(self, path: &str, handler: impl Handler) -> Self { self.on(Method::DELETE, path, handler) }
    pub fn patch(self, path: &str, handler: impl Handler) -> Self { self.on(Method::PATCH, path, handler) }
    pub fn head(self, path: &str, handler: impl Handler) -> Self { self.on(Method::HEAD, path, handler) }
    pub fn options(self, path: &str, handler: impl Handler) -> Self { self.on(Method::OPTIONS, path, handler) }
    pub fn trace(self, path: &str, handler: impl Handler) -> Self { self.on(Method::TRACE, path, handler) }

    /// Adds every route of `group` under its prefix.
    ///
    /// # Panics
    ///
    /// Same conditions as [`Router::on`].
    pub fn mount(mut self, group: Group) -> Self {
        for (method, path, handler) in group.routes {
            let full = join_path(&group.prefix, &path);
            let route = Route { handler, middlewares: Arc::clone(&group.middlewares) };
            self.routes
                .entry(method)
                .or_default()
                .insert(full.as_str(), route)
                .unwrap_or_else(|e| panic!("invalid route `{full}`: {e}"));
        }
        self
    }

    pub(crate) fn lookup(&self, method: &Method, path: &str, method_not_allowed: bool) -> Lookup {
        if let Some(matched) = self.routes.get(method).and_then(|tree| tree.at(path).ok()) {
            let params = matched.params.iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect();
            return Lookup::Found(matched.value.clone(), params);
        }

        let elsewhere = method_not_allowed
            && self.routes.iter().any(|(m, tree)| m != method && tree.at(path).is_ok());
        if elsewhere { Lookup::MethodNotAllowed } else { Lookup::NotFound }
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

fn join_path(prefix: &str, path: &str) -> String {
    let segments: Vec<&str> = [prefix, path].iter()
        .map(|s| s.trim_matches('/'))
        .filter(|s| !s.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::request::Request;

    async fn ok(_req: Request) -> Result<(), BoxError> { Ok(()) }

    #[test]
    fn joins_group_paths() {
        assert_eq!(join_path("", ""), "/");
        assert_eq!(join_path("auth", "invoke"), "/auth/invoke");
        assert_eq!(join_path("/api/", "/users/{id}"), "/api/users/{id}");
        assert_eq!(join_path("", "/health"), "/health");
    }

    #[test]
    fn lookup_outcomes() {
        let router = Router::new().get("/users/{id}", ok);

        let Lookup::Found(_, params) = router.lookup(&Method::GET, "/users/9", true) else {
            panic!("expected a match");
        };
        assert_eq!(params["id"], "9");

        assert!(matches!(router.lookup(&Method::POST, "/users/9", true), Lookup::MethodNotAllowed));
        assert!(matches!(router.lookup(&Method::POST, "/users/9", false), Lookup::NotFound));
        assert!(matches!(router.lookup(&Method::GET, "/nope", true), Lookup::NotFound));
    }

    #[test]
    fn group_middlewares_put_basic_auth_first() {
        let info = RouterInfo::new("auth")
            .basic_auth("u", "p")
            .middleware(|_: &mut Request| crate::middleware::Flow::Continue);
        let group = Group::new(info).get("invoke", ok).on_many(&[Method::PUT, Method::PATCH], "edit", ok);
        assert_eq!(group.middlewares.len(), 2);
        assert_eq!(group.routes.len(), 3);

        let router = Router::new().mount(group);
        assert!(matches!(router.lookup(&Method::PATCH, "/auth/edit", true), Lookup::Found(..)));
    }
}
