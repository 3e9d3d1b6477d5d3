//! Session Gate
//!
//! Decides whether a route may be shown. Public routes always render;
//! protected routes render only while the auth slice holds a token and
//! otherwise redirect to [`Route::Login`].

use std::fmt;
use tokio::sync::watch;

use super::store::AuthState;

/// Navigable views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Home,
    Datasets,
    DatasetDetail(i64),
    Statistics,
    Dashboard,
    Profile,
    Query,
}

impl Route {
    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }

    /// Parse a path such as `/data/42`; unknown paths yield `None`
    pub fn parse(path: &str) -> Option<Route> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            ["login"] => Some(Route::Login),
            ["register"] => Some(Route::Register),
            [] | ["home"] => Some(Route::Home),
            ["data"] => Some(Route::Datasets),
            ["data", id] => id.parse().ok().map(Route::DatasetDetail),
            ["stats"] => Some(Route::Statistics),
            ["dashboard"] => Some(Route::Dashboard),
            ["profile"] => Some(Route::Profile),
            ["graphql"] => Some(Route::Query),
            _ => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Login => write!(f, "/login"),
            Route::Register => write!(f, "/register"),
            Route::Home => write!(f, "/home"),
            Route::Datasets => write!(f, "/data"),
            Route::DatasetDetail(id) => write!(f, "/data/{}", id),
            Route::Statistics => write!(f, "/stats"),
            Route::Dashboard => write!(f, "/dashboard"),
            Route::Profile => write!(f, "/profile"),
            Route::Query => write!(f, "/graphql"),
        }
    }
}

/// Outcome of resolving a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Render(Route),
    Redirect(Route),
}

/// Route guard backed by the auth slice
#[derive(Debug, Clone)]
pub struct SessionGate {
    auth: watch::Receiver<AuthState>,
}

impl SessionGate {
    pub fn new(auth: watch::Receiver<AuthState>) -> Self {
        Self { auth }
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.borrow().is_authenticated()
    }

    pub fn resolve(&self, route: Route) -> Resolution {
        if route.is_public() || self.is_authenticated() {
            Resolution::Render(route)
        } else {
            Resolution::Redirect(Route::Login)
        }
    }

    /// Resolve a path; unknown paths fall back to the login view
    pub fn resolve_path(&self, path: &str) -> Resolution {
        match Route::parse(path) {
            Some(route) => self.resolve(route),
            None => Resolution::Redirect(Route::Login),
        }
    }
}
