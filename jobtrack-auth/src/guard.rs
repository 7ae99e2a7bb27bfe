use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Landing,
    Dashboard,
    OAuthCallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// Anyone may visit.
    Public,
    /// Only visitors who are not signed in, e.g. the landing page.
    PublicOnly,
    /// Signed-in users only.
    Protected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    Redirect(Route),
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Landing => "/",
            Route::Dashboard => "/dashboard",
            Route::OAuthCallback => "/oauth/callback",
        }
    }

    pub fn access(&self) -> RouteAccess {
        match self {
            Route::Landing => RouteAccess::PublicOnly,
            Route::Dashboard => RouteAccess::Protected,
            Route::OAuthCallback => RouteAccess::Public,
        }
    }
}

pub fn authorize(session: &Session, route: Route) -> Access {
    match (route.access(), session.is_authenticated()) {
        (RouteAccess::Public, _) => Access::Allow,
        (RouteAccess::Protected, true) | (RouteAccess::PublicOnly, false) => Access::Allow,
        (RouteAccess::Protected, false) => Access::Redirect(Route::Landing),
        (RouteAccess::PublicOnly, true) => Access::Redirect(Route::Dashboard),
    }
}
