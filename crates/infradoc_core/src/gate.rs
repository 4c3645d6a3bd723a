//! crates/infradoc_core/src/gate.rs
//!
//! Decides which screen is reachable for the current authentication state.
//! Role mismatches redirect to the caller's own landing screen; there is no
//! "access denied" screen.

use crate::domain::{Role, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated(Role),
}

impl AuthState {
    pub fn from_session(session: Option<&Session>) -> Self {
        match session {
            Some(session) => AuthState::Authenticated(session.role),
            None => AuthState::Unauthenticated,
        }
    }

    /// Login success moves to the session's role.
    pub fn on_login(self, role: Role) -> Self {
        AuthState::Authenticated(role)
    }

    /// Logout and any 401 both land here.
    pub fn on_logout(self) -> Self {
        AuthState::Unauthenticated
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    // Regular users
    DepartmentDashboard,
    Library,
    Insights,
    // Administrators
    AdminDashboard,
    AdminUpload,
    AdminUsers,
}

/// Who may see a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Only while signed out.
    Public,
    /// Any signed-in user.
    Authenticated,
    Role(Role),
}

impl Route {
    pub fn access(&self) -> Access {
        match self {
            Route::Login | Route::Register => Access::Public,
            Route::Library | Route::Insights => Access::Authenticated,
            Route::DepartmentDashboard => Access::Role(Role::User),
            Route::AdminDashboard | Route::AdminUpload | Route::AdminUsers => {
                Access::Role(Role::Admin)
            }
        }
    }

    pub fn landing(role: Role) -> Route {
        match role {
            Role::Admin => Route::AdminDashboard,
            Role::User => Route::DepartmentDashboard,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::DepartmentDashboard => "/department/dashboard",
            Route::Library => "/library",
            Route::Insights => "/insights",
            Route::AdminDashboard => "/admin/dashboard",
            Route::AdminUpload => "/admin/upload",
            Route::AdminUsers => "/admin/users",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Render(Route),
    Redirect(Route),
}

impl Decision {
    /// The route that ends up on screen either way.
    pub fn target(&self) -> Route {
        match self {
            Decision::Render(route) | Decision::Redirect(route) => *route,
        }
    }
}

pub fn resolve(state: AuthState, requested: Route) -> Decision {
    match (state, requested.access()) {
        (AuthState::Unauthenticated, Access::Public) => Decision::Render(requested),
        (AuthState::Unauthenticated, _) => Decision::Redirect(Route::Login),
        (AuthState::Authenticated(role), Access::Public) => Decision::Redirect(Route::landing(role)),
        (AuthState::Authenticated(_), Access::Authenticated) => Decision::Render(requested),
        (AuthState::Authenticated(role), Access::Role(required)) if role == required => {
            Decision::Render(requested)
        }
        (AuthState::Authenticated(role), Access::Role(_)) => Decision::Redirect(Route::landing(role)),
    }
}
