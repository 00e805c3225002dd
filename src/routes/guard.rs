//! Route guard: may this route render for the current session?
//!
//! A two-way bounce, not an authorization policy. Role checks happen where
//! they matter, via `net::types::is_admin`.

use super::{Route, RouteClass};
use crate::state::AuthState;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session not resolved yet; show a loading placeholder.
    Loading,
    Render,
    Redirect(Route),
}

/// Where anonymous users land.
pub const LOGIN_ROUTE: Route = Route::Login;
/// Where authenticated users land.
pub const HOME_ROUTE: Route = Route::Dashboard;

#[must_use]
pub fn decide(state: &AuthState, route: &Route) -> GuardDecision {
    match (state, route.class()) {
        (AuthState::Pending, _) => GuardDecision::Loading,
        (AuthState::Authenticated(_), RouteClass::Protected) | (AuthState::Anonymous, RouteClass::Public) => {
            GuardDecision::Render
        }
        (AuthState::Anonymous, RouteClass::Protected) => GuardDecision::Redirect(LOGIN_ROUTE),
        (AuthState::Authenticated(_), RouteClass::Public) => GuardDecision::Redirect(HOME_ROUTE),
    }
}

/// Guard a raw path. `/` and unknown paths redirect to the login route,
/// which then bounces authenticated users on to the dashboard.
#[must_use]
pub fn navigate(state: &AuthState, path: &str) -> GuardDecision {
    match Route::from_path(path) {
        Some(route) => decide(state, &route),
        None if state.is_pending() => GuardDecision::Loading,
        None => GuardDecision::Redirect(LOGIN_ROUTE),
    }
}
