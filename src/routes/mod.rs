//! Client route table.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every screen the shell can show is a `Route`. Navigation goes through
//! `guard::navigate`, which classifies the route and consults the session.

pub mod guard;

pub use guard::{GuardDecision, decide, navigate};


/// Whether a route needs a signed-in user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteClass {
    /// Only for anonymous users (login, register).
    Public,
    /// Only for authenticated users.
    Protected,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Dashboard,
    Products,
    NewProduct,
    ProductDetail(String),
    EditProduct(String),
}

impl Route {
    /// Parse a path such as `/productos/7/editar` (`/productos/editar/7` is
    /// accepted too). Query strings, fragments and a trailing slash are
    /// ignored. Returns `None` for `/` and unknown paths.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            ["login"] => Some(Self::Login),
            ["register"] => Some(Self::Register),
            ["dashboard"] => Some(Self::Dashboard),
            ["productos"] => Some(Self::Products),
            ["productos", "nuevo"] => Some(Self::NewProduct),
            ["productos", "editar"] => None,
            ["productos", id] => Some(Self::ProductDetail((*id).to_owned())),
            ["productos", id, "editar"] | ["productos", "editar", id] => Some(Self::EditProduct((*id).to_owned())),
            _ => None,
        }
    }

    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Login => "/login".to_owned(),
            Self::Register => "/register".to_owned(),
            Self::Dashboard => "/dashboard".to_owned(),
            Self::Products => "/productos".to_owned(),
            Self::NewProduct => "/productos/nuevo".to_owned(),
            Self::ProductDetail(id) => format!("/productos/{id}"),
            Self::EditProduct(id) => format!("/productos/{id}/editar"),
        }
    }

    #[must_use]
    pub fn class(&self) -> RouteClass {
        match self {
            Self::Login | Self::Register => RouteClass::Public,
            _ => RouteClass::Protected,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}
