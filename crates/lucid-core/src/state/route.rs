use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    #[default]
    Login,
    Signup,
    Chat,
    Profile,
}

impl Route {
    pub fn all() -> &'static [Route] {
        &[Route::Login, Route::Signup, Route::Chat, Route::Profile]
    }

    pub fn parse(fragment: &str) -> Option<Route> {
        match fragment.trim_start_matches('#') {
            "login" => Some(Route::Login),
            "signup" => Some(Route::Signup),
            "chat" => Some(Route::Chat),
            "profile" => Some(Route::Profile),
            _ => None,
        }
    }

    /// Unknown or empty fragments land on the login view.
    pub fn from_fragment(fragment: &str) -> Route {
        Self::parse(fragment).unwrap_or_default()
    }

    pub fn fragment(&self) -> &'static str {
        match self {
            Route::Login => "login",
            Route::Signup => "signup",
            Route::Chat => "chat",
            Route::Profile => "profile",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Route::Login => "Login",
            Route::Signup => "Sign up",
            Route::Chat => "Chat",
            Route::Profile => "Profile",
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self, Route::Chat | Route::Profile)
    }

    /// Applies the auth gate.
    pub fn resolve(self, authenticated: bool) -> Route {
        if self.requires_auth() && !authenticated {
            Route::Login
        } else {
            self
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.fragment())
    }
}
