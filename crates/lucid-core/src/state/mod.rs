//! Client state: routes, the action/effect vocabulary, the `AppState`
//! reducer and the `Executor` that performs its I/O.

mod action;
mod app;
mod executor;
mod route;

pub use action::{Action, AuthFlow, CreatePurpose, Effect, LoginField, SignupField, Ticket};
pub use app::{AppState, LoginForm, PendingSend, SignupForm};
pub use executor::Executor;
pub use route::Route;
