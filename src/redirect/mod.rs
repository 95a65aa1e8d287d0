pub mod handlers;
pub mod middleware;
pub mod resolver;
pub mod routes;

pub use resolver::{RedirectError, RedirectResolver, ResolvedRedirect};
pub use routes::create_redirect_router;
