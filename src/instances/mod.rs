//! Instance configuration and resolution.

mod env;
mod error;
mod resolver;


#[cfg(test)]
pub use env::MockEnvironment;
pub use env::{DEBUG_VAR, Environment, INSTANCES_VAR, ProcessEnv, TOKEN_VAR, URL_VAR};
pub use error::{ResolveError, ResolveResult};
pub use resolver::{Credentials, DEFAULT_INSTANCE, InstanceResolver};
