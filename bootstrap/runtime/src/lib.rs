//! Lambda custom-runtime bootstrap for `shape-dispatch`.
//!
//! Polls the Runtime API for invocations, hands the raw payload to the router and posts the
//! normalized response back. Configuration comes from the environment (see [`config`]).

pub mod bootstrap;
pub mod config;
pub mod runtime_api;
pub mod ses;
