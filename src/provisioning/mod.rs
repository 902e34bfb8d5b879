//! # Provisioning Steps
//!
//! One module per resource kind. Each step issues its create call and returns the
//! identifier of what it made; none of them reads back or reconciles existing state.

pub mod account;
pub mod job;
pub mod pool;

pub use account::create_batch_account;
pub use job::{create_job, create_task};
pub use pool::{create_pool, RegistryAuth, RegistryCredentials};
