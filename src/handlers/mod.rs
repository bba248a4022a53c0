// Resource handlers, one module per resource. All are thin orchestrators:
// auth context comes from the middleware gate, ownership from
// `crate::ownership`, quotas from `crate::plan`, classification from
// `crate::classify`.
pub mod auth;
pub mod checkpoints;
pub mod locations;
pub mod records;
pub mod users;
