//! Prefixed entity identifiers.
//!
//! Every persisted row gets a `<prefix>_<hex>` id generated server-side at
//! insert time. The prefix makes ids self-describing in logs and lets a
//! misdirected id (say, a location id sent to a checkpoint route) fail the
//! ownership lookup instead of silently matching.

use uuid::Uuid;

fn generate(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

pub fn user_id() -> String {
    generate("usr")
}

pub fn location_id() -> String {
    generate("loc")
}

pub fn checkpoint_id() -> String {
    generate("cp")
}

pub fn record_id() -> String {
    generate("rec")
}
