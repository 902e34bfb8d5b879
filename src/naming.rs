//! Identifiers for the resources a run creates.
//!
//! Every id is `<prefix>-<uuid v4, simple form>`, well inside the 64 character limit
//! the batch service puts on pool, job and task ids. Re-running the tool therefore
//! always creates new resources.

use uuid::Uuid;

pub const POOL_PREFIX: &str = "mypool";
pub const JOB_PREFIX: &str = "myjob";
pub const TASK_PREFIX: &str = "mytask";

pub fn unique_id(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

pub fn pool_id() -> String {
    unique_id(POOL_PREFIX)
}

pub fn job_id() -> String {
    unique_id(JOB_PREFIX)
}

pub fn task_id() -> String {
    unique_id(TASK_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_id_shape() {
        let id = pool_id();
        assert!(id.starts_with("mypool-"));
        assert_eq!(id.len(), "mypool-".len() + 32);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-'));
    }

    #[test]
    fn test_ids_do_not_repeat() {
        let ids: HashSet<String> = (0..1000).map(|_| task_id()).collect();
        assert_eq!(ids.len(), 1000);
    }
}
