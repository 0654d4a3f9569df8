//! Composition path registry: where form definitions and field types come from.
//!
//! Independent features register their locations at startup; the assembler
//! lists them when a form is built. Entries are never removed and keep their
//! registration order, because later locations are layered on top of earlier
//! ones.
//!
//! The registry is an ordinary value. Share it as `Arc<PathRegistry>` with
//! every collaborator that registers or lists paths.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use formwright_core::{CompositionKind, CompositionPath, DuplicatePolicy};
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct Paths {
    definitions: Vec<String>,
    field_types: Vec<String>,
}

impl Paths {
    fn of(&self, kind: CompositionKind) -> &Vec<String> {
        match kind {
            CompositionKind::Definition => &self.definitions,
            CompositionKind::FieldType => &self.field_types,
        }
    }

    fn of_mut(&mut self, kind: CompositionKind) -> &mut Vec<String> {
        match kind {
            CompositionKind::Definition => &mut self.definitions,
            CompositionKind::FieldType => &mut self.field_types,
        }
    }
}

/// Thread-safe, append-only lists of composition locations per kind.
#[derive(Debug, Default)]
pub struct PathRegistry {
    paths: RwLock<Paths>,
    policy: DuplicatePolicy,
}

impl PathRegistry {
    /// Create an empty registry that keeps duplicate registrations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with an explicit duplicate policy.
    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            paths: RwLock::new(Paths::default()),
            policy,
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Append `location` to the list for `kind`.
    ///
    /// Returns `false` only when the policy is [`DuplicatePolicy::Ignore`]
    /// and the location was already present.
    pub fn register(&self, kind: CompositionKind, location: impl Into<String>) -> bool {
        let location = location.into();
        if location.trim().is_empty() {
            warn!(kind = %kind, "Registering an empty composition path");
        }

        let mut paths = self.write();
        let list = paths.of_mut(kind);
        if self.policy == DuplicatePolicy::Ignore && list.contains(&location) {
            debug!(kind = %kind, location = %location, "Composition path already registered");
            return false;
        }

        info!(kind = %kind, location = %location, position = list.len(), "Registered composition path");
        list.push(location);
        true
    }

    /// Register several locations in order. Returns how many were appended.
    pub fn register_all<I, S>(&self, kind: CompositionKind, locations: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut appended = 0;
        for location in locations {
            if self.register(kind, location) {
                appended += 1;
            }
        }
        appended
    }

    /// Snapshot of the locations for `kind`, in registration order.
    ///
    /// The returned vector is a copy; changing it never touches the registry.
    pub fn list(&self, kind: CompositionKind) -> Vec<String> {
        self.read().of(kind).clone()
    }

    /// Like [`list`](Self::list), as typed paths.
    pub fn list_paths(&self, kind: CompositionKind) -> Vec<CompositionPath> {
        self.read()
            .of(kind)
            .iter()
            .map(|location| CompositionPath::new(kind, location.clone()))
            .collect()
    }

    /// Number of registrations for `kind`.
    pub fn len(&self, kind: CompositionKind) -> usize {
        self.read().of(kind).len()
    }

    /// Whether nothing has been registered for any kind.
    pub fn is_empty(&self) -> bool {
        let paths = self.read();
        paths.definitions.is_empty() && paths.field_types.is_empty()
    }

    // A panic while holding the lock cannot leave a half-written entry
    // (push is the only mutation), so a poisoned lock is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, Paths> {
        self.paths.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Paths> {
        self.paths.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn registration_order_preserved() {
        let registry = PathRegistry::new();
        registry.register(CompositionKind::Definition, "/components/blog/forms");
        registry.register(CompositionKind::Definition, "/plugins/seo/forms");

        assert_eq!(
            registry.list(CompositionKind::Definition),
            vec!["/components/blog/forms", "/plugins/seo/forms"]
        );
    }

    #[test]
    fn empty_kind_lists_nothing() {
        let registry = PathRegistry::new();
        registry.register(CompositionKind::Definition, "/forms");

        assert!(registry.list(CompositionKind::FieldType).is_empty());
        assert_eq!(registry.len(CompositionKind::FieldType), 0);
        assert!(!registry.is_empty());
        assert!(PathRegistry::new().is_empty());
    }

    #[test]
    fn kinds_are_independent() {
        let registry = PathRegistry::new();
        registry.register(CompositionKind::Definition, "/forms");
        registry.register(CompositionKind::FieldType, "/fields");

        assert_eq!(registry.list(CompositionKind::Definition), vec!["/forms"]);
        assert_eq!(registry.list(CompositionKind::FieldType), vec!["/fields"]);
    }

    #[test]
    fn duplicates_kept_by_default() {
        let registry = PathRegistry::new();
        assert!(registry.register(CompositionKind::Definition, "/forms"));
        assert!(registry.register(CompositionKind::Definition, "/forms"));

        assert_eq!(registry.len(CompositionKind::Definition), 2);
    }

    #[test]
    fn ignore_policy_skips_duplicates() {
        let registry = PathRegistry::with_policy(DuplicatePolicy::Ignore);
        assert!(registry.register(CompositionKind::Definition, "/forms"));
        assert!(!registry.register(CompositionKind::Definition, "/forms"));
        // Same location under another kind is a different entry
        assert!(registry.register(CompositionKind::FieldType, "/forms"));

        assert_eq!(registry.list(CompositionKind::Definition), vec!["/forms"]);
    }

    #[test]
    fn empty_location_is_accepted() {
        let registry = PathRegistry::new();
        assert!(registry.register(CompositionKind::FieldType, ""));
        assert_eq!(registry.list(CompositionKind::FieldType), vec![""]);
    }

    #[test]
    fn list_returns_a_detached_copy() {
        let registry = PathRegistry::new();
        registry.register(CompositionKind::Definition, "/forms");

        let mut snapshot = registry.list(CompositionKind::Definition);
        snapshot.push("/injected".into());
        snapshot.clear();

        assert_eq!(registry.list(CompositionKind::Definition), vec!["/forms"]);
    }

    #[test]
    fn register_all_counts_appended() {
        let registry = PathRegistry::with_policy(DuplicatePolicy::Ignore);
        let appended = registry.register_all(CompositionKind::Definition, ["/a", "/b", "/a"]);
        assert_eq!(appended, 2);

        let paths = registry.list_paths(CompositionKind::Definition);
        assert_eq!(paths[1], CompositionPath::new(CompositionKind::Definition, "/b"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_registrations_are_not_lost() {
        let registry = Arc::new(PathRegistry::new());
        let mut handles = Vec::new();
        for task in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                for i in 0..50 {
                    registry.register(CompositionKind::Definition, format!("/t{task}/p{i}"));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let paths = registry.list(CompositionKind::Definition);
        assert_eq!(paths.len(), 400);
        // Per-registrant order survives interleaving
        let task_three: Vec<_> = paths.iter().filter(|p| p.starts_with("/t3/")).collect();
        assert_eq!(task_three.first().map(|s| s.as_str()), Some("/t3/p0"));
        assert_eq!(task_three.last().map(|s| s.as_str()), Some("/t3/p49"));
    }
}
