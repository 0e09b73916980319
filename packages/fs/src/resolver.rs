//! Mapping guest paths onto preopened directories.

use std::sync::Arc;

use capsule_host::Descriptor;

/// A guest path resolved against a preopen.
#[derive(Clone)]
pub struct ResolvedPath {
    /// Directory descriptor of the matched preopen.
    pub descriptor: Arc<dyn Descriptor>,
    /// Path relative to that directory; `"."` for the directory itself.
    pub relative_path: String,
    /// Guest mount path of the preopen, as the host reported it.
    pub mount: String,
}

impl std::fmt::Debug for ResolvedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedPath")
            .field("mount", &self.mount)
            .field("relative_path", &self.relative_path)
            .finish()
    }
}

/// Strip one leading `./`.
pub fn normalize_path(path: &str) -> &str {
    path.strip_prefix("./").unwrap_or(path)
}

/// Resolve `path` against `mounts`, given in host enumeration order.
///
/// For each mount in turn:
/// - a root mount (`"."` or `""`) takes the whole path when it is the first
///   mount; later root mounts are skipped;
/// - a path under the mount (`mount/...`) resolves to the remainder;
/// - the mount path itself resolves to `"."`.
///
/// The first hit wins. When nothing matches, the whole path is resolved
/// against the first mount. Returns `None` only when there are no mounts.
pub fn resolve(mounts: &[(Arc<dyn Descriptor>, String)], path: &str) -> Option<ResolvedPath> {
    let (first_descriptor, first_mount) = mounts.first()?;
    let normalized = normalize_path(path);

    let hit = |descriptor: &Arc<dyn Descriptor>, mount: &str, relative: &str| ResolvedPath {
        descriptor: descriptor.clone(),
        relative_path: relative.to_string(),
        mount: mount.to_string(),
    };

    for (index, (descriptor, mount)) in mounts.iter().enumerate() {
        let guest = normalize_path(mount);

        if guest == "." || guest.is_empty() {
            if index == 0 {
                return Some(hit(descriptor, mount, normalized));
            }
            continue;
        }

        if let Some(rest) = normalized
            .strip_prefix(guest)
            .and_then(|rest| rest.strip_prefix('/'))
        {
            return Some(hit(descriptor, mount, rest));
        }

        if normalized == guest {
            return Some(hit(descriptor, mount, "."));
        }
    }

    // TODO: make this an error once hosts always mount every allowed path.
    tracing::debug!(
        path = normalized,
        mount = %first_mount,
        "no preopen matched, resolving against the first mount"
    );
    Some(hit(first_descriptor, first_mount, normalized))
}

#[cfg(test)]
mod tests {
    use super::*;
    use capsule_host::testing::MemoryDirectory;

    fn mount(path: &str) -> (Arc<dyn Descriptor>, String) {
        (Arc::new(MemoryDirectory::new()), path.to_string())
    }

    fn resolved_to(resolved: &ResolvedPath, expected: &(Arc<dyn Descriptor>, String)) -> bool {
        Arc::ptr_eq(&resolved.descriptor, &expected.0) && resolved.mount == expected.1
    }

    #[test]
    fn no_mounts_resolves_nothing() {
        assert!(resolve(&[], "data/input.txt").is_none());
    }

    #[test]
    fn prefix_and_exact_matches() {
        let mounts = vec![mount("data"), mount(".")];

        let file = resolve(&mounts, "data/input.txt").unwrap();
        assert!(resolved_to(&file, &mounts[0]));
        assert_eq!(file.relative_path, "input.txt");

        let dir = resolve(&mounts, "./data").unwrap();
        assert!(resolved_to(&dir, &mounts[0]));
        assert_eq!(dir.relative_path, ".");
    }

    #[test]
    fn later_root_mount_does_not_capture_unmatched_paths() {
        let mounts = vec![mount("data"), mount(".")];

        let other = resolve(&mounts, "other/x").unwrap();
        assert!(resolved_to(&other, &mounts[0]));
        assert_eq!(other.relative_path, "other/x");

        let file = resolve(&mounts, "data/input.txt").unwrap();
        assert!(resolved_to(&file, &mounts[0]));
        assert_eq!(file.relative_path, "input.txt");

        let dir = resolve(&mounts, "./data").unwrap();
        assert!(resolved_to(&dir, &mounts[0]));
        assert_eq!(dir.relative_path, ".");
    }

    #[test]
    fn later_root_mount_still_lets_named_mounts_match() {
        let mounts = vec![mount("data"), mount("."), mount("logs")];

        let resolved = resolve(&mounts, "logs/today.log").unwrap();
        assert!(resolved_to(&resolved, &mounts[2]));
        assert_eq!(resolved.relative_path, "today.log");
    }

    #[test]
    fn unmatched_path_falls_back_to_first_mount() {
        let mounts = vec![mount("data"), mount("logs")];

        let other = resolve(&mounts, "other/x").unwrap();
        assert!(resolved_to(&other, &mounts[0]));
        assert_eq!(other.relative_path, "other/x");
    }

    #[test]
    fn first_root_mount_wins() {
        let mounts = vec![mount(""), mount("."), mount("data")];

        let resolved = resolve(&mounts, "data/a.txt").unwrap();
        assert!(resolved_to(&resolved, &mounts[0]));
        assert_eq!(resolved.relative_path, "data/a.txt");
    }

    #[test]
    fn mount_paths_are_normalized() {
        let mounts = vec![mount("./data")];

        let resolved = resolve(&mounts, "data/nested/b.txt").unwrap();
        assert!(resolved_to(&resolved, &mounts[0]));
        assert_eq!(resolved.relative_path, "nested/b.txt");
    }

    #[test]
    fn prefix_requires_a_separator() {
        let mounts = vec![mount("data"), mount("database")];

        let resolved = resolve(&mounts, "database/db.sqlite").unwrap();
        assert!(resolved_to(&resolved, &mounts[1]));
        assert_eq!(resolved.relative_path, "db.sqlite");
    }

    #[test]
    fn earlier_mount_wins_on_overlap() {
        let mounts = vec![mount("data"), mount("data/raw")];

        let resolved = resolve(&mounts, "data/raw/x.csv").unwrap();
        assert!(resolved_to(&resolved, &mounts[0]));
        assert_eq!(resolved.relative_path, "raw/x.csv");
    }

    #[test]
    fn only_one_leading_dot_slash_is_stripped() {
        let mounts = vec![mount("data")];
        let resolved = resolve(&mounts, "././data").unwrap();
        assert_eq!(resolved.relative_path, "./data");
    }
}
