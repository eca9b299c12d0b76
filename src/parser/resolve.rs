use glob::Pattern;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Finds the on-disk file a declared export URI refers to.
///
/// Declared URIs follow the archive's internal layout, which doesn't always survive
/// extraction (parent directories get renamed). Candidates, first existing one wins:
///
/// 1. `root/<uri>`
/// 2. any file under `root` with the same base name
/// 3. the last 2, then last 3, segments of the URI joined to `root`
///
/// Steps 2 and 3 only run for URIs with more than one segment.
pub fn resolve_local_path(declared_uri: &str, root: &Path) -> Option<PathBuf> {
    let segments: Vec<&std::ffi::OsStr> = Path::new(declared_uri)
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s),
            _ => None,
        })
        .collect();
    if segments.is_empty() {
        return None;
    }

    let direct = join_tail(root, &segments, segments.len());
    if direct.exists() {
        return Some(direct);
    }
    if segments.len() < 2 {
        return None;
    }

    let file_name = segments[segments.len() - 1].to_string_lossy();
    if let Some(found) = find_by_name(root, &file_name) {
        debug!(uri = declared_uri, found = %found.display(), "resolved photo by file name");
        return Some(found);
    }

    for keep in [2, 3] {
        if segments.len() < keep {
            break;
        }
        let candidate = join_tail(root, &segments, keep);
        if candidate.exists() {
            return Some(candidate);
        }
    }

    None
}

fn join_tail(root: &Path, segments: &[&std::ffi::OsStr], keep: usize) -> PathBuf {
    let mut path = root.to_path_buf();
    path.extend(&segments[segments.len() - keep..]);
    path
}

fn find_by_name(root: &Path, file_name: &str) -> Option<PathBuf> {
    let pattern = format!(
        "{}/**/{}",
        Pattern::escape(&root.to_string_lossy()),
        Pattern::escape(file_name)
    );
    glob::glob(&pattern)
        .ok()?
        .filter_map(Result::ok)
        .find(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"jpeg").unwrap();
        path
    }

    #[test]
    fn exact_relative_join_wins() {
        let dir = tempfile::tempdir().unwrap();
        let expected = touch(dir.path(), "photos_and_videos/album/1.jpg");
        touch(dir.path(), "elsewhere/1.jpg");

        assert_eq!(
            resolve_local_path("photos_and_videos/album/1.jpg", dir.path()),
            Some(expected)
        );
    }

    #[test]
    fn renamed_parent_is_found_by_base_name() {
        let dir = tempfile::tempdir().unwrap();
        let expected = touch(dir.path(), "your_facebook_activity/posts/media/Album_abc/99.jpg");

        assert_eq!(
            resolve_local_path("photos_and_videos/Album_abc/99.jpg", dir.path()),
            Some(expected)
        );
    }

    #[test]
    fn single_segment_uri_only_tries_exact_join() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "nested/solo.jpg");

        assert_eq!(resolve_local_path("solo.jpg", dir.path()), None);
        let top = touch(dir.path(), "solo.jpg");
        assert_eq!(resolve_local_path("solo.jpg", dir.path()), Some(top));
    }

    #[test]
    fn missing_or_empty_uri_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_local_path("", dir.path()), None);
        assert_eq!(resolve_local_path("a/b/c.jpg", dir.path()), None);
    }

    #[test]
    fn parent_segments_cannot_escape_root() {
        let dir = tempfile::tempdir().unwrap();
        let inside = touch(dir.path(), "x/secret.jpg");
        assert_eq!(resolve_local_path("../x/secret.jpg", dir.path()), Some(inside));
    }
}
