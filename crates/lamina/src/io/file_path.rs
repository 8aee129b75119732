use relative_path::{RelativePath, RelativePathBuf};
use std::path::{Path, PathBuf};

/* # Why RelativePathBuf for FilePath?

The native backend resolves every path against its configured base
directory. Wrapping RelativePathBuf makes that relative-to-base contract
part of the type, so absolute system paths cannot sneak in.
*/

/// Type-safe wrapper for file paths relative to the native backend's base
/// directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilePath(RelativePathBuf);

impl FilePath {
    /// Returns the underlying relative path.
    pub fn as_relative(&self) -> &RelativePath {
        &self.0
    }

    /// Resolves this path against a base directory, yielding an absolute
    /// path usable with std::fs.
    pub fn resolve(&self, base_dir: &Path) -> PathBuf {
        self.0.to_path(base_dir)
    }
}

impl From<&str> for FilePath {
    fn from(s: &str) -> Self {
        Self(RelativePathBuf::from(s))
    }
}

impl From<String> for FilePath {
    fn from(s: String) -> Self {
        Self(RelativePathBuf::from(s))
    }
}

impl From<RelativePathBuf> for FilePath {
    fn from(p: RelativePathBuf) -> Self {
        Self(p)
    }
}

impl std::fmt::Display for FilePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<RelativePath> for FilePath {
    fn as_ref(&self) -> &RelativePath {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_path_from_str() {
        let path = FilePath::from("slides/case.isyntax");
        assert_eq!(path.as_relative().as_str(), "slides/case.isyntax");
    }

    #[test]
    fn test_file_path_resolve() {
        let path = FilePath::from("slides/case.isyntax");
        let resolved = path.resolve(Path::new("/data"));
        assert_eq!(resolved, PathBuf::from("/data/slides/case.isyntax"));
    }

    #[test]
    fn test_file_path_equality_and_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(FilePath::from("a.bin"));
        assert!(set.contains(&FilePath::from("a.bin")));
        assert!(!set.contains(&FilePath::from("b.bin")));
    }

    #[test]
    fn test_file_path_display() {
        let path = FilePath::from(String::from("nested/dir/file.dat"));
        assert_eq!(path.to_string(), "nested/dir/file.dat");
    }
}
