//! Path helpers

use std::path::PathBuf;

/// Expand `~` and make relative paths absolute against the working directory.
///
/// Absolute paths are returned unchanged; nothing is canonicalized, so the
/// path does not have to exist. An empty string means the working directory.
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();
    let cwd = || std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    if path.is_empty() {
        return cwd();
    }

    let expanded = match (path, dirs::home_dir()) {
        ("~", Some(home)) => home,
        (p, Some(home)) if p.starts_with("~/") => home.join(&p[2..]),
        (p, _) => PathBuf::from(p),
    };

    if expanded.is_relative() {
        cwd().join(expanded)
    } else {
        expanded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_unchanged() {
        assert_eq!(expand_path("/srv/files"), PathBuf::from("/srv/files"));
        assert_eq!(expand_path("  /srv/files "), PathBuf::from("/srv/files"));
    }

    #[test]
    fn test_relative_joined_to_cwd() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(expand_path("blobs"), cwd.join("blobs"));
        assert_eq!(expand_path("./blobs"), cwd.join("./blobs"));
        assert_eq!(expand_path(""), cwd);
    }

    #[test]
    fn test_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~"), home);
            assert_eq!(expand_path("~/.shortfile"), home.join(".shortfile"));
        }
    }
}
