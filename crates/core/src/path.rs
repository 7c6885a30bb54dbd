//! Remote path parsing and normalization
//!
//! Remote paths are `/`-separated and absolute within a scope. User input may
//! be relative to a working directory; it is joined and cleaned here before
//! anything is resolved against the service.

use crate::error::{Error, Result};

/// Path separator of the remote namespace
pub const SEPARATOR: char = '/';

/// A cleaned, absolute remote path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemotePath {
    path: String,
}

impl RemotePath {
    /// The namespace root
    pub fn root() -> Self {
        Self {
            path: SEPARATOR.to_string(),
        }
    }

    /// Build from an absolute path, cleaning `.`, `..` and repeated separators
    pub fn new(path: &str) -> Result<Self> {
        if !is_absolute(path) {
            return Err(Error::InvalidPath(format!(
                "'{path}' is not an absolute path"
            )));
        }
        Ok(Self { path: clean(path) })
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    pub fn is_root(&self) -> bool {
        self.path.len() == 1
    }

    /// Non-empty segments from the root down
    pub fn segments(&self) -> Vec<&str> {
        segments(&self.path)
    }

    /// Last segment, `None` for the root
    pub fn file_name(&self) -> Option<&str> {
        self.segments().last().copied()
    }

    /// Get the parent path (one level up)
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.path.rfind(SEPARATOR) {
            Some(0) | None => Some(Self::root()),
            Some(pos) => Some(Self {
                path: self.path[..pos].to_string(),
            }),
        }
    }

    /// Join a child path, which may itself be absolute
    pub fn join(&self, child: &str) -> Self {
        Self {
            path: join(&self.path, child),
        }
    }
}

impl std::fmt::Display for RemotePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}

/// Resolve user input against a working directory
///
/// Absolute input ignores the working directory. An empty working directory
/// means the root.
pub fn parse_path(workdir: &str, input: &str) -> Result<RemotePath> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::InvalidPath("Path cannot be empty".into()));
    }
    let base = if is_absolute(workdir) {
        RemotePath::new(workdir)?
    } else {
        RemotePath::root()
    };
    Ok(base.join(input))
}

/// Whether a path starts at the namespace root
pub fn is_absolute(path: &str) -> bool {
    path.starts_with(SEPARATOR)
}

/// Non-empty segments of a path
pub fn segments(path: &str) -> Vec<&str> {
    path.split(SEPARATOR).filter(|s| !s.is_empty()).collect()
}

/// Join `child` onto `base` and clean the result
pub fn join(base: &str, child: &str) -> String {
    if is_absolute(child) {
        clean(child)
    } else {
        clean(&format!("{base}{SEPARATOR}{child}"))
    }
}

/// Lexically clean an absolute path
///
/// `..` above the root stays at the root. The result never ends with a
/// separator unless it is the root itself.
pub fn clean(path: &str) -> String {
    let mut stack: Vec<&str> = Vec::new();
    for segment in segments(path) {
        match segment {
            "." => {}
            ".." => {
                stack.pop();
            }
            s => stack.push(s),
        }
    }
    format!("{SEPARATOR}{}", stack.join("/"))
}
