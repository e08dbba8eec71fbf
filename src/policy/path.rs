use std::fmt;
use std::path::Path;

use tracing::trace;

/// An absolute path reduced to a comparable form.
///
/// Both `\` and `/` separate segments. The root (drive letter, UNC share or
/// `/`) and every segment are lowercased, `.` segments are dropped and `..`
/// is collapsed lexically. The filesystem is never consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NormalizedPath {
    root: String,
    segments: Vec<String>,
}

impl NormalizedPath {
    /// Parse `raw` as an absolute path. Returns `None` for relative and
    /// drive-relative paths (`file.txt`, `C:`, `C:file.txt`).
    ///
    /// `\\?\` and `\\.\` prefixes are removed before a drive letter, and
    /// `\\?\UNC\server\share` becomes `\\server\share`. A leading run of
    /// separators that does not name a server and a share collapses to `/`.
    pub(crate) fn parse_absolute(raw: &str) -> Option<Self> {
        let unified = raw.replace('\\', "/");

        let (root, rest) = if let Some(device) = strip_device_prefix(&unified) {
            if has_drive_letter(device) {
                return Self::parse_absolute(device);
            }
            match device.get(..4) {
                Some(unc) if unc.eq_ignore_ascii_case("unc/") => split_unc(&device[4..])?,
                _ => split_unc(&unified[2..])?,
            }
        } else if let Some(unc) = unified.strip_prefix("//") {
            match split_unc(unc) {
                Some(parts) => parts,
                None => ("/".to_string(), unc.to_string()),
            }
        } else if has_drive_letter(&unified) {
            let rest = &unified[2..];
            if !rest.starts_with('/') {
                return None;
            }
            (unified[..2].to_lowercase(), rest.to_string())
        } else if unified.starts_with('/') {
            ("/".to_string(), unified.clone())
        } else {
            return None;
        };

        Some(Self::from_parts(root, &rest))
    }

    /// Every absolute reading of `raw`. `//etc/passwd` is both the share
    /// `\\etc\passwd` and, on POSIX hosts, `/etc/passwd`.
    pub(crate) fn interpretations(raw: &str) -> Vec<Self> {
        let mut readings: Vec<Self> = Self::parse_absolute(raw).into_iter().collect();

        let unified = raw.replace('\\', "/");
        if unified.starts_with("//") && strip_device_prefix(&unified).is_none() {
            let rooted = Self::from_parts("/".to_string(), &unified);
            if !readings.contains(&rooted) {
                readings.push(rooted);
            }
        }

        readings
    }

    fn from_parts(root: String, rest: &str) -> Self {
        let mut segments: Vec<String> = Vec::new();
        for segment in rest.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other.to_lowercase()),
            }
        }

        Self { root, segments }
    }

    /// True when `self` equals `ancestor` or lies beneath it, compared segment
    /// by segment.
    pub(crate) fn starts_with(&self, ancestor: &NormalizedPath) -> bool {
        self.root == ancestor.root
            && self.segments.len() >= ancestor.segments.len()
            && self.segments.iter().zip(&ancestor.segments).all(|(a, b)| a == b)
    }
}

/// The remainder after a `//?/` or `//./` prefix.
fn strip_device_prefix(unified: &str) -> Option<&str> {
    unified
        .strip_prefix("//?/")
        .or_else(|| unified.strip_prefix("//./"))
}

/// Split `server/share/rest` into a UNC root and the remainder. Both the
/// server and the share must be non-empty.
fn split_unc(unc: &str) -> Option<(String, String)> {
    let mut parts = unc.splitn(3, '/');
    let server = parts.next().filter(|s| !s.is_empty())?;
    let share = parts.next().filter(|s| !s.is_empty())?;
    let rest = parts.next().unwrap_or("");
    Some((
        format!("//{}/{}", server.to_lowercase(), share.to_lowercase()),
        rest.to_string(),
    ))
}

/// Drop a leading provider qualifier such as `FileSystem::` or
/// `Microsoft.PowerShell.Core\FileSystem::`.
fn strip_provider(raw: &str) -> &str {
    match raw.split_once("::") {
        Some((provider, rest))
            if provider.starts_with(|c: char| c.is_ascii_alphabetic())
                && provider
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '\\' | '/')) =>
        {
            rest
        }
        _ => raw,
    }
}

fn has_drive_letter(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Lowercase, backslash-separated form used for namespace prefix tests.
fn fold_namespace(raw: &str) -> String {
    raw.replace('/', "\\").to_lowercase()
}

/// True when the first component of `raw` names a provider drive such as
/// `Env:` or `HKLM:` rather than a single drive letter.
fn is_namespace(raw: &str) -> bool {
    let first = raw.split(['\\', '/']).next().unwrap_or("");
    match first.strip_suffix(':') {
        Some(name) => {
            name.len() >= 2 && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RootKind {
    /// Virtual drive prefix, stored folded.
    Namespace(String),
    Directory(NormalizedPath),
}

/// One entry of the restricted-root set.
#[derive(Debug, Clone)]
pub struct RestrictedRoot {
    source: String,
    kind: RootKind,
}

impl RestrictedRoot {
    /// Parse a configured root. Namespace prefixes (`Env:`,
    /// `Cert:\LocalMachine`) and absolute directories are accepted; relative
    /// or empty entries yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let kind = if is_namespace(trimmed) {
            let folded = fold_namespace(trimmed);
            RootKind::Namespace(folded.trim_end_matches('\\').to_string())
        } else {
            RootKind::Directory(NormalizedPath::parse_absolute(trimmed)?)
        };

        Some(Self {
            source: trimmed.to_string(),
            kind,
        })
    }

    /// The root as it was configured.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_namespace(&self) -> bool {
        matches!(self.kind, RootKind::Namespace(_))
    }

    /// Whether two roots restrict the same location, ignoring spelling.
    pub fn same_location(&self, other: &RestrictedRoot) -> bool {
        self.kind == other.kind
    }
}

impl fmt::Display for RestrictedRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Classify `path` against `roots`.
///
/// Virtual drive prefixes are tested first as plain case-insensitive string
/// prefixes. Relative paths are never restricted and are not resolved
/// against `working_directory`. Absolute paths are restricted when they equal
/// or lie under a directory root. A token carrying a provider qualifier is
/// restricted if either the qualified or the bare form is.
pub fn is_restricted_path(
    path: impl AsRef<Path>,
    working_directory: &Path,
    roots: &[RestrictedRoot],
) -> bool {
    let lossy = path.as_ref().to_string_lossy();
    let bare = strip_provider(&lossy);

    classify(&lossy, working_directory, roots)
        || (bare.len() != lossy.len() && classify(bare, working_directory, roots))
}

fn classify(raw: &str, working_directory: &Path, roots: &[RestrictedRoot]) -> bool {
    if raw.trim().is_empty() {
        return false;
    }

    let folded = fold_namespace(raw);
    for root in roots {
        if let RootKind::Namespace(prefix) = &root.kind {
            if folded.starts_with(prefix.as_str()) {
                trace!(path = raw, root = %root, "path matches restricted namespace");
                return true;
            }
        }
    }

    let readings = NormalizedPath::interpretations(raw);
    if readings.is_empty() {
        trace!(
            path = raw,
            cwd = %working_directory.display(),
            "relative path is not checked against restricted roots"
        );
        return false;
    }

    roots.iter().any(|root| match &root.kind {
        RootKind::Directory(dir) if readings.iter().any(|p| p.starts_with(dir)) => {
            trace!(path = raw, root = %root, "path is under restricted root");
            true
        }
        _ => false,
    })
}
