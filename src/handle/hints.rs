//! Actionable hints for io errors raised by the local backend.
//!
//! Usage:
//!   fs::remove_file(&p).map_err(with_hint("remove", &p))?;
//!
//! The returned error keeps the original `ErrorKind` so callers can still match on it.

use std::io;
use std::path::Path;

/// Hint for a raw OS error code, if one is known.
#[cfg(unix)]
fn os_hint(code: i32) -> Option<&'static str> {
    let hint = match code {
        libc::EACCES | libc::EPERM => "permission denied; check ownership and write permissions",
        libc::EXDEV => "cross-filesystem operation",
        libc::EBUSY => "resource busy; another process may be using it",
        libc::ENOENT => "path not found; it may have been moved or deleted",
        libc::EEXIST => "name already taken",
        libc::ENOSPC => "insufficient space on device",
        libc::EROFS => "read-only filesystem",
        libc::ELOOP => "too many symbolic link levels; possible symlink cycle",
        libc::ENAMETOOLONG => "file name too long",
        libc::EMFILE => "process file descriptor limit reached",
        libc::ENFILE => "system-wide file table overflow",
        libc::ENOTDIR => "a path component is not a directory",
        _ => return None,
    };
    Some(hint)
}

#[cfg(windows)]
fn os_hint(code: i32) -> Option<&'static str> {
    let hint = match code {
        5 => "access denied; check permissions",
        2 | 3 => "path not found; it may have been moved or deleted",
        32 => "sharing violation; file is in use",
        80 | 183 => "name already taken",
        112 => "insufficient disk space",
        19 => "write protected media",
        206 => "file name or path too long",
        _ => return None,
    };
    Some(hint)
}

#[cfg(not(any(unix, windows)))]
fn os_hint(_code: i32) -> Option<&'static str> {
    None
}

fn kind_hint(kind: io::ErrorKind) -> Option<&'static str> {
    match kind {
        io::ErrorKind::PermissionDenied => Some("permission denied; check ownership and write permissions"),
        io::ErrorKind::NotFound => Some("path not found; it may have been moved or deleted"),
        io::ErrorKind::AlreadyExists => Some("name already taken"),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => Some("busy or timed out; retry later"),
        io::ErrorKind::InvalidInput => Some("invalid name for this directory"),
        _ => None,
    }
}

/// Build "`op` '`path`': `error` (`hint`) [os code: N]".
pub fn describe(op: &str, path: &Path, e: &io::Error) -> String {
    let mut msg = format!("{op} '{}': {e}", path.display());
    let hint = match e.raw_os_error() {
        Some(code) => os_hint(code),
        None => kind_hint(e.kind()),
    };
    if let Some(h) = hint {
        msg.push_str(" (");
        msg.push_str(h);
        msg.push(')');
    }
    if let Some(code) = e.raw_os_error() {
        msg.push_str(&format!(" [os code: {code}]"));
    }
    msg
}

/// Closure for `.map_err(...)` that enriches the message and preserves the kind.
pub fn with_hint<'a>(op: &'a str, path: &'a Path) -> impl FnOnce(io::Error) -> io::Error + 'a {
    move |e: io::Error| io::Error::new(e.kind(), describe(op, path, &e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notfound_hint_includes_path() {
        let p = Path::new("/nonexistent/photo.png");
        let err = with_hint("open", p)(io::Error::from(io::ErrorKind::NotFound));
        let msg = err.to_string();
        assert!(msg.contains("open"));
        assert!(msg.contains("/nonexistent/photo.png"));
        assert!(msg.contains("path not found"));
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[test]
    fn enospc_hint_and_code_present() {
        let msg = describe("write", Path::new("/tmp"), &io::Error::from_raw_os_error(libc::ENOSPC));
        assert!(msg.contains("insufficient space"), "msg was: {msg}");
        assert!(msg.contains("os code"));
    }

    #[test]
    fn unknown_kind_has_no_hint() {
        let msg = describe("read", Path::new("x"), &io::Error::other("boom"));
        assert_eq!(msg, "read 'x': boom");
    }
}
