// Content fingerprints for change detection

/// Whether a file must be re-extracted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Dirty,
    Clean,
}

/// BLAKE3 digest of the file bytes as 64 lowercase hex chars.
pub fn fingerprint(content: &[u8]) -> String {
    blake3::hash(content).to_hex().to_string()
}

/// Compare a fresh fingerprint with the one stored at the last successful
/// extraction. `force` marks every file dirty.
pub fn classify(stored: Option<&str>, fresh: &str, force: bool) -> FileState {
    if force {
        return FileState::Dirty;
    }

    match stored {
        Some(previous) if previous == fresh => FileState::Clean,
        _ => FileState::Dirty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable() {
        let a = fingerprint(b"def foo():\n    pass\n");
        let b = fingerprint(b"def foo():\n    pass\n");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, fingerprint(b"def bar():\n    pass\n"));
    }

    #[test]
    fn test_classify() {
        let fresh = fingerprint(b"x = 1\n");
        assert_eq!(classify(None, &fresh, false), FileState::Dirty);
        assert_eq!(classify(Some(&fresh), &fresh, false), FileState::Clean);
        assert_eq!(classify(Some("stale"), &fresh, false), FileState::Dirty);
        assert_eq!(classify(Some(&fresh), &fresh, true), FileState::Dirty);
    }
}
