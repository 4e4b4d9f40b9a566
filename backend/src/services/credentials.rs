use crate::error::{KidVidError, Result};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// An opaque API key. `Debug` never prints the key itself.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Ordered API keys plus a shared cursor. The key list never changes after
/// construction; only the cursor moves, and it is always read modulo the length.
pub struct CredentialPool {
    credentials: Vec<Credential>,
    cursor: AtomicUsize,
}

impl CredentialPool {
    pub fn new(keys: Vec<String>) -> Result<Self> {
        let credentials: Vec<Credential> = keys
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .map(Credential)
            .collect();

        if credentials.is_empty() {
            return Err(KidVidError::NoCredentialsConfigured);
        }

        Ok(Self {
            credentials,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Snapshot of the shared cursor. A call reads it once and walks the pool
    /// from there with [`CredentialPool::at`].
    pub fn position(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    pub fn at(&self, position: usize) -> &Credential {
        &self.credentials[position % self.credentials.len()]
    }

    /// 1-based index of the key at `position`, for logs.
    pub fn index_of(&self, position: usize) -> usize {
        position % self.credentials.len() + 1
    }

    pub fn current(&self) -> &Credential {
        self.at(self.position())
    }

    /// Moves the cursor past the key at `position` if it still points there.
    /// Concurrent callers reporting the same denied key advance it only once.
    pub fn advance_past(&self, position: usize) -> bool {
        self.cursor
            .compare_exchange(position, position + 1, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Total number of advances since construction.
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Credential> {
        self.credentials.iter()
    }
}

impl fmt::Debug for CredentialPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPool")
            .field("len", &self.credentials.len())
            .field("cursor", &self.cursor())
            .finish()
    }
}
