use std::sync::atomic::{AtomicUsize, Ordering};

use secrecy::SecretString;

use crate::llm::LlmError;

/// Round-robin pool of API keys shared by every client that holds it.
pub struct CredentialPool {
    keys: Vec<SecretString>,
    current: AtomicUsize,
}

impl CredentialPool {
    pub fn new(keys: Vec<SecretString>) -> Result<Self, LlmError> {
        if keys.is_empty() {
            return Err(LlmError::NoCredentials);
        }
        Ok(Self { keys, current: AtomicUsize::new(0) })
    }

    pub fn current_index(&self) -> usize {
        self.current.load(Ordering::SeqCst) % self.keys.len()
    }

    pub fn current(&self) -> &SecretString {
        &self.keys[self.current_index()]
    }

    /// Advances to the next key and returns its index.
    pub fn rotate(&self) -> usize {
        let next = (self.current_index() + 1) % self.keys.len();
        self.current.store(next, Ordering::SeqCst);
        next
    }

    /// Total attempts a call may make before giving up.
    pub fn attempt_budget(&self, retries_per_key: u32) -> usize {
        let retries = usize::try_from(retries_per_key.max(1)).unwrap_or(1);
        self.keys.len().saturating_mul(retries)
    }
}
