//! Round-robin credential rotation with a random starting point.
//!
//! Several processes may share the same pool of search keys; starting each
//! one at a random offset spreads the first requests across the pool. Within
//! a process the rotator may back several concurrent searches, so the
//! read-and-advance step is a single compare-and-swap on the cursor.

use std::sync::atomic::{AtomicUsize, Ordering};

use groundchat_core::error::SearchError;
use rand::Rng;

pub struct CredentialRotator {
    pool: Vec<String>,
    cursor: AtomicUsize,
}

impl CredentialRotator {
    /// Build a rotator starting at a random position.
    ///
    /// Fails with [`SearchError::Configuration`] on an empty pool or a blank
    /// entry.
    pub fn new(pool: Vec<String>) -> Result<Self, SearchError> {
        check_pool(&pool)?;
        let start = rand::rng().random_range(0..pool.len());
        Ok(Self::at(pool, start))
    }

    /// Build a rotator starting at a fixed position (taken modulo the pool size).
    pub fn with_start(pool: Vec<String>, start: usize) -> Result<Self, SearchError> {
        check_pool(&pool)?;
        let start = start % pool.len();
        Ok(Self::at(pool, start))
    }

    fn at(pool: Vec<String>, start: usize) -> Self {
        Self {
            pool,
            cursor: AtomicUsize::new(start),
        }
    }

    /// Hand out the credential at the cursor and advance it.
    pub fn next(&self) -> &str {
        let len = self.pool.len();
        let index = match self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| Some((c + 1) % len))
        {
            Ok(previous) | Err(previous) => previous,
        };
        &self.pool[index]
    }
}

fn check_pool(pool: &[String]) -> Result<(), SearchError> {
    if pool.is_empty() {
        return Err(SearchError::Configuration(
            "search credential pool is empty".into(),
        ));
    }
    if let Some(position) = pool.iter().position(|k| k.trim().is_empty()) {
        return Err(SearchError::Configuration(format!(
            "search credential {position} is blank"
        )));
    }
    Ok(())
}

impl std::fmt::Debug for CredentialRotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRotator")
            .field("pool", &format_args!("[{} REDACTED]", self.pool.len()))
            .field("cursor", &self.cursor.load(Ordering::Relaxed))
            .finish()
    }
}
