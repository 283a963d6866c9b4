//! Non-fatal conditions noticed during evaluation.
//!
//! Evaluation never fails. When it has to fall back to a safe answer it
//! reports a [`Diagnostic`] to a [`DiagnosticSink`] chosen by the host.

use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A query named a flag that is not in the definition set
    UnknownFlag { name: String },

    /// A definition carried a percentage above 100; callers were excluded
    RolloutOutOfRange { name: String, percentage: u8 },

    /// A variant query supplied no variants; the default was served
    EmptyVariantTable { name: String },
}

impl Diagnostic {
    /// Name of the flag the diagnostic concerns.
    pub fn flag_name(&self) -> &str {
        match self {
            Self::UnknownFlag { name }
            | Self::RolloutOutOfRange { name, .. }
            | Self::EmptyVariantTable { name } => name,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFlag { name } => {
                write!(f, "flag '{name}' is not configured, resolving to disabled")
            }
            Self::RolloutOutOfRange { name, percentage } => write!(
                f,
                "flag '{name}' has rollout percentage {percentage} outside 0-100, excluding caller"
            ),
            Self::EmptyVariantTable { name } => {
                write!(f, "flag '{name}' was queried with no variants, serving default")
            }
        }
    }
}

/// Destination for diagnostics.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Emits every diagnostic as a `tracing` warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, diagnostic: Diagnostic) {
        tracing::warn!(flag = diagnostic.flag_name(), "{}", diagnostic);
    }
}

/// Drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn report(&self, _diagnostic: Diagnostic) {}
}

/// Keeps diagnostics in memory so the host can inspect or forward them.
#[derive(Debug, Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything reported so far.
    pub fn entries(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }

    /// Remove and return everything reported so far.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        // A panic while pushing cannot leave the Vec half-written
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.lock().push(diagnostic);
    }
}
