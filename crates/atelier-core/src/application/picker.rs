//! Document selection
//!
//! Attaching a document asks a picker for a path. The CLI prompts on the
//! terminal; tests use a fixed answer.

use crate::Result;
use std::path::PathBuf;

/// Source of a document path chosen by the user
pub trait DocumentPicker {
    /// `Ok(None)` means the user cancelled
    fn pick(&mut self) -> Result<Option<PathBuf>>;
}

impl<F> DocumentPicker for F
where
    F: FnMut() -> Result<Option<PathBuf>>,
{
    fn pick(&mut self) -> Result<Option<PathBuf>> {
        self()
    }
}

/// Picker that always answers with the same value
#[derive(Debug, Clone, Default)]
pub struct FixedPath(pub Option<PathBuf>);

impl FixedPath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(Some(path.into()))
    }

    pub fn cancelled() -> Self {
        Self(None)
    }
}

impl DocumentPicker for FixedPath {
    fn pick(&mut self) -> Result<Option<PathBuf>> {
        Ok(self.0.clone())
    }
}
