//! Codec context
//!
//! Tracks the debug path of the structure currently being encoded or
//! decoded ("object/cim/class/property") and the first error raised by the
//! codec. Once an error is recorded the context is frozen: every later
//! operation gets the same error back without touching any buffer.

use crate::{Result, WmioError};
use std::borrow::Cow;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone)]
struct Frozen {
    error: WmioError,
    path: String,
}

/// Debug path stack plus the sticky first error
#[derive(Debug, Default, Clone)]
pub(crate) struct Context {
    path: Vec<Cow<'static, str>>,
    frozen: Option<Frozen>,
}

impl Context {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Enter a named structure
    pub(crate) fn enter(&mut self, name: impl Into<Cow<'static, str>>) {
        self.path.push(name.into());
    }

    /// Leave the innermost structure
    pub(crate) fn leave(&mut self) {
        self.path.pop();
    }

    /// Fail fast if an earlier operation already failed
    #[inline]
    pub(crate) fn check(&self) -> Result<()> {
        match &self.frozen {
            Some(frozen) => Err(frozen.error.clone()),
            None => Ok(()),
        }
    }

    /// Record `err` if it is the first failure, and return the first failure
    pub(crate) fn freeze(&mut self, err: WmioError) -> WmioError {
        match &self.frozen {
            Some(frozen) => frozen.error.clone(),
            None => {
                let path = self.to_string();
                debug!(path = %path, error = %err, "wmio codec frozen");
                self.frozen = Some(Frozen {
                    error: err.clone(),
                    path,
                });
                err
            }
        }
    }

    pub(crate) fn error(&self) -> Option<&WmioError> {
        self.frozen.as_ref().map(|f| &f.error)
    }

    pub(crate) fn error_path(&self) -> Option<&str> {
        self.frozen.as_ref().map(|f| f.path.as_str())
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.path.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}
