// Copyright 2026 glint Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use std::{
    borrow::Cow,
    fmt::{Debug, Display},
    sync::Arc,
};

/// Kinds of [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Underlying I/O failed.
    Io,
    /// Invalid configuration.
    Config,
    /// A spawned task panicked or was aborted.
    Join,
    /// Another editor holds the disk entry of the same key.
    EditInProgress,
    /// The disk store has been deleted or is not opened.
    Closed,
    /// Error raised outside of glint, e.g. by a user supplied writer.
    External,
}

impl ErrorKind {
    /// Readable name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Io => "I/O error",
            ErrorKind::Config => "Config error",
            ErrorKind::Join => "Join error",
            ErrorKind::EditInProgress => "Edit in progress",
            ErrorKind::Closed => "Closed",
            ErrorKind::External => "External error",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error of fallible glint operations.
///
/// Pools and caches never fail on rejected input or storage faults, they degrade to a miss or a no-op. [`Error`] is
/// returned where the caller can act on the failure: builder validation, disk store internals and the async bridges.
///
/// `Display` renders a single line, with the context in parentheses:
///
/// ```text
/// Config error (multiplier: 1.5): size multiplier must be in 0..=1
/// ```
#[derive(Clone)]
pub struct Error {
    kind: ErrorKind,
    message: Cow<'static, str>,
    context: Vec<(&'static str, String)>,
    source: Option<Arc<anyhow::Error>>,
}

impl Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("Error");
        s.field("kind", &self.kind);
        if !self.message.is_empty() {
            s.field("message", &self.message);
        }
        if !self.context.is_empty() {
            s.field("context", &self.context);
        }
        if let Some(source) = &self.source {
            s.field("source", source);
        }
        s.finish()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.kind.as_str())?;
        for (i, (key, value)) in self.context.iter().enumerate() {
            let sep = if i == 0 { " (" } else { ", " };
            write!(f, "{sep}{key}: {value}")?;
        }
        if !self.context.is_empty() {
            f.write_str(")")?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(source) = &self.source {
            write!(f, ", source: {source:#}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_deref().map(|source| {
            let source: &(dyn std::error::Error + 'static) = source.as_ref();
            source
        })
    }
}

impl Error {
    /// Create an error of `kind`.
    ///
    /// ```rust
    /// # use glint_common::error::{Error, ErrorKind};
    /// let err = Error::new(ErrorKind::Io, "failed to commit entry").with_source(std::io::Error::other("disk is gone"));
    /// assert_eq!(err.kind(), ErrorKind::Io);
    /// ```
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: vec![],
            source: None,
        }
    }

    /// Attach a key/value pair that locates the failure.
    pub fn with_context(mut self, key: &'static str, value: impl ToString) -> Self {
        self.context.push((key, value.to_string()));
        self
    }

    /// Set the cause of the error, replacing the previous one.
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(Arc::new(source.into()));
        self
    }

    /// Kind of the error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Message of the error, may be empty.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Key/value pairs attached by [`Error::with_context`], in order.
    pub fn context(&self) -> &[(&'static str, String)] {
        &self.context
    }

    /// Downcast the cause of the error.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: Display + Debug + Send + Sync + 'static,
    {
        self.source.as_deref().and_then(|source| source.downcast_ref::<E>())
    }

    /// An [`ErrorKind::Io`] error caused by `source`.
    pub fn io_error(source: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, "").with_source(source)
    }

    /// An [`ErrorKind::Config`] error on `field` with the rejected `value`.
    pub fn config(field: &'static str, value: impl ToString, message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Config, message).with_context(field, value)
    }

    /// An [`ErrorKind::EditInProgress`] error on the hashed disk `key`.
    pub fn edit_in_progress(key: &str) -> Self {
        Self::new(ErrorKind::EditInProgress, "another editor is open").with_context("key", key)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::io_error(e)
    }
}

/// Result type of glint.
pub type Result<T> = std::result::Result<T, Error>;
