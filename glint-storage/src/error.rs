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

use glint_common::error::{Error, ErrorKind};

/// Error of [`crate::store::DiskLruStore`].
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The store directory has been deleted.
    #[error("store is closed")]
    Closed,
    /// Another editor of the same key is open.
    #[error("entry is being edited, key: {0}")]
    EditInProgress(String),
}

/// Result type of [`crate::store::DiskLruStore`].
pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Io(e) => Error::io_error(e),
            StoreError::Closed => Error::new(ErrorKind::Closed, "store is closed"),
            StoreError::EditInProgress(key) => Error::edit_in_progress(&key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_error() {
        let err: Error = StoreError::EditInProgress("abc".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::EditInProgress);
        assert_eq!(err.context(), [("key", "abc".to_string())]);

        let err: Error = StoreError::from(std::io::Error::other("disk full")).into();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
