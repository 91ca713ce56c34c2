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

use serde::{Deserialize, Serialize};

/// Memory pressure signal delivered by the host platform.
///
/// Levels are ordered, a higher level asks for at least as much memory back as a lower one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TrimLevel {
    /// No pressure, nothing to release.
    #[default]
    None,
    /// The app is running low or its UI is hidden. Release half of the budget.
    Moderate,
    /// The app is in the background. Release everything.
    Background,
    /// The app is about to be killed. Release everything.
    Complete,
}

impl TrimLevel {
    /// Map an Android `ComponentCallbacks2` trim integer to a [`TrimLevel`].
    ///
    /// `TRIM_MEMORY_COMPLETE` (80) and above map to [`TrimLevel::Complete`], `TRIM_MEMORY_BACKGROUND` (40) and above
    /// to [`TrimLevel::Background`], `TRIM_MEMORY_UI_HIDDEN` (20) and above or `TRIM_MEMORY_RUNNING_CRITICAL` (15) to
    /// [`TrimLevel::Moderate`].
    pub fn from_platform(level: i32) -> Self {
        match level {
            80.. => Self::Complete,
            40.. => Self::Background,
            20.. | 15 => Self::Moderate,
            _ => Self::None,
        }
    }

    /// The size a pool or cache with `max_size` budget should shrink to under this level.
    ///
    /// Returns `None` if nothing needs to be released.
    pub fn target_size(self, max_size: usize) -> Option<usize> {
        match self {
            Self::None => None,
            Self::Moderate => Some(max_size / 2),
            Self::Background | Self::Complete => Some(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_platform() {
        assert_eq!(TrimLevel::from_platform(80), TrimLevel::Complete);
        assert_eq!(TrimLevel::from_platform(60), TrimLevel::Background);
        assert_eq!(TrimLevel::from_platform(40), TrimLevel::Background);
        assert_eq!(TrimLevel::from_platform(20), TrimLevel::Moderate);
        assert_eq!(TrimLevel::from_platform(15), TrimLevel::Moderate);
        assert_eq!(TrimLevel::from_platform(10), TrimLevel::None);
        assert_eq!(TrimLevel::from_platform(5), TrimLevel::None);
        assert_eq!(TrimLevel::from_platform(-1), TrimLevel::None);
    }

    #[test]
    fn test_target_size() {
        assert_eq!(TrimLevel::None.target_size(100), None);
        assert_eq!(TrimLevel::Moderate.target_size(101), Some(50));
        assert_eq!(TrimLevel::Background.target_size(100), Some(0));
        assert_eq!(TrimLevel::Complete.target_size(100), Some(0));
        assert!(TrimLevel::Complete > TrimLevel::Background);
        assert!(TrimLevel::Background > TrimLevel::Moderate);
    }
}
