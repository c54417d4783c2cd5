//! Output profiles

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A build configuration variant
///
/// The set is fixed and ordered: `Debug` always sorts before `Release`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputProfile {
    Debug,
    Release,
}

impl OutputProfile {
    /// All profiles, in canonical order
    pub const ALL: [OutputProfile; 2] = [OutputProfile::Debug, OutputProfile::Release];

    /// Directory name used both under the toolchain target dir and the staging root
    pub fn dir_name(&self) -> &'static str {
        match self {
            OutputProfile::Debug => "debug",
            OutputProfile::Release => "release",
        }
    }

    /// Extra build arguments selecting this profile
    pub fn build_args(&self) -> &'static [&'static str] {
        match self {
            OutputProfile::Debug => &[],
            OutputProfile::Release => &["--release"],
        }
    }

    /// Where the toolchain leaves binaries for this profile
    pub fn source_dir(&self, target_dir: &Path) -> PathBuf {
        target_dir.join(self.dir_name())
    }

    /// Where staged artifacts for this profile live
    pub fn staging_dir(&self, output_root: &Path) -> PathBuf {
        output_root.join(self.dir_name())
    }
}

impl fmt::Display for OutputProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}
