//! Job submission flags

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Bitmask of job flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobFlags(u32);

impl JobFlags {
    /// No flags
    pub const NONE: JobFlags = JobFlags(0);
    /// Post extra debug events for this job
    pub const DEBUG: JobFlags = JobFlags(1);
    /// Job may be waited on by the submitter
    pub const WAITABLE: JobFlags = JobFlags(2);
    /// Job was submitted without validation
    pub const NOVALIDATE: JobFlags = JobFlags(8);

    /// Builds flags from raw bits
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw bits
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// True if every flag in `other` is set
    pub const fn contains(&self, other: JobFlags) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }
}

impl BitOr for JobFlags {
    type Output = JobFlags;

    fn bitor(self, rhs: JobFlags) -> JobFlags {
        JobFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for JobFlags {
    fn bitor_assign(&mut self, rhs: JobFlags) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for JobFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(JobFlags::DEBUG) {
            names.push("debug");
        }
        if self.contains(JobFlags::WAITABLE) {
            names.push("waitable");
        }
        if self.contains(JobFlags::NOVALIDATE) {
            names.push("novalidate");
        }
        write!(f, "[{}]", names.join(","))
    }
}
