//! Version file handling

use crate::error::{Error, Result};
use semver::Version;

/// Parse the contents of a version file
pub fn parse_version(text: &str) -> Result<Version> {
    let text = text.trim();
    Version::parse(text).map_err(|_| Error::InvalidVersion(text.to_string()))
}

/// Version released from a trunk at `trunk` (pre-release and build dropped)
pub fn release_version(trunk: &Version) -> Version {
    Version::new(trunk.major, trunk.minor, trunk.patch)
}

/// Trunk version after releasing `released`
pub fn next_trunk_version(released: &Version) -> Version {
    Version::new(released.major, released.minor + 1, 0)
}
