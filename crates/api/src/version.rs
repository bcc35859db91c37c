use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Tie-break policy used by `ArtifactResolver` when a class is present in
/// multiple artifacts and the caller did not pin a coordinate (base spec
/// §4.8). Legacy aliases are accepted at parse time and mapped onto one of
/// these three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionStrategy {
    Semver,
    LatestPublished,
    LatestUsed,
}

impl Default for VersionStrategy {
    fn default() -> Self {
        VersionStrategy::Semver
    }
}

impl FromStr for VersionStrategy {
    type Err = UnknownVersionStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "semver" | "semver-latest" => Ok(VersionStrategy::Semver),
            "latest-published" | "date-latest" | "modification-time" | "publish-time" => {
                Ok(VersionStrategy::LatestPublished)
            }
            "latest-used" | "creation-time" | "usage-time" => Ok(VersionStrategy::LatestUsed),
            other => Err(UnknownVersionStrategy(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown version strategy: {0}")]
pub struct UnknownVersionStrategy(pub String);
