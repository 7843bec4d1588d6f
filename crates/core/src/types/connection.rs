//! Backend variant tags

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which kind of backend serves a library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    /// Native host process reached through host commands
    #[default]
    Local,
    /// Content server reached over HTTP
    Remote,
    /// In-process SQLite catalog
    Embedded,
}

impl ConnectionKind {
    pub const ALL: [ConnectionKind; 3] = [Self::Local, Self::Remote, Self::Embedded];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
            Self::Embedded => "embedded",
        }
    }
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown connection type '{}'", s))
    }
}
