//! Read-only `.netrc` access
//!
//! Only the `github.com` entry matters here: its `login` is the GitHub
//! username and its `password` an access token.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Machine name of the GitHub entry
pub const GITHUB_MACHINE: &str = "github.com";

/// Credentials for one `machine` entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetrcEntry {
    /// `login` value
    pub login: Option<String>,
    /// `password` value
    pub password: Option<String>,
}

/// Parsed `.netrc` contents
#[derive(Debug, Clone, Default)]
pub struct NetrcFile {
    entries: Vec<(String, NetrcEntry)>,
}

impl NetrcFile {
    /// Parse `~/.netrc`; an absent or unreadable file yields no entries
    pub fn load() -> Self {
        Self::default_path().map_or_else(Self::default, |p| Self::load_from(&p))
    }

    /// Parse the file at `path`; an absent or unreadable file yields no entries
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(e) => {
                debug!("No netrc at {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// `~/.netrc`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".netrc"))
    }

    /// Parse netrc text
    ///
    /// Tokens are whitespace separated and may span lines. `macdef` bodies
    /// run until the next blank line and are skipped.
    pub fn parse(contents: &str) -> Self {
        let mut entries: Vec<(String, NetrcEntry)> = Vec::new();
        let mut in_macdef = false;
        let mut tokens = Vec::new();

        for line in contents.lines() {
            if in_macdef {
                if line.trim().is_empty() {
                    in_macdef = false;
                }
                continue;
            }
            let line = line.split('#').next().unwrap_or_default();
            for token in line.split_whitespace() {
                if token == "macdef" {
                    in_macdef = true;
                    break;
                }
                tokens.push(token.to_string());
            }
        }

        let mut iter = tokens.into_iter();
        while let Some(token) = iter.next() {
            match token.as_str() {
                "machine" => {
                    if let Some(name) = iter.next() {
                        entries.push((name, NetrcEntry::default()));
                    }
                }
                "default" => entries.push(("default".to_string(), NetrcEntry::default())),
                "login" | "password" | "account" => {
                    let value = iter.next();
                    if let Some((_, entry)) = entries.last_mut() {
                        match token.as_str() {
                            "login" => entry.login = value,
                            "password" => entry.password = value,
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
        }

        Self { entries }
    }

    /// Entry for `machine`, if present
    pub fn entry(&self, machine: &str) -> Option<&NetrcEntry> {
        self.entries
            .iter()
            .find(|(name, _)| name == machine)
            .map(|(_, entry)| entry)
    }

    /// GitHub username from the `github.com` entry
    pub fn github_username(&self) -> Option<&str> {
        self.entry(GITHUB_MACHINE)?.login.as_deref()
    }

    /// GitHub access token from the `github.com` entry
    pub fn github_access_token(&self) -> Option<&str> {
        self.entry(GITHUB_MACHINE)?.password.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NETRC: &str = "\
machine example.org login other password hunter2

# personal
machine github.com
  login octodev
  password ghp_0123456789

macdef init
cd /pub
bin

default login anonymous password user@example.org
";

    #[test]
    fn test_github_values() {
        let netrc = NetrcFile::parse(NETRC);
        assert_eq!(netrc.github_username(), Some("octodev"));
        assert_eq!(netrc.github_access_token(), Some("ghp_0123456789"));
    }

    #[test]
    fn test_other_entries() {
        let netrc = NetrcFile::parse(NETRC);
        assert_eq!(
            netrc.entry("example.org"),
            Some(&NetrcEntry {
                login: Some("other".to_string()),
                password: Some("hunter2".to_string()),
            })
        );
        assert_eq!(
            netrc.entry("default").and_then(|e| e.login.as_deref()),
            Some("anonymous")
        );
    }

    #[test]
    fn test_missing_file() {
        let netrc = NetrcFile::load_from(Path::new("/nonexistent/.netrc"));
        assert!(netrc.github_username().is_none());
        assert!(netrc.github_access_token().is_none());
    }

    #[test]
    fn test_no_github_entry() {
        let netrc = NetrcFile::parse("machine gitlab.com login someone password x\n");
        assert!(netrc.github_username().is_none());
    }
}
