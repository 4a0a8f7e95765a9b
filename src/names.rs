use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

use anyhow::Context;
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use tracing::{debug, info};

use crate::config::ScrapeConfig;
use crate::error::ResolveError;
use crate::filters::Tour;
use crate::http_client::{build_client, fetch_text};

pub const MAX_CANDIDATES: usize = 10;

static DIRECTORY_ENTRY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""\(([MW])\)\s*([^"]+?)\s*""#).expect("directory regex"));

/// Turns a partial player name into the site's canonical identifier
/// (the full name without spaces, e.g. `RafaelNadal`).
pub trait NameResolver: Send + Sync {
    fn resolve(&self, partial: &str, tour: Tour) -> Result<String, ResolveError>;
}

#[derive(Debug, Clone, Default)]
pub struct PlayerDirectory {
    men: Vec<String>,
    women: Vec<String>,
}

impl PlayerDirectory {
    pub fn parse(script: &str) -> Self {
        let mut directory = PlayerDirectory::default();
        for caps in DIRECTORY_ENTRY_RE.captures_iter(script) {
            let name = caps[2].trim().to_string();
            if name.is_empty() {
                continue;
            }
            let tour = if caps[1].starts_with(Tour::WTA.gender_marker()) {
                Tour::WTA
            } else {
                Tour::ATP
            };
            directory.players_mut(tour).push(name);
        }
        directory
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Tour, S)>,
        S: Into<String>,
    {
        let mut directory = PlayerDirectory::default();
        for (tour, name) in entries {
            directory.players_mut(tour).push(name.into());
        }
        directory
    }

    pub fn fetch(url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = build_client(timeout)?;
        let body = fetch_text(&client, url).context("player list request failed")?;
        let directory = Self::parse(&body);
        info!(
            men = directory.men.len(),
            women = directory.women.len(),
            "loaded player directory"
        );
        Ok(directory)
    }

    pub fn players(&self, tour: Tour) -> &[String] {
        match tour {
            Tour::ATP => &self.men,
            Tour::WTA => &self.women,
        }
    }

    fn players_mut(&mut self, tour: Tour) -> &mut Vec<String> {
        match tour {
            Tour::ATP => &mut self.men,
            Tour::WTA => &mut self.women,
        }
    }

    pub fn len(&self) -> usize {
        self.men.len() + self.women.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NameResolver for PlayerDirectory {
    /// Every letter run in `partial` must appear in a candidate's name; the
    /// players surviving all runs are the matches.
    fn resolve(&self, partial: &str, tour: Tour) -> Result<String, ResolveError> {
        let tokens = name_tokens(partial);
        let no_match = || ResolveError::NoMatch {
            name: partial.to_string(),
            tour,
        };
        if tokens.is_empty() {
            return Err(no_match());
        }

        let players = self.players(tour);
        let mut survivors: Option<HashSet<&str>> = None;
        for token in &tokens {
            let hits: HashSet<&str> = players
                .iter()
                .filter(|name| name.to_lowercase().contains(token.as_str()))
                .map(String::as_str)
                .collect();
            survivors = Some(match survivors {
                Some(prev) => prev.intersection(&hits).copied().collect(),
                None => hits,
            });
        }
        let survivors: BTreeSet<&str> = survivors.unwrap_or_default().into_iter().collect();
        debug!(partial, %tour, matches = survivors.len(), "resolved name tokens");

        let mut iter = survivors.iter();
        match (iter.next(), iter.next()) {
            (None, _) => Err(no_match()),
            (Some(only), None) => Ok(canonical_id(only)),
            _ => {
                // A full-name hit settles "Andy Murray" against longer names containing it.
                let wanted = tokens.join(" ");
                if let Some(exact) = survivors
                    .iter()
                    .find(|name| name_tokens(name).join(" ") == wanted)
                {
                    return Ok(canonical_id(exact));
                }
                Err(ResolveError::AmbiguousMatch {
                    name: partial.to_string(),
                    candidates: survivors
                        .iter()
                        .take(MAX_CANDIDATES)
                        .map(|name| name.to_string())
                        .collect(),
                })
            }
        }
    }
}

#[derive(Debug)]
pub struct DirectoryResolver {
    url: String,
    timeout: Duration,
    directory: OnceCell<PlayerDirectory>,
}

impl DirectoryResolver {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
            directory: OnceCell::new(),
        }
    }

    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self::new(config.player_list_url.clone(), config.request_timeout)
    }

    fn directory(&self) -> Result<&PlayerDirectory, ResolveError> {
        self.directory.get_or_try_init(|| {
            PlayerDirectory::fetch(&self.url, self.timeout)
                .map_err(|err| ResolveError::Directory(format!("{err:#}")))
        })
    }
}

impl NameResolver for DirectoryResolver {
    fn resolve(&self, partial: &str, tour: Tour) -> Result<String, ResolveError> {
        self.directory()?.resolve(partial, tour)
    }
}

/// Lowercased letter runs of a name, first occurrence order, no repeats.
/// `"Jo-Wilfried Tsonga"` -> `["jo", "wilfried", "tsonga"]`.
pub fn name_tokens(name: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for token in name
        .split(|c: char| !c.is_ascii_alphabetic())
        .filter(|t| !t.is_empty())
        .map(str::to_ascii_lowercase)
    {
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}

pub fn canonical_id(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}

pub fn display_name(canonical: &str) -> String {
    let mut out = String::with_capacity(canonical.len() + 4);
    for (idx, c) in canonical.chars().enumerate() {
        if idx > 0 && c.is_ascii_uppercase() {
            out.push(' ');
        }
        out.push(c);
    }
    out
}
