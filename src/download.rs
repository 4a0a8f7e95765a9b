use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::assemble::assemble;
use crate::config::ScrapeConfig;
use crate::error::{Error, SessionError};
use crate::filters::{Attrs, Tour};
use crate::interaction::MatchTableInteraction;
use crate::merge::{MatchTable, merge};
use crate::names::{NameResolver, display_name};
use crate::session::{PageSession, Wait, capture_page};
use crate::url::{player_id_from_url, player_url, tour_from_url};

#[derive(Debug, Clone, PartialEq)]
pub enum Subject {
    Player {
        name: String,
        tour: Tour,
        attrs: Attrs,
    },
    Url(String),
}

impl Subject {
    pub fn player(name: impl Into<String>, tour: Tour, attrs: Attrs) -> Self {
        Subject::Player {
            name: name.into(),
            tour,
            attrs,
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Subject::Url(url.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedQuery {
    pub name: String,
    pub tour: Tour,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchData {
    pub name: String,
    pub tour: Tour,
    pub url: String,
    pub title: String,
    pub records: MatchTable,
}

pub fn prepare(
    subject: &Subject,
    config: &ScrapeConfig,
    names: &dyn NameResolver,
) -> Result<PreparedQuery, Error> {
    match subject {
        Subject::Player { name, tour, attrs } => {
            let canonical = names.resolve(name, *tour)?;
            let code = assemble(Some(*tour), attrs, names)?;
            Ok(PreparedQuery {
                name: display_name(&canonical),
                tour: *tour,
                url: player_url(&config.base_url, &canonical, *tour, &code),
            })
        }
        Subject::Url(url) => {
            let tour = tour_from_url(url)?;
            let canonical = player_id_from_url(url)?;
            Ok(PreparedQuery {
                name: display_name(&canonical),
                tour,
                url: url.clone(),
            })
        }
    }
}

pub fn download<S: PageSession>(
    subject: &Subject,
    config: &ScrapeConfig,
    names: &dyn NameResolver,
    session: &mut S,
) -> Result<MatchData, Error> {
    let query = prepare(subject, config, names)?;
    fetch_prepared(query, config, session)
}

pub fn fetch_prepared<S: PageSession>(
    query: PreparedQuery,
    config: &ScrapeConfig,
    session: &mut S,
) -> Result<MatchData, Error> {
    info!(url = %query.url, tour = %query.tour, "querying player page");

    let interaction = MatchTableInteraction::new(query.tour);
    let capture = capture_page(session, &query.url, &interaction, &Wait::from_config(config))?;
    let records = merge(&capture.fragments)?;
    info!(
        fragments = capture.fragments.len(),
        rows = records.row_count(),
        "merged match records"
    );

    Ok(MatchData {
        name: query.name,
        tour: query.tour,
        url: query.url,
        title: capture.title,
        records,
    })
}

/// Runs independent queries in parallel. Each query gets a fresh session from
/// `new_session`, created only after its attributes validate; results come
/// back in input order.
pub fn download_batch<S, F>(
    subjects: &[Subject],
    config: &ScrapeConfig,
    names: &dyn NameResolver,
    new_session: F,
) -> Vec<Result<MatchData, Error>>
where
    S: PageSession,
    F: Fn() -> Result<S, SessionError> + Sync,
{
    subjects
        .par_iter()
        .map(|subject| {
            let query = prepare(subject, config, names)?;
            let mut session = new_session()?;
            fetch_prepared(query, config, &mut session)
        })
        .collect()
}
