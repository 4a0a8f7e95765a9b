use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Error;
use crate::filters::Tour;

static PLAYER_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&]p=([A-Za-z]+)").expect("player id regex"));

/// `<base>/cgi-bin/[w]player-classic.cgi?p=<Id><code>`; `code` starts with `&f=`.
pub fn player_url(base: &str, canonical_id: &str, tour: Tour, code: &str) -> String {
    let gender = match tour {
        Tour::ATP => "",
        Tour::WTA => "w",
    };
    format!(
        "{}/cgi-bin/{gender}player-classic.cgi?p={canonical_id}{code}",
        base.trim_end_matches('/')
    )
}

/// Tour from the character after `cgi-bin/`: `w` for WTA, `p` for ATP.
pub fn tour_from_url(url: &str) -> Result<Tour, Error> {
    let marker = url
        .find("cgi-bin/")
        .and_then(|idx| url[idx + "cgi-bin/".len()..].chars().next());
    match marker {
        Some('w') => Ok(Tour::WTA),
        Some('p') => Ok(Tour::ATP),
        _ => Err(Error::InvalidUrl(url.to_string())),
    }
}

pub fn player_id_from_url(url: &str) -> Result<String, Error> {
    PLAYER_ID_RE
        .captures(url)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| Error::InvalidUrl(url.to_string()))
}
