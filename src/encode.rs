use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::combos::validate_combo;
use crate::error::EncodeError;
use crate::events::{EVENTS, EventCode, find_event, join_labels};
use crate::filters::{FilterKey, FilterValue, Phase, Tour};
use crate::names::NameResolver;

/// Largest rank the site's five-digit range encoding can carry.
pub const MAX_RANK: u32 = 99_999;

static SETS_COUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d)\s*(?:/|of)\s*(\d)(?:\s+sets?)?$").expect("sets count regex")
});

static BEST_OF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^best\s+of\s+(\d)(?:\s+sets?)?$").expect("best-of regex"));

/// Encodes one (key, value) pair into its fragment, prefix included.
///
/// Date keys yield the bare `YYYYMMDD` token; the assembler folds both dates
/// into the leading date fragment. People keys resolve every name through
/// `names`, which needs a tour.
pub fn encode(
    key: FilterKey,
    value: &FilterValue,
    tour: Option<Tour>,
    names: &dyn NameResolver,
) -> Result<String, EncodeError> {
    match key.phase() {
        Phase::Date => encode_date(key, value),
        Phase::People => encode_people(key, value, tour, names),
        Phase::Query => encode_query(key, value, tour).map(|code| format!("{}{code}", key.prefix())),
    }
}

pub fn encode_date(key: FilterKey, value: &FilterValue) -> Result<String, EncodeError> {
    match value {
        FilterValue::Date(date) => Ok(format_date(*date)),
        // JSON may hand over a date the untagged parse did not recognise.
        FilterValue::Text(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map(format_date)
            .map_err(|_| EncodeError::InvalidType {
                key,
                expected: "Provide a date, e.g. '2003-12-11'.",
            }),
        _ => Err(EncodeError::InvalidType {
            key,
            expected: "Provide a date, e.g. '2003-12-11'.",
        }),
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

fn encode_people(
    key: FilterKey,
    value: &FilterValue,
    tour: Option<Tour>,
    names: &dyn NameResolver,
) -> Result<String, EncodeError> {
    let raw_names: Vec<&str> = match value {
        FilterValue::Text(name) => vec![name.as_str()],
        FilterValue::List(list) if !list.is_empty() => list.iter().map(String::as_str).collect(),
        _ => {
            return Err(EncodeError::InvalidType {
                key,
                expected: "Try a string name or a list of string names.",
            });
        }
    };
    let Some(tour) = tour else {
        return Err(EncodeError::TourRequired {
            key,
            value: raw_names.join(", "),
        });
    };

    let mut resolved = Vec::with_capacity(raw_names.len());
    for name in raw_names {
        resolved.push(names.resolve(name, tour)?);
    }
    Ok(format!("{}{}", key.prefix(), resolved.join(",")))
}

fn encode_query(
    key: FilterKey,
    value: &FilterValue,
    tour: Option<Tour>,
) -> Result<String, EncodeError> {
    match value {
        FilterValue::Text(raw) => encode_text(key, raw, tour),
        FilterValue::List(items) => {
            let Some(separator) = key.list_separator() else {
                return Err(EncodeError::InvalidType {
                    key,
                    expected: list_rejection(key),
                });
            };
            if items.is_empty() {
                return Err(EncodeError::invalid(
                    key,
                    format!("Provide at least one value for key '{key}'."),
                ));
            }
            let codes = items
                .iter()
                .map(|item| encode_text(key, item, tour))
                .collect::<Result<Vec<_>, _>>()?;
            validate_combo(key, &codes)?;
            Ok(codes.join(separator))
        }
        FilterValue::Range(lo, hi) if key == FilterKey::VsRank => encode_rank_range(*lo, *hi),
        FilterValue::Range(..) | FilterValue::Date(_) => Err(EncodeError::InvalidType {
            key,
            expected: text_expectation(key),
        }),
    }
}

fn list_rejection(key: FilterKey) -> &'static str {
    match key {
        FilterKey::VsHeight => "Provide a single string; lists of heights are not supported.",
        FilterKey::VsRank => "Provide a single string or a (low, high) tuple of ranks.",
        _ => "Provide a single string.",
    }
}

fn text_expectation(key: FilterKey) -> &'static str {
    match key {
        FilterKey::Surface
        | FilterKey::Level
        | FilterKey::Event
        | FilterKey::Round
        | FilterKey::Sets
        | FilterKey::AsEntry
        | FilterKey::VsEntry => "Provide a string or a list of strings.",
        _ => "Provide a single string.",
    }
}

fn encode_text(key: FilterKey, raw: &str, tour: Option<Tour>) -> Result<String, EncodeError> {
    let folded = fold(raw);
    let code = match key {
        FilterKey::Surface => surface(&folded)?,
        FilterKey::Level => level(&folded, tour)?,
        FilterKey::Event => return event(raw, &folded, tour),
        FilterKey::Round => round(&folded, tour)?,
        FilterKey::Sets => return sets(raw, &folded, tour),
        FilterKey::Score => score(&folded)?,
        FilterKey::AsRank => as_rank(&folded)?,
        FilterKey::VsRank => return vs_rank(raw, &folded, tour),
        FilterKey::VsCurrentRank => vs_current_rank(&folded, tour)?,
        FilterKey::AsEntry | FilterKey::VsEntry => entry(key, &folded)?,
        FilterKey::VsHand => hand(&folded)?,
        FilterKey::VsHeight => height(raw, &folded, tour)?,
        FilterKey::HeadToHead
        | FilterKey::ExcludeOpponent
        | FilterKey::StartDate
        | FilterKey::EndDate => {
            return Err(EncodeError::InvalidType {
                key,
                expected: "This key is not encoded as a query fragment.",
            });
        }
    };
    Ok(code.to_string())
}

fn fold(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .replace(['\u{2019}', '\u{2032}'], "'")
}

fn surface(value: &str) -> Result<&'static str, EncodeError> {
    match value {
        "hard" => Ok("0"),
        "clay" => Ok("1"),
        "grass" => Ok("2"),
        "carpet" => Ok("3"),
        _ => Err(EncodeError::invalid(
            FilterKey::Surface,
            "Invalid value for key 'surface'. Choose from 'hard', 'clay', 'grass', and 'carpet'.",
        )),
    }
}

fn level(value: &str, tour: Option<Tour>) -> Result<&'static str, EncodeError> {
    match (value, tour) {
        ("grand slams" | "grand slam", _) => Ok("0"),
        ("masters", Some(Tour::WTA)) | ("premier", Some(Tour::ATP)) => {
            let (label, tour) = if value == "masters" {
                ("Masters", Tour::WTA)
            } else {
                ("Premier", Tour::ATP)
            };
            Err(EncodeError::invalid(
                FilterKey::Level,
                format!(
                    "The '{label}' level doesn't go with the '{tour}' tour. For this level, \
                     'ATP' goes with 'Masters' and 'WTA' goes with 'Premier'."
                ),
            ))
        }
        ("masters" | "premier", _) => Ok("1"),
        ("all tour", _) => Ok("2"),
        _ => Err(EncodeError::invalid(
            FilterKey::Level,
            "Invalid value for key 'level'. Choose from 'Grand Slams', 'Masters' (ATP), \
             'Premier' (WTA), and 'All Tour'.",
        )),
    }
}

fn event(raw: &str, value: &str, tour: Option<Tour>) -> Result<String, EncodeError> {
    let Some(entry) = find_event(value) else {
        let names = EVENTS
            .iter()
            .map(|entry| format!("'{}'", entry.name))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(EncodeError::invalid(
            FilterKey::Event,
            format!("Invalid value for key 'event'. Choose from {names}."),
        ));
    };

    let code = match tour {
        Some(tour) => entry.code_for(tour),
        None => match (entry.atp, entry.wta) {
            (atp, wta) if atp == wta => atp,
            (labels, EventCode::Unavailable) | (EventCode::Unavailable, labels) => labels,
            _ => {
                return Err(EncodeError::TourRequired {
                    key: FilterKey::Event,
                    value: raw.to_string(),
                });
            }
        },
    };

    match (code, tour) {
        (EventCode::Labels(labels), _) => Ok(join_labels(labels)),
        (EventCode::Unavailable, tour) => Err(EncodeError::invalid(
            FilterKey::Event,
            format!(
                "'{}' and '{}' do not go together. Try 'Davis Cup' with 'ATP' or 'Fed Cup' \
                 with 'WTA'.",
                entry.name,
                tour.map(Tour::as_str).unwrap_or("this")
            ),
        )),
    }
}

fn round(value: &str, tour: Option<Tour>) -> Result<&'static str, EncodeError> {
    let code = match value {
        "final" | "finals" | "f" => "0",
        "semifinal" | "semifinals" | "sf" => "1",
        "quarterfinal" | "quarterfinals" | "qf" => "2",
        "r16" | "round of 16" => "3",
        "r32" | "round of 32" => "4",
        "r64" | "round of 64" => "5",
        "r128" | "round of 128" => "6",
        "first round" | "1r" => "7",
        "second round" | "2r" => "8",
        "third round" | "3r" => "9",
        "first match" => "10",
        "second match" => "11",
        "third match" => "12",
        _ => {
            return Err(EncodeError::invalid(
                FilterKey::Round,
                "Invalid value for key 'round'. Choose a late round ('Final'/'F', \
                 'Semifinal'/'SF', 'Quarterfinal'/'QF'), a round by remaining players \
                 ('Round of 16'/'R16' through 'Round of 128'/'R128') or, for ATP players, \
                 'First Round'/'1R' through 'Third Round'/'3R' and 'First Match' through \
                 'Third Match'.",
            ));
        }
    };
    let atp_only = matches!(code, "7" | "8" | "9" | "10" | "11" | "12");
    if atp_only && tour == Some(Tour::WTA) {
        return Err(EncodeError::invalid(
            FilterKey::Round,
            "Sorry, this option is only available for ATP players. Try names for late rounds \
             ('Quarterfinal' or later) or that are based on the remaining number of players \
             ('Round of 16'/'R16' or earlier).",
        ));
    }
    Ok(code)
}

const SETS_ATP_ONLY: &str = "Sorry, this option is only available for ATP players. For WTA \
     players, try 'straight sets' or 'deciding set'.";

fn sets(raw: &str, value: &str, tour: Option<Tour>) -> Result<String, EncodeError> {
    let tour_required = || EncodeError::TourRequired {
        key: FilterKey::Sets,
        value: raw.to_string(),
    };
    let atp_only = || EncodeError::invalid(FilterKey::Sets, SETS_ATP_ONLY);

    let code = match value {
        "straight sets" | "straights" => "0",
        "deciding set" | "decider" => "1",
        _ => {
            if let Some(caps) = BEST_OF_RE.captures(value) {
                match (&caps[1], tour) {
                    ("5", Some(Tour::WTA)) => return Err(atp_only()),
                    ("5", _) => "2",
                    ("3", Some(Tour::WTA)) => "0i1",
                    ("3", Some(Tour::ATP)) => "6",
                    ("3", None) => return Err(tour_required()),
                    _ => return Err(sets_invalid()),
                }
            } else if let Some(caps) = SETS_COUNT_RE.captures(value) {
                match ((&caps[1], &caps[2]), tour) {
                    (("2", "3"), Some(Tour::WTA)) => "0",
                    (("3", "3"), Some(Tour::WTA)) => "1",
                    (("2", "3") | ("3", "3"), None) => return Err(tour_required()),
                    (("2", "3"), Some(Tour::ATP)) => "7",
                    (("3", "3"), Some(Tour::ATP)) => "8",
                    (("3", "5") | ("4", "5") | ("5", "5"), Some(Tour::WTA)) => {
                        return Err(atp_only());
                    }
                    (("3", "5"), _) => "3",
                    (("4", "5"), _) => "4",
                    (("5", "5"), _) => "5",
                    _ => return Err(sets_invalid()),
                }
            } else {
                return Err(sets_invalid());
            }
        }
    };
    Ok(code.to_string())
}

fn sets_invalid() -> EncodeError {
    EncodeError::invalid(
        FilterKey::Sets,
        "Invalid value for key 'sets'. Choose from 'straight sets', 'deciding set', or, for \
         ATP players, 'X of Y sets', where Y can be '3' or '5'.",
    )
}

fn score(value: &str) -> Result<&'static str, EncodeError> {
    let all = value.contains("all");
    let won = value.contains("won") || value.contains("win");
    let lost = value.contains("lost") || value.contains("loss");

    // (all, won, lost) per set score; tiebreaks add a "deciding" code.
    let codes: Option<[&str; 3]> = if value.contains("tiebreak") || value.contains("7-6") {
        if !(all || won || lost) && (value.contains("deciding") || value.contains("final")) {
            return Ok("3");
        }
        Some(["0", "1", "2"])
    } else if value.contains("7-5") {
        Some(["4", "5", "6"])
    } else if value.contains("6-0") {
        Some(["7", "8", "9"])
    } else if value.contains("6-1") {
        Some(["10", "11", "12"])
    } else {
        None
    };

    let code = codes.and_then(|[all_code, won_code, lost_code]| {
        if all {
            Some(all_code)
        } else if won {
            Some(won_code)
        } else if lost {
            Some(lost_code)
        } else {
            None
        }
    });
    code.ok_or_else(|| {
        EncodeError::invalid(
            FilterKey::Score,
            "Invalid value for key 'score'. Choose 'all', 'won', or 'lost' for scores of '7-6', \
             '7-5', '6-0', or '6-1' (e.g., 'all 7-6', 'lost 6-0'), or 'deciding 7-6'.",
        )
    })
}

fn as_rank(value: &str) -> Result<&'static str, EncodeError> {
    match value {
        "number 1" | "no. 1" => Ok("0"),
        "top 5" => Ok("1"),
        "top 10" => Ok("2"),
        "top 20" => Ok("3"),
        "top 50" => Ok("4"),
        "below 50" => Ok("9"),
        _ => Err(EncodeError::invalid(
            FilterKey::AsRank,
            "Invalid value for key 'as rank'. Choose from 'Number 1', 'Top 5', 'Top 10', \
             'Top 20', 'Top 50', and 'Below 50'.",
        )),
    }
}

fn vs_rank(raw: &str, value: &str, tour: Option<Tour>) -> Result<String, EncodeError> {
    match (value, tour) {
        ("top 10" | "top 20" | "top 50" | "top 100", _) | ("top 5", Some(Tour::ATP)) => {
            Ok(format!("{}qq", value.replacen("top ", "Top_", 1)))
        }
        // The site has no WTA 'Top 5' label.
        ("top 5", Some(Tour::WTA)) => encode_rank_range(1, 5),
        ("top 5", None) => Err(EncodeError::TourRequired {
            key: FilterKey::VsRank,
            value: raw.to_string(),
        }),
        _ => Err(EncodeError::invalid(
            FilterKey::VsRank,
            "Invalid value for key 'vs rank'. Choose from 'Top 5', 'Top 10', 'Top 20', \
             'Top 50', 'Top 100', or provide a tuple with your desired (inclusive) range.",
        )),
    }
}

/// `cx` + both bounds as five digits + `qq`. Ranks below 10000 are written as
/// `1` followed by four zero-padded digits.
pub fn encode_rank_range(lo: u32, hi: u32) -> Result<String, EncodeError> {
    if lo == 0 || hi > MAX_RANK || lo > hi {
        return Err(EncodeError::invalid(
            FilterKey::VsRank,
            format!(
                "Invalid range ({lo}, {hi}) for key 'vs rank'. Provide ranks from 1 to \
                 {MAX_RANK}, lowest first."
            ),
        ));
    }
    Ok(format!("cx{}{}qq", rank_digits(lo), rank_digits(hi)))
}

fn rank_digits(rank: u32) -> String {
    if rank < 10_000 {
        format!("1{rank:04}")
    } else {
        rank.to_string()
    }
}

fn vs_current_rank(value: &str, tour: Option<Tour>) -> Result<&'static str, EncodeError> {
    if tour == Some(Tour::WTA) {
        return Err(EncodeError::invalid(
            FilterKey::VsCurrentRank,
            "Sorry, this attribute is only available for ATP players.",
        ));
    }
    match value {
        "top 10" => Ok("0"),
        "top 20" => Ok("1"),
        "top 50" => Ok("2"),
        "top 100" => Ok("3"),
        "active" => Ok("4"),
        "inactive" => Ok("5"),
        _ => Err(EncodeError::invalid(
            FilterKey::VsCurrentRank,
            "Invalid value for key 'vs current rank'. Choose from 'Top 10', 'Top 20', \
             'Top 50', 'Top 100', 'Active', and 'Inactive'.",
        )),
    }
}

fn entry(key: FilterKey, value: &str) -> Result<&'static str, EncodeError> {
    match value {
        "seeded" => Ok("0"),
        "unseeded" => Ok("1"),
        "qualifier" => Ok("2"),
        "wild card" | "wildcard" => Ok("3"),
        _ => Err(EncodeError::invalid(
            key,
            format!(
                "Invalid value for key '{key}'. Choose from 'seeded', 'unseeded', 'qualifier', \
                 and 'wild card'."
            ),
        )),
    }
}

fn hand(value: &str) -> Result<&'static str, EncodeError> {
    match value {
        "right" => Ok("0"),
        "left" => Ok("1"),
        _ => Err(EncodeError::invalid(
            FilterKey::VsHand,
            "Invalid value for key 'hand'. Choose 'right' or 'left'.",
        )),
    }
}

fn height_brackets(tour: Tour) -> [&'static str; 4] {
    match tour {
        Tour::ATP => ["Under 5'10", "Under 6'0", "Over 6'2", "Over 6'4"],
        Tour::WTA => ["Under 5'6", "Under 5'8", "Over 5'10", "Over 6'0"],
    }
}

fn height(raw: &str, value: &str, tour: Option<Tour>) -> Result<&'static str, EncodeError> {
    const BRACKET_CODES: [&str; 4] = ["2", "3", "4", "5"];
    match value {
        "shorter" => return Ok("0"),
        "taller" => return Ok("1"),
        _ => {}
    }
    let bracket_index = |tour: Tour| {
        height_brackets(tour)
            .iter()
            .position(|bracket| bracket.to_lowercase() == value)
    };

    match tour {
        Some(tour) => bracket_index(tour)
            .map(|idx| BRACKET_CODES[idx])
            .ok_or_else(|| height_invalid(&[tour])),
        None if bracket_index(Tour::ATP).is_some() || bracket_index(Tour::WTA).is_some() => {
            Err(EncodeError::TourRequired {
                key: FilterKey::VsHeight,
                value: raw.to_string(),
            })
        }
        None => Err(height_invalid(&[Tour::ATP, Tour::WTA])),
    }
}

fn height_invalid(tours: &[Tour]) -> EncodeError {
    let choices = tours
        .iter()
        .map(|tour| {
            let [u0, u1, o0, o1] = height_brackets(*tour);
            format!(
                "For tour '{tour}', choose from 'Shorter', 'Taller', '{u0}', '{u1}', '{o0}', \
                 and '{o1}'."
            )
        })
        .collect::<Vec<_>>()
        .join(" ");
    EncodeError::invalid(
        FilterKey::VsHeight,
        format!("Invalid value for key 'height'. {choices}"),
    )
}
