use chrono::NaiveDate;

use ta_query::assemble::assemble;
use ta_query::error::{EncodeError, ResolveError};
use ta_query::filters::{Attrs, FilterKey, FilterValue, Tour};
use ta_query::names::PlayerDirectory;

fn directory() -> PlayerDirectory {
    PlayerDirectory::from_entries([
        (Tour::ATP, "Jo Wilfried Tsonga"),
        (Tour::ATP, "Gael Monfils"),
        (Tour::ATP, "Juan Martin Del Potro"),
        (Tour::ATP, "Arthur Ashe"),
        (Tour::ATP, "Andy Murray"),
        (Tour::ATP, "Jamie Murray"),
        (Tour::ATP, "Arnaud Clement"),
        (Tour::ATP, "Guillermo Canas"),
        (Tour::WTA, "Sabine Lisicki"),
        (Tour::WTA, "Venus Williams"),
        (Tour::WTA, "Serena Williams"),
        (Tour::WTA, "Bianca Andreescu"),
    ])
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn code<V: Into<FilterValue>>(tour: Option<Tour>, key: &str, value: V) -> Result<String, EncodeError> {
    let attrs = Attrs::from_named([(key, value)])?;
    assemble(tour, &attrs, &directory())
}

fn expect<V: Into<FilterValue>>(tour: Option<Tour>, key: &str, value: V, expected: &str) {
    match code(tour, key, value) {
        Ok(found) => assert_eq!(found, expected, "key '{key}'"),
        Err(err) => panic!("key '{key}' failed: {err}"),
    }
}

fn expect_message<V: Into<FilterValue>>(tour: Option<Tour>, key: &str, value: V, needle: &str) {
    let err = code(tour, key, value).expect_err("value should be rejected");
    let message = err.to_string();
    assert!(message.contains(needle), "'{message}' lacks '{needle}'");
}

const ATP: Option<Tour> = Some(Tour::ATP);
const WTA: Option<Tour> = Some(Tour::WTA);

#[test]
fn people_are_resolved_and_joined() {
    expect(ATP, "head-to-head", ["jo-wi tsong", "gael mONf"], "&f=ACareerqq&q=JoWilfriedTsonga,GaelMonfils");
    expect(ATP, "exclude opp", ["jo-wi tsong", "gael mONf"], "&f=ACareerqq&x=JoWilfriedTsonga,GaelMonfils");
    expect(WTA, "exclude opp", "Sab Lisi", "&f=ACareerqq&x=SabineLisicki");
    expect(WTA, "head-to-head", ["Venus", "bia rees"], "&f=ACareerqq&q=VenusWilliams,BiancaAndreescu");
    expect(ATP, "head-to-head", ["juan potro"], "&f=ACareerqq&q=JuanMartinDelPotro");
    expect(ATP, "head-to-head", "Art Ash", "&f=ACareerqq&q=ArthurAshe");
}

#[test]
fn resolver_failures_propagate_unchanged() {
    let err = code(ATP, "head-to-head", "Murray").unwrap_err();
    match err {
        EncodeError::Resolve(ResolveError::AmbiguousMatch { candidates, .. }) => {
            assert_eq!(candidates, vec!["Andy Murray", "Jamie Murray"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(matches!(
        code(WTA, "head-to-head", "Gael Monfils"),
        Err(EncodeError::Resolve(ResolveError::NoMatch { tour: Tour::WTA, .. }))
    ));
}

#[test]
fn date_ranges() {
    let attrs = Attrs::from_named([("start date", date(2003, 12, 11))]).unwrap();
    let err = assemble(None, &attrs, &directory()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "'start date' and 'end date' must both be present or absent in your 'attrs' dict."
    );

    let attrs = Attrs::from_named([
        ("start date", date(2003, 12, 11)),
        ("end date", date(2001, 12, 11)),
    ])
    .unwrap();
    assert_eq!(assemble(None, &attrs, &directory()).unwrap(), "&f=Acx2001121120031211qq");

    let attrs = Attrs::from_named([
        ("start date", date(1991, 2, 11)),
        ("end date", date(1993, 2, 11)),
    ])
    .unwrap();
    assert_eq!(assemble(None, &attrs, &directory()).unwrap(), "&f=Acx1991021119930211qq");
}

#[test]
fn surfaces() {
    expect_message(
        None,
        "surface",
        "dirt",
        "Invalid value for key 'surface'. Choose from 'hard', 'clay', 'grass', and 'carpet'.",
    );
    expect(None, "surface", "grass", "&f=ACareerqqB2");
    expect(None, "surface", "GRASS", "&f=ACareerqqB2");
    expect(None, "surface", ["clay", "carpet"], "&f=ACareerqqB1i3");
}

#[test]
fn events() {
    expect(ATP, "event", "Olympics", "&f=ACareerqqDOlympicsqq");
    expect(WTA, "event", "Canada", "&f=ACareerqqDMontrealqq,Torontoqq,Toronto_qq,Canadian_Open");
    expect(WTA, "event", ["Washington", "Beijing"], "&f=ACareerqqDWashingtonqq,Beijingqq");
    expect(
        ATP,
        "event",
        ["Tour Finals", "French Open"],
        "&f=ACareerqqDTour_Finalsqq,Masters,Roland_Garrosqq",
    );
    expect_message(ATP, "event", "Shanghai", "Invalid value for key 'event'.");
    expect_message(WTA, "event", "Davis Cup", "'Davis Cup' and 'WTA' do not go together.");
}

#[test]
fn levels() {
    expect_message(ATP, "level", "Backyard", "Invalid value for key 'level'.");
    expect(ATP, "level", "All Tour", "&f=ACareerqqC2");
    expect_message(
        ATP,
        "level",
        ["Premier", "Grand Slams"],
        "The 'Premier' level doesn't go with the 'ATP' tour. For this level, 'ATP' goes with \
         'Masters' and 'WTA' goes with 'Premier'.",
    );
    expect_message(
        WTA,
        "level",
        ["Masters", "Grand Slams"],
        "The 'Masters' level doesn't go with the 'WTA' tour.",
    );
    expect(WTA, "level", ["premier", "grand slams"], "&f=ACareerqqC1i0");
}

#[test]
fn sets() {
    expect(ATP, "sets", "straight sets", "&f=ACareerqqP0");
    expect(WTA, "sets", "2 of 3 sets", "&f=ACareerqqP0");
    expect(ATP, "sets", ["3/3 sets", "4/5 sets"], "&f=ACareerqqP8i4");
    expect_message(
        WTA,
        "sets",
        ["3/3 sets", "4/5 sets"],
        "Sorry, this option is only available for ATP players. For WTA players, try \
         'straight sets' or 'deciding set'.",
    );
    expect_message(
        ATP,
        "sets",
        ["deciding set", "5/5 sets"],
        "Valid 'sets' lists can include up to two categories",
    );
    expect_message(
        ATP,
        "sets",
        ["decider", "2/3 sets", "4/5 sets"],
        "Valid 'sets' lists can include up to two categories",
    );
}

#[test]
fn rounds() {
    expect(WTA, "round", "R128", "&f=ACareerqqE6");
    expect(ATP, "round", ["Final", "SF", "quarterfinals"], "&f=ACareerqqE0i1i2");
    expect(ATP, "round", ["first match"], "&f=ACareerqqE10");
    expect_message(
        WTA,
        "round",
        ["third match"],
        "Sorry, this option is only available for ATP players.",
    );
    let err = code(ATP, "round", ["first match", "1R"]).unwrap_err();
    assert!(matches!(err, EncodeError::IllegalCombination { key: FilterKey::Round, .. }));
    assert!(err.to_string().starts_with("Valid 'round' lists that combine categories"));
}

#[test]
fn scores() {
    expect(None, "score", "all 7-6", "&f=ACareerqqQ0");
    expect(None, "score", "lost 6-1", "&f=ACareerqqQ12");
    expect_message(
        None,
        "score",
        "won 6-3",
        "Invalid value for key 'score'. Choose 'all', 'won', or 'lost'",
    );
}

#[test]
fn heights() {
    expect(ATP, "vs height", "Over 6'4", "&f=ACareerqqM5");
    expect(WTA, "vs height", "shorter", "&f=ACareerqqM0");
    expect_message(
        WTA,
        "vs height",
        "Equal",
        "Invalid value for key 'height'. For tour 'WTA', choose from 'Shorter', 'Taller', \
         'Under 5'6', 'Under 5'8', 'Over 5'10', and 'Over 6'0'.",
    );
    expect_message(
        ATP,
        "vs height",
        "Equal",
        "Invalid value for key 'height'. For tour 'ATP', choose from 'Shorter', 'Taller', \
         'Under 5'10', 'Under 6'0', 'Over 6'2', and 'Over 6'4'.",
    );
    assert!(matches!(
        code(WTA, "vs height", ["shorter", "under 5'6"]),
        Err(EncodeError::InvalidType { key: FilterKey::VsHeight, .. })
    ));
}

#[test]
fn hands_and_entries() {
    expect(None, "vs hand", "right", "&f=ACareerqqK0");
    expect(None, "vs hand", "Left", "&f=ACareerqqK1");
    expect_message(
        None,
        "vs hand",
        "ambidextrous",
        "Invalid value for key 'hand'. Choose 'right' or 'left'.",
    );

    expect(None, "vs entry", "unseeded", "&f=ACareerqqJ1");
    expect(None, "vs entry", ["wild card", "seeded"], "&f=ACareerqqJ3i0");
    expect_message(
        None,
        "vs entry",
        "none",
        "Invalid value for key 'vs entry'. Choose from 'seeded', 'unseeded', 'qualifier', and \
         'wild card'.",
    );

    expect(None, "as entry", "Seeded", "&f=ACareerqqH0");
    expect(None, "as entry", ["Unseeded", "Qualifier"], "&f=ACareerqqH1i2");
    expect_message(None, "as entry", "none", "Invalid value for key 'as entry'.");
}

#[test]
fn ranks() {
    expect(ATP, "vs current rank", "Top 50", "&f=ACareerqqR2");
    expect(ATP, "vs current rank", "inactive", "&f=ACareerqqR5");
    expect_message(
        WTA,
        "vs current rank",
        "inactive",
        "Sorry, this attribute is only available for ATP players.",
    );

    expect(ATP, "vs rank", "Top 5", "&f=ACareerqqITop_5qq");
    expect(WTA, "vs rank", "Top 5", "&f=ACareerqqIcx1000110005qq");
    expect(WTA, "vs rank", (1u32, 5u32), "&f=ACareerqqIcx1000110005qq");
    expect(ATP, "vs rank", (14u32, 112u32), "&f=ACareerqqIcx1001410112qq");
    expect_message(ATP, "vs rank", "Number 2", "Invalid value for key 'vs rank'.");

    expect(None, "as rank", "Top 5", "&f=ACareerqqG1");
    expect(None, "as rank", "Below 50", "&f=ACareerqqG9");
    expect_message(
        None,
        "as rank",
        "Number 2",
        "Invalid value for key 'as rank'. Choose from 'Number 1', 'Top 5', 'Top 10', 'Top 20', \
         'Top 50', and 'Below 50'.",
    );
}

#[test]
fn unknown_keys_are_hard_errors() {
    let err = Attrs::from_named([("backhand", "one-handed")]).unwrap_err();
    assert!(matches!(err, EncodeError::UnknownKey(ref key) if key == "backhand"));
}

#[test]
fn full_query_orders_fragments() {
    let attrs = Attrs::from_named::<&str, FilterValue, _>([
        ("vs height", "Shorter".into()),
        ("vs hand", "right".into()),
        ("vs entry", vec!["wild card", "seeded"].into()),
        ("as entry", "seeded".into()),
        ("vs current rank", "inactive".into()),
        ("vs rank", (14u32, 112u32).into()),
        ("sets", vec!["straights", "4 of 5 sets"].into()),
        ("score", "all 7-6".into()),
        ("exclude opp", vec!["Arnaud Clement", "Guillermo Canas"].into()),
    ])
    .unwrap();
    assert_eq!(
        assemble(ATP, &attrs, &directory()).unwrap(),
        "&f=ACareerqqM0K0J3i0H0R5Icx1001410112qqP0i4Q0&x=ArnaudClement,GuillermoCanas"
    );
}

#[test]
fn attrs_from_json_keep_document_order() {
    let attrs = Attrs::from_json(
        r#"{"head-to-head": "andy murr", "surface": ["clay", "carpet"], "vs rank": [14, 112],
            "start_date": "2010-01-01", "end-date": "2012-06-30"}"#,
    )
    .unwrap();
    assert_eq!(
        assemble(ATP, &attrs, &directory()).unwrap(),
        "&f=Acx2010010120120630qqB1i3Icx1001410112qq&q=AndyMurray"
    );
}
