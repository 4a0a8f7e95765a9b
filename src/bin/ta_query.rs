use anyhow::{Context, Result, anyhow};
use serde_json::{Map, Value, json};

use ta_query::config::ScrapeConfig;
use ta_query::download::{self, MatchData, Subject};
use ta_query::filters::{Attrs, Tour};
use ta_query::logging;
use ta_query::names::DirectoryResolver;
use ta_query::webdriver::WebDriverSession;

const USAGE: &str = "usage: ta_query (--name <player> --tour <atp|wta> [--attrs <json>] | --url <player url>) [--print-url] [--log <level>]";

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        println!("{USAGE}");
        return Ok(());
    }
    logging::init(arg_value(&args, "--log").as_deref().unwrap_or("info"))?;

    let config = ScrapeConfig::from_env();
    let subject = parse_subject(&args)?;
    let names = DirectoryResolver::from_config(&config);

    if args.iter().any(|arg| arg == "--print-url") {
        let query = download::prepare(&subject, &config, &names)?;
        println!("{}", query.url);
        return Ok(());
    }

    let mut session =
        WebDriverSession::new(&config).context("unable to set up webdriver client")?;
    let data = download::download(&subject, &config, &names, &mut session)?;
    println!("{}", serde_json::to_string_pretty(&render(&data))?);
    Ok(())
}

fn parse_subject(args: &[String]) -> Result<Subject> {
    if let Some(url) = arg_value(args, "--url") {
        return Ok(Subject::url(url));
    }
    let name = arg_value(args, "--name").ok_or_else(|| anyhow!("missing --name or --url\n{USAGE}"))?;
    let tour: Tour = arg_value(args, "--tour")
        .ok_or_else(|| anyhow!("missing --tour\n{USAGE}"))?
        .parse()?;
    let attrs = match arg_value(args, "--attrs") {
        Some(raw) => Attrs::from_json(&raw).context("invalid --attrs")?,
        None => Attrs::new(),
    };
    Ok(Subject::player(name, tour, attrs))
}

/// Accepts both `--flag value` and `--flag=value`.
fn arg_value(args: &[String], flag: &str) -> Option<String> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(rest) = arg.strip_prefix(flag).and_then(|r| r.strip_prefix('=')) {
            let trimmed = rest.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

fn render(data: &MatchData) -> Value {
    let records = data
        .records
        .rows()
        .map(|row| {
            let mut object = Map::new();
            for (name, cell) in row {
                object.insert(name.to_string(), json!(cell));
            }
            Value::Object(object)
        })
        .collect::<Vec<_>>();
    json!({
        "name": data.name,
        "tour": data.tour,
        "url": data.url,
        "title": data.title,
        "records": records,
    })
}
