use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kana_drill::config::DrillSettings;
use kana_drill::content::{Dataset, LogOnError};
use kana_drill::domain::{DrillLevel, Script};
use kana_drill::drill::{DrillAssembler, DrillRequest};

const USAGE: &str = "usage: kana_drill [hiragana|katakana] [line-id|mixed] [easy|medium|difficult]";

fn main() -> ExitCode {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "kana_drill=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();

  let args: Vec<String> = std::env::args().skip(1).collect();
  if args.iter().any(|a| a == "-h" || a == "--help") {
    println!("{}", USAGE);
    return ExitCode::SUCCESS;
  }

  let script = match args.first().map(|s| s.parse::<Script>()).unwrap_or(Ok(Script::Hiragana)) {
    Ok(script) => script,
    Err(e) => {
      eprintln!("{}\n{}", e, USAGE);
      return ExitCode::from(2);
    }
  };
  let line_id = args.get(1).map(String::as_str);
  let level = match args.get(2).map(|s| s.parse::<DrillLevel>()).unwrap_or(Ok(DrillLevel::Easy)) {
    Ok(level) => level,
    Err(e) => {
      eprintln!("{}\n{}", e, USAGE);
      return ExitCode::from(2);
    }
  };

  let settings = DrillSettings::load();
  let custom = settings
    .dataset_dir
    .as_deref()
    .and_then(|dir| Dataset::load_from_dir(dir).log_warn("Falling back to the built-in dataset"));
  let dataset = custom.as_ref().unwrap_or_else(|| Dataset::builtin());

  let mut rng = rand::rng();
  let request = DrillRequest { script, line_id, level };
  let session = DrillAssembler::new(dataset, &settings, request, &mut rng).assemble();

  match serde_json::to_string_pretty(&session) {
    Ok(json) => {
      println!("{}", json);
      ExitCode::SUCCESS
    }
    Err(e) => {
      eprintln!("Failed to serialize session: {}", e);
      ExitCode::FAILURE
    }
  }
}
