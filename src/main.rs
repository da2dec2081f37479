//! Paradigm Shift demo
//!
//! Wraps a classical-style reader and exercises it through the promise,
//! modern and deferred conventions.

use anyhow::Result;
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

use paradigm_shift::{
    convert, Arg, Callable, ConfigManager, Engines, Outcome, Scope, ShiftConfig,
};

/// Environment variable pointing at a JSON or YAML config file
const CONFIG_ENV: &str = "PARADIGM_SHIFT_CONFIG";

/// `legacy_read(path, on_ok, on_err)`
fn legacy_read() -> Callable {
    Callable::new(|_, args| {
        let path = args.first().and_then(Arg::as_value).cloned().unwrap_or(Value::Null);
        let mut handlers = args.iter().filter_map(Arg::as_handler);
        let (on_ok, on_err) = (handlers.next(), handlers.next());
        match (path, on_ok, on_err) {
            (Value::String(p), Some(ok), _) if !p.is_empty() => ok.call(vec![json!(format!("data:{}", p))]),
            (_, _, Some(err)) => err.call(vec![json!("no such file")]),
            _ => {}
        }
        Outcome::Done
    })
}

async fn load_config() -> Result<ShiftConfig> {
    let config = match std::env::var(CONFIG_ENV) {
        Ok(path) => ConfigManager::new(path).load().await?,
        Err(_) => ShiftConfig::default(),
    };
    Ok(config.with_env()?)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let config = load_config().await?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    Engines::install(config.engines())?;
    info!("Using {:?}", Engines::global());

    let from_classical = convert(legacy_read(), Scope::unbound())?.from("classical")?;

    // Promise
    if let Some(read) = from_classical.to("promise", None)?.into_function() {
        for path in ["file.txt", ""] {
            if let Some(promise) = read.call(vec![Arg::value(path)]).into_promise() {
                match promise.await {
                    Ok(data) => println!("promise  {:>10} -> resolved {}", format!("{:?}", path), data),
                    Err(reason) => println!("promise  {:>10} -> rejected {}", format!("{:?}", path), reason),
                }
            }
        }
    }

    // Modern
    if let Some(read) = from_classical.to("modern", None)?.into_function() {
        read.call(vec![
            Arg::value("notes.md"),
            Arg::handler(|args| println!("modern   \"notes.md\" -> {:?}", args)),
        ]);
    }

    // Deferred
    if let Some(read) = from_classical.to("deferred", None)?.into_function() {
        if let Some(promise) = read.call(vec![Arg::value("")]).into_promise() {
            promise
                .on_success(|data| println!("deferred \"\" -> resolved {}", data))
                .fail(|reason| println!("deferred \"\" -> rejected {}", reason));
        }
    }

    Ok(())
}
