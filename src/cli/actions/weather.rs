use crate::cli::{
    actions::{enter, open_session, report},
    globals::GlobalArgs,
};
use crate::features::weather::{WeatherPoller, WeatherReport, WeatherUpdate, fetch_weather};
use crate::routes::paths;
use anyhow::Result;
use tracing::info;

/// Execute the weather action: one fetch, or polling until Ctrl-C.
/// # Errors
/// Returns an error if the session is missing or a single fetch fails.
pub async fn show(watch: bool, globals: &GlobalArgs) -> Result<()> {
    let config = globals.config()?;
    let session = open_session(&config)?;
    enter(&session, paths::DASHBOARD).await?;

    if !watch {
        let report_body = fetch_weather(session.gateway()).await.map_err(report)?;
        print_report(&report_body);
        return Ok(());
    }

    let poller = WeatherPoller::spawn(session.gateway().clone(), config.weather_interval);
    let mut updates = poller.updates();
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                match updates.borrow_and_update().clone() {
                    WeatherUpdate::Pending => {}
                    WeatherUpdate::Report(report_body) => print_report(&report_body),
                    WeatherUpdate::Failed(message) => eprintln!("weather unavailable: {message}"),
                }
            }
            _ = &mut shutdown => {
                info!("stopping weather watch");
                break;
            }
        }
    }

    poller.cancel();
    Ok(())
}

fn print_report(report_body: &WeatherReport) {
    match &report_body.current {
        Some(current) => println!(
            "{}  {}  (updated {})",
            current.temperature,
            current.description,
            current.date.as_deref().unwrap_or("-")
        ),
        None => println!("No weather data yet."),
    }

    if report_body.history.is_empty() {
        return;
    }
    println!("history:");
    for observation in &report_body.history {
        println!(
            "  {}  {:>8}  {}",
            observation.date.as_deref().unwrap_or("-"),
            observation.temperature.to_string(),
            observation.description
        );
    }
}
