//! Background weather polling. The poller fetches immediately, then on every
//! interval tick, and publishes the latest outcome on a `watch` channel.
//! Cancelling or dropping the handle aborts the task.

use crate::app_lib::AuthGateway;
use crate::features::weather::{client::fetch_weather, types::WeatherReport};
use std::time::Duration;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{Instrument, debug, info_span, warn};

/// Latest outcome published by the poller.
#[derive(Clone, Debug, PartialEq)]
pub enum WeatherUpdate {
    /// No fetch has completed yet.
    Pending,
    Report(WeatherReport),
    Failed(String),
}

/// Handle to a running poller.
pub struct WeatherPoller {
    updates: watch::Receiver<WeatherUpdate>,
    task: JoinHandle<()>,
}

impl WeatherPoller {
    /// Starts polling on the current tokio runtime.
    #[must_use]
    pub fn spawn(gateway: AuthGateway, every: Duration) -> Self {
        let (sender, updates) = watch::channel(WeatherUpdate::Pending);
        let span = info_span!("weather.poller", interval_secs = every.as_secs());
        let task = tokio::spawn(poll(gateway, every, sender).instrument(span));

        Self { updates, task }
    }

    /// Receiver for every published update.
    #[must_use]
    pub fn updates(&self) -> watch::Receiver<WeatherUpdate> {
        self.updates.clone()
    }

    #[must_use]
    pub fn latest(&self) -> WeatherUpdate {
        self.updates.borrow().clone()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops polling. Equivalent to dropping the handle.
    pub fn cancel(self) {
        self.task.abort();
    }
}

impl Drop for WeatherPoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn poll(gateway: AuthGateway, every: Duration, sender: watch::Sender<WeatherUpdate>) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let update = match fetch_weather(&gateway).await {
            Ok(report) => {
                debug!(history = report.history.len(), "weather updated");
                WeatherUpdate::Report(report)
            }
            Err(err) => {
                warn!("weather fetch failed: {err}");
                WeatherUpdate::Failed(err.to_string())
            }
        };

        if sender.send(update).is_err() {
            debug!("no weather subscribers left, stopping");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{WeatherPoller, WeatherUpdate};
    use crate::app_lib::{AuthGateway, TokenSink, config::AppConfig};
    use crate::features::weather::client::WEATHER_PATH;
    use crate::routes::HistoryNavigator;
    use anyhow::Result;
    use secrecy::SecretString;
    use serde_json::json;
    use std::{net::TcpListener, sync::Arc, time::Duration};
    use tokio::time::timeout;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    struct FixedToken;

    impl TokenSink for FixedToken {
        fn access_token(&self) -> Option<SecretString> {
            Some(SecretString::from("access-1"))
        }
        fn refresh_token(&self) -> Option<SecretString> {
            None
        }
        fn store_refreshed(&self, _access: SecretString, _refresh: Option<SecretString>) {}
        fn expire(&self) {}
    }

    fn gateway(server: &MockServer) -> Result<AuthGateway> {
        let config = AppConfig {
            api_base_url: server.uri(),
            ..AppConfig::default()
        };
        Ok(AuthGateway::new(
            &config,
            Arc::new(FixedToken),
            Arc::new(HistoryNavigator::default()),
        )?)
    }

    async fn mount_weather(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path(WEATHER_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "current": {"temperature": "+3°C", "description": "Snow", "date": "2024-01-01T08:00:00Z"},
                "history": []
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn publishes_first_report_immediately() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        mount_weather(&server).await;

        let poller = WeatherPoller::spawn(gateway(&server)?, Duration::from_secs(300));
        let mut updates = poller.updates();
        assert_eq!(*updates.borrow(), WeatherUpdate::Pending);

        timeout(Duration::from_secs(5), updates.changed()).await??;
        let WeatherUpdate::Report(report) = poller.latest() else {
            panic!("expected a weather report");
        };
        assert_eq!(
            report.current.map(|current| current.description),
            Some("Snow".to_string())
        );
        assert!(poller.is_running());
        poller.cancel();
        Ok(())
    }

    #[tokio::test]
    async fn keeps_polling_on_interval() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        mount_weather(&server).await;

        let poller = WeatherPoller::spawn(gateway(&server)?, Duration::from_millis(50));
        tokio::time::sleep(Duration::from_millis(300)).await;
        drop(poller);

        let fetched = server.received_requests().await.unwrap_or_default().len();
        assert!(fetched >= 2, "expected repeated fetches, got {fetched}");
        Ok(())
    }

    #[tokio::test]
    async fn failures_are_published() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(WEATHER_PATH))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let poller = WeatherPoller::spawn(gateway(&server)?, Duration::from_secs(300));
        let mut updates = poller.updates();
        timeout(Duration::from_secs(5), updates.changed()).await??;
        assert!(matches!(poller.latest(), WeatherUpdate::Failed(_)));
        Ok(())
    }

    #[tokio::test]
    async fn dropping_the_handle_stops_the_task() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        mount_weather(&server).await;

        let poller = WeatherPoller::spawn(gateway(&server)?, Duration::from_millis(20));
        let mut updates = poller.updates();
        timeout(Duration::from_secs(5), updates.changed()).await??;
        drop(poller);

        // The aborted task drops its sender, which closes the channel.
        let closed = timeout(Duration::from_secs(5), async {
            while updates.changed().await.is_ok() {}
        })
        .await;
        assert!(closed.is_ok());
        Ok(())
    }
}
