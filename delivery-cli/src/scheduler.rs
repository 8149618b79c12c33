use chrono::Utc;
use delivery_core::{IngestReport, IngestSchedule, Ingestor};
use tracing::{error, info};

/// Run ingestion cycles on `schedule` forever. Each cycle finishes before the
/// next trigger is computed, so cycles never overlap.
pub async fn run(ingestor: Ingestor, schedule: IngestSchedule) {
    loop {
        let now = Utc::now();
        let next = schedule.next_after(now);
        info!(%next, "next weather ingestion scheduled");

        let wait = (next - now).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        run_cycle(&ingestor).await;
    }
}

/// One scheduled cycle. Failures are logged and the schedule carries on.
pub async fn run_cycle(ingestor: &Ingestor) -> Option<IngestReport> {
    match ingestor.run_once().await {
        Ok(report) => Some(report),
        Err(err) => {
            error!(%err, "weather ingestion cycle failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, routing::get};
    use delivery_core::{HttpObservationFeed, SqliteWeatherStore, WeatherStore};
    use std::sync::Arc;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<observations timestamp="1700003700">
  <station>
    <name>Tallinn-Harku</name>
    <wmocode>26038</wmocode>
    <phenomenon>Light snowfall</phenomenon>
    <airtemperature>-4.2</airtemperature>
    <windspeed>6.1</windspeed>
  </station>
  <station>
    <name>Virtsu</name>
    <wmocode>26128</wmocode>
    <phenomenon></phenomenon>
    <airtemperature>1.0</airtemperature>
    <windspeed>9.0</windspeed>
  </station>
  <station>
    <name>Pärnu</name>
    <wmocode>41803</wmocode>
    <phenomenon>Moderate rain</phenomenon>
    <airtemperature>2.5</airtemperature>
    <windspeed>12.4</windspeed>
  </station>
</observations>"#;

    async fn spawn_feed(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}/observations.php")
    }

    fn ingestor(url: String, store: Arc<SqliteWeatherStore>) -> Ingestor {
        let stations = vec!["Tallinn-Harku".into(), "Tartu-Tõravere".into(), "Pärnu".into()];
        Ingestor::new(Arc::new(HttpObservationFeed::new(url)), store, stations)
    }

    #[tokio::test]
    async fn cycle_ingests_monitored_stations_from_http_feed() {
        let app = Router::new().route("/observations.php", get(|| async { FEED }));
        let url = spawn_feed(app).await;
        let store = Arc::new(SqliteWeatherStore::open_in_memory().unwrap());

        let report = run_cycle(&ingestor(url, store.clone())).await.unwrap();

        assert_eq!(report.seen, 3);
        assert_eq!(report.saved, 2);
        let records = store.find_all().unwrap();
        let names: Vec<_> = records.iter().map(|r| r.station_name.as_str()).collect();
        assert_eq!(names, ["Tallinn-Harku", "Pärnu"]);
        assert!(records.iter().all(|r| r.observed_at == 1_700_003_700));
        assert_eq!(records[1].weather_phenomenon, "Moderate rain");
    }

    #[tokio::test]
    async fn failed_cycle_is_logged_and_saves_nothing() {
        let app = Router::new().route(
            "/observations.php",
            get(|| async { (axum::http::StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let url = spawn_feed(app).await;
        let store = Arc::new(SqliteWeatherStore::open_in_memory().unwrap());

        assert_eq!(run_cycle(&ingestor(url, store.clone())).await, None);
        assert!(store.find_all().unwrap().is_empty());
    }
}
