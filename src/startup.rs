use crate::shutdown;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use snapcal::components::calendar_record::{export_events, CalendarEncoder, EventRecord};
use snapcal::components::date_parser;
use snapcal::components::events::{EventStoreHandle, IngestReport, TrackedEvent};
use snapcal::components::scanner::{
    OpenAiRecognizer, Recognizer, ScannerHandle, SnapshotSource, StreamGuard, VisualSource,
};
use snapcal::components::ComponentManager;
use snapcal::config::Config;
use snapcal::error::{AppResult, Error};
use snapcal::utils::time::{Clock, SystemClock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the application config
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

fn system_clock(config: &Config) -> AppResult<Arc<dyn Clock>> {
    Ok(Arc::new(SystemClock::new(config.tz()?)))
}

fn recognizer(config: &Config) -> AppResult<Arc<OpenAiRecognizer>> {
    let api_key = config.recognizer_api_key()?;
    info!("Using recognizer model {}", config.recognizer.model);
    Ok(Arc::new(OpenAiRecognizer::new(api_key, &config.recognizer)))
}

/// Run the scan loop until a termination signal, then export every event
pub async fn run_scan(config: Config) -> miette::Result<()> {
    let clock = system_clock(&config)?;
    let recognizer = recognizer(&config)?;

    let store = EventStoreHandle::new(Arc::clone(&clock));
    let scanner = ScannerHandle::new(
        Arc::new(SnapshotSource::new(config.source_path.clone())),
        recognizer,
        store.clone(),
        clock,
        config.capture,
    );

    // Initialize component manager
    let mut component_manager = ComponentManager::new();
    component_manager.register(store.clone());
    component_manager.register(scanner.clone());

    if let Err(e) = scanner.start().await {
        error!("Could not start scanning: {}", e);
        component_manager.shutdown_all().await?;
        return Err(e.into());
    }
    info!(
        "Scanning {} (press Ctrl-C to stop)",
        config.source_path.display()
    );

    // Create shutdown channel
    let (shutdown_send, shutdown_recv) = oneshot::channel();
    tokio::spawn(async move {
        shutdown::handle_signals(shutdown_send).await;
    });
    let _ = shutdown_recv.await;

    scanner.stop().await?;
    let status = scanner.status().await?;
    info!(
        "Scan finished: {} recognition call(s), {} accepted, {} failed",
        status.recognition_calls, status.accepted_detections, status.failed_recognitions
    );

    let events = store.list().await?;
    let exported = export(&config.output_dir, &events).await;
    component_manager.shutdown_all().await?;

    exported?;
    Ok(())
}

/// Recognize a single photograph and export the events found in it
pub async fn run_image(config: Config, path: PathBuf) -> miette::Result<()> {
    let clock = system_clock(&config)?;
    let recognizer = recognizer(&config)?;
    let store = EventStoreHandle::new(Arc::clone(&clock));

    let result = recognize_file(&config, &path, recognizer.as_ref(), &store, clock.now()).await;
    store.shutdown().await?;
    let report = result?;

    print_report(&report);
    export(&config.output_dir, &report.created).await?;
    Ok(())
}

async fn recognize_file(
    config: &Config,
    path: &Path,
    recognizer: &OpenAiRecognizer,
    store: &EventStoreHandle,
    reference: DateTime<Tz>,
) -> AppResult<IngestReport> {
    let source = SnapshotSource::new(path);
    let mut stream = StreamGuard::new(source.acquire(config.capture).await?);
    let frame = stream.grab_frame().await?;
    stream.release();

    let detections = recognizer.recognize(&frame).await?;
    if detections.is_empty() {
        warn!("No dated events found in {}", path.display());
    }
    store.ingest(detections, reference).await
}

/// Parse a text fragment and print the event with its calendar body
pub fn run_parse(config: Config, text: &str, at: Option<&str>) -> miette::Result<()> {
    let tz = config.tz()?;
    let reference = match at {
        Some(at) => DateTime::parse_from_rfc3339(at)
            .map_err(|e| Error::Config(format!("Invalid reference instant '{}': {}", at, e)))?
            .with_timezone(&tz),
        None => SystemClock::new(tz).now(),
    };

    let event = date_parser::parse(text, &reference)?;
    let body = CalendarEncoder::new(Utc::now()).encode(
        &EventRecord::new(event.title.clone(), event.start, event.end)
            .with_description(event.description.clone()),
    )?;

    println!("Title: {}", event.title);
    println!("Start: {}", event.start);
    println!("End:   {}", event.end);
    println!();
    print!("{}", body);
    Ok(())
}

fn print_report(report: &IngestReport) {
    for event in &report.created {
        println!("{}  {} - {}", event.title, event.start, event.end);
    }
    for failure in &report.failures {
        println!("skipped '{}': {}", failure.text, failure.reason);
    }
    if report.duplicates > 0 {
        println!("{} duplicate(s) ignored", report.duplicates);
    }
}

async fn export(dir: &Path, events: &[TrackedEvent]) -> AppResult<()> {
    if events.is_empty() {
        info!("No events to export");
        return Ok(());
    }
    let written = export_events(
        dir,
        events
            .iter()
            .map(|event| (event.title.as_str(), event.encoded_body.as_str())),
    )
    .await?;
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}
