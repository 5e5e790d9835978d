use std::{process, sync::Arc};

use folio::{
    application::{
        content::ContentService, error::AppError, images::ImagePolicy, source::ContentSource,
    },
    cache::{CacheConfig, ContentStore},
    config::{self, Command, ShowArgs},
    domain::{
        content::{ContentItem, ItemDetail},
        resources::ResourceKey,
    },
    infra::{http::HttpContentSource, telemetry},
};
use serde::{Serialize, Serializer, ser::SerializeMap};
use tracing::{Dispatch, Level, dispatcher, error};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(std::io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;

    let service = build_service(&settings)?;

    match cli_args.command {
        Command::Fetch(args) => run_fetch(&service, &args.resources).await,
        Command::Categories => print_json(&service.categories().await),
        Command::Show(args) => run_show(&service, &args).await,
    }
}

fn build_service(settings: &config::Settings) -> Result<ContentService, AppError> {
    let source: Arc<dyn ContentSource> = Arc::new(HttpContentSource::new(&settings.api)?);
    let store = Arc::new(ContentStore::new(&CacheConfig::from(&settings.cache)));
    let images = ImagePolicy::from_settings(&settings.api, &settings.images);
    Ok(ContentService::new(source, store, images))
}

/// Fetched resources keyed by name, in request order.
struct FetchReport<'a>(&'a [(ResourceKey, Vec<ContentItem>)]);

impl Serialize for FetchReport<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (resource, items) in self.0 {
            map.serialize_entry(resource, items)?;
        }
        map.end()
    }
}

async fn run_fetch(service: &ContentService, resources: &[ResourceKey]) -> Result<(), AppError> {
    // repeated names would become duplicate JSON keys
    let mut unique: Vec<ResourceKey> = Vec::with_capacity(resources.len());
    for resource in resources {
        if !unique.contains(resource) {
            unique.push(resource.clone());
        }
    }

    let fetched = service.fetch_many(&unique).await;
    print_json(&FetchReport(&fetched))
}

async fn run_show(service: &ContentService, args: &ShowArgs) -> Result<(), AppError> {
    let item = service
        .find_item(&args.resource, &args.id)
        .await
        .ok_or_else(|| AppError::not_found(args.resource.to_string(), args.id.as_str()))?;
    print_json(&ItemDetail::new(&item, args.slide))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to render output: {err}")))?;
    println!("{out}");
    Ok(())
}
