//! Reactive Data Demo - Main Entry Point
//!
//! Loads a simulated paged catalogue in increments, presents a filtered view
//! of it and logs every notification until the loader runs out of data.
//!
//! Usage: `reactive-data-demo [config.toml]`

use anyhow::Context;
use reactive_data::{
    Available, ChangeEvent, Data, DataSource, Error, FutureLoader, Increment, IncrementalData,
    Intent, Loadable, LoaderConfig, LoaderState, Looper, Observable, datas,
};
use std::rc::Rc;
use std::time::Duration;

const CATALOGUE: [&str; 12] = [
    "bear", "cat", "foo", "bar", "baz", "fish", "boar", "emu", "bison", "yak", "bat", "owl",
];
const PAGE_SIZE: usize = 4;

fn load_config() -> anyhow::Result<LoaderConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path))?;
            Ok(LoaderConfig::from_toml_str(&text)?)
        }
        None => Ok(LoaderConfig::default().with_look_ahead_row_count(2)),
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting reactive data demo...");

    let config = load_config()?;
    let looper = Looper::new();

    let loader = FutureLoader::new(|offset: usize, page: usize| async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let end = (offset + PAGE_SIZE).min(CATALOGUE.len());
        let elements: Vec<String> = CATALOGUE[offset..end]
            .iter()
            .map(|name| name.to_string())
            .collect();
        tracing::info!("Fetched page {} ({} elements)", page, elements.len());
        Ok::<_, Error>(Some(Increment::new(
            elements,
            Available::from_remaining(CATALOGUE.len() - end),
        )))
    });
    let catalogue = IncrementalData::with_config(&looper, config, loader)?;
    let source: Rc<dyn Data<String>> = catalogue.clone();
    let with_b = datas::filter(source, |name: &String| name.contains('b'));

    let logger = Rc::new(|event: ChangeEvent| tracing::info!("View changed: {:?}", event));
    with_b.register_data_observer(logger);
    catalogue.register_loading_observer(Rc::new(|loading: bool| {
        tracing::info!("Loading: {}", loading)
    }));

    while catalogue.loader_state() != LoaderState::Exhausted {
        if !looper.run_until(|| !catalogue.is_loading(), Duration::from_secs(5)) {
            anyhow::bail!("loader did not settle");
        }
        // Presenting the last row pulls in the next page
        if let Some(last) = catalogue.size().checked_sub(1) {
            catalogue.get_with(last, Intent::Presentation)?;
        }
        looper.run_until(
            || catalogue.is_loading() || catalogue.loader_state() == LoaderState::Exhausted,
            Duration::from_secs(5),
        );
    }

    tracing::info!(
        "Loaded {} elements; view holds {:?}",
        catalogue.size(),
        datas::to_vec(&*with_b)
    );
    catalogue.close();
    Ok(())
}
