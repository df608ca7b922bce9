use anyhow::Context;
use nm_api_types::RenderInstruction;
use nm_ledger_http::HttpLedger;
use nm_market_core::{Storefront, StorefrontConfig, StorefrontHooks};
use nm_provider_client::sim::{SimulatedIdentity, SimulatedLedger, SimulatedUserData};
use nm_provider_client::{AppHost, LedgerService, Presenter};
use std::cell::Cell;
use std::rc::Rc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

mod script;
mod settings;

use script::{ScriptLine, parse_line};
use settings::SimSettings;

/// Writes every render instruction to stdout as one JSON line.
struct JsonLinePresenter;

impl Presenter for JsonLinePresenter {
    fn render(&self, instruction: &RenderInstruction) {
        match serde_json::to_string(instruction) {
            Ok(line) => println!("{line}"),
            Err(err) => warn!(error = %err, "render instruction not serializable"),
        }
    }
}

/// A reload restarts the storefront from the catalog once the current line is done.
#[derive(Default)]
struct SimHost {
    pending: Cell<bool>,
}

impl SimHost {
    fn take_reload(&self) -> bool {
        self.pending.replace(false)
    }
}

impl AppHost for SimHost {
    fn reload(&self) {
        info!("chain changed, reloading storefront");
        self.pending.set(true);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let settings = SimSettings::from_env()?;
    let config = StorefrontConfig::from_env()?;
    let catalog = settings.load_catalog()?;

    let identity = if settings.accounts.is_empty() {
        SimulatedIdentity::unavailable()
    } else {
        SimulatedIdentity::new(settings.accounts.clone())
    };
    let ledger: Rc<dyn LedgerService> = match &settings.ledger_url {
        Some(url) => {
            info!(endpoint = %url, "using HTTP ledger");
            Rc::new(HttpLedger::new(Some(url.clone())))
        }
        None => Rc::new(SimulatedLedger::new(settings.starting_balance)),
    };
    let host = Rc::new(SimHost::default());

    let store = Storefront::new(
        identity,
        ledger,
        StorefrontHooks {
            user_data: Rc::new(SimulatedUserData::default()),
            host: host.clone(),
            presenter: Rc::new(JsonLinePresenter),
        },
        &config,
    );
    store.load(catalog.clone());
    info!(items = catalog.len(), currency = %config.currency, "market-sim ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        };
        let Some(line) = line else {
            break;
        };

        match parse_line(&line) {
            Ok(Some(ScriptLine::Intent(intent))) => {
                // failures were already rendered as notices
                let _ = store.dispatch(intent).await;
            }
            Ok(Some(ScriptLine::Event(event))) => store.handle_event(event).await,
            Ok(None) => {}
            Err(err) => warn!(error = %err, "skipping line"),
        }

        if host.take_reload() {
            store.disconnect();
            store.load(catalog.clone());
        }
    }

    info!("market-sim finished");
    Ok(())
}
