//! Trackside server binary.
//!
//! Runs the HTTP control surface against an in-memory mock layout. Real
//! deployments swap in `LayoutState`/`CommandSink` implementations that
//! talk to the layout process; the mock seeds a couple of components so
//! the API is explorable out of the box.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use trackside::config::Config;
use trackside::layout::MockLayout;
use trackside::scope::CommandScope;
use trackside::services::web::run_server;
use trackside::{ComponentState, Dialect};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,trackside=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let config = Config::from_env();
    info!(addr = %config.web.bind_addr(), "starting trackside");

    let layout = Arc::new(MockLayout::new());
    layout.add_movable(CommandScope::Engine, 12, Dialect::Classic);
    layout.add_movable(CommandScope::Engine, 18, Dialect::Legacy);
    layout.add_movable(CommandScope::Train, 501, Dialect::Legacy);
    layout.add(ComponentState::fixed(CommandScope::Switch, 1));
    layout.add(ComponentState::fixed(CommandScope::Accessory, 8));
    layout.add(ComponentState::fixed(CommandScope::Route, 1));

    run_server(&config, layout.clone(), layout).await?;
    Ok(())
}
