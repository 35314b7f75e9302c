//! `brewbot serve`: the simulated controller behind the HTTP interface.

use brewbot_core::MachineController;
use tracing::info;

use crate::cli::{GlobalOpts, ServeArgs};
use crate::config;
use crate::error::CliError;

pub async fn handle(args: ServeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let simulation = config::resolve_simulation(&cfg, &args)?;
    let addr = config::resolve_bind(&cfg, &args)?;

    let listener = brewbot_server::bind(addr).await?;
    let controller = MachineController::spawn(&simulation);

    if !global.quiet {
        let t = &simulation.timings;
        eprintln!("☕ brewbot simulator on http://{}", listener.local_addr()?);
        eprintln!(
            "   grind {} · pump {} · heat {} · dispense {}{}",
            humantime::format_duration(t.grind),
            humantime::format_duration(t.pump),
            humantime::format_duration(t.heat),
            humantime::format_duration(t.dispense),
            if simulation.require_cups {
                " · cups required"
            } else {
                ""
            },
        );
        eprintln!("   Press Ctrl-C to stop.");
    }

    let served = brewbot_server::serve(listener, controller.clone(), shutdown_signal()).await;
    controller.shutdown().await;
    served?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
