//! `brewbot brew`: one guided brew against a controller.
//!
//! A `BrewDriver` runs on its own task; this handler watches the published
//! session, asks the user at every instruction or error phase and shows
//! progress while the machine works.

use std::time::Duration;

use brewbot_core::{
    BrewDriver, DriverAction, DriverConfig, DriverHandle, RemoteMachine, SessionPhase, SessionView,
};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::cli::{BrewArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    remote: RemoteMachine,
    driver_config: DriverConfig,
    args: BrewArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if !global.yes {
        util::require_terminal("brew")?;
    }

    let answers = if global.yes {
        Answers::Auto {
            delay: driver_config.poll_interval,
            max_retries: args.max_retries,
        }
    } else {
        Answers::Ask
    };
    let (driver, handle) = BrewDriver::new(remote, driver_config, args.name);
    let task = tokio::spawn(driver.run());
    let color = output::should_color(&global.color);
    let mut display = BrewDisplay::new(global.quiet, color);

    if let Err(e) = follow(&handle, &mut display, answers).await {
        handle.cancel();
        display.finish();
        return Err(e);
    }

    let view = task.await.map_err(|e| CliError::ApiError {
        code: "internal".into(),
        message: format!("brew driver failed: {e}"),
    })?;
    display.finish();

    if view.abandoned {
        return Err(CliError::Abandoned {
            phase: view.phase.to_string(),
        });
    }

    let out = output::render_single(&global.output, &view, summary, |v| v.id.to_string());
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Who answers the prompts.
#[derive(Debug, Clone, Copy)]
enum Answers {
    Ask,
    /// `--yes`: a repeat answer in the same phase waits `delay` first, and
    /// more than `max_retries` repeats end the brew.
    Auto { delay: Duration, max_retries: u32 },
}

/// Watch the session until it finishes, answering every prompt once per
/// attempt.
async fn follow(
    handle: &DriverHandle,
    display: &mut BrewDisplay,
    answers: Answers,
) -> Result<(), CliError> {
    let mut views = handle.subscribe();
    let mut answered: Option<(SessionPhase, u32)> = None;
    let mut repeats = 0u32;

    loop {
        let view = views.borrow_and_update().clone();
        display.update(&view);
        if view.is_finished() {
            return Ok(());
        }

        let key = (view.phase, view.attempts);
        if view.phase.awaits_user() && answered != Some(key) {
            let repeated = answered.is_some_and(|(phase, _)| phase == view.phase);
            repeats = if repeated { repeats.saturating_add(1) } else { 0 };
            answered = Some(key);

            let proceed = match answers {
                Answers::Ask => ask(&view, display).await?,
                Answers::Auto { delay, max_retries } => {
                    if repeats > max_retries {
                        return Err(CliError::Stuck {
                            phase: view.phase.to_string(),
                            retries: max_retries,
                            message: view
                                .last_error
                                .clone()
                                .or_else(|| view.phase.hint().map(str::to_owned))
                                .unwrap_or_default(),
                        });
                    }
                    if repeated {
                        tokio::select! {
                            () = tokio::time::sleep(delay) => {}
                            _ = tokio::signal::ctrl_c() => {
                                handle.cancel();
                                return Ok(());
                            }
                        }
                    }
                    true
                }
            };
            let action = if proceed {
                action_for(view.phase)
            } else {
                DriverAction::Abandon
            };
            debug!(?action, phase = %view.phase, "answered");
            if handle.send(action).await.is_err() {
                return Ok(());
            }
        }

        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
            }
            _ = tokio::signal::ctrl_c() => {
                handle.cancel();
                return Ok(());
            }
        }
    }
}

fn action_for(phase: SessionPhase) -> DriverAction {
    match phase {
        SessionPhase::InstructGrinder => DriverAction::StartGrinding,
        SessionPhase::InstructDispenser => DriverAction::StartDispensing,
        _ => DriverAction::Retry,
    }
}

async fn ask(view: &SessionView, display: &BrewDisplay) -> Result<bool, CliError> {
    let prompt = match view.phase {
        SessionPhase::InstructGrinder => "Cup is under the grinder. Start grinding?",
        SessionPhase::InstructDispenser => "Cup is under the dispenser. Start brewing?",
        _ => "Fixed it? Try again?",
    };
    let bar = display.bar.clone();
    tokio::task::spawn_blocking(move || {
        bar.suspend(|| {
            dialoguer::Confirm::new()
                .with_prompt(prompt)
                .default(true)
                .interact()
        })
    })
    .await
    .map_err(|e| CliError::Io(std::io::Error::other(e)))?
    .map_err(util::prompt_err)
}

// ── Display ─────────────────────────────────────────────────────────

struct BrewDisplay {
    bar: ProgressBar,
    color: bool,
    shown: Option<(SessionPhase, Option<String>)>,
}

impl BrewDisplay {
    fn new(quiet: bool, color: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(100)
        };
        if let Ok(style) = ProgressStyle::with_template("{msg:24} [{bar:30}] {pos:>3}%") {
            bar.set_style(style.progress_chars("=> "));
        }
        Self {
            bar,
            color,
            shown: None,
        }
    }

    fn update(&mut self, view: &SessionView) {
        let key = (view.phase, view.last_error.clone());
        if self.shown.as_ref() != Some(&key) {
            self.bar.println(self.heading(view));
            self.bar.set_message(view.phase.title());
            self.shown = Some(key);
        }
        self.bar.set_position(u64::from(view.progress));
    }

    fn heading(&self, view: &SessionView) -> String {
        let mut lines = vec![format!("» {}", view.phase.title())];
        if let Some(hint) = view.phase.hint() {
            lines.push(format!("  {hint}"));
        }
        if let Some(ref err) = view.last_error {
            lines.push(format!("  {}", output::warning(err, self.color)));
        }
        lines.join("\n")
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

// ── Summary ─────────────────────────────────────────────────────────

fn summary(view: &SessionView) -> String {
    let elapsed = (Utc::now() - view.started_at)
        .to_std()
        .map(|d| Duration::from_secs(d.as_secs()))
        .unwrap_or_default();

    let mut fields = vec![
        ("Session", view.id.to_string()),
        ("Name", view.name.clone().unwrap_or_else(|| "-".into())),
        ("Phase", view.phase.to_string()),
        ("Took", humantime::format_duration(elapsed).to_string()),
        ("Attempts", view.attempts.to_string()),
    ];
    if let Some(ref status) = view.last_status {
        fields.push(("Beans left", format!("{:.1} g", status.bean_weight)));
        fields.push(("Water left", format!("{:.0} mL", status.water_weight)));
    }
    if view.failed_polls > 0 {
        fields.push(("Failed polls", view.failed_polls.to_string()));
    }
    output::detail_lines(&fields)
}
