//! `brewbot status`.

use brewbot_api::StatusResponse;
use brewbot_core::{MachineLink, RemoteMachine};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub async fn handle(remote: &RemoteMachine, global: &GlobalOpts) -> Result<(), CliError> {
    let status = remote.get_status().await?;
    print_status(&status, global);
    Ok(())
}

/// Render a full snapshot; shared with `simulate`, which answers with one.
pub fn print_status(status: &StatusResponse, global: &GlobalOpts) {
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        status,
        |s| detail(s, color),
        |s| s.status.to_string(),
    );
    output::print_output(&out, global.quiet);
}

fn detail(s: &StatusResponse, color: bool) -> String {
    let mut fields = vec![
        ("Status", output::status_label(s.status, color)),
        ("Beans", format!("{:.1} g ({}%)", s.bean_weight, s.bean_level)),
        ("Water", water_line(s, color)),
        ("Boiler", format!("{:.1} °C", s.boiler_temp)),
        ("Flow", format!("{:.1} mL/s", s.flow_rate)),
        ("Grinder cup", yes_no(s.grinder_cup_detected)),
        ("Dispenser cup", yes_no(s.dispenser_cup_detected)),
    ];
    if !s.error_message.is_empty() {
        fields.push(("Error", output::warning(&s.error_message, color)));
    }
    output::detail_lines(&fields)
}

fn water_line(s: &StatusResponse, color: bool) -> String {
    let line = format!("{:.0} mL ({}%)", s.water_weight, s.water_level);
    if s.water_level_warning {
        format!("{line} {}", output::warning("low", color))
    } else {
        line
    }
}

fn yes_no(present: bool) -> String {
    let word = if present { "present" } else { "absent" };
    word.into()
}
