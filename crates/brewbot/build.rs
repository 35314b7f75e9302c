use std::fs;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::Shell;

// The clap tree lives in cli.rs with no crate-internal imports.
#[path = "src/cli.rs"]
mod cli;

fn main() {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let out_dir = std::env::var_os("OUT_DIR").expect("OUT_DIR not set by Cargo");
    let out_dir = Path::new(&out_dir);

    let mut cmd = cli::Cli::command();
    cmd.build();

    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("create man directory");
    write_manpages(&cmd, &man_dir);

    let completion_dir = out_dir.join("completions");
    fs::create_dir_all(&completion_dir).expect("create completions directory");
    for shell in [Shell::Bash, Shell::Zsh, Shell::Fish] {
        clap_complete::generate_to(shell, &mut cmd, "brewbot", &completion_dir)
            .unwrap_or_else(|e| panic!("failed to write {shell} completions: {e}"));
    }
}

/// `brewbot.1`, `brewbot-serve.1`, `brewbot-config-init.1`, ...
fn write_manpages(root: &clap::Command, dir: &Path) {
    let mut pending = vec![root.clone()];

    while let Some(cmd) = pending.pop() {
        let page = cmd.get_name().to_owned();
        for sub in cmd.get_subcommands().filter(|s| !s.is_hide_set()) {
            pending.push(sub.clone().name(format!("{page}-{}", sub.get_name())));
        }

        let mut buf = Vec::new();
        clap_mangen::Man::new(cmd)
            .render(&mut buf)
            .unwrap_or_else(|e| panic!("failed to render {page}.1: {e}"));
        let path = dir.join(format!("{page}.1"));
        fs::write(&path, buf).unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
    }
}
