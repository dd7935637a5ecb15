// src/cli.rs
use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{env, path::PathBuf};

use crate::commands::{
    self, DEFAULT_CONFIG_FILE, init::InitOptions, list::ListOptions, report::ReportOptions,
    run::RunOptions,
};
use crate::infra::t;

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for `--lang <VALUE>` or `--lang=<VALUE>`.
fn pre_parse_language() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    if let Some(pos) = args.iter().position(|arg| arg == "--lang") {
        return args.get(pos + 1).cloned();
    }
    args.iter()
        .find_map(|arg| arg.strip_prefix("--lang=").map(str::to_string))
}

fn config_arg(locale: &str) -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .help(t!("cli.arg_config", locale = locale).to_string())
        .value_name("CONFIG")
        .default_value(DEFAULT_CONFIG_FILE)
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Set)
}

fn project_dir_arg(locale: &str) -> Arg {
    Arg::new("project-dir")
        .long("project-dir")
        .help(t!("cli.arg_project_dir", locale = locale).to_string())
        .value_name("PROJECT_DIR")
        .default_value(".")
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Set)
}

fn module_arg(help: String) -> Arg {
    Arg::new("module")
        .short('m')
        .long("module")
        .help(help)
        .value_name("MODULE")
        .action(ArgAction::Append)
}

pub fn build_cli(locale: &str) -> Command {
    Command::new("suite-runner")
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli.about", locale = locale).to_string())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli.arg_lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("run")
                .about(t!("cli.cmd_run_about", locale = locale).to_string())
                .arg(config_arg(locale))
                .arg(project_dir_arg(locale))
                .arg(module_arg(t!("cli.arg_run_module", locale = locale).to_string()))
                .arg(
                    Arg::new("tags")
                        .short('t')
                        .long("tags")
                        .help(t!("cli.arg_tags", locale = locale).to_string())
                        .value_name("TAGS")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("report-dir")
                        .long("report-dir")
                        .help(t!("cli.arg_report_dir", locale = locale).to_string())
                        .value_name("REPORT_DIR")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("timeout")
                        .long("timeout")
                        .help(t!("cli.arg_timeout", locale = locale).to_string())
                        .value_name("SECONDS")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("quiet")
                        .short('q')
                        .long("quiet")
                        .help(t!("cli.arg_quiet", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("report")
                .about(t!("cli.cmd_report_about", locale = locale).to_string())
                .arg(config_arg(locale))
                .arg(project_dir_arg(locale))
                .arg(module_arg(t!("cli.arg_report_module", locale = locale).to_string()))
                .arg(
                    Arg::new("input")
                        .short('i')
                        .long("input")
                        .help(t!("cli.arg_input", locale = locale).to_string())
                        .value_name("RAW_JSON")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help(t!("cli.arg_output", locale = locale).to_string())
                        .value_name("DIR")
                        .value_parser(clap::value_parser!(PathBuf))
                        .requires("input")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("jobs")
                        .short('j')
                        .long("jobs")
                        .help(t!("cli.arg_jobs", locale = locale).to_string())
                        .value_name("JOBS")
                        .value_parser(clap::value_parser!(u64).range(1..))
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("list")
                .about(t!("cli.cmd_list_about", locale = locale).to_string())
                .arg(config_arg(locale))
                .arg(project_dir_arg(locale)),
        )
        .subcommand(
            Command::new("init")
                .about(t!("cli.cmd_init_about", locale = locale).to_string())
                .arg(config_arg(locale))
                .arg(
                    Arg::new("non-interactive")
                        .long("non-interactive")
                        .help(t!("cli.arg_non_interactive", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("force")
                        .long("force")
                        .help(t!("cli.arg_force", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
}

fn path_arg(matches: &ArgMatches, id: &str, default: &str) -> PathBuf {
    matches
        .get_one::<PathBuf>(id)
        .cloned()
        .unwrap_or_else(|| PathBuf::from(default))
}

fn modules_arg(matches: &ArgMatches) -> Vec<String> {
    matches
        .get_many::<String>("module")
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

pub async fn run() -> Result<()> {
    // Pre-parse language and initialize i18n first.
    let requested = pre_parse_language();
    let help_locale = match &requested {
        Some(lang) => crate::resolve_locale(lang),
        None => crate::system_locale(),
    };
    rust_i18n::set_locale(help_locale);

    let matches = build_cli(help_locale).get_matches();

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            commands::run::execute(RunOptions {
                config: path_arg(run_matches, "config", DEFAULT_CONFIG_FILE),
                project_dir: path_arg(run_matches, "project-dir", "."),
                modules: modules_arg(run_matches),
                tags: run_matches.get_one::<String>("tags").cloned(),
                report_dir: run_matches.get_one::<PathBuf>("report-dir").cloned(),
                timeout_secs: run_matches.get_one::<u64>("timeout").copied(),
                quiet: run_matches.get_flag("quiet"),
                lang: run_matches.get_one::<String>("lang").cloned(),
            })
            .await?;
        }
        Some(("report", report_matches)) => {
            commands::report::execute(ReportOptions {
                config: path_arg(report_matches, "config", DEFAULT_CONFIG_FILE),
                project_dir: path_arg(report_matches, "project-dir", "."),
                modules: modules_arg(report_matches),
                input: report_matches.get_one::<PathBuf>("input").cloned(),
                output: report_matches.get_one::<PathBuf>("output").cloned(),
                jobs: report_matches.get_one::<u64>("jobs").map(|jobs| *jobs as usize),
                lang: report_matches.get_one::<String>("lang").cloned(),
            })
            .await?;
        }
        Some(("list", list_matches)) => {
            commands::list::execute(ListOptions {
                config: path_arg(list_matches, "config", DEFAULT_CONFIG_FILE),
                project_dir: path_arg(list_matches, "project-dir", "."),
                lang: list_matches.get_one::<String>("lang").cloned(),
            })?;
        }
        Some(("init", init_matches)) => {
            commands::init::execute(InitOptions {
                config: path_arg(init_matches, "config", DEFAULT_CONFIG_FILE),
                non_interactive: init_matches.get_flag("non-interactive"),
                force: init_matches.get_flag("force"),
                locale: help_locale.to_string(),
            })?;
        }
        _ => {
            // Clap has already printed help for a missing subcommand.
        }
    }
    Ok(())
}
