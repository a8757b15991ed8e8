// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod picks;
mod prefs;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use picks::Pick;
use runtime::SheetRuntime;
use std::env;
use std::path::PathBuf;
use valvecode_app::{AppCommand, AppState};
use valvecode_sheet::SheetClient;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `valvecode --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let log_path = config.log_path()?;
    logging::init(&log_path, config.log_level()).with_context(|| {
        format!(
            "start logging to {}; set [log].path or VALVECODE_LOG",
            log_path.display()
        )
    })?;
    tracing::info!(config = %options.config_path.display(), "valvecode starting");

    let category = match &options.category {
        Some(category) => category.clone(),
        None => prefs::selected_category(&prefs::default_path()?)?,
    };
    tracing::info!(%category, "category resolved");

    let schema = config.schema()?;
    let client = SheetClient::new(
        config.sheet_base_url(),
        config.sheet_id(),
        config.sheet_timeout()?,
    )
    .with_context(|| {
        format!(
            "invalid [sheet] config in {}; fix base_url/sheet_id/timeout values",
            options.config_path.display()
        )
    })?;

    if options.check_only {
        let table = client
            .load_table(&category)
            .with_context(|| format!("load {category} master data"))?;
        println!("{category}: {} rows", table.len());
        return Ok(());
    }

    let mut state = AppState::new(category.clone(), schema, config.expected_length());

    if options.print_code {
        let table = client
            .load_table(&category)
            .with_context(|| format!("load {category} master data"))?;
        state.dispatch(AppCommand::TableLoaded(table));
        picks::apply(&mut state, &options.picks)?;

        let code = state.code();
        println!("{}", code.code);
        println!("{}", code.status_label());
        if !code.valid {
            bail!(
                "part number is incomplete: {}; add more --pick arguments",
                code.status_label()
            );
        }
        return Ok(());
    }

    let mut runtime = SheetRuntime::new(client);
    valvecode_tui::run_app(&mut state, &mut runtime)?;
    if !state.code().is_empty() {
        println!("{}", state.code().code);
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    category: Option<String>,
    picks: Vec<Pick>,
    print_code: bool,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        category: None,
        picks: Vec::new(),
        print_code: false,
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--category" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--category requires a name such as Gate_Valve"))?;
                let value = value.as_ref().trim();
                if value.is_empty() {
                    bail!("--category must not be empty");
                }
                options.category = Some(value.to_owned());
            }
            "--pick" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--pick requires Field=Value"))?;
                options.picks.push(Pick::parse(value.as_ref())?);
            }
            "--print-code" => {
                options.print_code = true;
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    if !options.picks.is_empty() && !options.print_code {
        bail!("--pick only applies with --print-code");
    }

    Ok(options)
}

fn print_help() {
    println!("valvecode: build valve part numbers from sheet master data");
    println!("  --config <path>          Use a specific config path");
    println!("  --category <name>        Valve category tab (default from prefs, else Gate_Valve)");
    println!("  --pick <Field=Value>     Select a value; repeat per field (needs --print-code)");
    println!("  --print-code             Print the part number for the picks and exit");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --check                  Validate config and load the sheet once");
    println!("  --help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::{CliOptions, parse_cli_args};
    use crate::picks::Pick;
    use anyhow::Result;
    use std::path::PathBuf;

    fn default_options_path() -> PathBuf {
        PathBuf::from("/tmp/valvecode-config.toml")
    }

    #[test]
    fn parse_cli_args_defaults_to_provided_config_path() -> Result<()> {
        let options = parse_cli_args(Vec::<String>::new(), default_options_path())?;
        assert_eq!(
            options,
            CliOptions {
                config_path: default_options_path(),
                category: None,
                picks: Vec::new(),
                print_code: false,
                print_config_path: false,
                print_example: false,
                check_only: false,
                show_help: false,
            }
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_config_path_override() -> Result<()> {
        let options = parse_cli_args(
            vec!["--config", "/custom/config.toml"],
            default_options_path(),
        )?;
        assert_eq!(options.config_path, PathBuf::from("/custom/config.toml"));
        Ok(())
    }

    #[test]
    fn parse_cli_args_errors_for_missing_values() {
        let error = parse_cli_args(vec!["--config"], default_options_path())
            .expect_err("missing config value should fail");
        assert!(error.to_string().contains("--config requires a file path"));

        let error = parse_cli_args(vec!["--category"], default_options_path())
            .expect_err("missing category should fail");
        assert!(error.to_string().contains("--category requires"));

        let error = parse_cli_args(vec!["--category", " "], default_options_path())
            .expect_err("blank category should fail");
        assert!(error.to_string().contains("must not be empty"));
    }

    #[test]
    fn parse_cli_args_errors_for_unknown_argument() {
        let error = parse_cli_args(vec!["--wat"], default_options_path())
            .expect_err("unknown arg should fail");
        let message = error.to_string();
        assert!(message.contains("unknown argument"));
        assert!(message.contains("--help"));
    }

    #[test]
    fn parse_cli_args_collects_picks_in_order() -> Result<()> {
        let options = parse_cli_args(
            vec![
                "--category",
                "Ball_Valve",
                "--pick",
                "Size=2\"",
                "--print-code",
                "--pick",
                "Valve=Ball",
            ],
            default_options_path(),
        )?;
        assert_eq!(options.category.as_deref(), Some("Ball_Valve"));
        assert!(options.print_code);
        assert_eq!(
            options.picks,
            vec![Pick::parse("Size=2\"")?, Pick::parse("Valve=Ball")?]
        );
        Ok(())
    }

    #[test]
    fn parse_cli_args_rejects_picks_without_print_code() {
        let error = parse_cli_args(vec!["--pick", "Size=2\""], default_options_path())
            .expect_err("pick without print-code should fail");
        assert!(error.to_string().contains("--print-code"));
    }

    #[test]
    fn parse_cli_args_sets_print_and_check_flags() -> Result<()> {
        let options = parse_cli_args(
            vec!["--print-config-path", "--print-example-config", "--check"],
            default_options_path(),
        )?;
        assert!(options.print_config_path);
        assert!(options.print_example);
        assert!(options.check_only);
        assert!(!options.print_code);
        assert!(!options.show_help);
        Ok(())
    }

    #[test]
    fn parse_cli_args_sets_help_flag_for_long_and_short_variants() -> Result<()> {
        let long = parse_cli_args(vec!["--help"], default_options_path())?;
        assert!(long.show_help);

        let short = parse_cli_args(vec!["-h"], default_options_path())?;
        assert!(short.show_help);
        Ok(())
    }
}
