use clap::{arg, command};
use std::path::PathBuf;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("trajfind")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("trajfind")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("locate")
                .about(
                    "Repeatedly search a host graph snapshot for a trajectory record until it \
                appears or the retry budget runs out.",
                )
                .arg(
                    arg!(-g --"graph" <PATH>)
                        .required(true)
                        .help("JSON snapshot of the host graph; re-read on every attempt")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-c --"config" <PATH>)
                        .required(false)
                        .help("TOML configuration file (default: ~/.config/trajfind/config.toml)")
                        .default_value("~/.config/trajfind/config.toml"),
                )
                .arg(
                    arg!(--"max-attempts" <N>)
                        .required(false)
                        .help("Maximum number of attempts")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    arg!(--"interval-ms" <MILLIS>)
                        .required(false)
                        .help("Delay between attempts in milliseconds")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(-m --"marker-key" <KEY>)
                        .required(false)
                        .help("Property name of candidate containers"),
                )
                .arg(
                    arg!(-s --"strategy" <STRATEGY>)
                        .required(false)
                        .help(
                            "ROOT_PATH=PREFERRED_SUBSTRING, tried in the order given. An empty \
                        ROOT_PATH searches the whole graph. Replaces configured strategies.",
                        )
                        .action(clap::ArgAction::Append),
                )
                .arg(
                    arg!(--"max-depth" <DEPTH>)
                        .required(false)
                        .help("Do not inspect properties deeper than this below a strategy root")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"max-nodes" <NODES>)
                        .required(false)
                        .help("Abort a strategy's scan once this many objects have been visited")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"log-level" <LEVEL>)
                        .required(false)
                        .help("Log verbosity: debug, info, warn, error, none")
                        .value_parser(["debug", "info", "warn", "error", "none"]),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                ),
        )
        .subcommand(
            command!("scan")
                .about("List the candidate containers found in a host graph snapshot")
                .arg(
                    arg!(-g --"graph" <PATH>)
                        .required(true)
                        .help("JSON snapshot of the host graph")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    arg!(-r --"root" <PATH>)
                        .required(false)
                        .help("Dotted path to start from (default: whole graph)")
                        .default_value(""),
                )
                .arg(
                    arg!(-c --"config" <PATH>)
                        .required(false)
                        .help("TOML configuration file (default: ~/.config/trajfind/config.toml)")
                        .default_value("~/.config/trajfind/config.toml"),
                )
                .arg(
                    arg!(-m --"marker-key" <KEY>)
                        .required(false)
                        .help("Property name of candidate containers"),
                )
                .arg(
                    arg!(--"max-depth" <DEPTH>)
                        .required(false)
                        .help("Do not inspect properties deeper than this below the root")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"max-nodes" <NODES>)
                        .required(false)
                        .help("Abort once this many objects have been visited")
                        .value_parser(clap::value_parser!(usize)),
                ),
        )
        .subcommand(
            command!("validate")
                .about("Check whether a JSON document is a trajectory record")
                .arg(
                    arg!(-f --"file" <PATH>)
                        .required(true)
                        .help("The JSON document to check")
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
}
