extern crate chrono;
extern crate clap;
#[macro_use] extern crate log;
extern crate env_logger;
extern crate filevault;

use clap::{App, Arg, SubCommand};
use std::env;
use std::path::Path;

use filevault::{Error, Store};

/// Command-line entrypoint
fn main() {
    let cli = App::new("filevault")
        .bin_name("filevault")
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .help("Augment verbosity (print more details)")
                .multiple(true)
                .global(true),
        )
        .arg(
            Arg::with_name("store-dir")
                .short("d")
                .long("store-dir")
                .takes_value(true)
                .default_value(".filevault")
                .global(true),
        )
        .subcommand(
            SubCommand::with_name("track")
                .about("Record the current content of a file as a new version")
                .arg(Arg::with_name("path").required(true).takes_value(true))
                .arg(
                    Arg::with_name("message")
                        .short("m")
                        .takes_value(true)
                        .default_value(""),
                ),
        )
        .subcommand(
            SubCommand::with_name("diff")
                .about("Show the operations turning one tracked version into another")
                .arg(Arg::with_name("name").required(true).takes_value(true))
                .arg(Arg::with_name("v1").required(true).takes_value(true))
                .arg(Arg::with_name("v2").required(true).takes_value(true)),
        )
        .subcommand(
            SubCommand::with_name("history")
                .about("List every recorded version of a tracked name")
                .arg(Arg::with_name("name").required(true).takes_value(true)),
        )
        .subcommand(SubCommand::with_name("list").about("List every tracked name"))
        .subcommand(
            SubCommand::with_name("status")
                .about("Compare a file's current content against its tracked head")
                .arg(Arg::with_name("path").required(true).takes_value(true)),
        )
        .subcommand(
            SubCommand::with_name("restore")
                .about("Reconstruct a tracked version and write it out")
                .arg(Arg::with_name("name").required(true).takes_value(true))
                .arg(Arg::with_name("version").required(true).takes_value(true))
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .takes_value(true),
                ),
        );

    let mut cli = cli;
    let matches = match cli.get_matches_from_safe_borrow(env::args_os()) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    // Set up logging
    {
        let level = match matches.occurrences_of("verbose") {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        let mut logger_builder = env_logger::builder();
        logger_builder.filter(None, level);
        if let Ok(val) = env::var("FILEVAULT_LOG") {
            logger_builder.parse_filters(&val);
        }
        if let Ok(val) = env::var("FILEVAULT_LOG_STYLE") {
            logger_builder.parse_write_style(&val);
        }
        logger_builder.init();
    }

    let store_dir = matches.value_of("store-dir").unwrap();

    let res = match matches.subcommand_name() {
        Some("track") => run_track(matches.subcommand_matches("track").unwrap(), store_dir),
        Some("diff") => run_diff(matches.subcommand_matches("diff").unwrap(), store_dir),
        Some("history") => run_history(matches.subcommand_matches("history").unwrap(), store_dir),
        Some("list") => run_list(store_dir),
        Some("status") => run_status(matches.subcommand_matches("status").unwrap(), store_dir),
        Some("restore") => run_restore(matches.subcommand_matches("restore").unwrap(), store_dir),
        _ => {
            cli.print_help().expect("Can't print help");
            std::process::exit(2);
        }
    };

    if let Err(e) = res {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run_track(args: &clap::ArgMatches<'_>, store_dir: &str) -> Result<(), Error> {
    let path = Path::new(args.value_of_os("path").unwrap());
    let message = args.value_of("message").unwrap_or("");
    let bytes = std::fs::read(path)?;
    let name = path_to_name(path);

    info!("Tracking {:?}", name);
    let store = Store::open(store_dir)?;
    let metadata = filevault::track(&store, &name, &bytes, message)?;
    println!("{} version {}", name, metadata.version);
    Ok(())
}

fn run_diff(args: &clap::ArgMatches<'_>, store_dir: &str) -> Result<(), Error> {
    let name = args.value_of("name").unwrap();
    let v1 = parse_version(args.value_of("v1").unwrap())?;
    let v2 = parse_version(args.value_of("v2").unwrap())?;

    let store = Store::open(store_dir)?;
    let summary = filevault::diff(&store, name, v1, v2)?;
    println!(
        "{} operations, +{} copied {} -{}",
        summary.operation_count, summary.bytes_added, summary.bytes_copied, summary.bytes_removed
    );
    Ok(())
}

fn run_history(args: &clap::ArgMatches<'_>, store_dir: &str) -> Result<(), Error> {
    let name = args.value_of("name").unwrap();
    let store = Store::open(store_dir)?;
    for metadata in filevault::history(&store, name)? {
        println!(
            "{}\t{}\t{}\t{}",
            metadata.version, metadata.timestamp, metadata.checksum, metadata.message
        );
    }
    Ok(())
}

fn run_list(store_dir: &str) -> Result<(), Error> {
    let store = Store::open(store_dir)?;
    for entry in filevault::list(&store)? {
        println!("{}\tv{}\t{} bytes", entry.name, entry.version, entry.size);
    }
    Ok(())
}

fn run_status(args: &clap::ArgMatches<'_>, store_dir: &str) -> Result<(), Error> {
    let path = Path::new(args.value_of_os("path").unwrap());
    let name = path_to_name(path);
    let working_copy = std::fs::read(path)?;

    let store = Store::open(store_dir)?;
    let entry = filevault::status(&store, &name, &working_copy)?;
    let state = if entry.head_version == 0 {
        "untracked"
    } else if entry.modified {
        "modified"
    } else {
        "unchanged"
    };
    println!(
        "{}\thead v{}\t{}\t{}",
        entry.name, entry.head_version, state, entry.last_message
    );
    Ok(())
}

fn run_restore(args: &clap::ArgMatches<'_>, store_dir: &str) -> Result<(), Error> {
    let name = args.value_of("name").unwrap();
    let version = parse_version(args.value_of("version").unwrap())?;
    let output = args
        .value_of_os("output")
        .map(Path::new)
        .unwrap_or_else(|| Path::new(name));

    let store = Store::open(store_dir)?;
    let bytes = filevault::restore(&store, name, version)?;
    std::fs::write(output, bytes)?;
    info!("Restored {:?} version {} to {:?}", name, version, output);
    Ok(())
}

fn parse_version(s: &str) -> Result<u32, Error> {
    s.parse()
        .map_err(|_| Error::InvalidArgument(format!("{:?} is not a valid version number", s)))
}

/// Derives a tracked name from a filesystem path: the relative path with
/// any leading `./` stripped, so names are stable across working
/// directories.
fn path_to_name(path: &Path) -> String {
    let path = if path.starts_with(".") {
        path.strip_prefix(".").unwrap()
    } else {
        path
    };
    path.to_string_lossy().into_owned()
}
