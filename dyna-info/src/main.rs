use std::path::Path;

use clap::{Parser, ValueEnum};
use dyna::reader::{PayloadSizeSource, ReaderOptions};

#[derive(Clone, Copy, ValueEnum)]
enum SizeSource {
    /// Split size field of the PES header
    Pes,
    /// Size word of the basic header
    Basic,
}

impl From<SizeSource> for PayloadSizeSource {
    fn from(value: SizeSource) -> Self {
        match value {
            SizeSource::Pes => PayloadSizeSource::PesLiteral,
            SizeSource::Basic => PayloadSizeSource::BasicSize,
        }
    }
}

#[derive(Parser)]
#[command(name = "dyna-info", about = "Parse and display Dynacolor recording structure")]
struct Args {
    /// Input .dyna/.dyn file (optionally .gz)
    #[arg(short = 'f', long = "file")]
    file: Option<String>,

    /// Input .dyna/.dyn file (positional)
    #[arg(conflicts_with = "file", required_unless_present_any = ["file", "schema", "version"])]
    input: Option<String>,

    /// Where payload sizes are read from
    #[arg(long = "size-source", value_enum, default_value = "pes")]
    size_source: SizeSource,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Print JSON schema for the output format and exit
    #[arg(long)]
    schema: bool,

    /// Display version and quit
    #[arg(long)]
    version: bool,
}

fn main() {
    // Reset SIGPIPE to default so piped output (e.g. head/tail) exits cleanly
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    if args.version {
        for line in version_banner(
            env!("CARGO_PKG_VERSION"),
            env!("RELEASE_VERSION"),
            env!("GIT_COMMIT"),
        ) {
            println!("{line}");
        }
        return Ok(());
    }

    if args.schema {
        let schema = schemars::schema_for!(dyna::reader::DynaFile);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let file = args
        .file
        .or(args.input)
        .ok_or("Expected a .dyna/.dyn file as input!")?;
    let path = Path::new(&file);
    if !dyna::reader::has_dyna_extension(path) {
        log::warn!("{} does not have a .dyna/.dyn extension", path.display());
    }

    let options = ReaderOptions {
        payload_size: args.size_source.into(),
    };
    let mut reader = dyna::open_dyna(path)?;
    let recording = dyna::parse_dyna(&mut reader, options)?;

    if args.json {
        println!("{}", serde_json::to_string(&recording)?);
        return Ok(());
    }

    println!(
        "Stream: {:?} (codec {}), {} records{}",
        recording.stream_format,
        recording.codec,
        recording.frames.len(),
        if recording.magic_ok { "" } else { ", no magic" }
    );

    println!(
        "{:>4} {:>3} {:>3} {:>3} {:>12} {:>8} {:>8} {:>11} {:>5}",
        "Type", "FT", "CH", "FMT", "OFFSET", "SIZE", "PES", "TIME", "EXTRA"
    );

    for frame in &recording.frames {
        let basic = &frame.header.basic;
        println!(
            "{:>4} {:>3} {:>3} {:>3X} {:>12} {:>8} {:>8} {:>11} {:>5}",
            if basic.audio { "A" } else { "V" },
            basic.frame_type,
            basic.channel,
            frame.pes.format_id,
            frame.file_offset,
            basic.size,
            frame.data_size,
            basic.time,
            if frame.header.has_extra() { 1 } else { 0 },
        );
    }

    Ok(())
}

fn version_banner(version: &str, release: &str, commit: &str) -> Vec<String> {
    let mut lines = vec![
        "Dynacolor Info Tool".to_string(),
        "License: GNU AGPL v3 (AGPL-3.0-only)".to_string(),
        String::new(),
        format!("\tVersion:     {version}"),
    ];
    if !release.is_empty() {
        lines.push(format!("\tGit tag:     {release}"));
    }
    if !commit.is_empty() {
        lines.push(format!("\tGit commit:  {commit}"));
    }
    lines
}
