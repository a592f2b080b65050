use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use ledsong::{
    compile_midi, to_arduino_header, write_versioned, CompileOptions, Compilation, LedsongError,
    TempoOverride,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Arduino header with a PROGMEM event table
    Header,
    /// The full compilation as JSON
    Json,
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Standard MIDI file to compile
    #[arg(value_name = "INPUT_MID")]
    input: PathBuf,

    /// Directory for the output file (defaults to the input's directory)
    #[arg(value_name = "OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// YAML options file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of outputs, using the default pin layout (overrides config)
    #[arg(long)]
    actuators: Option<usize>,

    /// Play back at this tempo in BPM
    #[arg(long, conflicts_with = "multiplier")]
    bpm: Option<f64>,

    /// Play back this many times faster than the file
    #[arg(long)]
    multiplier: Option<f64>,

    /// Minimum OFF time before the same output turns on again
    #[arg(long)]
    min_gap_ms: Option<u64>,

    /// OFF time inserted when a note restarts while still sounding
    #[arg(long)]
    retrigger_gap_ms: Option<u64>,

    #[arg(long, value_enum, default_value_t = Format::Header)]
    format: Format,

    /// Print to stdout instead of writing a file
    #[arg(long, default_value_t = false)]
    stdout: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("Compilation error: {}", e);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), LedsongError> {
    let options = resolve_options(args)?;
    options.validate()?;

    let bytes = fs::read(&args.input).map_err(|source| LedsongError::Io {
        path: args.input.clone(),
        source,
    })?;
    let compilation = compile_midi(&bytes, &options)?;

    let (text, extension) = match args.format {
        Format::Header => {
            let source_name = args
                .input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            (
                to_arduino_header(&compilation, &options.outputs, &source_name),
                "h",
            )
        }
        Format::Json => (
            serde_json::to_string_pretty(&compilation)
                .map_err(|e| LedsongError::Serialize(e.to_string()))?,
            "json",
        ),
    };

    if args.stdout {
        println!("{}", text);
    } else {
        let path = write_versioned(&output_path(args, extension), &text)?;
        eprintln!("Wrote: {}", path.display());
    }
    report(&compilation, &options);
    Ok(())
}

fn resolve_options(args: &Args) -> Result<CompileOptions, LedsongError> {
    let mut options = match &args.config {
        Some(path) => CompileOptions::load(path)?,
        None => CompileOptions::default(),
    };

    if let Some(count) = args.actuators {
        options.outputs = CompileOptions::with_actuator_count(count)?.outputs;
    }
    if let Some(ms) = args.min_gap_ms {
        options.gaps.min_gap_ms = ms;
    }
    if let Some(ms) = args.retrigger_gap_ms {
        options.gaps.retrigger_gap_ms = ms;
    }
    if let Some(bpm) = args.bpm {
        options.tempo = TempoOverride::Bpm(bpm);
    } else if let Some(m) = args.multiplier {
        options.tempo = TempoOverride::Multiplier(m);
    }

    Ok(options)
}

fn output_path(args: &Args, extension: &str) -> PathBuf {
    let dir = args
        .output_dir
        .clone()
        .or_else(|| args.input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    let stem = args
        .input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "song".to_string());
    dir.join(format!("{}.{}", stem, extension))
}

fn report(compilation: &Compilation, options: &CompileOptions) {
    let pins: Vec<u8> = compilation
        .actuator_map
        .iter()
        .filter_map(|(_, id)| options.outputs.get(id as usize).map(|o| o.pin))
        .collect();
    eprintln!("Mapped notes: {:?} -> pins {:?}", compilation.chosen_pitches, pins);
    if compilation.stats.truncated {
        eprintln!(
            "WARNING: MIDI had more than {} distinct notes; unmapped notes were skipped.",
            options.actuator_count()
        );
    }
    eprintln!(
        "Tempo: {:.2} BPM -> {:.2} BPM",
        compilation.base_bpm, compilation.effective_bpm
    );
    eprintln!("Events: {}", compilation.events.len());
}
