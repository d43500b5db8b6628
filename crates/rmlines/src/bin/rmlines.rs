//! `rmlines` — convert reMarkable v6 files to SVG or PDF.
//!
//! Usage:
//!   rmlines <input.rm|folder> [-o OUT] [-t svg|pdf] [--content FILE]
//!
//! A folder input produces a multipage PDF from all `.rm` files in it,
//! ordered by the `--content` sidecar when given, else by modification
//! time.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use rmlines::content::{order_files_with_sidecar, sort_by_mtime};
use rmlines::{ConvertError, Format};

const USAGE: &str = "usage: rmlines <input.rm|folder> [-o OUT] [-t svg|pdf] [--content FILE]

  -o, --output FILE   output file (default: stdout)
  -t, --type FORMAT   output type: svg or pdf (default: guess from output name)
      --content FILE  .content file for page ordering (folders only)
  -h, --help          show this help";

struct Args {
    input: PathBuf,
    output: Option<PathBuf>,
    format: Option<Format>,
    content: Option<PathBuf>,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut input = None;
    let mut output = None;
    let mut format = None;
    let mut content = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-o" | "--output" => {
                i += 1;
                output = Some(PathBuf::from(
                    args.get(i).ok_or("missing value for --output")?,
                ));
            }
            "-t" | "--type" => {
                i += 1;
                format = Some(match args.get(i).map(String::as_str) {
                    Some("svg") | Some("SVG") => Format::Svg,
                    Some("pdf") | Some("PDF") => Format::Pdf,
                    Some(other) => return Err(format!("unknown format: {other}")),
                    None => return Err("missing value for --type".into()),
                });
            }
            "--content" => {
                i += 1;
                content = Some(PathBuf::from(
                    args.get(i).ok_or("missing value for --content")?,
                ));
            }
            "-h" | "--help" => return Err(String::new()),
            flag if flag.starts_with('-') => return Err(format!("unknown flag: {flag}")),
            positional => {
                if input.is_some() {
                    return Err("expected exactly one input path".into());
                }
                input = Some(PathBuf::from(positional));
            }
        }
        i += 1;
    }

    Ok(Args {
        input: input.ok_or("expected an input path")?,
        output,
        format,
        content,
    })
}

fn effective_format(args: &Args) -> Format {
    args.format.unwrap_or_else(|| {
        args.output
            .as_deref()
            .map(Format::from_path)
            .unwrap_or(Format::Pdf)
    })
}

fn write_output(output: Option<&Path>, data: &[u8]) -> std::io::Result<()> {
    match output {
        Some(path) => std::fs::write(path, data),
        None => std::io::stdout().write_all(data),
    }
}

fn collect_rm_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_rm = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("rm"));
        if path.is_file() && is_rm {
            files.push(path);
        }
    }
    Ok(files)
}

fn run_single(args: &Args) -> Result<(), String> {
    let format = effective_format(args);
    let data = std::fs::read(&args.input)
        .map_err(|e| format!("failed to read {}: {e}", args.input.display()))?;
    let out = rmlines::convert_data(&data, format).map_err(|e| convert_error_message(&e))?;
    write_output(args.output.as_deref(), &out).map_err(|e| format!("failed to write output: {e}"))
}

fn run_directory(args: &Args) -> Result<(), String> {
    if effective_format(args) == Format::Svg {
        return Err("multipage output is only supported for PDF, not SVG".into());
    }

    let mut files =
        collect_rm_files(&args.input).map_err(|e| format!("failed to list input folder: {e}"))?;
    if files.is_empty() {
        return Err(format!(
            "no .rm files found in directory: {}",
            args.input.display()
        ));
    }

    let mut used_sidecar = false;
    if let Some(content_path) = &args.content {
        let (ordered, used) = order_files_with_sidecar(&files, content_path);
        files = ordered;
        used_sidecar = used;
        if !used {
            eprintln!(
                "warning: could not use content file {}, falling back to modification time",
                content_path.display()
            );
        }
    }
    if !used_sidecar {
        sort_by_mtime(&mut files);
        if args.content.is_none() {
            eprintln!(
                "warning: ordering pages by modification time; pass --content for reliable order"
            );
        }
    }

    let pdf = rmlines::convert_files_to_pdf(&files).map_err(|e| convert_error_message(&e))?;
    write_output(args.output.as_deref(), &pdf).map_err(|e| format!("failed to write output: {e}"))
}

fn convert_error_message(err: &ConvertError) -> String {
    match err {
        ConvertError::Parse(cause) => format!("{err}: {cause}"),
        ConvertError::Render(cause) => format!("{err}: {cause}"),
        ConvertError::Pdf(cause) => format!("{err}: {cause}"),
        _ => err.to_string(),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&raw) {
        Ok(args) => args,
        Err(msg) => {
            if msg.is_empty() {
                println!("{USAGE}");
                return ExitCode::SUCCESS;
            }
            eprintln!("{msg}\n{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    let result = if args.input.is_dir() {
        run_directory(&args)
    } else {
        run_single(&args)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}
