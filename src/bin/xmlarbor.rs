//! Command-line front end: read XML files, query them, and write them back
//! in canonical form.

use std::fs;
use std::io::{self, Read, Write};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use xmlarbor::builder::BuildOptions;
use xmlarbor::reader::parse_str_with_options;
use xmlarbor::serial::{serialize_node, serialize_with_options, SerializeOptions};
use xmlarbor::Document;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// xmlarbor -- read, query, and re-serialize XML files.
#[derive(Parser, Debug)]
#[command(name = "xmlarbor", version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// XML files to process (use `-` for stdin).
    #[arg(required = true)]
    files: Vec<String>,

    /// Print diagnostics and debug logging to stderr.
    #[arg(long, short)]
    verbose: bool,

    // -- Parsing options ---------------------------------------------------
    /// Keep tabs and whitespace-only text instead of cleaning them.
    #[arg(long)]
    keep_whitespace: bool,

    // -- Queries -----------------------------------------------------------
    /// Print the element with this id (searched from the root).
    #[arg(long, value_name = "ID")]
    id: Option<String>,

    /// Print the elements matching this name or slash path from the root.
    #[arg(long, value_name = "PATH")]
    path: Option<String>,

    /// Verify the name and id indices of the whole tree.
    #[arg(long)]
    check: bool,

    // -- Output options ----------------------------------------------------
    /// Do not output the document.
    #[arg(long)]
    noout: bool,

    /// Omit the `<?xml ...?>` declaration.
    #[arg(long)]
    no_decl: bool,

    /// Indentation written per nesting level.
    #[arg(long, value_name = "STR", default_value = "\t")]
    indent: String,

    /// Save output to a file instead of stdout.
    #[arg(long, value_name = "FILE")]
    output: Option<String>,

    /// Print timing information for parsing and serializing.
    #[arg(long)]
    timing: bool,
}

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

const EXIT_SUCCESS: u8 = 0;
const EXIT_PARSE_ERROR: u8 = 1;
const EXIT_NOT_FOUND: u8 = 2;
const EXIT_INDEX_ERROR: u8 = 3;
const EXIT_WRITE_ERROR: u8 = 4;

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // One sink for the whole run, so results from several files and
    // queries accumulate instead of replacing each other.
    let mut out: Box<dyn Write> = match cli.output {
        Some(ref output_file) => match fs::File::create(output_file) {
            Ok(f) => Box::new(io::BufWriter::new(f)),
            Err(e) => {
                eprintln!("{output_file}: failed to create: {e}");
                return ExitCode::from(EXIT_WRITE_ERROR);
            }
        },
        None => Box::new(io::stdout().lock()),
    };

    let mut worst_exit: u8 = EXIT_SUCCESS;
    for file in &cli.files {
        let exit = process_file(&cli, file, &mut out);
        if exit > worst_exit {
            worst_exit = exit;
        }
    }
    if let Err(e) = out.flush() {
        eprintln!("failed to write output: {e}");
        worst_exit = EXIT_WRITE_ERROR;
    }

    ExitCode::from(worst_exit)
}

/// Installs a stderr subscriber. `RUST_LOG` overrides the default level.
fn init_logging(verbose: bool) {
    let default = if verbose { "xmlarbor=debug" } else { "xmlarbor=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Processes a single input file and returns an exit code.
fn process_file(cli: &Cli, filename: &str, out: &mut dyn Write) -> u8 {
    match read_input(filename) {
        Ok(input) => process_input(cli, filename, &input, out),
        Err(e) => {
            eprintln!("{filename}: failed to read: {e}");
            EXIT_PARSE_ERROR
        }
    }
}

/// Parses, checks, queries, and writes one document.
fn process_input(cli: &Cli, filename: &str, input: &str, out: &mut dyn Write) -> u8 {
    // -- Parse -------------------------------------------------------------
    let start_parse = Instant::now();
    let options = BuildOptions::default().clean_whitespace(!cli.keep_whitespace);
    let doc = match parse_str_with_options(input, &options) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("{filename}: {e}");
            return EXIT_PARSE_ERROR;
        }
    };
    if cli.timing {
        eprintln!("Parsing took {:?}", start_parse.elapsed());
    }

    if cli.verbose {
        for diag in doc.diagnostics() {
            eprintln!("{filename}: {diag}");
        }
    }

    let serial = SerializeOptions::default()
        .declaration(!cli.no_decl)
        .indent_str(&cli.indent);
    let mut exit_code = EXIT_SUCCESS;

    // -- Index check -------------------------------------------------------
    if cli.check {
        if let Some(root) = doc.root_element() {
            match doc.verify_indices(root) {
                Ok(()) => eprintln!("{filename}: indices consistent"),
                Err(e) => {
                    eprintln!("{filename}: {e}");
                    exit_code = EXIT_INDEX_ERROR;
                }
            }
        }
    }

    // -- Queries -----------------------------------------------------------
    let querying = cli.id.is_some() || cli.path.is_some();
    if let Some(ref id) = cli.id {
        let code = print_by_id(out, filename, &doc, id, &serial);
        exit_code = exit_code.max(code);
    }
    if let Some(ref path) = cli.path {
        let code = print_by_path(out, filename, &doc, path, &serial);
        exit_code = exit_code.max(code);
    }

    // -- Serialization / output --------------------------------------------
    if !cli.noout && !querying {
        let start_serial = Instant::now();
        let mut output = serialize_with_options(&doc, &serial);
        output.push('\n');
        exit_code = exit_code.max(write_output(out, &output));
        if cli.timing {
            eprintln!("Serializing took {:?}", start_serial.elapsed());
        }
    }

    exit_code
}

// ---------------------------------------------------------------------------
// Input reading
// ---------------------------------------------------------------------------

/// Reads input from a file or stdin (when filename is `-`).
fn read_input(filename: &str) -> io::Result<String> {
    if filename == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        fs::read_to_string(filename)
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

fn print_by_id(
    out: &mut dyn Write,
    filename: &str,
    doc: &Document,
    id: &str,
    options: &SerializeOptions,
) -> u8 {
    let found = doc
        .root_element()
        .and_then(|root| doc.element_by_id(root, id));
    match found {
        Some(element) => {
            let mut text = serialize_node(doc, element, options);
            text.push('\n');
            write_output(out, &text)
        }
        None => {
            eprintln!("{filename}: no element with id '{id}'");
            EXIT_NOT_FOUND
        }
    }
}

fn print_by_path(
    out: &mut dyn Write,
    filename: &str,
    doc: &Document,
    path: &str,
    options: &SerializeOptions,
) -> u8 {
    let found = doc
        .root_element()
        .map(|root| doc.elements_by_name(root, path))
        .unwrap_or_default();
    if found.is_empty() {
        eprintln!("{filename}: nothing matches '{path}'");
        return EXIT_NOT_FOUND;
    }
    let mut text = String::new();
    for &element in found {
        text.push_str(&serialize_node(doc, element, options));
        text.push('\n');
    }
    write_output(out, &text)
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Appends `content` to the run's output sink.
fn write_output(out: &mut dyn Write, content: &str) -> u8 {
    match out.write_all(content.as_bytes()) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("failed to write output: {e}");
            EXIT_WRITE_ERROR
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SHELF: &str = "<shelf><book id='b1'><title>One</title></book><book><title>Two</title></book></shelf>";

    fn cli_from(args: &[&str]) -> Cli {
        Cli::parse_from(["xmlarbor"].iter().chain(args).copied())
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_id_and_path_results_accumulate() {
        let cli = cli_from(&["--id", "b1", "--path", "book/title", "-"]);
        let mut out = Vec::new();
        assert_eq!(process_input(&cli, "-", SHELF, &mut out), EXIT_SUCCESS);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<book id=\"b1\">\n\t<title>One</title>\n</book>\n<title>One</title>\n"
        );
    }

    #[test]
    fn test_documents_accumulate_across_inputs() {
        let cli = cli_from(&["--no-decl", "a.xml", "b.xml"]);
        let mut out = Vec::new();
        process_input(&cli, "a.xml", "<a/>", &mut out);
        process_input(&cli, "b.xml", "<b/>", &mut out);
        assert_eq!(String::from_utf8(out).unwrap(), "<a/>\n<b/>\n");
    }

    #[test]
    fn test_write_failure_sets_exit_code() {
        let cli = cli_from(&["-"]);
        assert_eq!(process_input(&cli, "-", SHELF, &mut BrokenPipe), EXIT_WRITE_ERROR);

        let cli = cli_from(&["--path", "book", "-"]);
        assert_eq!(process_input(&cli, "-", SHELF, &mut BrokenPipe), EXIT_WRITE_ERROR);
    }

    #[test]
    fn test_lookup_miss_and_parse_error_codes() {
        let cli = cli_from(&["--id", "nope", "-"]);
        let mut out = Vec::new();
        assert_eq!(process_input(&cli, "-", SHELF, &mut out), EXIT_NOT_FOUND);
        assert!(out.is_empty());
        assert_eq!(process_input(&cli, "-", "<a><b></a>", &mut out), EXIT_PARSE_ERROR);
    }
}
