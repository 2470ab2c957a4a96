//! The `repocutter` command-line front end.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use repocutter::{DumpError, DumpfileSource, SubversionRange, commands};

#[derive(Parser)]
#[command(
    name = "repocutter",
    version,
    about = "Stream surgery on SVN dump files",
    disable_help_subcommand = true
)]
struct Cli {
    /// Suppress progress and warning chatter on standard error.
    #[arg(short, long, global = true)]
    quiet: bool,
    /// Restrict the operation to a selection of revisions.
    #[arg(short = 'r', long = "range", global = true, value_name = "SELECTION")]
    range: Option<String>,
    /// Read the dump from a file instead of standard input.
    #[arg(short = 'i', long = "infile", global = true, value_name = "PATH")]
    infile: Option<PathBuf>,
    /// Enable debug tracing on standard error.
    #[arg(short = 'd', long = "debug", global = true)]
    debug: bool,
    /// Base value to renumber from (renumber only).
    #[arg(short = 'b', long = "base", global = true, default_value_t = 0, value_name = "N")]
    base: u64,
    /// Log-entry patch file (setlog only).
    #[arg(short = 'l', long = "logentries", global = true, value_name = "FILE")]
    logentries: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Emit only the revisions in the selection.
    Select,
    /// Emit only the revisions not in the selection.
    Deselect,
    /// Keep only nodes whose path matches one of the patterns.
    Sift {
        #[arg(required = true)]
        patterns: Vec<String>,
    },
    /// Drop nodes whose path matches one of the patterns.
    Expunge {
        #[arg(required = true)]
        patterns: Vec<String>,
    },
    /// Regexp-replace path headers and mergeinfo paths.
    Pathrename { from: String, to: String },
    /// Pop the first segment off each path.
    Pop,
    /// Swap the first two segments of each path.
    Swap,
    /// Delete the named properties.
    Propdel {
        #[arg(required = true)]
        propnames: Vec<String>,
    },
    /// Set properties given as NAME=VALUE.
    Propset {
        #[arg(required = true)]
        assignments: Vec<String>,
    },
    /// Rename properties given as OLD->NEW.
    Proprename {
        #[arg(required = true)]
        renames: Vec<String>,
    },
    /// Replace log entries from a log patch file.
    Setlog,
    /// Replace content with generated cookies.
    Strip { patterns: Vec<String> },
    /// Regexp search and replace over content bodies.
    Replace { transform: String },
    /// Obscure path segments and committer IDs.
    Obscure,
    /// Renumber revisions so they are contiguous.
    Renumber,
    /// Topologically reduce a dump file.
    Reduce { file: PathBuf },
    /// Report one line of essential information per node.
    See,
    /// Extract log entries in svn log format.
    Log,
    /// Neutralize a stream into a reproducible test load.
    Testify,
    /// Report the repocutter version.
    Version,
    /// Show help for a subcommand.
    Help { topic: Option<String> },
}

const GENERAL_HELP: &str = "\
repocutter - stream surgery on SVN dump files
general usage: repocutter [-q] [-r SELECTION] SUBCOMMAND

In all commands, the -r (or --range) option limits the selection of revisions
over which an operation will be performed. A selection consists of one or more
comma-separated ranges. A range may consist of an integer revision number or
the special name HEAD for the head revision. Or it may be a colon-separated
pair of integers, or an integer followed by a colon followed by HEAD.

Type 'repocutter help <subcommand>' for help on a specific subcommand.

Available subcommands:
   deselect     Deselecting revisions
   expunge      Expunge operations by Node-path header
   log          Extracting log entries
   obscure      Obscure pathnames
   pathrename   Transform path headers with a regexp replace
   pop          Pop the first segment off each path
   propdel      Deleting revision properties
   proprename   Renaming revision properties
   propset      Setting revision properties
   reduce       Topologically reduce a dump
   renumber     Renumber revisions so they're contiguous
   replace      Regexp replace in blobs
   see          Report only essential topological information
   select       Selecting revisions
   setlog       Mutating log entries
   sift         Sift for operations by Node-path header
   strip        Replace content with unique cookies, preserving structure
   swap         Swap first two components of pathnames
   testify      Massage a stream file into a neutralized test load
   version      Report repocutter's version
";

fn subcommand_help(topic: &str) -> Option<&'static str> {
    let text = match topic {
        "select" => {
            "select: usage: repocutter [-q] [-r SELECTION] select

The 'select' subcommand selects a range and permits only revisions in
that range to pass to standard output. A range beginning with 0
includes the dumpfile header.
"
        }
        "deselect" => {
            "deselect: usage: repocutter [-q] [-r SELECTION] deselect

The 'deselect' subcommand selects a range and permits only revisions NOT in
that range to pass to standard output.
"
        }
        "sift" => {
            "sift: usage: repocutter [-r SELECTION] sift PATTERN...

Delete all operations with Node-path headers *not* matching specified
regular expressions (opposite of 'expunge'). Any revision left with no
Node records after this filtering has its Revision record removed as
well.
"
        }
        "expunge" => {
            "expunge: usage: repocutter [-r SELECTION] expunge PATTERN...

Delete all operations with Node-path headers matching specified regular
expressions (opposite of 'sift'). Any revision left with no Node
records after this filtering has its Revision record removed as well.
A selection may name individual nodes with REVISION.NODE syntax.
"
        }
        "pathrename" => {
            "pathrename: usage: repocutter [-r SELECTION] pathrename FROM TO

Modify Node-path headers, Node-copyfrom-path headers, and svn:mergeinfo
properties matching the regular expression FROM; replace with TO. TO
may contain backreferences (${1}, ${2} etc - braces not optional) to
parenthesized portions of FROM.
"
        }
        "pop" => {
            "pop: usage: repocutter [-r SELECTION] pop

Pop initial segment off each path. May be useful after a sift command
to turn a dump from a subproject stripped from a dump for a
multiple-project repository into the normal form with
trunk/tags/branches at the top level.
"
        }
        "swap" => {
            "swap: usage: repocutter [-r SELECTION] swap

Swap the top two elements of each pathname in every revision in the
selection set. Useful following a sift operation for straightening out
a common form of multi-project repository.
"
        }
        "propdel" => {
            "propdel: usage: repocutter [-r SELECTION] propdel PROPNAME...

Delete the property PROPNAME. May be restricted by a revision
selection. You may specify multiple properties to be deleted.
"
        }
        "propset" => {
            "propset: usage: repocutter [-r SELECTION] propset PROPNAME=PROPVAL...

Set the property PROPNAME to PROPVAL. May be restricted by a revision
selection. You may specify multiple property settings.
"
        }
        "proprename" => {
            "proprename: usage: repocutter [-r SELECTION] proprename OLDNAME->NEWNAME...

Rename the property OLDNAME to NEWNAME. May be restricted by a
revision selection. You may specify multiple properties to be renamed.
"
        }
        "setlog" => {
            "setlog: usage: repocutter [-r SELECTION] -logentries=LOGFILE setlog

Replace the log entries in the input dumpfile with the corresponding
entries in the LOGFILE, which should be in the format of an svn log
output. Replacements may be restricted to a specified range. The
author recorded on each input revision must match the author in the
patch; a mismatch aborts the run.
"
        }
        "strip" => {
            "strip: usage: repocutter [-r SELECTION] strip PATTERN...

Replace content with unique generated cookies on all node paths
matching the specified regular expressions; if no expressions are
given, match all paths. Symbolic links are left alone. Stale content
checksums are removed, not recomputed; consumers stricter than
reposurgeon may object.
"
        }
        "replace" => {
            "replace: usage: repocutter replace /REGEXP/REPLACE/

Perform a regular expression search/replace on blob content. The first
character of the argument (normally /) is treated as the end delimiter
for the regular-expression and replacement parts. Stale content
checksums are removed, not recomputed.
"
        }
        "obscure" => {
            "obscure: usage: repocutter [-r SELECTION] obscure

Replace path segments and committer IDs with arbitrary but consistent
names in order to obscure them. The replacement algorithm is tuned to
make the replacements readily distinguishable by eyeball.
"
        }
        "renumber" => {
            "renumber: usage: repocutter renumber

Renumber all revisions, patching Node-copyfrom headers as required.
Any selection option is ignored. Takes no arguments. The -b option
can be used to set the base to renumber from, defaulting to 0.
"
        }
        "reduce" => {
            "reduce: usage: repocutter reduce INPUT-FILE

Strip revisions out of a dump so the only parts left are those likely
to be relevant to a conversion problem. A revision is interesting if
it either (a) contains any operation that is not a plain file
modification - any directory operation, or any add, or any delete, or
any copy, or any operation on properties - or (b) it is referenced by
a later copy operation. Any commit that is neither interesting nor
has interesting neighbors is dropped.

Because the 'interesting' status of a commit is not known for sure
until all future commits have been checked for copy operations, this
command requires a seekable input file. It cannot operate on standard
input. The reduced dump is emitted to standard output.
"
        }
        "see" => {
            "see: usage: repocutter [-r SELECTION] see

Render a very condensed report on the repository node structure, mainly
useful for examining strange and pathological repositories. File
content is ignored. You get one line per repository operation,
reporting the revision, operation type, file path, and the copy source
(if any). Directory paths are distinguished by a trailing slash. The
'copy' operation is really an 'add' with a directory source and
target; the display name is changed to make them easier to see.
"
        }
        "log" => {
            "log: usage: repocutter [-r SELECTION] log

Generate a log report, same format as the output of svn log on a
repository, to standard output.
"
        }
        "testify" => {
            "testify: usage: repocutter testify

Replace commit timestamps with a monotonically increasing clock tick
starting at the Unix epoch and advancing by 10 seconds per commit.
Replace all attributions with 'fred'. Discard the repository UUID.
Use this to neutralize procedurally-generated streams so they can be
compared.
"
        }
        "version" => "version: usage: repocutter version\n\nReport the repocutter version.\n",
        _ => return None,
    };
    Some(text)
}

fn open_source(infile: Option<&Path>) -> repocutter::Result<DumpfileSource<Box<dyn Read>>> {
    let reader: Box<dyn Read> = match infile {
        Some(path) => Box::new(
            File::open(path)
                .map_err(|err| DumpError::Usage(format!("input file open failed: {err}")))?,
        ),
        None => Box::new(io::stdin().lock()),
    };
    Ok(DumpfileSource::new(reader))
}

fn run(cli: Cli) -> repocutter::Result<()> {
    let selection = match cli.range.as_deref() {
        Some(spec) => SubversionRange::parse(spec)?,
        None => SubversionRange::all(),
    };
    let mut stdout = io::stdout().lock();
    match cli.command {
        Command::Version => {
            writeln!(stdout, "repocutter {}", env!("CARGO_PKG_VERSION"))?;
            Ok(())
        }
        Command::Help { topic } => match topic {
            None => {
                stdout.write_all(GENERAL_HELP.as_bytes())?;
                Ok(())
            }
            Some(topic) => match subcommand_help(&topic) {
                Some(text) => {
                    stdout.write_all(text.as_bytes())?;
                    Ok(())
                }
                None => Err(DumpError::Usage(format!("no such command {topic:?}"))),
            },
        },
        Command::Reduce { file } => {
            let handle = File::open(&file)
                .map_err(|err| DumpError::Usage(format!("can't open stream to reduce: {err}")))?;
            let mut source = DumpfileSource::new(handle);
            commands::reduce(&mut source, &mut stdout)
        }
        command => {
            let mut source = open_source(cli.infile.as_deref())?;
            match command {
                Command::Select => commands::select(&mut source, &mut stdout, &selection),
                Command::Deselect => commands::deselect(&mut source, &mut stdout, &selection),
                Command::Sift { patterns } => {
                    commands::sift(&mut source, &mut stdout, &selection, &patterns)
                }
                Command::Expunge { patterns } => {
                    commands::expunge(&mut source, &mut stdout, &selection, &patterns)
                }
                Command::Pathrename { from, to } => {
                    commands::pathrename(&mut source, &mut stdout, &selection, &from, &to)
                }
                Command::Pop => commands::pop(&mut source, &mut stdout, &selection),
                Command::Swap => commands::swap(&mut source, &mut stdout, &selection),
                Command::Propdel { propnames } => {
                    commands::propdel(&mut source, &mut stdout, &selection, &propnames)
                }
                Command::Propset { assignments } => {
                    commands::propset(&mut source, &mut stdout, &selection, &assignments)
                }
                Command::Proprename { renames } => {
                    commands::proprename(&mut source, &mut stdout, &selection, &renames)
                }
                Command::Setlog => {
                    let logpath = cli.logentries.ok_or_else(|| {
                        DumpError::Usage("setlog requires a log entries file".into())
                    })?;
                    commands::setlog(&mut source, &mut stdout, &selection, &logpath)
                }
                Command::Strip { patterns } => {
                    commands::strip(&mut source, &mut stdout, &selection, &patterns)
                }
                Command::Replace { transform } => {
                    commands::replace(&mut source, &mut stdout, &selection, &transform)
                }
                Command::Obscure => commands::obscure(&mut source, &mut stdout, &selection),
                Command::Renumber => commands::renumber(&mut source, &mut stdout, cli.base),
                Command::See => commands::see(&mut source, &mut stdout, &selection),
                Command::Log => commands::log(&mut source, &mut stdout, &selection),
                Command::Testify => commands::testify(&mut source, &mut stdout),
                Command::Version
                | Command::Help { .. }
                | Command::Reduce { .. } => Ok(()),
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let default_filter = if cli.debug {
        "repocutter=debug"
    } else if cli.quiet {
        "repocutter=error"
    } else {
        "repocutter=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();
    if let Err(err) = run(cli) {
        eprintln!("repocutter: {err}");
        process::exit(1);
    }
}
