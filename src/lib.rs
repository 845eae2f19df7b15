//! This is a preprocessor for markdown prompt and command templates. It runs the shell commands embedded in a document and rewrites the document with their captured output inlined, and it derives an `allowed-tools:` declaration for the document's frontmatter from the programs those commands invoke.
//!
//! # Getting started
//!
//! ```sh
//! cargo install context-composer
//! ```
//!
//! # How to
//!
//! Embed a command with `!` followed by a backtick-delimited span:
//!
//! ```markdown
//! # Project status
//!
//! !`git status --short`
//!
//! Files in this directory: !`ls | wc -l`
//! ```
//!
//! Running `context-composer file.md` executes each command in document
//! order and produces:
//!
//! ```markdown
//! ---
//! allowed-tools: Bash(git:*), Bash(ls:*), Bash(wc:*)
//! ---
//! # Project status
//!
//! <Command>
//!   ▶ git status --short
//!   M src/lib.rs
//! </Command>
//!
//! Files in this directory:
//! <Command>
//!   ▶ ls | wc -l
//!   14
//! </Command>
//! ```
//!
//! # Details
//!
//! When the pattern `` !`command` `` is encountered, the command is written
//! to a temporary script and run using `bash` with the caller's working
//! directory; stdout and stderr are both captured and inlined. A command
//! sharing its line with prose keeps that prose on its own line, with the
//! output block inserted on adjacent lines. A command that exits non-zero
//! aborts the whole run: no partially substituted document is ever written.
//!
//! The `allowed-tools:` line lists every distinct program name the embedded
//! commands invoke, one `Bash(<name>:*)` entry per program, in lexicographic
//! order. It replaces an existing `allowed-tools:` line, or is inserted
//! into the frontmatter block (created at the top of the document when
//! absent).
//!
//! Tag casing (`<Command>` vs `<command>`) and block indentation are
//! selectable on the command line with `--tag-case` and `--indent`, or in
//! an optional `context-composer.toml`:
//!
//! ```toml
//! tag_case = "kebab"
//! indent_spaces = 2
//! ```
pub mod composer;
pub mod error;
pub mod executor;
pub mod frontmatter;
pub mod shell;
mod utils;

pub use composer::{load_config, Composer, ComposerConfig, Directive, TagCase};
pub use error::ComposeError;
pub use executor::CommandResult;
