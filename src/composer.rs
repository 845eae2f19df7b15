//! The embedded-command substitution pass.
//!
//! A directive is `!` immediately followed by a backtick-delimited span,
//! e.g. `` !`ls -la` ``. Every directive in a document is executed in
//! document order and replaced by its formatted output block; prose sharing
//! a line with a directive is preserved on its own line.

use std::fs;
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::error::{ComposeError, Result};
use crate::executor::{execute_command_with_limit, format_command_output, MAX_COMMAND_OUTPUT_BYTES};

lazy_static! {
    static ref EMBEDDED_COMMAND: Regex = Regex::new(r"!`([^`]+)`")
        .expect("Failed to init regex for finding embedded command pattern");
}

const CONFIG_FILE: &str = "context-composer.toml";

/// Casing convention for the generated wrapper tags.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TagCase {
    /// `<Command>`
    #[default]
    Pascal,
    /// `<command>`
    Kebab,
}

#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct ComposerConfig {
    #[serde(default)]
    pub tag_case: TagCase,
    #[serde(default)]
    pub indent_spaces: Option<usize>,
    #[serde(default)]
    pub max_output_bytes: Option<usize>,
}

impl ComposerConfig {
    pub fn create_composer(&self) -> Composer {
        Composer {
            tag_case: self.tag_case,
            indent_spaces: self.indent_spaces.unwrap_or(0),
            max_output_bytes: self.max_output_bytes.unwrap_or(MAX_COMMAND_OUTPUT_BYTES),
        }
    }
}

/// Read the optional project config file, falling back to defaults when it
/// is missing or malformed.
pub fn load_config() -> ComposerConfig {
    fs::read_to_string(Path::new(CONFIG_FILE))
        .map_err(|_| None::<String>)
        .and_then(|fc| toml::from_str::<ComposerConfig>(fc.as_str()).map_err(|_| None))
        .unwrap_or_default()
}

pub struct Composer {
    pub tag_case: TagCase,
    pub indent_spaces: usize,
    pub max_output_bytes: usize,
}

impl Default for Composer {
    fn default() -> Self {
        ComposerConfig::default().create_composer()
    }
}

/// One directive occurrence located in the original, unmodified text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Shell source between the backtick delimiters.
    pub command: String,
    /// Byte offset of the `!` in the original text.
    pub start: usize,
    /// Byte length of the whole directive span.
    pub len: usize,
}

/// Locate every embedded command directive in `content`, in ascending
/// offset order.
pub fn find_directives(content: &str) -> Vec<Directive> {
    EMBEDDED_COMMAND
        .captures_iter(content)
        .map(|caps| {
            let whole = caps.get(0).expect("regex match has a full capture");
            Directive {
                command: caps[1].to_string(),
                start: whole.start(),
                len: whole.as_str().len(),
            }
        })
        .collect()
}

/// The text bracketing one directive in the current working copy.
struct TextContext<'a> {
    before_match: &'a str,
    after_match: &'a str,
    text_before_on_same_line: &'a str,
    text_after_on_same_line: &'a str,
    last_newline_before: Option<usize>,
    first_newline_after: Option<usize>,
}

fn surrounding_context(content: &str, match_index: usize, match_len: usize) -> TextContext<'_> {
    let before_match = &content[..match_index];
    let after_match = &content[match_index + match_len..];

    let last_newline_before = before_match.rfind('\n');
    let text_before_on_same_line = match last_newline_before {
        Some(index) => &before_match[index + 1..],
        None => before_match,
    };

    let first_newline_after = after_match.find('\n');
    let text_after_on_same_line = match first_newline_after {
        Some(index) => &after_match[..index],
        None => after_match,
    };

    TextContext {
        before_match,
        after_match,
        text_before_on_same_line,
        text_after_on_same_line,
        last_newline_before,
        first_newline_after,
    }
}

fn build_replacement(formatted: &str, has_text_before: bool, has_text_after: bool) -> String {
    let mut replacement = if has_text_before {
        format!("\n{}", formatted)
    } else {
        formatted.to_string()
    };
    if has_text_after {
        replacement.push('\n');
    }
    replacement
}

// Same-line prose survives on its own line; whitespace-only line remainders
// are dropped with the directive.
fn splice_replacement(context: &TextContext<'_>, replacement: &str) -> String {
    let kept_prefix = match context.last_newline_before {
        Some(index) => &context.before_match[..=index],
        None => "",
    };
    let kept_before_line = if context.text_before_on_same_line.trim().is_empty() {
        ""
    } else {
        context.text_before_on_same_line
    };
    let kept_after_line = if context.text_after_on_same_line.trim().is_empty() {
        ""
    } else {
        context.text_after_on_same_line
    };
    let rest = match context.first_newline_after {
        Some(index) => &context.after_match[index..],
        None => "",
    };

    format!("{}{}{}{}{}", kept_prefix, kept_before_line, replacement, kept_after_line, rest)
}

impl Composer {
    /// Replace every embedded command directive in `content` with its
    /// executed, formatted output.
    ///
    /// The directive list is fixed by a single scan of the original text;
    /// directives then execute strictly in that order, one child process at
    /// a time, while a running offset correction locates each one inside
    /// the already-edited text. The first non-zero exit status aborts the
    /// whole pass and nothing of the partially-edited result is surfaced.
    pub fn replace_embedded_commands(&self, content: &str) -> Result<String> {
        let directives = find_directives(content);

        if directives.is_empty() {
            return Ok(content.to_string());
        }

        let mut result = content.to_string();
        let mut offset: isize = 0;

        for directive in &directives {
            let command_result =
                execute_command_with_limit(&directive.command, self.max_output_bytes)?;

            if command_result.exit_code != 0 {
                return Err(ComposeError::CommandFailed {
                    command: directive.command.clone(),
                    exit_code: command_result.exit_code,
                    output: format!("{}{}", command_result.stdout, command_result.stderr),
                });
            }

            let formatted = format_command_output(
                &directive.command,
                &command_result,
                self.tag_case,
                self.indent_spaces,
            );

            let corrected_index = (directive.start as isize + offset) as usize;
            let context = surrounding_context(&result, corrected_index, directive.len);

            let has_text_before = !context.text_before_on_same_line.trim().is_empty();
            let has_text_after = !context.text_after_on_same_line.trim().is_empty();
            let text_before_len = context.text_before_on_same_line.len();

            let replacement = build_replacement(&formatted, has_text_before, has_text_after);
            let spliced = splice_replacement(&context, &replacement);

            offset += replacement.len() as isize - directive.len as isize;
            if !has_text_before {
                // The whitespace-only line prefix was dropped with the
                // directive, so later offsets shift by its length too.
                offset -= text_before_len as isize;
            }
            result = spliced;
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_deserialize_config() {
        let expected = ComposerConfig {
            tag_case: TagCase::Kebab,
            indent_spaces: Some(4),
            max_output_bytes: None,
        };
        let toml_config = r#"
        tag_case = "kebab"
        indent_spaces = 4
        "#;
        let config: ComposerConfig = toml::from_str(toml_config).unwrap();
        assert_eq!(config, expected);
    }

    #[test]
    fn default_composer_uses_pascal_and_no_indent() {
        let composer = Composer::default();
        assert_eq!(composer.tag_case, TagCase::Pascal);
        assert_eq!(composer.indent_spaces, 0);
        assert_eq!(composer.max_output_bytes, MAX_COMMAND_OUTPUT_BYTES);
    }

    #[test]
    fn finds_directives_in_document_order() {
        let directives = find_directives("a !`first` b\n!`second`\n");
        assert_eq!(
            directives,
            vec![
                Directive {
                    command: "first".to_string(),
                    start: 2,
                    len: 8,
                },
                Directive {
                    command: "second".to_string(),
                    start: 13,
                    len: 9,
                },
            ]
        );
    }

    #[test]
    fn directive_must_not_contain_backticks() {
        assert_eq!(find_directives("!`a ` b`"), find_directives("!`a `"));
        assert!(find_directives("!``").is_empty());
    }

    #[test]
    fn context_splits_shared_line() {
        let content = "Run this: !`pwd` now\nnext";
        let context = surrounding_context(content, 10, 6);
        assert_eq!(context.text_before_on_same_line, "Run this: ");
        assert_eq!(context.text_after_on_same_line, " now");
        assert_eq!(context.last_newline_before, None);
        assert_eq!(context.first_newline_after, Some(4));
    }

    #[test]
    fn splice_replaces_a_whole_line() {
        let content = "before\n!`x`\nafter";
        let context = surrounding_context(content, 7, 4);
        let spliced = splice_replacement(&context, "BLOCK");
        assert_eq!(spliced, "before\nBLOCK\nafter");
    }

    #[test]
    fn splice_keeps_shared_line_prose() {
        let content = "intro !`x` outro\nrest";
        let context = surrounding_context(content, 6, 4);
        let replacement = build_replacement("BLOCK", true, true);
        let spliced = splice_replacement(&context, &replacement);
        assert_eq!(spliced, "intro \nBLOCK\n outro\nrest");
    }

    #[test]
    fn splice_drops_whitespace_only_line_remainders() {
        let content = "  !`x`  \nrest";
        let context = surrounding_context(content, 2, 4);
        let replacement = build_replacement("BLOCK", false, false);
        let spliced = splice_replacement(&context, &replacement);
        assert_eq!(spliced, "BLOCK\nrest");
    }
}
