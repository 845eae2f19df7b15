//! Frontmatter handling and the derived `allowed-tools:` declaration.
//!
//! The metadata block is the leading section delimited by `---` marker
//! lines; it is only recognized when it starts at the very first byte of
//! the document. Lines inside it are raw `key: value` text and keep their
//! order, except for the injected or replaced allow-list line.

use std::collections::BTreeSet;

use lazy_static::lazy_static;
use regex::Regex;

use crate::composer::find_directives;
use crate::shell::extract_command_names;

lazy_static! {
    static ref FRONTMATTER: Regex = Regex::new(r"(?s)\A---\n(.*?)\n---\n")
        .expect("Failed to init regex for finding frontmatter block");
}

const ALLOWED_TOOLS_KEY: &str = "allowed-tools:";
const DESCRIPTION_KEY: &str = "description:";

/// Every distinct program name invoked by the embedded directives in
/// `content`, in lexicographic order.
pub fn extract_embedded_commands(content: &str) -> Vec<String> {
    let mut names = BTreeSet::new();
    for directive in find_directives(content) {
        for name in extract_command_names(&directive.command) {
            names.insert(name);
        }
    }
    names.into_iter().collect()
}

/// Split `content` into its leading frontmatter block (the text between the
/// marker lines) and the remaining body.
pub fn extract_frontmatter(content: &str) -> (Option<&str>, &str) {
    match FRONTMATTER.captures(content) {
        Some(caps) => {
            let whole = caps.get(0).expect("regex match has a full capture");
            let inner = caps.get(1).expect("frontmatter regex has one group");
            (Some(inner.as_str()), &content[whole.end()..])
        }
        None => (None, content),
    }
}

fn format_allowed_tools(commands: &[String]) -> String {
    let tools: Vec<String> = commands
        .iter()
        .map(|command| format!("Bash({}:*)", command))
        .collect();
    format!("{} {}", ALLOWED_TOOLS_KEY, tools.join(", "))
}

// Replace an existing declaration in place; otherwise insert after the
// description line if present, else at the top of the block.
fn insert_allowed_tools_line(lines: &mut Vec<String>, allowed_tools_line: String) {
    if let Some(existing) = lines
        .iter_mut()
        .find(|line| line.starts_with(ALLOWED_TOOLS_KEY))
    {
        *existing = allowed_tools_line;
        return;
    }

    let position = lines
        .iter()
        .position(|line| line.starts_with(DESCRIPTION_KEY))
        .map(|index| index + 1)
        .unwrap_or(0);
    lines.insert(position, allowed_tools_line);
}

/// Derive the allow-list declaration from the embedded directives in
/// `content` and inject it into the document's frontmatter block, creating
/// the block when absent. A document with no directives is returned
/// unchanged.
pub fn inject_allowed_tools(content: &str) -> String {
    let commands = extract_embedded_commands(content);
    if commands.is_empty() {
        return content.to_string();
    }

    let allowed_tools_line = format_allowed_tools(&commands);
    let (frontmatter, body) = extract_frontmatter(content);

    match frontmatter {
        None => format!("---\n{}\n---\n{}", allowed_tools_line, content),
        Some(block) => {
            let mut lines: Vec<String> = block.split('\n').map(String::from).collect();
            insert_allowed_tools_line(&mut lines, allowed_tools_line);
            format!("---\n{}\n---\n{}", lines.join("\n"), body)
        }
    }
}
