//! Extraction of the program names a shell command invokes.
//!
//! The extractor parses real shell grammar and walks the resulting syntax
//! tree, so pipelines, `&&`/`||` chains, loops, conditionals, subshells and
//! function bodies all contribute their command heads. Extraction is
//! best-effort metadata, not a correctness gate: a string that does not
//! parse as shell yields an empty list.

use std::collections::BTreeSet;
use std::io::Cursor;

use brush_parser::ast;
use brush_parser::{Parser, ParserOptions, SourceInfo};
use tracing::debug;

/// Collect the literal program names invoked anywhere in `command`,
/// deduplicated and in lexicographic order.
pub fn extract_command_names(command: &str) -> Vec<String> {
    let input = format!("{}\n", command);
    let cursor = Cursor::new(input);

    let options = ParserOptions::default();
    let source_info = SourceInfo::default();
    let mut parser = Parser::new(cursor, &options, &source_info);

    let program = match parser.parse_program() {
        Ok(program) => program,
        Err(err) => {
            debug!("skipping name extraction for unparseable command: {:?}", err);
            return Vec::new();
        }
    };

    let mut names = BTreeSet::new();
    for list in &program.complete_commands {
        collect_compound_list(list, &mut names);
    }
    names.into_iter().collect()
}

fn collect_compound_list(list: &ast::CompoundList, names: &mut BTreeSet<String>) {
    for item in &list.0 {
        collect_and_or_list(&item.0, names);
    }
}

fn collect_and_or_list(list: &ast::AndOrList, names: &mut BTreeSet<String>) {
    collect_pipeline(&list.first, names);
    for next in &list.additional {
        match next {
            ast::AndOr::And(pipeline) | ast::AndOr::Or(pipeline) => {
                collect_pipeline(pipeline, names);
            }
        }
    }
}

fn collect_pipeline(pipeline: &ast::Pipeline, names: &mut BTreeSet<String>) {
    for command in &pipeline.seq {
        collect_command(command, names);
    }
}

fn collect_command(command: &ast::Command, names: &mut BTreeSet<String>) {
    match command {
        ast::Command::Simple(simple) => collect_simple_command(simple, names),
        ast::Command::Compound(compound, _redirects) => {
            collect_compound_command(compound, names);
        }
        // The function name is a definition, not an invocation; only the
        // commands inside the body count.
        ast::Command::Function(func) => collect_compound_command(&func.body.0, names),
        ast::Command::ExtendedTest(_) => {}
    }
}

fn collect_simple_command(command: &ast::SimpleCommand, names: &mut BTreeSet<String>) {
    if let Some(word) = &command.word_or_name {
        names.insert(format!("{}", word));
        return;
    }
    // A command word can end up in prefix position when it follows
    // assignments or redirects; the first plain word is still the name.
    if let Some(prefix) = &command.prefix {
        for item in &prefix.0 {
            if let ast::CommandPrefixOrSuffixItem::Word(word) = item {
                names.insert(format!("{}", word));
                return;
            }
        }
    }
}

fn collect_compound_command(command: &ast::CompoundCommand, names: &mut BTreeSet<String>) {
    match command {
        ast::CompoundCommand::BraceGroup(group) => collect_compound_list(&group.list, names),
        ast::CompoundCommand::Subshell(subshell) => collect_compound_list(&subshell.list, names),
        ast::CompoundCommand::ForClause(for_clause) => {
            collect_compound_list(&for_clause.body.list, names);
        }
        ast::CompoundCommand::WhileClause(clause) | ast::CompoundCommand::UntilClause(clause) => {
            collect_compound_list(&clause.0, names);
            collect_compound_list(&clause.1.list, names);
        }
        ast::CompoundCommand::IfClause(if_clause) => {
            collect_compound_list(&if_clause.condition, names);
            collect_compound_list(&if_clause.then, names);
            if let Some(elses) = &if_clause.elses {
                for else_clause in elses {
                    if let Some(condition) = &else_clause.condition {
                        collect_compound_list(condition, names);
                    }
                    collect_compound_list(&else_clause.body, names);
                }
            }
        }
        ast::CompoundCommand::CaseClause(case_clause) => {
            for case in &case_clause.cases {
                if let Some(cmd) = &case.cmd {
                    collect_compound_list(cmd, names);
                }
            }
        }
        ast::CompoundCommand::Arithmetic(_) => {}
        ast::CompoundCommand::ArithmeticForClause(for_clause) => {
            collect_compound_list(&for_clause.body.list, names);
        }
    }
}
