//! P1 — `TypeCollector`: registers every user class into a fresh
//! [`Context`], rejects duplicate/reserved names, detects cyclic
//! heritage, and orders [`ast::Program::classes`] so parents always
//! precede children.

use cool_ast::ast::{self, ClassDecl};
use cool_common::diagnostics::messages;
use cool_common::Diagnostic;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::types::{Context, DefineError, BUILT_IN_NAMES};

/// Runs P1 over `program`, mutating it in place (duplicate classes are
/// renamed, cyclic parents are severed) and returns the freshly seeded
/// context.
pub fn collect(program: &mut ast::Program, errors: &mut Vec<Diagnostic>) -> Context {
    let mut ctx = Context::new();

    for class in program.classes.iter_mut() {
        register_class(&mut ctx, class, errors);
    }

    sever_cycles_and_order(program, errors);

    ctx
}

fn register_class(ctx: &mut Context, class: &mut ClassDecl, errors: &mut Vec<Diagnostic>) {
    let original = class.name.lexeme.clone();

    if BUILT_IN_NAMES.contains(&original.as_str()) {
        errors.push(Diagnostic::error(
            messages::invalid_class_name(&original),
            class.name.span,
        ));
    } else {
        match ctx.create_type(&original) {
            Ok(_) => return,
            Err(DefineError::Duplicate) => {
                errors.push(Diagnostic::error(messages::class_already_defined(&original), class.name.span));
            }
        }
    }

    loop {
        class.name.lexeme = format!("1{}", class.name.lexeme);
        if BUILT_IN_NAMES.contains(&class.name.lexeme.as_str()) {
            continue;
        }
        if ctx.create_type(&class.name.lexeme).is_ok() {
            debug!(renamed = %class.name.lexeme, "resolved duplicate class name");
            break;
        }
    }
}

/// Builds a declared-parent map over the (possibly renamed) user
/// classes, severs any cyclic links by clearing the offending classes'
/// `parent` field (COOL defaults an unparented class to `Object`), and
/// finally sorts `program.classes` so that every class comes after its
/// parent.
fn sever_cycles_and_order(program: &mut ast::Program, errors: &mut Vec<Diagnostic>) {
    let parent_of: FxHashMap<String, Option<String>> = program
        .classes
        .iter()
        .map(|c| (c.name.lexeme.clone(), c.parent.as_ref().map(|t| t.lexeme.clone())))
        .collect();

    let cycle_members = detect_cycle_members(&parent_of);

    if !cycle_members.is_empty() {
        let first = program
            .classes
            .iter()
            .find(|c| cycle_members.contains(&c.name.lexeme))
            .expect("cycle_members only names classes present in program.classes");
        let span = first
            .parent
            .as_ref()
            .map(|t| t.span)
            .unwrap_or(first.name.span);
        errors.push(Diagnostic::error(messages::cyclic_heritage(), span));

        for class in program.classes.iter_mut() {
            if cycle_members.contains(&class.name.lexeme) {
                class.parent = None;
            }
        }
    }

    let parent_of: FxHashMap<String, Option<String>> = program
        .classes
        .iter()
        .map(|c| (c.name.lexeme.clone(), c.parent.as_ref().map(|t| t.lexeme.clone())))
        .collect();

    let mut levels: FxHashMap<String, usize> = FxHashMap::default();
    for class in &program.classes {
        level_of(&class.name.lexeme, &parent_of, &mut levels);
    }
    program
        .classes
        .sort_by_key(|c| *levels.get(&c.name.lexeme).unwrap_or(&1));
}

fn level_of(name: &str, parent_of: &FxHashMap<String, Option<String>>, levels: &mut FxHashMap<String, usize>) -> usize {
    if let Some(&lvl) = levels.get(name) {
        return lvl;
    }
    let lvl = match parent_of.get(name) {
        Some(Some(parent_name)) if parent_of.contains_key(parent_name) => {
            1 + level_of(parent_name, parent_of, levels)
        }
        // No declared parent, or the parent is a built-in / unresolved
        // name: either way this class sits directly under `Object`.
        _ => 1,
    };
    levels.insert(name.to_string(), lvl);
    lvl
}

/// Classic cycle detection over a "one outgoing edge per node" graph
/// (every class has at most one parent): walk each unvisited chain,
/// remembering positions; closing a loop back onto the current walk
/// marks every node from that point on as a cycle member.
fn detect_cycle_members(parent_of: &FxHashMap<String, Option<String>>) -> FxHashSet<String> {
    let mut done: FxHashSet<String> = FxHashSet::default();
    let mut cycle_members: FxHashSet<String> = FxHashSet::default();

    for start in parent_of.keys() {
        if done.contains(start) {
            continue;
        }
        let mut path: Vec<String> = Vec::new();
        let mut index_in_path: FxHashMap<String, usize> = FxHashMap::default();
        let mut cur = start.clone();
        loop {
            if done.contains(&cur) {
                break;
            }
            if let Some(&idx) = index_in_path.get(&cur) {
                for member in &path[idx..] {
                    cycle_members.insert(member.clone());
                }
                break;
            }
            index_in_path.insert(cur.clone(), path.len());
            path.push(cur.clone());
            match parent_of.get(&cur) {
                Some(Some(parent_name)) if parent_of.contains_key(parent_name) => {
                    cur = parent_name.clone();
                }
                _ => break,
            }
        }
        for member in path {
            done.insert(member);
        }
    }

    cycle_members
}

#[cfg(test)]
mod tests {
    use super::*;
    use cool_ast::builder::*;

    fn class_names(program: &ast::Program) -> Vec<&str> {
        program.classes.iter().map(|c| c.name.lexeme.as_str()).collect()
    }

    #[test]
    fn parents_sort_before_children() {
        let mut program = program(vec![
            class("C", Some("B"), vec![]),
            class("B", Some("A"), vec![]),
            class("A", None, vec![]),
        ]);
        let mut errors = Vec::new();
        collect(&mut program, &mut errors);
        assert!(errors.is_empty());
        assert_eq!(class_names(&program), vec!["A", "B", "C"]);
    }

    #[test]
    fn duplicate_class_is_renamed_and_reported() {
        let mut program = program(vec![class("A", None, vec![]), class("A", None, vec![])]);
        let mut errors = Vec::new();
        let ctx = collect(&mut program, &mut errors);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, messages::class_already_defined("A"));
        assert!(ctx.get_type_id("A").is_some());
        assert!(ctx.get_type_id("1A").is_some());
    }

    #[test]
    fn builtin_name_is_rejected_and_renamed() {
        let mut program = program(vec![class("Int", None, vec![])]);
        let mut errors = Vec::new();
        let ctx = collect(&mut program, &mut errors);
        assert_eq!(errors.len(), 1);
        assert!(ctx.get_type_id("1Int").is_some());
    }

    #[test]
    fn two_cycle_is_severed_with_one_error() {
        let mut program = program(vec![class("A", Some("B"), vec![]), class("B", Some("A"), vec![])]);
        let mut errors = Vec::new();
        collect(&mut program, &mut errors);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, messages::cyclic_heritage());
        assert!(program.classes.iter().all(|c| c.parent.is_none()));
    }
}
