use pretty_assertions::assert_eq;

use rox::ast::{Expr, ExprId, Stmt};
use rox::parser::Parser;
use rox::reporter::Reporter;
use rox::resolver::{Locals, Resolver};
use rox::scanner::scan;

fn resolve(source: &str) -> (Vec<Stmt>, Locals, Reporter) {
    let mut reporter = Reporter::silent();
    let tokens = scan(source, &mut reporter);
    let statements = Parser::new(&tokens, &mut reporter).parse();
    assert!(!reporter.had_error(), "{:?}", reporter.diagnostics());

    let locals = Resolver::new(&mut reporter).resolve(&statements);
    (statements, locals, reporter)
}

fn errors(source: &str) -> Vec<String> {
    let (_, _, reporter) = resolve(source);
    reporter.diagnostics().to_vec()
}

/// Hop‑counts of every `Variable` read, in id order.
fn read_depths(locals: &Locals, statements: &[Stmt]) -> Vec<(String, Option<usize>)> {
    let mut reads: Vec<(ExprId, String)> = Vec::new();
    for stmt in statements {
        collect_reads(stmt, &mut reads);
    }
    reads.sort();
    reads
        .into_iter()
        .map(|(id, name)| (name, locals.get(id)))
        .collect()
}

fn collect_reads(stmt: &Stmt, out: &mut Vec<(ExprId, String)>) {
    match stmt {
        Stmt::Print(expr) | Stmt::Expression(expr) => collect_expr(expr, out),
        Stmt::Var {
            initializer: Some(expr),
            ..
        } => collect_expr(expr, out),
        Stmt::Block(statements) => statements.iter().for_each(|s| collect_reads(s, out)),
        Stmt::Function(decl) => decl.body.iter().for_each(|s| collect_reads(s, out)),
        Stmt::Return {
            value: Some(expr), ..
        } => collect_expr(expr, out),
        _ => {}
    }
}

fn collect_expr(expr: &Expr, out: &mut Vec<(ExprId, String)>) {
    match expr {
        Expr::Variable { id, name } => out.push((*id, name.lexeme.clone())),
        Expr::Binary { left, right, .. } => {
            collect_expr(left, out);
            collect_expr(right, out);
        }
        Expr::Call {
            callee, arguments, ..
        } => {
            collect_expr(callee, out);
            arguments.iter().for_each(|a| collect_expr(a, out));
        }
        _ => {}
    }
}

#[test]
fn globals_are_left_unresolved() {
    let (statements, locals, reporter) = resolve("var a = 1; print a;");

    assert!(!reporter.had_error());
    assert!(locals.is_empty());
    assert_eq!(read_depths(&locals, &statements), vec![("a".to_string(), None)]);
}

#[test]
fn block_locals_count_hops_outward() {
    let (statements, locals, _) = resolve("{ var a = 1; { var b = 2; print a + b; } }");

    assert_eq!(
        read_depths(&locals, &statements),
        vec![("a".to_string(), Some(1)), ("b".to_string(), Some(0))]
    );
}

#[test]
fn function_body_sits_one_scope_inside_parameters() {
    let (statements, locals, _) = resolve("fun f(x) { var y = 1; print x + y; }");

    assert_eq!(
        read_depths(&locals, &statements),
        vec![("x".to_string(), Some(1)), ("y".to_string(), Some(0))]
    );
}

#[test]
fn closure_reads_reach_enclosing_function() {
    let source = "fun outer() { var n = 0; fun inner() { return n; } return inner; }";
    let (statements, locals, _) = resolve(source);

    // `n` inside inner: body(0) → params(1) → outer body(2)
    assert_eq!(
        read_depths(&locals, &statements),
        vec![("n".to_string(), Some(2)), ("inner".to_string(), Some(0))]
    );
}

#[test]
fn reading_local_in_own_initializer() {
    assert_eq!(
        errors("{ var a = 1; { var a = a; } }"),
        vec!["[line 1] Error at 'a': Can't read local variable in its own initializer.".to_string()]
    );
}

#[test]
fn global_self_reference_is_allowed() {
    assert!(errors("var a = 1; var a = a;").is_empty());
}

#[test]
fn duplicate_local_declaration() {
    assert_eq!(
        errors("{ var a = 1; var a = 2; }"),
        vec!["[line 1] Error at 'a': Already a variable with this name in this scope.".to_string()]
    );
}

#[test]
fn duplicate_parameters() {
    assert_eq!(
        errors("fun f(a, a) {}"),
        vec!["[line 1] Error at 'a': Already a variable with this name in this scope.".to_string()]
    );
}

#[test]
fn body_may_shadow_parameter() {
    assert!(errors("fun f(a) { var a = 2; }").is_empty());
}

#[test]
fn return_outside_function() {
    assert_eq!(
        errors("return 1;"),
        vec!["[line 1] Error at 'return': Can't return from top-level code.".to_string()]
    );
}

#[test]
fn value_return_from_initializer() {
    assert_eq!(
        errors("class C { init() { return 1; } }"),
        vec!["[line 1] Error at 'return': Can't return a value from an initializer.".to_string()]
    );
}

#[test]
fn bare_return_from_initializer_is_fine() {
    assert!(errors("class C { init() { return; } }").is_empty());
}

#[test]
fn this_outside_class() {
    assert_eq!(
        errors("print this;\nfun f() { return this; }"),
        vec![
            "[line 1] Error at 'this': Can't use 'this' outside of a class.".to_string(),
            "[line 2] Error at 'this': Can't use 'this' outside of a class.".to_string(),
        ]
    );
}

#[test]
fn errors_accumulate_across_program() {
    let found = errors("return;\n{ var a = 1; var a = 2; }\nprint this;");

    assert_eq!(found.len(), 3);
    assert!(found[0].starts_with("[line 1]"));
    assert!(found[1].starts_with("[line 2]"));
    assert!(found[2].starts_with("[line 3]"));
}
