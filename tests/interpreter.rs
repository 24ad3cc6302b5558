use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use pretty_assertions::assert_eq;

use rox::ast::{Expr, Stmt};
use rox::error::{LoxError, RuntimeError};
use rox::interpreter::{Interpreter, MAX_CALL_DEPTH};
use rox::parser::Parser;
use rox::reporter::Reporter;
use rox::resolver::Resolver;
use rox::scanner::scan;
use rox::Lox;

/// Print sink the test keeps a handle to.
#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn session() -> (Lox, SharedBuffer) {
    let buffer = SharedBuffer::default();
    (Lox::with_output(buffer.clone()), buffer)
}

/// Run a program that must succeed and return what it printed.
fn run(source: &str) -> String {
    let (mut lox, out) = session();

    if let Err(e) = lox.run(source) {
        panic!("{}: {:?}", e, lox.reporter().diagnostics());
    }

    out.contents()
}

/// Run a program that must fail at runtime; returns (printed, diagnostic).
fn run_failing(source: &str) -> (String, String) {
    let (mut lox, out) = session();

    match lox.run(source) {
        Err(LoxError::Runtime(_)) => {}
        other => panic!("expected runtime error, got {:?}", other),
    }

    assert!(lox.reporter().had_runtime_error());

    (out.contents(), lox.reporter().diagnostics()[0].clone())
}

#[test]
fn arithmetic_and_printing() {
    assert_eq!(
        run("print 1 + 2 * 3; print (1 + 2) * 3; print 10 / 4; print -3 - 1;"),
        "7\n9\n2.5\n-4\n"
    );
}

#[test]
fn plus_concatenates_strings() {
    assert_eq!(run("print \"foo\" + \"bar\";"), "foobar\n");
}

#[test]
fn plus_rejects_mixed_operands() {
    let (_, diagnostic) = run_failing("print \"a\" + 1;");

    assert_eq!(
        diagnostic,
        "[line 1] Error at '+': Operands must be two numbers or two strings."
    );
}

#[test]
fn comparison_requires_numbers() {
    let (_, diagnostic) = run_failing("print 1 < \"2\";");

    assert_eq!(diagnostic, "[line 1] Error at '<': Operands must be numbers.");
}

#[test]
fn unary_minus_requires_number() {
    let (_, diagnostic) = run_failing("print -\"x\";");

    assert_eq!(diagnostic, "[line 1] Error at '-': Operand must be a number.");
}

#[test]
fn division_by_zero_follows_ieee() {
    assert_eq!(run("print 1 / 0; print -1 / 0; print 0 / 0 == 0 / 0;"), "inf\n-inf\nfalse\n");
}

#[test]
fn truthiness() {
    assert_eq!(
        run("print !nil; print !false; print !0; print !\"\"; if (0) print \"zero\";"),
        "true\ntrue\nfalse\nfalse\nzero\n"
    );
}

#[test]
fn equality_has_no_coercion() {
    assert_eq!(
        run("print nil == nil; print nil == false; print 1 == \"1\"; print \"a\" == \"a\"; print 2 != 2;"),
        "true\nfalse\nfalse\ntrue\nfalse\n"
    );
}

#[test]
fn logical_operators_short_circuit() {
    let source = "
        var calls = 0;
        fun touch() { calls = calls + 1; return true; }
        print false and touch();
        print true or touch();
        print nil or \"fallback\";
        print 1 and 2;
        print calls;
    ";

    assert_eq!(run(source), "false\ntrue\nfallback\n2\n0\n");
}

#[test]
fn block_shadowing() {
    assert_eq!(run("var a = 1; { var a = 2; print a; } print a;"), "2\n1\n");
}

#[test]
fn for_loop_scope_ends_with_loop() {
    assert_eq!(run("for (var i = 0; i < 3; i = i + 1) print i;"), "0\n1\n2\n");

    let (out, diagnostic) = run_failing("for (var i = 0; i < 1; i = i + 1) {} print i;");

    assert_eq!(out, "");
    assert_eq!(diagnostic, "[line 1] Error at 'i': Undefined variable 'i'.");
}

#[test]
fn while_loop() {
    assert_eq!(run("var n = 3; while (n > 0) { print n; n = n - 1; }"), "3\n2\n1\n");
}

#[test]
fn recursion() {
    let source = "
        fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }
        print fib(15);
    ";

    assert_eq!(run(source), "610\n");
}

#[test]
fn counters_are_independent_closures() {
    let source = "
        fun makeCounter() {
            var count = 0;
            fun increment() { count = count + 1; return count; }
            return increment;
        }
        var a = makeCounter();
        var b = makeCounter();
        print a(); print a(); print a();
        print b();
    ";

    assert_eq!(run(source), "1\n2\n3\n1\n");
}

#[test]
fn closure_captures_declaration_scope_not_later_shadow() {
    let source = "
        var a = \"global\";
        {
            fun show() { print a; }
            show();
            var a = \"block\";
            show();
        }
    ";

    assert_eq!(run(source), "global\nglobal\n");
}

#[test]
fn functions_without_return_yield_nil() {
    assert_eq!(run("fun f() {} print f(); fun g() { return; } print g();"), "nil\nnil\n");
}

#[test]
fn return_unwinds_only_one_frame() {
    let source = "
        fun inner() { return 1; }
        fun outer() { var x = inner(); print \"after\"; return x + 1; }
        print outer();
    ";

    assert_eq!(run(source), "after\n2\n");
}

#[test]
fn return_exits_nested_loops() {
    let source = "
        fun find() {
            for (var i = 0; i < 10; i = i + 1) {
                var j = 0;
                while (true) { if (i * j == 6) return i + j; j = j + 1; if (j > i) return -1; }
            }
        }
        print find();
        fun scan() {
            var i = 0;
            while (true) { if (i == 3) return i; i = i + 1; }
        }
        print scan();
    ";

    assert_eq!(run(source), "-1\n3\n");
}

#[test]
fn calling_non_callable() {
    let (_, diagnostic) = run_failing("\"text\"();");

    assert_eq!(diagnostic, "[line 1] Error at ')': Can only call functions and classes.");
}

#[test]
fn arity_mismatch() {
    let (_, diagnostic) = run_failing("fun f(a, b) {} f(1);");

    assert_eq!(diagnostic, "[line 1] Error at ')': Expected 2 arguments but got 1.");
}

#[test]
fn arguments_evaluate_left_to_right() {
    let source = "
        fun show(x) { print x; return x; }
        fun three(a, b, c) {}
        three(show(1), show(2), show(3));
    ";

    assert_eq!(run(source), "1\n2\n3\n");
}

#[test]
fn runtime_error_aborts_rest_of_program() {
    let (out, diagnostic) = run_failing("print 1;\nprint undefined;\nprint 3;");

    assert_eq!(out, "1\n");
    assert_eq!(diagnostic, "[line 2] Error at 'undefined': Undefined variable 'undefined'.");
}

#[test]
fn static_errors_prevent_execution() {
    let (mut lox, out) = session();

    let result = lox.run("print 1;\nreturn 2;");

    assert!(matches!(result, Err(LoxError::Compile { count: 1 })));
    assert!(lox.reporter().had_error());
    assert_eq!(out.contents(), "");
}

#[test]
fn syntax_errors_prevent_execution() {
    let (mut lox, out) = session();

    assert!(matches!(lox.run("print 1; print ;"), Err(LoxError::Compile { .. })));
    assert_eq!(out.contents(), "");
}

#[test]
fn class_with_initializer_and_method() {
    let source = "
        class C { init(x) { this.x = x; } get() { return this.x; } }
        var c = C(5);
        print c.get();
    ";

    assert_eq!(run(source), "5\n");
}

#[test]
fn class_constructor_arity() {
    let prelude = "class C { init(x) { this.x = x; } }";

    let (_, diagnostic) = run_failing(&format!("{} C();", prelude));
    assert_eq!(diagnostic, "[line 1] Error at ')': Expected 1 arguments but got 0.");

    let (_, diagnostic) = run_failing(&format!("{} C(1, 2);", prelude));
    assert_eq!(diagnostic, "[line 1] Error at ')': Expected 1 arguments but got 2.");
}

#[test]
fn class_without_initializer_takes_no_arguments() {
    assert_eq!(run("class Box {} var b = Box(); b.v = 1; print b.v; print b; print Box;"), "1\nBox instance\nBox\n");
}

#[test]
fn fields_shadow_methods() {
    let source = "
        class C { m() { return \"method\"; } }
        var c = C();
        print c.m();
        c.m = \"field\";
        print c.m;
    ";

    assert_eq!(run(source), "method\nfield\n");
}

#[test]
fn bound_methods_remember_their_instance() {
    let source = "
        class Person {
            init(name) { this.name = name; }
            greet() { print \"hi \" + this.name; }
        }
        var greet = Person(\"ada\").greet;
        greet();
        print greet;
    ";

    assert_eq!(run(source), "hi ada\n<fn greet>\n");
}

#[test]
fn method_can_name_its_own_class() {
    let source = "
        class Node {
            init(depth) { this.depth = depth; }
            child() { return Node(this.depth + 1); }
        }
        print Node(0).child().child().depth;
    ";

    assert_eq!(run(source), "2\n");
}

#[test]
fn initializer_always_returns_instance() {
    let source = "
        class C {
            init(flag) { this.flag = flag; if (flag) return; this.late = true; }
        }
        var c = C(true);
        print c.flag;
        print c.init(false) == c;
        print c.late;
    ";

    assert_eq!(run(source), "true\ntrue\ntrue\n");
}

#[test]
fn undefined_property() {
    let (_, diagnostic) = run_failing("class C {} print C().missing;");

    assert_eq!(diagnostic, "[line 1] Error at 'missing': Undefined property 'missing'.");
}

#[test]
fn properties_need_instances() {
    let (_, diagnostic) = run_failing("var x = 1; print x.y;");
    assert_eq!(diagnostic, "[line 1] Error at 'y': Only instances have properties.");

    let (_, diagnostic) = run_failing("var x = 1; x.y = 2;");
    assert_eq!(diagnostic, "[line 1] Error at 'y': Only instances have fields.");
}

#[test]
fn callbacks_inside_methods_see_this() {
    let source = "
        class Thing {
            getCallback() {
                fun localFunction() { print this.label; }
                return localFunction;
            }
        }
        var t = Thing();
        t.label = \"thing\";
        t.getCallback()();
    ";

    assert_eq!(run(source), "thing\n");
}

#[test]
fn clock_is_a_native_number() {
    assert_eq!(
        run("var t = clock(); print t > 0; print clock;"),
        "true\n<native fn>\n"
    );
}

#[test]
fn globals_persist_across_runs() {
    let (mut lox, out) = session();

    lox.run("var count = 0; fun bump() { var step = 1; count = count + step; return count; }")
        .unwrap();
    lox.run("bump();").unwrap();
    lox.run("{ var local = bump(); print local; }").unwrap();

    assert_eq!(out.contents(), "2\n");
}

#[test]
fn errors_reset_between_runs() {
    let (mut lox, out) = session();

    assert!(lox.run("print ;").is_err());
    assert!(lox.reporter().had_error());

    lox.run("print 1;").unwrap();

    assert!(!lox.reporter().had_error());
    assert!(lox.reporter().diagnostics().is_empty());
    assert_eq!(out.contents(), "1\n");
}

#[test]
fn tampered_hop_count_is_a_desync() {
    let source = "{ var a = 1; { print a; } }";

    let mut reporter = Reporter::silent();
    let tokens = scan(source, &mut reporter);
    let statements = Parser::new(&tokens, &mut reporter).parse();
    let mut locals = Resolver::new(&mut reporter).resolve(&statements);

    assert!(!reporter.had_error());

    // The read of `a` is the only resolved expression.
    let (id, depth) = locals.iter().next().unwrap();
    assert_eq!(depth, 1);

    let mut interpreter = Interpreter::with_output(SharedBuffer::default());
    assert!(interpreter.interpret(&statements, locals.clone()).is_ok());

    locals.insert(id, depth + 1);

    let err = interpreter.interpret(&statements, locals).unwrap_err();

    assert!(matches!(
        err,
        RuntimeError::Desync { ref name, depth: 2, line: 1 } if name == "a"
    ));
}

#[test]
fn evaluate_single_expression() {
    let mut reporter = Reporter::silent();
    let tokens = scan("(1 + 2) * \"x\" == nil", &mut reporter);
    let expr = Parser::new(&tokens, &mut reporter).parse_expression().unwrap();

    assert!(matches!(expr, Expr::Binary { .. }));

    let err = Interpreter::with_output(SharedBuffer::default())
        .evaluate(&expr)
        .unwrap_err();

    assert_eq!(err.to_string(), "Operands must be numbers.");
}

#[test]
fn statements_run_in_order() {
    let mut reporter = Reporter::silent();
    let tokens = scan("var a = 1; a = a + 1; print a;", &mut reporter);
    let statements = Parser::new(&tokens, &mut reporter).parse();

    assert!(matches!(statements[1], Stmt::Expression(Expr::Assign { .. })));

    let buffer = SharedBuffer::default();
    let locals = Resolver::new(&mut reporter).resolve(&statements);
    Interpreter::with_output(buffer.clone())
        .interpret(&statements, locals)
        .unwrap();

    assert_eq!(buffer.contents(), "2\n");
}

#[test]
fn unbounded_recursion_is_a_runtime_error() {
    let (mut lox, out) = session();

    let result = lox.run("fun f(n) { return f(n + 1); }\nf(0);\nprint \"unreachable\";");

    assert!(matches!(result, Err(LoxError::Runtime(_))));
    assert_eq!(
        lox.reporter().diagnostics(),
        &["[line 1] Error at ')': Stack overflow.".to_string()]
    );
    assert_eq!(out.contents(), "");

    // The depth counter unwinds with the error.
    lox.run("fun g(n) { if (n == 0) return 0; return 1 + g(n - 1); } print g(10);")
        .unwrap();

    assert_eq!(out.contents(), "10\n");
}

#[test]
fn deep_recursion_below_the_limit_completes() {
    let source = format!(
        "fun f(n) {{ if (n == 0) return 0; return 1 + f(n - 1); }} print f({});",
        MAX_CALL_DEPTH - 1
    );

    assert_eq!(run(&source), format!("{}\n", MAX_CALL_DEPTH - 1));
}

#[test]
fn recursion_one_past_the_limit_fails() {
    let source = format!(
        "fun f(n) {{ if (n == 0) return 0; return 1 + f(n - 1); }} print f({});",
        MAX_CALL_DEPTH
    );

    let (out, diagnostic) = run_failing(&source);

    assert_eq!(out, "");
    assert_eq!(diagnostic, "[line 1] Error at ')': Stack overflow.");
}
