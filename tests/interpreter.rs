mod common;

#[cfg(test)]
mod interpreter_tests {
    use pretty_assertions::assert_eq;
    use rox as lox;

    use lox::lox::Status;
    use lox::value::Value;

    use crate::common::{error_messages, output_of, run, session};

    fn runtime_error(source: &str) -> String {
        let (_, outcome) = run(source);

        assert_eq!(outcome.status, Status::RuntimeError);
        assert_eq!(outcome.exit_code(), 70);

        let mut messages = error_messages(&outcome);
        assert_eq!(messages.len(), 1);
        messages.remove(0)
    }

    // ───────────────────────── expressions ─────────────────────────

    #[test]
    fn test_arithmetic_and_printing() {
        assert_eq!(output_of("print 1 + 2 * 3;"), "7\n");
        assert_eq!(output_of("print (1 + 2) * 3 / 2;"), "4.5\n");
        assert_eq!(output_of("print -(3 - 5);"), "2\n");
        assert_eq!(output_of("print 10 / 4;"), "2.5\n");
    }

    #[test]
    fn test_strings_concatenate() {
        assert_eq!(output_of("print \"foo\" + \"bar\";"), "foobar\n");
        assert_eq!(output_of("print \"1\" + \"2\";"), "12\n");
    }

    #[test]
    fn test_comparison_and_equality() {
        let source = r#"
            print 1 < 2;
            print 2 <= 1;
            print 1 == 1;
            print "a" == "a";
            print nil == false;
            print 1 == "1";
            print nil == nil;
            print 3 != 4;
        "#;

        assert_eq!(
            output_of(source),
            "true\nfalse\ntrue\ntrue\nfalse\nfalse\ntrue\ntrue\n"
        );
    }

    #[test]
    fn test_truthiness() {
        let source = r#"
            if (0) print "zero is truthy";
            if ("") print "empty string is truthy";
            if (nil) print "unreachable"; else print "nil is falsy";
            print !false;
            print !!nil;
        "#;

        assert_eq!(
            output_of(source),
            "zero is truthy\nempty string is truthy\nnil is falsy\ntrue\nfalse\n"
        );
    }

    #[test]
    fn test_logical_operators_return_operands() {
        let source = r#"
            print "hi" or 2;
            print nil or "yes";
            print nil and crash();
            print 1 and 2;
        "#;

        assert_eq!(output_of(source), "hi\nyes\nnil\n2\n");
    }

    #[test]
    fn test_division_by_zero_follows_ieee() {
        assert_eq!(output_of("print 1 / 0;"), "inf\n");
        assert_eq!(output_of("print -1 / 0;"), "-inf\n");
    }

    // ───────────────────────── statements ──────────────────────────

    #[test]
    fn test_blocks_shadow_and_restore() {
        let source = r#"
            var a = "global a";
            var b = "global b";
            {
                var a = "outer a";
                {
                    var a = "inner a";
                    print a;
                    print b;
                }
                print a;
            }
            print a;
        "#;

        assert_eq!(
            output_of(source),
            "inner a\nglobal b\nouter a\nglobal a\n"
        );
    }

    #[test]
    fn test_uninitialized_variable_is_nil() {
        assert_eq!(output_of("var a; print a;"), "nil\n");
    }

    #[test]
    fn test_while_and_for_loops() {
        let source = r#"
            var i = 0;
            while (i < 3) { print i; i = i + 1; }
            for (var j = 0; j < 2; j = j + 1) print j * 10;
        "#;

        assert_eq!(output_of(source), "0\n1\n2\n0\n10\n");
    }

    #[test]
    fn test_fibonacci_with_for() {
        let source = r#"
            var a = 0;
            var temp;
            for (var b = 1; a < 100; b = temp + b) {
                print a;
                temp = a;
                a = b;
            }
        "#;

        assert_eq!(
            output_of(source),
            "0\n1\n1\n2\n3\n5\n8\n13\n21\n34\n55\n89\n"
        );
    }

    // ───────────────────────── functions ───────────────────────────

    #[test]
    fn test_recursion_and_return() {
        let source = r#"
            fun fib(n) {
                if (n < 2) return n;
                return fib(n - 1) + fib(n - 2);
            }
            print fib(15);
        "#;

        assert_eq!(output_of(source), "610\n");
    }

    #[test]
    fn test_return_unwinds_out_of_loops() {
        let source = r#"
            fun find() {
                var i = 0;
                while (true) {
                    if (i == 4) return i;
                    i = i + 1;
                }
            }
            print find();
        "#;
        assert_eq!(output_of(source), "4\n");
    }

    #[test]
    fn test_function_without_return_yields_nil() {
        assert_eq!(output_of("fun f() {} print f();"), "nil\n");
    }

    #[test]
    fn test_closures_make_independent_counters() {
        let source = r#"
            fun makeCounter() {
                var i = 0;
                fun count() {
                    i = i + 1;
                    return i;
                }
                return count;
            }

            var c1 = makeCounter();
            var c2 = makeCounter();
            print c1();
            print c1();
            print c2();
            print c1();
        "#;

        assert_eq!(output_of(source), "1\n2\n1\n3\n");
    }

    #[test]
    fn test_callable_display() {
        let source = r#"
            fun hello() {}
            class Greeter {}
            print hello;
            print clock;
            print Greeter;
            print Greeter();
        "#;

        assert_eq!(
            output_of(source),
            "<fn hello>\n<native fn clock>\nGreeter\nGreeter instance\n"
        );
    }

    #[test]
    fn test_clock_native() {
        assert_eq!(output_of("print clock() > 0;"), "true\n");
        assert_eq!(
            runtime_error("clock(1);"),
            "Expected 0 arguments but got 1.\n[line 1]"
        );
    }

    #[test]
    fn test_host_defined_native() {
        let (mut lox, out) = session();

        lox.interpreter_mut()
            .define_native("twice", 1, |args: &[Value]| match &args[0] {
                Value::Number(n) => Ok(Value::Number(n * 2.0)),
                other => Err(format!("twice wants a number, got {}.", other.type_name())),
            });

        assert!(lox.run("print twice(21);").is_ok());
        assert_eq!(out.contents(), "42\n");

        let outcome = lox.run("\n\ntwice(\"x\");");
        assert_eq!(
            error_messages(&outcome),
            vec!["twice wants a number, got string.\n[line 3]"]
        );
    }

    // ───────────────────────── classes ─────────────────────────────

    #[test]
    fn test_fields_methods_and_initializer() {
        let source = r#"
            class Point {
                init(x, y) {
                    this.x = x;
                    this.y = y;
                }
                sum() { return this.x + this.y; }
            }

            var p = Point(2, 3);
            print p.sum();
            p.x = 10;
            print p.sum();
        "#;

        assert_eq!(output_of(source), "5\n13\n");
    }

    #[test]
    fn test_bound_methods_remember_their_instance() {
        let source = r#"
            class Person {
                init(name) { this.name = name; }
                greet() { print "hi " + this.name; }
            }

            var greet = Person("ada").greet;
            greet();
        "#;

        assert_eq!(output_of(source), "hi ada\n");
    }

    #[test]
    fn test_fields_shadow_methods() {
        let source = r#"
            class A { m() { return "method"; } }
            var a = A();
            a.m = "field";
            print a.m;
        "#;

        assert_eq!(output_of(source), "field\n");
    }

    #[test]
    fn test_initializer_returns_this() {
        let source = r#"
            class Foo {
                init() {
                    this.n = 1;
                    return;
                }
            }

            var foo = Foo();
            print foo.init() == foo;
            print foo.init().n;
        "#;

        assert_eq!(output_of(source), "true\n1\n");
    }

    #[test]
    fn test_inheritance_and_super() {
        let source = r#"
            class A { m() { return 1; } }
            class B < A { m() { return super.m() + 1; } }
            print B().m();
        "#;

        assert_eq!(output_of(source), "2\n");
    }

    #[test]
    fn test_inherited_methods_and_initializer() {
        let source = r#"
            class Base {
                init(v) { this.v = v; }
                show() { print this.v; }
            }
            class Derived < Base {}
            Derived("from base").show();
        "#;

        assert_eq!(output_of(source), "from base\n");
    }

    #[test]
    fn test_super_binds_to_enclosing_class() {
        let source = r#"
            class A { m() { return "A"; } }
            class B < A {
                m() { return "B"; }
                test() { return super.m(); }
            }
            class C < B {}
            print C().test();
        "#;

        assert_eq!(output_of(source), "A\n");
    }

    #[test]
    fn test_field_shadows_inherited_method() {
        let source = r#"
            class A { m() { return "A.m"; } }
            class B < A {}
            var b = B();
            b.m = "shadowed later";
            print b.m;
            print B().m();
        "#;

        assert_eq!(output_of(source), "shadowed later\nA.m\n");
    }

    #[test]
    fn test_redeclared_superclass_is_a_new_class() {
        let source = r#"
            class A { m() { return "first"; } }
            class B < A {}
            class A { m() { return "second"; } }
            print B().m();
            print A().m();
        "#;

        assert_eq!(output_of(source), "first\nsecond\n");
    }

    // ───────────────────────── runtime errors ──────────────────────

    #[test]
    fn test_deep_recursion_within_limit() {
        let source = r#"
            fun down(n) {
                if (n == 0) return "bottom";
                return down(n - 1);
            }
            print down(900);
        "#;

        assert_eq!(output_of(source), "bottom\n");
    }

    #[test]
    fn test_runaway_recursion_is_a_runtime_error() {
        let (mut lox, out) = session();

        assert!(lox.run("var survivor = \"still here\";").is_ok());

        let outcome = lox.run("fun f(n) { return f(n + 1); }\nf(0);");
        assert_eq!(outcome.status, Status::RuntimeError);
        assert_eq!(error_messages(&outcome), vec!["Stack overflow.\n[line 1]"]);

        // The session keeps its globals and can call functions again.
        assert!(lox.run("print survivor;").is_ok());
        assert!(lox.run("fun g() { return 1; } print g();").is_ok());
        assert_eq!(out.contents(), "still here\n1\n");
    }

    #[test]
    fn test_operand_type_errors() {
        assert_eq!(
            runtime_error("print \"1\" + 1;"),
            "Operands of '+' must be two numbers or two strings, got string and number.\n[line 1]"
        );
        assert_eq!(
            runtime_error("print -\"x\";"),
            "Operand of '-' must be a number, got string.\n[line 1]"
        );
        assert_eq!(
            runtime_error("print 1 < nil;"),
            "Right operand of '<' must be a number, got nil.\n[line 1]"
        );
        assert_eq!(
            runtime_error("print true * 2;"),
            "Left operand of '*' must be a number, got boolean.\n[line 1]"
        );
    }

    #[test]
    fn test_undefined_variables() {
        assert_eq!(
            runtime_error("print nope;"),
            "Undefined variable 'nope'.\n[line 1]"
        );
        assert_eq!(
            runtime_error("\nnope = 1;"),
            "Undefined variable 'nope'.\n[line 2]"
        );
    }

    #[test]
    fn test_call_errors() {
        assert_eq!(
            runtime_error("fun f(a, b) {}\nf(1);"),
            "Expected 2 arguments but got 1.\n[line 2]"
        );
        assert_eq!(
            runtime_error("fun f(a, b) {}\nf(1, 2, 3);"),
            "Expected 2 arguments but got 3.\n[line 2]"
        );
        assert_eq!(
            runtime_error("\"str\"();"),
            "Can only call functions and classes, got string.\n[line 1]"
        );
        assert_eq!(
            runtime_error("class A { init(x) {} } A();"),
            "Expected 1 arguments but got 0.\n[line 1]"
        );
    }

    #[test]
    fn test_property_errors() {
        assert_eq!(
            runtime_error("class A {} print A().missing;"),
            "Undefined property 'missing'.\n[line 1]"
        );
        assert_eq!(
            runtime_error("var n = 1; print n.x;"),
            "Only instances have properties, got number.\n[line 1]"
        );
        assert_eq!(
            runtime_error("var n = 1; n.x = 2;"),
            "Only instances have fields.\n[line 1]"
        );
        assert_eq!(
            runtime_error("var NotAClass = 1;\nclass B < NotAClass {}"),
            "Superclass must be a class.\n[line 2]"
        );
    }

    #[test]
    fn test_runtime_error_stops_execution_but_keeps_output() {
        let (out, outcome) = run("print 1;\nprint nil + 1;\nprint 2;");

        assert_eq!(out, "1\n");
        assert_eq!(outcome.status, Status::RuntimeError);
        assert_eq!(
            error_messages(&outcome),
            vec!["Operands of '+' must be two numbers or two strings, got nil and number.\n[line 2]"]
        );
    }

    #[test]
    fn test_scan_error_is_static() {
        let (out, outcome) = run("print 1;\nprint @;");

        assert_eq!(out, "");
        assert_eq!(outcome.status, Status::StaticError);
        assert_eq!(
            error_messages(&outcome),
            vec!["[line 2] Error: Unexpected character: @"]
        );
    }

    // ───────────────────────── sessions ────────────────────────────

    #[test]
    fn test_session_state_persists_across_runs() {
        let (mut lox, out) = session();

        assert!(lox.run("var count = 1;").is_ok());
        assert!(lox.run("fun bump() { count = count + 1; return count; }").is_ok());
        assert!(lox.run("print bump();").is_ok());
        assert!(lox.run("{ var local = bump(); print local; }").is_ok());

        assert_eq!(out.contents(), "2\n3\n");
    }

    #[test]
    fn test_session_recovers_after_errors() {
        let (mut lox, out) = session();

        assert!(lox.run("var x = 1;").is_ok());
        assert_eq!(lox.run("print x +;").status, Status::StaticError);
        assert_eq!(lox.run("{ var y = 2; print y + nil; }").status, Status::RuntimeError);
        assert!(lox.run("print x;").is_ok());

        // Globals defined before the failing statement are kept.
        assert_eq!(lox.run("var z = 5; z();").status, Status::RuntimeError);
        assert!(lox.run("print z;").is_ok());

        assert_eq!(out.contents(), "1\n5\n");
    }

    #[test]
    fn test_closures_survive_across_runs() {
        let (mut lox, out) = session();

        assert!(lox
            .run("fun make() { var n = 0; fun inc() { n = n + 1; return n; } return inc; }")
            .is_ok());
        assert!(lox.run("var inc = make();").is_ok());
        assert!(lox.run("inc();").is_ok());
        assert!(lox.run("print inc();").is_ok());

        assert_eq!(out.contents(), "2\n");
    }
}
