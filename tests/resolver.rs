mod common;

#[cfg(test)]
mod resolver_tests {
    use pretty_assertions::assert_eq;
    use rox as lox;

    use lox::interpreter::Interpreter;
    use lox::lox::Status;
    use lox::parser::Parser;
    use lox::resolver::Resolver;
    use lox::scanner::Scanner;

    use crate::common::{error_messages, output_of, run};

    fn static_errors(source: &str) -> Vec<String> {
        let (out, outcome) = run(source);

        assert_eq!(outcome.status, Status::StaticError);
        assert_eq!(outcome.exit_code(), 65);
        assert_eq!(out, "", "nothing runs after a static error");

        error_messages(&outcome)
    }

    #[test]
    fn test_self_reference_in_global_initializer() {
        assert_eq!(
            static_errors("var x = x;"),
            vec!["[line 1] at 'x': Can't read local variable in its own initializer."]
        );
    }

    #[test]
    fn test_self_reference_in_local_initializer() {
        assert_eq!(
            static_errors("var a = 1;\n{\n  var a = a;\n}"),
            vec!["[line 3] at 'a': Can't read local variable in its own initializer."]
        );
    }

    #[test]
    fn test_redeclaration_in_block_is_a_collision() {
        assert_eq!(
            static_errors("{ var a = 1; var a = 2; }"),
            vec!["[line 1] at 'a': Name collision: 'a' is already declared in this scope."]
        );
    }

    #[test]
    fn test_redeclaration_at_top_level_is_allowed() {
        assert_eq!(output_of("var a = 1; var a = 2; print a;"), "2\n");
    }

    #[test]
    fn test_parameter_collision() {
        assert_eq!(
            static_errors("fun f(a, a) {}"),
            vec!["[line 1] at 'a': Name collision: 'a' is already declared in this scope."]
        );
    }

    #[test]
    fn test_return_rules() {
        assert_eq!(
            static_errors("return 1;"),
            vec!["[line 1] at 'return': Can't return from top-level code."]
        );
        assert_eq!(
            static_errors("class A { init() { return 1; } }"),
            vec!["[line 1] at 'return': Can't return a value from an initializer."]
        );

        // A bare return is fine inside an initializer.
        assert_eq!(output_of("class A { init() { return; } } print A();"), "A instance\n");
    }

    #[test]
    fn test_this_and_super_placement() {
        assert_eq!(
            static_errors("print this;"),
            vec!["[line 1] at 'this': Can't use 'this' outside of a class."]
        );
        assert_eq!(
            static_errors("fun f() { return this; }"),
            vec!["[line 1] at 'this': Can't use 'this' outside of a class."]
        );
        assert_eq!(
            static_errors("super.m();"),
            vec!["[line 1] at 'super': Can't use 'super' outside of a class."]
        );
        assert_eq!(
            static_errors("class A { m() { super.m(); } }"),
            vec!["[line 1] at 'super': Can't use 'super' in a class with no superclass."]
        );
    }

    #[test]
    fn test_class_cannot_inherit_from_itself() {
        assert_eq!(
            static_errors("class A < A {}"),
            vec!["[line 1] at 'A': A class can't inherit from itself."]
        );
    }

    #[test]
    fn test_all_errors_are_collected() {
        assert_eq!(
            static_errors("return 1;\nprint this;\n{ var b; var b; }"),
            vec![
                "[line 1] at 'return': Can't return from top-level code.",
                "[line 2] at 'this': Can't use 'this' outside of a class.",
                "[line 3] at 'b': Name collision: 'b' is already declared in this scope.",
            ]
        );
    }

    #[test]
    fn test_resolver_used_directly() {
        let (tokens, _) = Scanner::new("{ var a; var a; }\nreturn;").scan_tokens();
        let statements = Parser::new(&tokens).parse();

        let mut interpreter = Interpreter::new();
        let mut resolver = Resolver::new(&mut interpreter);
        resolver.resolve(&statements);

        assert!(resolver.had_error());
        assert_eq!(resolver.errors().len(), 2);
    }

    #[test]
    fn test_closures_bind_to_declaration_scope() {
        let source = r#"
            var a = "global";
            {
                fun show() { print a; }
                show();
                var a = "block";
                show();
                print a;
            }
        "#;

        assert_eq!(output_of(source), "global\nglobal\nblock\n");
    }

    #[test]
    fn test_methods_see_this_through_nested_functions() {
        let source = r#"
            class Box {
                init(v) { this.v = v; }
                getter() {
                    fun inner() { return this.v; }
                    return inner;
                }
            }
            print Box(7).getter()();
        "#;

        assert_eq!(output_of(source), "7\n");
    }
}
