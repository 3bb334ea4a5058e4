#[cfg(test)]
mod parser_tests {
    use pretty_assertions::assert_eq;
    use rox as lox;

    use lox::ast::{Expr, Stmt};
    use lox::ast_printer::AstPrinter;
    use lox::parser::Parser;
    use lox::scanner::Scanner;
    use lox::token::Token;

    fn tokens(source: &str) -> Vec<Token> {
        let (tokens, errors) = Scanner::new(source).scan_tokens();
        assert!(errors.is_empty(), "unexpected scan errors: {:?}", errors);
        tokens
    }

    /// Parse and pretty-print, asserting the program is well formed.
    fn printed(source: &str) -> String {
        let tokens = tokens(source);
        let mut parser = Parser::new(&tokens);
        let statements = parser.parse();

        assert!(!parser.had_error(), "unexpected parse errors: {:?}", parser.errors());

        AstPrinter::print_program(&statements)
    }

    fn parse_errors(source: &str) -> (Vec<Stmt>, Vec<String>) {
        let tokens = tokens(source);
        let mut parser = Parser::new(&tokens);
        let statements = parser.parse();
        let errors = parser.into_errors().iter().map(|e| e.to_string()).collect();

        (statements, errors)
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_eq!(printed("1 + 2 * 3;"), "(; (+ 1.0 (* 2.0 3.0)))");
        assert_eq!(printed("1 - 2 - 3;"), "(; (- (- 1.0 2.0) 3.0))");
        assert_eq!(printed("print -a == !b;"), "(print (== (- a) (! b)))");
        assert_eq!(printed("x or y and z;"), "(; (or x (and y z)))");
        assert_eq!(printed("a = b = c;"), "(; (= a (= b c)))");
        assert_eq!(
            printed("(1 + 2.5) * \"s\" >= nil;"),
            "(; (>= (* (group (+ 1.0 2.5)) s) nil))"
        );
    }

    #[test]
    fn test_calls_and_properties() {
        assert_eq!(printed("f(1)(2, 3);"), "(; (call (call f 1.0) 2.0 3.0))");
        assert_eq!(printed("a.b.c = d();"), "(; (= (. (. a b) c) (call d)))");
    }

    #[test]
    fn test_declarations() {
        assert_eq!(printed("var a; var b = true;"), "(var a)\n(var b true)");
        assert_eq!(
            printed("fun add(a, b) { return a + b; }"),
            "(fun add (a b) (return (+ a b)))"
        );
        assert_eq!(
            printed("class B < A { init(x) { this.x = x; } m() { return super.m(); } }"),
            "(class B < A (init (x) (; (= (. this x) x))) (m () (return (super m))))"
        );
        assert_eq!(printed("fun f() { return; }"), "(fun f () (return))");
    }

    #[test]
    fn test_control_flow() {
        assert_eq!(
            printed("if (a) print 1; else { print 2; }"),
            "(if a (print 1.0) (block (print 2.0)))"
        );
        assert_eq!(printed("while (x) x = x - 1;"), "(while x (; (= x (- x 1.0))))");
    }

    #[test]
    fn test_for_desugars_to_while() {
        assert_eq!(
            printed("for (var i = 0; i < 3; i = i + 1) print i;"),
            "(block (var i 0.0) (while (< i 3.0) (block (print i) (; (= i (+ i 1.0))))))"
        );
        assert_eq!(printed("for (;;) print 1;"), "(while true (print 1.0))");
    }

    #[test]
    fn test_invalid_assignment_target_is_recorded_not_thrown() {
        let (statements, errors) = parse_errors("1 = 2;\nprint 3;");

        assert_eq!(statements.len(), 2);
        assert_eq!(errors, vec!["[line 1] at '=': Invalid assignment target."]);
    }

    #[test]
    fn test_panic_mode_reports_one_error_per_bad_statement() {
        let (statements, errors) = parse_errors("print ;\nprint 2;\nvar = 3;\nprint 4;");

        assert_eq!(statements.len(), 2);
        assert_eq!(
            errors,
            vec![
                "[line 1] at ';': Expect expression.",
                "[line 3] at '=': Expect variable name.",
            ]
        );
    }

    #[test]
    fn test_error_at_end_of_input() {
        let (_, errors) = parse_errors("print 1");

        assert_eq!(errors, vec!["[line 1] at '': Expect ';' after value."]);
    }

    #[test]
    fn test_class_and_super_errors() {
        let (_, errors) = parse_errors("class { }");
        assert_eq!(errors, vec!["[line 1] at '{': Expect class name."]);

        let (_, errors) = parse_errors("class A < { }");
        assert_eq!(errors, vec!["[line 1] at '{': Expect superclass name."]);

        let (_, errors) = parse_errors("print super;");
        assert_eq!(errors, vec!["[line 1] at ';': Expect '.' after 'super'."]);
    }

    #[test]
    fn test_argument_limit() {
        let args = vec!["1"; 256].join(", ");
        let (statements, errors) = parse_errors(&format!("f({});", args));

        assert_eq!(statements.len(), 1);
        assert_eq!(errors, vec!["[line 1] at '1': Can't have more than 255 arguments."]);

        let args = vec!["1"; 255].join(", ");
        let (_, errors) = parse_errors(&format!("f({});", args));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_parameter_limit() {
        let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
        let (_, errors) = parse_errors(&format!("fun f({}) {{}}", params.join(", ")));

        assert_eq!(errors, vec!["[line 1] at 'p255': Can't have more than 255 parameters."]);
    }

    #[test]
    fn test_ids_continue_from_starting_point() {
        let tokens = tokens("a; b = c; this;");
        let mut parser = Parser::starting_at(&tokens, 10);
        let statements = parser.parse();

        let ids: Vec<usize> = statements
            .iter()
            .map(|stmt| match stmt {
                Stmt::Expression(Expr::Variable { id, .. })
                | Stmt::Expression(Expr::Assign { id, .. })
                | Stmt::Expression(Expr::This { id, .. }) => id.0,
                other => panic!("unexpected statement {:?}", other),
            })
            .collect();

        // `b` is numbered as a variable before it turns into an assignment.
        assert_eq!(ids, vec![10, 13, 14]);
        assert_eq!(parser.next_id(), 15);
    }

    #[test]
    fn test_parse_expression() {
        let tokens = tokens("-(1 + 2) / 4");
        let mut parser = Parser::new(&tokens);
        let expr = parser.parse_expression();

        assert!(!parser.had_error());
        assert_eq!(
            expr.as_ref().map(AstPrinter::print),
            Some("(/ (- (group (+ 1.0 2.0))) 4.0)".to_string())
        );

        let tokens = self::tokens("1 2");
        let mut parser = Parser::new(&tokens);
        assert!(parser.parse_expression().is_some());
        assert_eq!(
            parser.errors()[0].to_string(),
            "[line 1] at '2': Expect end of expression."
        );
    }
}
