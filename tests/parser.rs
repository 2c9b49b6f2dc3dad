#[cfg(test)]
mod parser_tests {
    use slox::ast::{ExprKind, Stmt};
    use slox::ast_printer::AstPrinter;
    use slox::error::LoxError;
    use slox::parser::Parser;
    use slox::scanner::scan;

    fn parse(source: &str) -> Result<Vec<Stmt>, Vec<LoxError>> {
        let (tokens, errors) = scan(source);
        assert!(errors.is_empty(), "unexpected lex errors: {:?}", errors);
        Parser::new(tokens).parse()
    }

    fn render(source: &str) -> String {
        AstPrinter::print_program(&parse(source).expect("program should parse"))
    }

    fn messages(source: &str) -> Vec<String> {
        parse(source)
            .expect_err("program should fail to parse")
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_expression_precedence() {
        assert_eq!(render("1 - 2 - 3;"), "(; (- (- 1 2) 3))");
        assert_eq!(render("!true == false;"), "(; (== (! true) false))");
        assert_eq!(render("a or b and c;"), "(; (or a (and b c)))");
        assert_eq!(render("1 < 2 == 3 >= 4;"), "(; (== (< 1 2) (>= 3 4)))");
    }

    #[test]
    fn test_assignment_is_right_associative() {
        assert_eq!(render("a = b = 3;"), "(; (= a (= b 3)))");
        assert_eq!(render("a.b.c = 1;"), "(; (= (. (. a b) c) 1))");
    }

    #[test]
    fn test_calls_and_properties_chain() {
        assert_eq!(render("f(1)(2).x;"), "(; (. (call (call f 1) 2) x))");
        assert_eq!(render("super.go;"), "(; (super go))");
    }

    #[test]
    fn test_for_loop_desugars_to_while() {
        assert_eq!(
            render("for (var i = 0; i < 3; i = i + 1) print(i);"),
            "(block (var i 0) (while (< i 3) (block (; (call print i)) (; (= i (+ i 1))))))"
        );
        assert_eq!(render("for (;;) x;"), "(while true (; x))");
    }

    #[test]
    fn test_control_flow_and_declarations() {
        assert_eq!(
            render("if (a) b; else { c; }"),
            "(if a (; b) (block (; c)))"
        );
        assert_eq!(
            render("fun add(a, b) { return a + b; }"),
            "(fun add(a b) (return (+ a b)))"
        );
        assert_eq!(render("fun f() { return; }"), "(fun f() (return))");
        assert_eq!(render("import \"lib.lox\";"), "(import \"lib.lox\")");
    }

    #[test]
    fn test_class_with_superclass() {
        let statements = parse("class B < A { go() {} init() {} }").unwrap();

        match &statements[0] {
            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                assert_eq!(name.lexeme, "B");
                let superclass = superclass.as_ref().expect("superclass");
                assert!(matches!(&superclass.kind, ExprKind::Variable(t) if t.lexeme == "A"));
                let names: Vec<&str> = methods.iter().map(|m| m.name.lexeme.as_str()).collect();
                assert_eq!(names, vec!["go", "init"]);
            }
            other => panic!("expected class, got {:?}", other),
        }
    }

    #[test]
    fn test_every_node_gets_a_distinct_id() {
        let statements = parse("a; a;").unwrap();

        let ids: Vec<_> = statements
            .iter()
            .map(|s| match s {
                Stmt::Expression(e) => e.id,
                other => panic!("expected expression, got {:?}", other),
            })
            .collect();

        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_errors_are_collected_after_synchronizing() {
        assert_eq!(
            messages("var = 1;\nprint(;\nvar ok = 2;"),
            vec![
                "[line 1] Error at '=': Expected variable name.",
                "[line 2] Error at ';': Expected expression.",
            ]
        );
    }

    #[test]
    fn test_error_at_end() {
        assert_eq!(
            messages("print(1)"),
            vec!["[line 1] Error at end: Expected ';' after expression."]
        );
    }

    #[test]
    fn test_invalid_assignment_target() {
        assert_eq!(
            messages("1 + 2 = 3;"),
            vec!["[line 1] Error at '=': Invalid assignment target."]
        );
    }

    #[test]
    fn test_too_many_arguments() {
        let args = vec!["1"; 256].join(", ");
        let errors = messages(&format!("f({});", args));

        assert_eq!(errors.len(), 1);
        assert!(errors[0].ends_with("Can't have more than 255 arguments."));
    }
}
