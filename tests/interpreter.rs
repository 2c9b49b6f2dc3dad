mod common;

#[cfg(test)]
mod interpreter_tests {
    use slox::interpreter::Status;

    use crate::common::{run_err, run_ok, Harness, MapLoader};

    // ─────────────────────────── expressions ───────────────────────────

    #[test]
    fn test_arithmetic_and_concatenation() {
        assert_eq!(
            run_ok("print(1 + 2 * 3); print(7 / 2); print(-(4 - 6)); print(\"ab\" + \"cd\");"),
            vec!["7", "3.5", "2", "abcd"]
        );
    }

    #[test]
    fn test_comparison_equality_and_truthiness() {
        assert_eq!(
            run_ok(
                "print(1 < 2); print(2 <= 1); print(nil == nil); print(nil == false); \
                 print(\"a\" == \"a\"); print(1 != 1); print(!0); print(!nil);"
            ),
            vec!["true", "false", "true", "false", "true", "false", "false", "true"]
        );
    }

    #[test]
    fn test_logical_operators_return_operands() {
        assert_eq!(
            run_ok("print(nil or \"yes\"); print(1 and 2); print(false and boom); print(0 or boom);"),
            vec!["yes", "2", "false", "0"]
        );
    }

    #[test]
    fn test_division_by_zero_follows_ieee() {
        assert_eq!(run_ok("print(1 / 0); print(-1 / 0);"), vec!["inf", "-inf"]);
    }

    #[test]
    fn test_operand_type_errors() {
        assert_eq!(run_err("print(-\"x\");"), "Operand must be a number.\n[line 1]");
        assert_eq!(run_err("print(1 < \"x\");"), "Operands must be numbers.\n[line 1]");
        assert_eq!(
            run_err("\n\nprint(1 + \"x\");"),
            "Operands must be two numbers or two strings.\n[line 3]"
        );
    }

    // ─────────────────────────── variables ─────────────────────────────

    #[test]
    fn test_block_shadowing_reads_outer_value() {
        assert_eq!(
            run_ok("var x = 1; { var x = x + 1; print(x); } print(x);"),
            vec!["2", "1"]
        );
    }

    #[test]
    fn test_assignment_reaches_resolved_frame() {
        assert_eq!(
            run_ok("var a = 1; { var b = 2; { a = 10; b = 20; } print(b); } print(a);"),
            vec!["20", "10"]
        );
    }

    #[test]
    fn test_undefined_variable() {
        assert_eq!(run_err("print(nope);"), "Undefined variable 'nope'.\n[line 1]");
        assert_eq!(run_err("nope = 1;"), "Undefined variable 'nope'.\n[line 1]");
    }

    #[test]
    fn test_initializer_reads_global_declared_later_in_source() {
        assert_eq!(
            run_ok("fun f() { { var g = g + 1; print(g); } } var g = 1; f(); print(g);"),
            vec!["2", "1"]
        );
    }

    #[test]
    fn test_uninitialized_variable_is_nil() {
        assert_eq!(run_ok("var a; print(a);"), vec!["nil"]);
    }

    // ─────────────────────────── control flow ──────────────────────────

    #[test]
    fn test_loops() {
        assert_eq!(
            run_ok("var i = 0; while (i < 3) { print(i); i = i + 1; } for (var j = 0; j < 2; j = j + 1) print(j);"),
            vec!["0", "1", "2", "0", "1"]
        );
    }

    #[test]
    fn test_return_unwinds_nested_loops() {
        assert_eq!(
            run_ok(
                "fun find() { for (var i = 0; ; i = i + 1) { while (true) { if (i == 3) return i; i = i + 1; } } } \
                 print(find());"
            ),
            vec!["3"]
        );
    }

    // ─────────────────────────── functions ─────────────────────────────

    #[test]
    fn test_recursion() {
        assert_eq!(
            run_ok("fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } print(fib(15));"),
            vec!["610"]
        );
    }

    #[test]
    fn test_closures_keep_their_frame_alive() {
        assert_eq!(
            run_ok(
                "fun counter() { var n = 0; fun inc() { n = n + 1; return n; } return inc; } \
                 var a = counter(); var b = counter(); print(a()); print(a()); print(b());"
            ),
            vec!["1", "2", "1"]
        );
    }

    #[test]
    fn test_closure_binding_is_static() {
        assert_eq!(
            run_ok(
                "var a = \"global\"; { fun show() { print(a); } show(); var a = \"block\"; show(); }"
            ),
            vec!["global", "global"]
        );
    }

    #[test]
    fn test_function_without_return_yields_nil() {
        assert_eq!(run_ok("fun f() {} print(f());"), vec!["nil"]);
    }

    #[test]
    fn test_call_errors() {
        assert_eq!(
            run_err("\"text\"();"),
            "Can only call functions and classes.\n[line 1]"
        );
        assert_eq!(
            run_err("fun f(a, b) {} f(1);"),
            "Expected 2 arguments but got 1.\n[line 1]"
        );
        assert_eq!(
            run_err("class A { init(x) {} } A();"),
            "Expected 1 arguments but got 0.\n[line 1]"
        );
    }

    #[test]
    fn test_printing_callables() {
        assert_eq!(
            run_ok("fun f() {} class C {} print(f); print(clock); print(C); print(C());"),
            vec!["<fn f>", "<native fn>", "C", "C instance"]
        );
    }

    // ─────────────────────────── classes ───────────────────────────────

    #[test]
    fn test_fields_and_methods() {
        assert_eq!(
            run_ok(
                "class Point { init(x, y) { this.x = x; this.y = y; } sum() { return this.x + this.y; } } \
                 var p = Point(1, 2); p.x = 10; print(p.sum()); print(p.y);"
            ),
            vec!["12", "2"]
        );
    }

    #[test]
    fn test_bound_method_remembers_receiver() {
        assert_eq!(
            run_ok(
                "class A { init(n) { this.n = n; } get() { return this.n; } } \
                 var m = A(\"first\").get; print(m());"
            ),
            vec!["first"]
        );
    }

    #[test]
    fn test_fields_shadow_methods() {
        assert_eq!(
            run_ok("class A { m() { return \"method\"; } } var a = A(); a.m = \"field\"; print(a.m);"),
            vec!["field"]
        );
    }

    #[test]
    fn test_initializer_always_returns_instance() {
        assert_eq!(
            run_ok(
                "class A { init() { this.v = 1; return; } } var a = A(); \
                 print(a.init() == a); print(a.v);"
            ),
            vec!["true", "1"]
        );
    }

    #[test]
    fn test_inheritance_and_super() {
        assert_eq!(
            run_ok(
                "class A { name() { return \"A\"; } hello() { return \"hello \" + this.name(); } } \
                 class B < A { name() { return \"B\"; } hello() { return super.hello() + \"!\"; } } \
                 class C < B {} \
                 print(C().hello());"
            ),
            vec!["hello B!"]
        );
    }

    #[test]
    fn test_super_inside_nested_closure() {
        assert_eq!(
            run_ok(
                "class A { say() { return \"A\"; } } \
                 class B < A { say() { fun inner() { return super.say(); } return inner(); } } \
                 print(B().say());"
            ),
            vec!["A"]
        );
    }

    #[test]
    fn test_class_declared_in_block() {
        assert_eq!(
            run_ok("{ class Local { make() { return Local(); } } print(Local().make()); }"),
            vec!["Local instance"]
        );
    }

    #[test]
    fn test_instance_identity() {
        assert_eq!(
            run_ok("class A {} var a = A(); var b = a; print(a == b); print(a == A());"),
            vec!["true", "false"]
        );
    }

    #[test]
    fn test_property_errors() {
        assert_eq!(
            run_err("class A {} A().missing;"),
            "Undefined property 'missing'.\n[line 1]"
        );
        assert_eq!(run_err("var n = 1; n.x;"), "Only instances have properties.\n[line 1]");
        assert_eq!(run_err("var n = 1; n.x = 2;"), "Only instances have fields.\n[line 1]");
        assert_eq!(
            run_err("class A {} class B < A { go() { return super.nope; } } B().go();"),
            "Undefined property 'nope'.\n[line 1]"
        );
    }

    #[test]
    fn test_superclass_must_be_a_class() {
        assert_eq!(
            run_err("var NotClass = 1; class A < NotClass {}"),
            "Superclass must be a class.\n[line 1]"
        );
    }

    // ─────────────────────────── pipeline ──────────────────────────────

    #[test]
    fn test_static_errors_prevent_execution() {
        let mut harness = Harness::new();

        assert_eq!(harness.run("print(1);\nreturn 2;"), Status::StaticError);
        assert_eq!(Status::StaticError.exit_code(), 65);
        assert!(harness.output().is_empty());
        assert_eq!(
            harness.static_errors(),
            vec!["[line 2] Error at 'return': Can't return from top-level code."]
        );
    }

    #[test]
    fn test_runtime_error_stops_the_program() {
        let mut harness = Harness::new();

        assert_eq!(harness.run("print(1); print(-nil); print(2);"), Status::RuntimeError);
        assert_eq!(Status::RuntimeError.exit_code(), 70);
        assert_eq!(harness.lines(), vec!["1"]);
    }

    #[test]
    fn test_runs_share_globals_across_calls() {
        let mut harness = Harness::new();

        assert_eq!(harness.run("var x = 1; fun bump() { x = x + 1; }"), Status::Completed);
        assert_eq!(harness.run("print(undefinedThing);"), Status::RuntimeError);
        assert_eq!(harness.run("bump(); { var x = x * 10; print(x); } print(x);"), Status::Completed);

        assert_eq!(harness.lines(), vec!["20", "2"]);
    }

    #[test]
    fn test_block_frame_is_restored_after_runtime_error() {
        let mut harness = Harness::new();

        assert_eq!(harness.run("{ var y = 1; print(-nil); }"), Status::RuntimeError);
        // Declared in globals, not in the abandoned block frame.
        assert_eq!(harness.run("var z = 2;"), Status::Completed);
        assert_eq!(harness.run("fun g() { return z; } print(g()); print(y);"), Status::RuntimeError);

        assert_eq!(harness.lines(), vec!["2"]);
        assert_eq!(
            harness.runtime_errors(),
            vec![
                "Operand must be a number.\n[line 1]",
                "Undefined variable 'y'.\n[line 1]",
            ]
        );
    }

    #[test]
    fn test_frame_is_restored_after_error_inside_call() {
        let mut harness = Harness::new();

        assert_eq!(
            harness.run("fun fail() { var local = 1; { var inner = 2; return -\"x\"; } } fail();"),
            Status::RuntimeError
        );
        assert_eq!(harness.run("var after = 3; print(after);"), Status::Completed);
        assert_eq!(harness.run("print(local);"), Status::RuntimeError);

        assert_eq!(harness.lines(), vec!["3"]);
    }

    #[test]
    fn test_runaway_recursion_is_a_runtime_error() {
        let mut harness = Harness::new().max_call_depth(64);

        assert_eq!(
            harness.run("fun down(n) { return down(n + 1); }\ndown(0);"),
            Status::RuntimeError
        );
        assert_eq!(harness.runtime_errors(), vec!["Stack overflow.\n[line 1]"]);

        // The depth counter unwinds with the error.
        assert_eq!(
            harness.run("fun d(n) { if (n == 0) return 0; return 1 + d(n - 1); } print(d(60));"),
            Status::Completed
        );
        assert_eq!(harness.lines(), vec!["60"]);
    }

    #[test]
    fn test_default_call_depth_limit_on_large_stack() {
        use std::thread;

        let (deep, runaway, errors) = thread::Builder::new()
            .stack_size(256 * 1024 * 1024)
            .spawn(|| {
                let mut harness = Harness::new();
                let deep = harness.run(
                    "fun d(n) { if (n == 0) return 0; return 1 + d(n - 1); } print(d(900));",
                );
                let runaway = harness.run("fun forever(n) { return forever(n + 1); } forever(0);");
                (deep, runaway, (harness.lines(), harness.runtime_errors()))
            })
            .expect("spawn interpreter thread")
            .join()
            .expect("interpreter thread should not abort");

        assert_eq!(deep, Status::Completed);
        assert_eq!(runaway, Status::RuntimeError);
        assert_eq!(errors.0, vec!["900"]);
        assert_eq!(errors.1, vec!["Stack overflow.\n[line 1]"]);
    }

    #[test]
    fn test_exit_stops_without_error() {
        let mut harness = Harness::new();

        assert_eq!(
            harness.run("print(\"before\"); fun f() { exit(); } f(); print(\"after\");"),
            Status::Exited
        );
        assert_eq!(Status::Exited.exit_code(), 0);
        assert_eq!(harness.lines(), vec!["before"]);
        assert!(harness.runtime_errors().is_empty());
    }

    // ─────────────────────────── import ────────────────────────────────

    #[test]
    fn test_import_runs_module_in_globals() {
        let loader = MapLoader::default()
            .with("math.lox", "fun square(n) { return n * n; } var loaded = true;");
        let mut harness = Harness::with_loader(loader);

        let status = harness.run("{ import \"math.lox\"; } print(square(4)); print(loaded);");

        assert_eq!(status, Status::Completed, "{:?}", harness.runtime_errors());
        assert_eq!(harness.lines(), vec!["16", "true"]);
    }

    #[test]
    fn test_import_module_name_from_expression() {
        let loader = MapLoader::default().with("lib/a.lox", "print(\"a loaded\");");
        let mut harness = Harness::with_loader(loader);

        assert_eq!(harness.run("var dir = \"lib/\"; import dir + \"a.lox\";"), Status::Completed);
        assert_eq!(harness.lines(), vec!["a loaded"]);
    }

    #[test]
    fn test_import_std_file_module() {
        assert_eq!(run_ok("import \"std:File\"; print(File);"), vec!["File"]);
    }

    #[test]
    fn test_import_failures() {
        assert_eq!(
            run_err("import 42;"),
            "Module name must be a string.\n[line 1]"
        );
        assert_eq!(
            run_err("import \"std:Net\";"),
            "'std:Net' is not a standard library module.\n[line 1]"
        );
        assert_eq!(
            run_err("\nimport \"missing.lox\";"),
            "Could not import module 'missing.lox'.\n[line 2]"
        );
    }

    #[test]
    fn test_import_with_static_errors_reports_them() {
        let loader = MapLoader::default().with("bad.lox", "var = ;");
        let mut harness = Harness::with_loader(loader);

        assert_eq!(harness.run("import \"bad.lox\";"), Status::RuntimeError);
        assert_eq!(harness.static_errors().len(), 1);
        assert_eq!(
            harness.runtime_errors(),
            vec!["Module 'bad.lox' contains errors.\n[line 1]"]
        );
    }

    #[test]
    fn test_runtime_error_in_module_propagates() {
        let loader = MapLoader::default().with("boom.lox", "\n\nprint(-\"boom\");");
        let mut harness = Harness::with_loader(loader);

        assert_eq!(harness.run("import \"boom.lox\"; print(\"unreached\");"), Status::RuntimeError);
        assert_eq!(harness.runtime_errors(), vec!["Operand must be a number.\n[line 3]"]);
        assert!(harness.output().is_empty());
    }
}
