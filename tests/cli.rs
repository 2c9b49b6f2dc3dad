#[cfg(test)]
mod cli_tests {
    use std::fs;
    use std::process::{Command, Output};

    use tempfile::TempDir;

    fn slox(args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_slox"))
            .args(args)
            .output()
            .expect("slox binary should start")
    }

    fn run_script(source: &str) -> Output {
        let dir = TempDir::new().expect("temp dir should be created");
        let path = dir.path().join("main.lox");
        fs::write(&path, source).expect("script should be written");

        slox(&["run", path.to_str().expect("temp path is UTF-8")])
    }

    #[test]
    fn test_unknown_flag_is_a_usage_error() {
        let output = slox(&["--bogus"]);
        assert_eq!(output.status.code(), Some(64));
        assert!(!output.stderr.is_empty());
    }

    #[test]
    fn test_missing_argument_is_a_usage_error() {
        assert_eq!(slox(&["run"]).status.code(), Some(64));
        assert_eq!(slox(&["frobnicate"]).status.code(), Some(64));
    }

    #[test]
    fn test_help_exits_cleanly() {
        let output = slox(&["--help"]);
        assert_eq!(output.status.code(), Some(0));
        assert!(String::from_utf8_lossy(&output.stdout).contains("run"));
    }

    #[test]
    fn test_run_exit_codes() {
        let ok = run_script("print(1 + 2);");
        assert_eq!(ok.status.code(), Some(0));
        assert_eq!(String::from_utf8_lossy(&ok.stdout), "3\n");

        assert_eq!(run_script("return 1;").status.code(), Some(65));
        assert_eq!(run_script("print(-nil);").status.code(), Some(70));
    }

    #[test]
    fn test_runaway_recursion_exits_with_runtime_error() {
        let output = run_script("fun down(n) { return down(n + 1); }\ndown(0);");

        assert_eq!(output.status.code(), Some(70));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("Stack overflow."), "stderr was: {}", stderr);
    }

    #[test]
    fn test_deep_recursion_within_limit_completes() {
        let output =
            run_script("fun d(n) { if (n == 0) return 0; return 1 + d(n - 1); }\nprint(d(990));");

        assert_eq!(output.status.code(), Some(0));
        assert_eq!(String::from_utf8_lossy(&output.stdout), "990\n");
    }
}
