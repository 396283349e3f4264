use std::fs;
use std::path::Path;

#[derive(Debug)]
struct TestExpectation {
    /// Substrings the generated C++ must contain.
    generated: Vec<String>,
    /// Substring the compile-time diagnostic must contain, if the
    /// program is expected to be rejected.
    error: Option<String>,
}

fn parse_test_file(content: &str) -> (String, TestExpectation) {
    let mut generated = Vec::new();
    let mut error = None;
    let mut source_lines = Vec::new();

    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("// expect-cc: ") {
            generated.push(rest.to_string());
        } else if let Some(rest) = line.strip_prefix("// expect-error: ") {
            error = Some(rest.to_string());
        } else {
            source_lines.push(line);
        }
    }

    (
        source_lines.join("\n"),
        TestExpectation { generated, error },
    )
}

fn run_test_file(path: &Path) -> Result<(), String> {
    let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let (source, expectation) = parse_test_file(&content);

    match rox::generate(&source) {
        Ok(cc) => {
            if let Some(expected) = &expectation.error {
                return Err(format!(
                    "Expected a diagnostic containing {expected:?} but generation succeeded"
                ));
            }
            for needle in &expectation.generated {
                if !cc.contains(needle) {
                    return Err(format!("Generated C++ does not contain {needle:?}"));
                }
            }
            // Idempotence: a second run must produce identical bytes.
            let again = rox::generate(&source).map_err(|e| e.to_string())?;
            if cc != again {
                return Err("Generation is not idempotent".to_string());
            }
            Ok(())
        }
        Err(e) => {
            let message = e.to_string();
            match &expectation.error {
                Some(expected) if message.contains(expected) => Ok(()),
                Some(expected) => Err(format!(
                    "Diagnostic mismatch:\n  Expected fragment: {expected:?}\n  Actual:            {message:?}"
                )),
                None => Err(message),
            }
        }
    }
}

#[test]
fn run_all_program_tests() {
    let test_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/programs");

    if !test_dir.exists() {
        println!("No tests/programs directory found, skipping");
        return;
    }

    let mut failures = Vec::new();
    let mut passed = 0;

    let mut entries: Vec<_> = fs::read_dir(&test_dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    entries.sort();

    for path in entries {
        if path.extension().map_or(false, |e| e == "rox") {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            print!("Testing {}... ", name);

            match run_test_file(&path) {
                Ok(()) => {
                    println!("OK");
                    passed += 1;
                }
                Err(e) => {
                    println!("FAILED");
                    failures.push((name, e));
                }
            }
        }
    }

    println!("\n{} passed, {} failed", passed, failures.len());

    if !failures.is_empty() {
        println!("\nFailures:");
        for (name, err) in &failures {
            println!("\n--- {} ---\n{}", name, err);
        }
        panic!("{} test(s) failed", failures.len());
    }
}
