use std::fs::File;
use std::io::Read;

use interpreter::Interpreter;
use walkdir::WalkDir;

// Every `*.monk` program under `tests/programs` is run as a single program and its rendered result
// (or its parse errors, one per line) is compared with the sibling `*.monk.out` file.
#[test]
fn test_programs() {
    let source_files = WalkDir::new("tests/programs")
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| matches!(entry.path().extension(), Some(extension) if extension == "monk"))
        .filter_map(|entry| {
            let mut exp_filename = entry.file_name().to_os_string();
            exp_filename.push(".out");

            let parent = entry.path().parent().unwrap();
            let exp_filepath = parent.join(exp_filename);

            if exp_filepath.exists() {
                Some((entry, exp_filepath))
            } else {
                None
            }
        });

    let mut total = 0;

    for (src_path, exp_path) in source_files {
        println!("🕑 Running test: {}", src_path.path().display());

        let mut src_content = String::new();
        let mut exp_content = String::new();

        File::open(src_path.path())
            .unwrap()
            .read_to_string(&mut src_content)
            .unwrap();
        File::open(exp_path)
            .unwrap()
            .read_to_string(&mut exp_content)
            .unwrap();

        let program = match interpreter::parse(&src_content) {
            Ok(program) => program,
            Err(errs) => {
                let err_combined: String = errs.into_iter().map(|err| err.to_string()).fold(
                    String::new(),
                    |mut acc, item| {
                        acc.push_str(&item);
                        acc.push('\n');
                        acc
                    },
                );

                assert_eq!(exp_content, err_combined);
                println!("✅ Test complete: {}", src_path.path().display());
                total += 1;
                continue;
            }
        };

        let mut interpreter = Interpreter::new();
        let output = match interpreter.eval(&program) {
            Some(value) => format!("{}\n", value),
            None => String::new(),
        };
        assert_eq!(exp_content, output);

        println!("✅ Test complete: {}", src_path.path().display());
        total += 1;
    }

    assert!(total > 0, "no programs found");
    println!("✅ Ran {} tests", total)
}
