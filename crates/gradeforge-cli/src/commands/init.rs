//! The `gradeforge init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create gradeforge.toml
    if std::path::Path::new("gradeforge.toml").exists() {
        println!("gradeforge.toml already exists, skipping.");
    } else {
        std::fs::write("gradeforge.toml", SAMPLE_CONFIG)?;
        println!("Created gradeforge.toml");
    }

    // Create example course file
    std::fs::create_dir_all("courses")?;
    let example_path = std::path::Path::new("courses/example-course.toml");
    if example_path.exists() {
        println!("courses/example-course.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_COURSE)?;
        println!("Created courses/example-course.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit gradeforge.toml to pick an evaluator");
    println!("  2. Run: gradeforge validate --course courses/example-course.toml");
    println!("  3. Run: gradeforge run --course courses/example-course.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# gradeforge configuration

# "multiple" lets a student submit again; "single" rejects repeat attempts.
attempt_policy = "multiple"

# Max submissions graded concurrently.
parallelism = 4

output_dir = "./gradeforge-out"

# Free-text answers are scored by the configured evaluator. The heuristic
# evaluator needs no credentials; "openai" calls a chat-completions API.
[evaluator]
type = "heuristic"

# [evaluator]
# type = "openai"
# api_key = "${OPENAI_API_KEY}"
# model = "gpt-4.1-mini"
"#;

const EXAMPLE_COURSE: &str = r#"[course]
name = "Example Course"
description = "A small course to get started"

[[faculty]]
name = "Priya Nair"
email = "priya@example.edu"

[[students]]
name = "Sam Okafor"
email = "sam@example.edu"

[[students]]
name = "Ana Silva"
email = "ana@example.edu"

[[assignments]]
title = "Normalization Quiz"
subject = "Databases"

[[assignments.questions]]
kind = "multiple-choice"
prompt = "Which normal form removes transitive dependencies?"
options = ["1NF", "2NF", "3NF"]
answer = "3NF"
marks = 20

[[assignments.questions]]
kind = "free-text"
prompt = "Explain the difference between 2NF and 3NF, with an example schema."
marks = 50

[[submissions]]
student = "sam@example.edu"
assignment = "Normalization Quiz"

[submissions.answers]
1 = "3NF"
2 = """
2NF removes partial dependencies on a composite key, while 3NF also removes
transitive dependencies between non-key attributes. For example, an orders
table storing customer city keyed by order id violates 3NF because city
depends on customer, not on the order itself.
"""

[[submissions]]
student = "ana@example.edu"
assignment = "Normalization Quiz"

[submissions.answers]
1 = "2NF"
2 = "They are different normal forms."
"#;
