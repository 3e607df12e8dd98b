//! The `gradeforge validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(course_path: PathBuf) -> Result<()> {
    let courses = if course_path.is_dir() {
        gradeforge_core::parser::load_course_directory(&course_path)?
    } else {
        vec![gradeforge_core::parser::parse_course(&course_path)?]
    };

    let mut total_warnings = 0;

    for course in &courses {
        println!(
            "Course: {} ({} users, {} assignments, {} submissions)",
            course.name,
            course.users.len(),
            course.assignments.len(),
            course.submissions.len()
        );

        let warnings = gradeforge_core::parser::validate_course(course);
        for w in &warnings {
            let prefix = w
                .context
                .as_ref()
                .map(|c| format!("  [{c}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All course files valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
