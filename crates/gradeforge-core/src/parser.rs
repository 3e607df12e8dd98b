//! TOML course file parser.
//!
//! Loads course files from TOML, resolves the human-friendly references
//! they use (student emails, assignment titles, 1-based question indexes)
//! into ids, and validates the result for common authoring mistakes.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::grader::display_value;
use crate::model::{AnswerKey, Assignment, Question, QuestionKind, Role, User};
use crate::processor::SubmissionRequest;

/// Intermediate TOML structure for parsing course files.
#[derive(Debug, Deserialize)]
struct TomlCourseFile {
    course: TomlCourseHeader,
    #[serde(default)]
    faculty: Vec<TomlPerson>,
    #[serde(default)]
    students: Vec<TomlPerson>,
    #[serde(default)]
    assignments: Vec<TomlAssignment>,
    #[serde(default)]
    submissions: Vec<TomlSubmission>,
}

#[derive(Debug, Deserialize)]
struct TomlCourseHeader {
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TomlPerson {
    name: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct TomlAssignment {
    title: String,
    #[serde(default)]
    subject: String,
    /// Email of the owning faculty member; defaults to the first one listed.
    #[serde(default)]
    faculty: Option<String>,
    /// Defaults to the sum of question marks.
    #[serde(default)]
    max_marks: Option<u32>,
    /// RFC 3339 timestamp.
    #[serde(default)]
    due_date: Option<String>,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    kind: String,
    prompt: String,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    answer: Option<toml::Value>,
    marks: u32,
}

#[derive(Debug, Deserialize)]
struct TomlSubmission {
    /// Student email.
    student: String,
    /// Assignment title.
    assignment: String,
    /// Responses keyed by 1-based question index.
    #[serde(default)]
    answers: HashMap<String, toml::Value>,
}

/// A course file with all references resolved to ids.
#[derive(Debug, Clone)]
pub struct CourseFile {
    pub name: String,
    pub description: String,
    /// Faculty first, then students, in file order.
    pub users: Vec<User>,
    pub assignments: Vec<Assignment>,
    pub submissions: Vec<SubmissionRequest>,
}

/// Parse a single TOML file into a `CourseFile`.
pub fn parse_course(path: &Path) -> Result<CourseFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read course file: {}", path.display()))?;

    parse_course_str(&content, path)
}

/// Parse a TOML string into a `CourseFile` (useful for testing).
pub fn parse_course_str(content: &str, source_path: &Path) -> Result<CourseFile> {
    let parsed: TomlCourseFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let mut users = Vec::new();
    let mut faculty_ids: HashMap<String, Uuid> = HashMap::new();
    let mut student_ids: HashMap<String, Uuid> = HashMap::new();

    for person in parsed.faculty {
        let user = User::new(person.name, person.email.clone(), Role::Faculty);
        faculty_ids.entry(person.email).or_insert(user.id);
        users.push(user);
    }
    for person in parsed.students {
        let user = User::new(person.name, person.email.clone(), Role::Student);
        student_ids.entry(person.email).or_insert(user.id);
        users.push(user);
    }

    let default_faculty = users.iter().find(|u| u.role == Role::Faculty).map(|u| u.id);

    let assignments = parsed
        .assignments
        .into_iter()
        .map(|a| {
            let faculty_id = match &a.faculty {
                Some(email) => *faculty_ids
                    .get(email)
                    .with_context(|| format!("assignment '{}': unknown faculty {email}", a.title))?,
                None => default_faculty.with_context(|| {
                    format!("assignment '{}' needs at least one faculty member", a.title)
                })?,
            };

            let questions = a
                .questions
                .into_iter()
                .map(|q| {
                    let kind: QuestionKind = q
                        .kind
                        .parse()
                        .map_err(|e: String| anyhow::anyhow!("{}", e))?;
                    let answer_key = q
                        .answer
                        .map(|v| {
                            serde_json::to_value(v)
                                .context("failed to convert answer key to JSON")
                        })
                        .transpose()?
                        .map(|answer| AnswerKey { answer });

                    Ok(Question {
                        id: Uuid::new_v4(),
                        kind,
                        prompt: q.prompt,
                        options: q.options,
                        answer_key,
                        marks: q.marks,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let max_marks = a
                .max_marks
                .unwrap_or_else(|| questions.iter().map(|q| q.marks).sum());
            let due_date = a
                .due_date
                .map(|raw| {
                    DateTime::parse_from_rfc3339(&raw)
                        .map(|dt| dt.with_timezone(&Utc))
                        .with_context(|| format!("assignment '{}': invalid due_date", a.title))
                })
                .transpose()?;

            let mut assignment = Assignment::new(a.title, a.subject, faculty_id, max_marks);
            assignment.due_date = due_date;
            assignment.questions = questions;
            Ok(assignment)
        })
        .collect::<Result<Vec<Assignment>>>()?;

    let submissions = parsed
        .submissions
        .into_iter()
        .map(|s| {
            let student_id = *student_ids
                .get(&s.student)
                .with_context(|| format!("submission references unknown student {}", s.student))?;
            let assignment = assignments
                .iter()
                .find(|a| a.title == s.assignment)
                .with_context(|| {
                    format!("submission references unknown assignment '{}'", s.assignment)
                })?;

            let mut answers = HashMap::new();
            for (key, value) in s.answers {
                let index: usize = key.parse().with_context(|| {
                    format!("submission for '{}': answer key '{key}' is not a question index", assignment.title)
                })?;
                let question = index
                    .checked_sub(1)
                    .and_then(|i| assignment.questions.get(i))
                    .with_context(|| {
                        format!(
                            "submission for '{}': question index {index} is out of range",
                            assignment.title
                        )
                    })?;
                let response = serde_json::to_value(value)
                    .context("failed to convert answer to JSON")?;
                answers.insert(question.id, response);
            }

            Ok(SubmissionRequest {
                assignment_id: assignment.id,
                student_id,
                answers,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CourseFile {
        name: parsed.course.name,
        description: parsed.course.description,
        users,
        assignments,
        submissions,
    })
}

/// Recursively load all `.toml` course files from a directory.
pub fn load_course_directory(dir: &Path) -> Result<Vec<CourseFile>> {
    let mut courses = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            courses.extend(load_course_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_course(&path) {
                Ok(course) => courses.push(course),
                Err(e) => {
                    tracing::warn!("skipping {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(courses)
}

/// A warning from course validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The assignment title or user email it concerns (if applicable).
    pub context: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Validate a course for common issues.
pub fn validate_course(course: &CourseFile) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    // Check for duplicate emails
    let mut seen_emails = std::collections::HashSet::new();
    for user in &course.users {
        if !seen_emails.insert(&user.email) {
            warnings.push(ValidationWarning {
                context: Some(user.email.clone()),
                message: format!("duplicate email: {}", user.email),
            });
        }
    }

    // Check for duplicate assignment titles
    let mut seen_titles = std::collections::HashSet::new();
    for assignment in &course.assignments {
        if !seen_titles.insert(&assignment.title) {
            warnings.push(ValidationWarning {
                context: Some(assignment.title.clone()),
                message: format!("duplicate assignment title: {}", assignment.title),
            });
        }
    }

    for assignment in &course.assignments {
        if assignment.questions.is_empty() {
            warnings.push(ValidationWarning {
                context: Some(assignment.title.clone()),
                message: "assignment has no questions".to_string(),
            });
        }
        for question in &assignment.questions {
            if question.kind == QuestionKind::MultipleChoice {
                match &question.answer_key {
                    None => warnings.push(ValidationWarning {
                        context: Some(assignment.title.clone()),
                        message: format!(
                            "multiple-choice question '{}' has no answer key; every response will score zero",
                            question.prompt
                        ),
                    }),
                    Some(key) => {
                        let key_text = display_value(&key.answer);
                        if !question.options.is_empty() && !question.options.contains(&key_text) {
                            warnings.push(ValidationWarning {
                                context: Some(assignment.title.clone()),
                                message: format!(
                                    "answer key '{key_text}' is not among the options of '{}'",
                                    question.prompt
                                ),
                            });
                        }
                    }
                }
            }
            if question.marks == 0 {
                warnings.push(ValidationWarning {
                    context: Some(assignment.title.clone()),
                    message: format!("question '{}' is worth zero marks", question.prompt),
                });
            }
        }

        let question_total: u32 = assignment.questions.iter().map(|q| q.marks).sum();
        if !assignment.questions.is_empty() && assignment.max_marks != question_total {
            warnings.push(ValidationWarning {
                context: Some(assignment.title.clone()),
                message: format!(
                    "max_marks is {} but questions add up to {question_total}",
                    assignment.max_marks
                ),
            });
        }
    }

    // Check for submissions that leave questions unanswered
    for submission in &course.submissions {
        let Some(assignment) = course
            .assignments
            .iter()
            .find(|a| a.id == submission.assignment_id)
        else {
            continue;
        };
        if submission.answers.len() < assignment.questions.len() {
            warnings.push(ValidationWarning {
                context: Some(assignment.title.clone()),
                message: format!(
                    "a submission answers {} of {} questions",
                    submission.answers.len(),
                    assignment.questions.len()
                ),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    const VALID_COURSE: &str = r#"
[course]
name = "Intro to Databases"
description = "Relational fundamentals"

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
due_date = "2026-09-15T23:59:00Z"

[[assignments.questions]]
kind = "multiple-choice"
prompt = "Which normal form removes transitive dependencies?"
options = ["1NF", "2NF", "3NF"]
answer = "3NF"
marks = 20

[[assignments.questions]]
kind = "free-text"
prompt = "Explain the difference between 2NF and 3NF."
marks = 50

[[submissions]]
student = "sam@example.edu"
assignment = "Normalization Quiz"

[submissions.answers]
1 = "3NF"
2 = "2NF removes partial dependencies while 3NF removes transitive ones."

[[submissions]]
student = "ana@example.edu"
assignment = "Normalization Quiz"

[submissions.answers]
1 = "2NF"
"#;

    #[test]
    fn parse_valid_course() {
        let course = parse_course_str(VALID_COURSE, &PathBuf::from("course.toml")).unwrap();
        assert_eq!(course.name, "Intro to Databases");
        assert_eq!(course.users.len(), 3);
        assert_eq!(course.assignments.len(), 1);
        assert_eq!(course.submissions.len(), 2);

        let assignment = &course.assignments[0];
        assert_eq!(assignment.max_marks, 70);
        assert_eq!(assignment.questions.len(), 2);
        assert_eq!(assignment.questions[0].kind, QuestionKind::MultipleChoice);
        assert!(assignment.due_date.is_some());

        let sam = course
            .users
            .iter()
            .find(|u| u.email == "sam@example.edu")
            .unwrap();
        let submission = &course.submissions[0];
        assert_eq!(submission.student_id, sam.id);
        assert_eq!(submission.assignment_id, assignment.id);
        assert_eq!(
            submission.answers.get(&assignment.questions[0].id),
            Some(&json!("3NF"))
        );
    }

    #[test]
    fn parse_missing_optional_fields() {
        let toml = r#"
[course]
name = "Minimal"

[[students]]
name = "Sam Okafor"
email = "sam@example.edu"
"#;
        let course = parse_course_str(toml, &PathBuf::from("course.toml")).unwrap();
        assert_eq!(course.description, "");
        assert_eq!(course.users.len(), 1);
        assert_eq!(course.users[0].role, Role::Student);
        assert!(course.assignments.is_empty());
        assert!(course.submissions.is_empty());
    }

    #[test]
    fn explicit_max_marks_wins_over_question_sum() {
        let toml = r#"
[course]
name = "Course"

[[faculty]]
name = "Priya Nair"
email = "priya@example.edu"

[[assignments]]
title = "Quiz"
max_marks = 100

[[assignments.questions]]
kind = "mcq"
prompt = "Pick one."
options = ["a", "b"]
answer = "a"
marks = 20
"#;
        let course = parse_course_str(toml, &PathBuf::from("course.toml")).unwrap();
        assert_eq!(course.assignments[0].max_marks, 100);
        // The mismatch is flagged rather than rejected.
        let warnings = validate_course(&course);
        assert!(warnings.iter().any(|w| w.message.contains("add up to 20")));
    }

    #[test]
    fn unknown_student_email_fails() {
        let toml = r#"
[course]
name = "Course"

[[faculty]]
name = "Priya Nair"
email = "priya@example.edu"

[[assignments]]
title = "Quiz"

[[assignments.questions]]
kind = "free-text"
prompt = "Explain."
marks = 10

[[submissions]]
student = "ghost@example.edu"
assignment = "Quiz"
"#;
        let err = parse_course_str(toml, &PathBuf::from("course.toml")).unwrap_err();
        assert!(err.to_string().contains("unknown student"));
    }

    #[test]
    fn answer_index_out_of_range_fails() {
        let toml = r#"
[course]
name = "Course"

[[faculty]]
name = "Priya Nair"
email = "priya@example.edu"

[[students]]
name = "Sam Okafor"
email = "sam@example.edu"

[[assignments]]
title = "Quiz"

[[assignments.questions]]
kind = "free-text"
prompt = "Explain."
marks = 10

[[submissions]]
student = "sam@example.edu"
assignment = "Quiz"

[submissions.answers]
3 = "an answer to a question that does not exist"
"#;
        let err = parse_course_str(toml, &PathBuf::from("course.toml")).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn unknown_question_kind_fails() {
        let toml = r#"
[course]
name = "Course"

[[faculty]]
name = "Priya Nair"
email = "priya@example.edu"

[[assignments]]
title = "Quiz"

[[assignments.questions]]
kind = "essay"
prompt = "Explain."
marks = 10
"#;
        let err = parse_course_str(toml, &PathBuf::from("course.toml")).unwrap_err();
        assert!(err.to_string().contains("unknown question kind"));
    }

    #[test]
    fn validate_flags_mcq_without_answer_key() {
        let toml = r#"
[course]
name = "Course"

[[faculty]]
name = "Priya Nair"
email = "priya@example.edu"

[[assignments]]
title = "Quiz"

[[assignments.questions]]
kind = "multiple-choice"
prompt = "Pick one."
options = ["a", "b"]
marks = 10
"#;
        let course = parse_course_str(toml, &PathBuf::from("course.toml")).unwrap();
        let warnings = validate_course(&course);
        assert!(warnings.iter().any(|w| w.message.contains("no answer key")));
    }

    #[test]
    fn validate_flags_assignment_without_questions() {
        let toml = r#"
[course]
name = "Course"

[[faculty]]
name = "Priya Nair"
email = "priya@example.edu"

[[assignments]]
title = "Empty Quiz"
"#;
        let course = parse_course_str(toml, &PathBuf::from("course.toml")).unwrap();
        let warnings = validate_course(&course);
        assert!(warnings.iter().any(|w| w.message.contains("no questions")));
    }

    #[test]
    fn validate_flags_key_outside_options() {
        let toml = r#"
[course]
name = "Course"

[[faculty]]
name = "Priya Nair"
email = "priya@example.edu"

[[assignments]]
title = "Quiz"

[[assignments.questions]]
kind = "multiple-choice"
prompt = "Pick one."
options = ["a", "b"]
answer = "c"
marks = 10
"#;
        let course = parse_course_str(toml, &PathBuf::from("course.toml")).unwrap();
        let warnings = validate_course(&course);
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("not among the options")));
    }

    #[test]
    fn validate_flags_incomplete_submission() {
        let course = parse_course_str(VALID_COURSE, &PathBuf::from("course.toml")).unwrap();
        let warnings = validate_course(&course);
        // Ana answered one of two questions.
        assert!(warnings
            .iter()
            .any(|w| w.message.contains("answers 1 of 2 questions")));
    }

    #[test]
    fn parse_malformed_toml() {
        let bad = "this is not [valid toml }{";
        let result = parse_course_str(bad, &PathBuf::from("bad.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn load_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("course.toml");
        std::fs::write(&file_path, VALID_COURSE).unwrap();

        let courses = load_course_directory(dir.path()).unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].name, "Intro to Databases");
    }
}
