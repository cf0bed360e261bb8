//! Areq's script builder, assembling the batch script sent to the job service.
//!
//! A batch script is made of an interpreter directive (the shebang), followed by one `#SBATCH`
//! directive per job option, followed by the user's script. The interpreter directive is taken
//! from the first line of the user's script when it has one, otherwise the client's default
//! interpreter is used.

pub mod options;
pub mod time;

use self::options::JobOptions;
use std::fmt;

/// The marker starting every interpreter directive.
pub const SHEBANG_MARKER: &str = "#!";

/// An interpreter directive, always starting with `#!`.
#[derive(Clone, Debug, PartialEq)]
pub struct Interpreter {
    directive: String,
}

impl Interpreter {
    /// Create a new interpreter from a bare path (`/bin/sh`) or a full directive (`#!/bin/sh`).
    /// Return None when the given value is blank.
    pub fn new(interpreter: &str) -> Option<Interpreter> {
        let interpreter = interpreter.trim();
        if interpreter.is_empty() {
            return None;
        }

        let directive = match interpreter.starts_with(SHEBANG_MARKER) {
            true => interpreter.to_string(),
            false => format!("{}{}", SHEBANG_MARKER, interpreter),
        };

        Some(Interpreter {
            directive: directive,
        })
    }

    /// Get the full directive, including the `#!` marker.
    pub fn get_directive(&self) -> &str {
        &self.directive
    }
}

impl fmt::Display for Interpreter {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(&self.directive)
    }
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ScriptError {
    /// The script has no content at all.
    #[error("script is empty")]
    Empty,
    /// The script has no interpreter directive, and no default interpreter is configured.
    #[error("interpreter not specified: either start the script with a shebang or configure an interpreter")]
    MissingInterpreter,
}

/// Split the given script into lines, after trimming it. Fail when nothing is left.
pub fn split_lines(script: &str) -> Result<Vec<&str>, ScriptError> {
    let lines: Vec<&str> = script.trim().lines().collect();

    match lines.is_empty() {
        true => Err(ScriptError::Empty),
        false => Ok(lines),
    }
}

/// Build the final batch script from the given lines, options and default interpreter.
///
/// When the first line is an interpreter directive, it is used verbatim as the first line of the
/// final script and is not repeated in the body. Otherwise, the default interpreter is required.
/// Option directives follow the interpreter directive, in the order the options were set, then
/// the remaining lines follow unchanged.
pub fn build_script(lines: &[&str], options: &JobOptions, default_interpreter: Option<&Interpreter>) -> Result<String, ScriptError> {
    if lines.iter().all(|line| line.trim().is_empty()) {
        return Err(ScriptError::Empty);
    }

    let (directive, body) = match lines[0].starts_with(SHEBANG_MARKER) {
        true => (lines[0], &lines[1..]),
        false => match default_interpreter {
            Some(interpreter) => (interpreter.get_directive(), lines),
            None => return Err(ScriptError::MissingInterpreter),
        },
    };

    let directives = options.to_directives();
    let mut script = Vec::with_capacity(1 + directives.len() + body.len());
    script.push(directive);
    script.extend(directives.iter().map(String::as_str));
    script.extend(body.iter().copied());

    Ok(script.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::options::{OptionKey, OptionValue};

    #[test]
    fn test_interpreter() {
        assert_eq!(Interpreter::new("/bin/sh").unwrap().get_directive(), "#!/bin/sh");
        assert_eq!(Interpreter::new("#!/usr/bin/env bash").unwrap().get_directive(), "#!/usr/bin/env bash");
        assert_eq!(Interpreter::new(" /bin/bash ").unwrap().to_string(), "#!/bin/bash");
        assert_eq!(Interpreter::new(""), None);
        assert_eq!(Interpreter::new("   "), None);
    }

    #[test]
    fn test_build_script() {
        let sh = Interpreter::new("/bin/sh");
        let empty = JobOptions::new();

        // The script's own shebang wins.
        assert_eq!(
            build_script(&["#!/bin/sh", "echo hi"], &empty, None),
            Ok(String::from("#!/bin/sh\necho hi")),
        );
        assert_eq!(
            build_script(&["#!/bin/bash", "echo hi"], &empty, sh.as_ref()),
            Ok(String::from("#!/bin/bash\necho hi")),
        );
        // The default interpreter is used otherwise, and the body is kept whole.
        assert_eq!(
            build_script(&["echo hi"], &empty, sh.as_ref()),
            Ok(String::from("#!/bin/sh\necho hi")),
        );
        assert_eq!(
            build_script(&["echo hi"], &empty, None),
            Err(ScriptError::MissingInterpreter),
        );
        // A lone interpreter line is a valid script.
        assert_eq!(
            build_script(&["#!/bin/sh"], &empty, None),
            Ok(String::from("#!/bin/sh")),
        );
        // Empty scripts are rejected.
        assert_eq!(build_script(&[], &empty, sh.as_ref()), Err(ScriptError::Empty));
        assert_eq!(build_script(&["", "  "], &empty, sh.as_ref()), Err(ScriptError::Empty));
    }

    #[test]
    fn test_build_script_with_options() {
        let mut options = JobOptions::new();
        options.nodes(1);

        assert_eq!(
            build_script(&["#!/bin/bash", "echo a", "echo b"], &options, None),
            Ok(String::from("#!/bin/bash\n#SBATCH --nodes=\"1\"\necho a\necho b")),
        );

        options.set(OptionKey::JobName, OptionValue::Text(String::from("test")));
        assert_eq!(
            build_script(&["echo a"], &options, Interpreter::new("/bin/sh").as_ref()),
            Ok(String::from("#!/bin/sh\n#SBATCH --nodes=\"1\"\n#SBATCH --job-name=\"test\"\necho a")),
        );
        // One directive per option, even without a body.
        assert_eq!(
            build_script(&["#!/bin/sh"], &options, None),
            Ok(String::from("#!/bin/sh\n#SBATCH --nodes=\"1\"\n#SBATCH --job-name=\"test\"")),
        );
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines("\n  echo hi\necho bye \n\n"), Ok(vec!["echo hi", "echo bye"]));
        assert_eq!(split_lines("#!/bin/sh\r\necho hi"), Ok(vec!["#!/bin/sh", "echo hi"]));
        assert_eq!(split_lines(" \n\t\n"), Err(ScriptError::Empty));
    }
}
