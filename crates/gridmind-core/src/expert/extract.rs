//! Code extraction from free-form model responses.
//!
//! The contract with the model: the last fenced code block in the response is
//! the program. A response with no fence is taken wholesale. Extraction is a
//! single deterministic step; whatever comes out goes straight to the
//! sandbox, never to this process's own interpreter.

/// Extract the candidate program from a model response.
///
/// Returns `None` when no non-empty program can be found (maps to the
/// `no_code` failure kind).
pub fn extract_program(response: &str) -> Option<String> {
    let fences: Vec<usize> = response.match_indices("```").map(|(i, _)| i).collect();

    let program = if fences.len() >= 2 {
        // Last complete fence pair; an unclosed trailing fence is ignored.
        let pairs = fences.len() / 2;
        let open = fences[pairs * 2 - 2];
        let close = fences[pairs * 2 - 1];
        strip_language_tag(&response[open + 3..close])
    } else {
        response.trim().to_string()
    };

    if program.is_empty() {
        None
    } else {
        Some(program)
    }
}

/// Drop a leading language tag line (` ```python `) from fence contents.
fn strip_language_tag(inner: &str) -> String {
    match inner.split_once('\n') {
        Some((first, rest)) => {
            let tag = first.trim();
            if !tag.is_empty() && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                rest.trim().to_string()
            } else {
                inner.trim().to_string()
            }
        }
        None => inner.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_single_fenced_block() {
        let response = "Here is my solution:\n```python\ndef transform(grid):\n    return grid\n```\nDone.";
        let program = extract_program(response).unwrap();
        assert_eq!(program, "def transform(grid):\n    return grid");
    }

    #[test]
    fn test_takes_last_of_multiple_blocks() {
        let response = "```python\nfirst\n```\nsome prose\n```python\nsecond\n```";
        assert_eq!(extract_program(response).unwrap(), "second");
    }

    #[test]
    fn test_no_fence_takes_whole_response() {
        let response = "def transform(grid):\n    return grid";
        assert_eq!(extract_program(response).unwrap(), response);
    }

    #[test]
    fn test_fence_without_language_tag() {
        let response = "```\ndef transform(grid):\n    return grid\n```";
        assert_eq!(
            extract_program(response).unwrap(),
            "def transform(grid):\n    return grid"
        );
    }

    #[test]
    fn test_first_code_line_is_not_eaten_as_tag() {
        // `x=1` is not a bare language tag; it must survive.
        let response = "```\nx=1\nreturn x\n```";
        assert_eq!(extract_program(response).unwrap(), "x=1\nreturn x");
    }

    #[test]
    fn test_empty_response_yields_none() {
        assert!(extract_program("").is_none());
        assert!(extract_program("   \n  ").is_none());
        assert!(extract_program("```python\n```").is_none());
    }

    #[test]
    fn test_unclosed_trailing_fence_ignored() {
        let response = "```python\ncomplete\n```\ntrailing ```";
        assert_eq!(extract_program(response).unwrap(), "complete");
    }
}
