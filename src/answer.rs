/// Answer for every negative question.
pub const NEGATIVE_ANSWER: &str = "The event does not occur";
/// Prefix shared by every positive answer.
pub const POSITIVE_PREFIX: &str = "The event happens at ";

const NEGATIVE_CONCLUSION: &str = "not occur";

/// "The event happens at stroke 2" / "The event happens at strokes 0,3".
///
/// Singular only when exactly one index matched.
pub fn positive_answer(indices: &[usize]) -> String {
    let joined = indices
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(",");
    if indices.len() == 1 {
        format!("{POSITIVE_PREFIX}stroke {joined}")
    } else {
        format!("{POSITIVE_PREFIX}strokes {joined}")
    }
}

/// Parses the index list back out of a positive answer.
pub fn parse_positive_indices(answer: &str) -> Option<Vec<usize>> {
    let rest = answer.strip_prefix(POSITIVE_PREFIX)?;
    let list = rest
        .strip_prefix("strokes ")
        .or_else(|| rest.strip_prefix("stroke "))?;
    list.split(',').map(|i| i.trim().parse().ok()).collect()
}

/// "stroke <i>: <caption>" line for the thinking block.
pub fn thinking_line(index: usize, caption: &str) -> String {
    format!("stroke {index}: {caption}")
}

/// Wraps `answer` in the `<thinking>` block built from the chunk's caption lines.
pub fn chain_of_thought(thinking: &[String], answer: &str) -> String {
    let conclusion = if answer == NEGATIVE_ANSWER {
        NEGATIVE_CONCLUSION.to_string()
    } else if let Some(rest) = answer.strip_prefix(POSITIVE_PREFIX) {
        rest.to_string()
    } else {
        answer.to_lowercase()
    };

    let mut lines = Vec::with_capacity(thinking.len() + 3);
    lines.push("<thinking>".to_string());
    lines.extend(thinking.iter().cloned());
    lines.push(format!("therefore the answer is {conclusion}"));
    lines.push("</thinking>".to_string());
    format!("{}\n<answer>{answer}</answer>", lines.join("\n"))
}

/// Final answer text, wrapped or bare depending on `use_cot`.
pub fn compose(thinking: &[String], answer: &str, use_cot: bool) -> String {
    if use_cot {
        chain_of_thought(thinking, answer)
    } else {
        answer.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pluralization_follows_index_count() {
        assert_eq!(positive_answer(&[2]), "The event happens at stroke 2");
        assert_eq!(positive_answer(&[0, 3]), "The event happens at strokes 0,3");
        assert_eq!(parse_positive_indices("The event happens at strokes 0,3"), Some(vec![0, 3]));
        assert_eq!(parse_positive_indices("The event happens at stroke 4"), Some(vec![4]));
        assert_eq!(parse_positive_indices(NEGATIVE_ANSWER), None);
    }

    #[test]
    fn wraps_positive_answer() {
        let thinking = vec![
            thinking_line(0, "upper player hits a smash back"),
            thinking_line(1, "no caption"),
        ];
        let wrapped = chain_of_thought(&thinking, "The event happens at strokes 0,1");
        assert_eq!(
            wrapped,
            "<thinking>\nstroke 0: upper player hits a smash back\nstroke 1: no caption\n\
             therefore the answer is strokes 0,1\n</thinking>\n\
             <answer>The event happens at strokes 0,1</answer>"
        );
    }

    #[test]
    fn negative_and_unrecognized_conclusions() {
        let thinking = vec![thinking_line(0, "x")];
        assert!(chain_of_thought(&thinking, NEGATIVE_ANSWER)
            .contains("therefore the answer is not occur\n</thinking>"));
        assert!(chain_of_thought(&thinking, "Maybe Later")
            .contains("therefore the answer is maybe later\n"));
        assert_eq!(compose(&thinking, NEGATIVE_ANSWER, false), NEGATIVE_ANSWER);
    }
}
