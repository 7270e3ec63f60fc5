//! Static sweep configuration. The swept axes are fixed tables compiled into
//! the binary; the CLI only configures paths and the backend endpoint.

/// Sampling temperatures to sweep. Total: 6 values.
pub const TEMPERATURES: &[f64] = &[0.0, 0.2, 0.4, 0.6, 0.8, 1.0];

/// Generative base models to sweep.
pub const GENERATIVE_MODELS: &[&str] = &["llama3.1", "llama3.2", "phi3", "mistral"];

/// Embedding models to sweep.
pub const EMBEDDING_MODELS: &[&str] = &["nomic-embed-text"];

/// Repetitions of the sentence set within each cell.
pub const REPETITIONS: usize = 1;

/// Name under which the per-cell derived session model is registered.
pub const SESSION_NAME: &str = "generator";

/// Worked-example instruction for the generative session. Teaches the
/// capitalized-variable / lowercase-value convention and the bare `_`
/// placeholder for information absent from the sentence.
pub const SYSTEM_INSTRUCTION: &str = r#"You are a logician who works with Prolog. You will receive a logical property and a sentence.
Modify the logical property according to the sentence and answer with the modified logical property.
If an information is not contained in the sentence, place an underscore in the place of the value or the variable.
The underscore must be not be surrounded by quotes, it should be _ and not "_".
Remember that words that starts with a capital letter are variables and words that starts with a lowercase letter are values.
Examples:
Logical property: hasColor(apple, red)
Sentence: The apple is green.
Answer: hasColor(apple, green)

Logical property: order(pizza, "1/1/1999", 12)
Sentence: I ordered a sushi at 14:00.
Answer: order(sushi, _, 14)"#;

/// Prompt sent per sentence, embedding the retrieved template literal.
pub fn adaptation_prompt(literal: &str, sentence: &str) -> String {
    format!(
        "Modify this logical property ```{literal}``` according to this sentence \"{sentence}\". \
         Answer only with the modified logical property in plain text. If an information is not \
         contained in the sentence, place an underscore in the place of the value."
    )
}

/// Canonical text form of a swept temperature, shared by artifact filenames,
/// summary rows, and stats keys so float keys never appear in a map.
pub fn format_temperature(temperature: f64) -> String {
    if temperature.fract() == 0.0 {
        format!("{temperature:.1}")
    } else {
        format!("{temperature}")
    }
}

/// The axes one sweep run iterates. Built from the static tables for the
/// CLI; tests construct reduced plans directly.
#[derive(Debug, Clone)]
pub struct SweepPlan {
    pub embedding_models: Vec<String>,
    pub generative_models: Vec<String>,
    pub temperatures: Vec<f64>,
    pub repetitions: usize,
}

impl SweepPlan {
    pub fn from_static_tables() -> Self {
        Self {
            embedding_models: EMBEDDING_MODELS.iter().map(|s| s.to_string()).collect(),
            generative_models: GENERATIVE_MODELS.iter().map(|s| s.to_string()).collect(),
            temperatures: TEMPERATURES.to_vec(),
            repetitions: REPETITIONS.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::format_temperature;

    #[test]
    fn whole_temperatures_keep_one_decimal() {
        assert_eq!(format_temperature(0.0), "0.0");
        assert_eq!(format_temperature(1.0), "1.0");
    }

    #[test]
    fn fractional_temperatures_print_verbatim() {
        assert_eq!(format_temperature(0.2), "0.2");
        assert_eq!(format_temperature(0.8), "0.8");
    }
}
