//! Entity annotation for document sections.
//!
//! Taggers are opaque text-analysis functions behind [`EntityTagger`]. The
//! built-in [`HeuristicTagger`] recognizes:
//!
//! | Label | Pattern |
//! |-------|---------|
//! | `DATE` | a standalone 4-digit year between 1000 and 2999 |
//! | `PERCENT` | a number immediately followed by `%` |
//! | `PROPER_NOUN` | two or more consecutive capitalized words |

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    pub text: String,
    pub label: String,
}

pub trait EntityTagger: Send + Sync {
    fn tag(&self, text: &str) -> Vec<Entity>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicTagger;

impl EntityTagger for HeuristicTagger {
    fn tag(&self, text: &str) -> Vec<Entity> {
        let mut out = Vec::new();
        let mut run: Vec<&str> = Vec::new();

        for raw in text.split_whitespace() {
            let word = raw.trim_matches(|c: char| c.is_ascii_punctuation() && c != '%');

            if is_capitalized(word) {
                run.push(word);
                // A word ending a clause closes the run after itself.
                if raw.ends_with(['.', ',', ';', ':']) {
                    flush_run(&mut run, &mut out);
                }
                continue;
            }
            flush_run(&mut run, &mut out);

            if is_year(word) {
                out.push(entity(word, "DATE"));
            } else if let Some(number) = word.strip_suffix('%') {
                if !number.is_empty() && number.parse::<f64>().is_ok() {
                    out.push(entity(word, "PERCENT"));
                }
            }
        }
        flush_run(&mut run, &mut out);

        out
    }
}

fn entity(text: &str, label: &str) -> Entity {
    Entity {
        text: text.to_string(),
        label: label.to_string(),
    }
}

fn is_capitalized(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) if first.is_uppercase() => chars.all(|c| c.is_alphabetic() || c == '-'),
        _ => false,
    }
}

fn is_year(word: &str) -> bool {
    word.len() == 4
        && word.chars().all(|c| c.is_ascii_digit())
        && matches!(word.as_bytes()[0], b'1' | b'2')
}

fn flush_run(run: &mut Vec<&str>, out: &mut Vec<Entity>) {
    if run.len() >= 2 {
        out.push(entity(&run.join(" "), "PROPER_NOUN"));
    }
    run.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(entities: &[Entity]) -> Vec<(&str, &str)> {
        entities
            .iter()
            .map(|e| (e.text.as_str(), e.label.as_str()))
            .collect()
    }

    #[test]
    fn tags_years_percentages_and_names() {
        let tagged = HeuristicTagger.tag(
            "In 2019 researchers at Stanford University found a 12.5% increase, per World Health Organization data.",
        );
        assert_eq!(
            labels(&tagged),
            vec![
                ("2019", "DATE"),
                ("Stanford University", "PROPER_NOUN"),
                ("12.5%", "PERCENT"),
                ("World Health Organization", "PROPER_NOUN"),
            ]
        );
    }

    #[test]
    fn single_capitalized_word_is_not_an_entity() {
        assert!(HeuristicTagger.tag("Results were mixed.").is_empty());
    }

    #[test]
    fn punctuation_splits_runs() {
        let tagged = HeuristicTagger.tag("Alice Smith, Bob Jones met.");
        assert_eq!(
            labels(&tagged),
            vec![("Alice Smith", "PROPER_NOUN"), ("Bob Jones", "PROPER_NOUN")]
        );
    }
}
