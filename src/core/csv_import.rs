//! Two-column word lists.
//!
//! Each line is `foreign word,translation`. Fields may be wrapped in double
//! quotes, inside which `""` stands for one quote and commas are literal.

/// Rows read from an uploaded word list
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ParsedWordList {
    /// Trimmed (foreign word, translation) pairs in file order
    pub rows: Vec<(String, String)>,
    /// Non-blank lines that were not two non-empty fields
    pub skipped: usize,
}

pub fn parse_word_list(text: &str) -> ParsedWordList {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut parsed = ParsedWordList::default();

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match split_fields(line).as_deref() {
            Some([foreign, translation]) => {
                let foreign = foreign.trim();
                let translation = translation.trim();
                if foreign.is_empty() || translation.is_empty() {
                    parsed.skipped += 1;
                } else {
                    parsed.rows.push((foreign.to_string(), translation.to_string()));
                }
            }
            _ => parsed.skipped += 1,
        }
    }

    parsed
}

/// Split one line into fields; `None` when a quote is left open
fn split_fields(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }

    if in_quotes {
        return None;
    }
    fields.push(field);
    Some(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(foreign: &str, translation: &str) -> (String, String) {
        (foreign.to_string(), translation.to_string())
    }

    #[test]
    fn test_plain_rows() {
        let parsed = parse_word_list("hund,dog\r\nkatze, cat\n\n  maus ,mouse  \n");
        assert_eq!(parsed.rows, vec![row("hund", "dog"), row("katze", "cat"), row("maus", "mouse")]);
        assert_eq!(parsed.skipped, 0);
    }

    #[test]
    fn test_quoted_fields() {
        let parsed = parse_word_list("\"la casa, grande\",\"the \"\"big\"\" house\"\n");
        assert_eq!(parsed.rows, vec![row("la casa, grande", "the \"big\" house")]);
    }

    // Wrong column counts, empty sides and open quotes are skipped
    #[test]
    fn test_invalid_rows_are_skipped() {
        let parsed = parse_word_list("one\na,b,c\n,empty\nfine,row\n\"open,quote\n");
        assert_eq!(parsed.rows, vec![row("fine", "row")]);
        assert_eq!(parsed.skipped, 4);
    }

    #[test]
    fn test_byte_order_mark() {
        let parsed = parse_word_list("\u{feff}eins,one");
        assert_eq!(parsed.rows, vec![row("eins", "one")]);
    }
}
