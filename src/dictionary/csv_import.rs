use tracing::warn;

const DEFINITION_SEPARATORS: &[char] = &[';', '\n', '|'];

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CsvImport {
    pub entries: Vec<(String, Vec<String>)>,
    /// 1-based line numbers that were rejected.
    pub skipped_lines: Vec<usize>,
}

/// Parse `word,definitions` rows. Definitions may hold several senses split
/// by `;`, `|` or a newline. A first line mentioning "word" or "definition"
/// is treated as a header.
pub fn parse_csv(content: &str) -> CsvImport {
    let mut import = CsvImport::default();

    for (index, line) in content.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if index == 0 {
            let lower = trimmed.to_lowercase();
            if lower.contains("word") || lower.contains("definition") {
                continue;
            }
        }

        let fields = split_line(trimmed);
        if fields.len() < 2 {
            warn!(line = line_no, "skipping row without a definition column");
            import.skipped_lines.push(line_no);
            continue;
        }

        let word = fields[0].trim();
        let definitions_text = fields[1].trim();
        if word.is_empty() || definitions_text.is_empty() {
            warn!(line = line_no, "skipping row with empty word or definition");
            import.skipped_lines.push(line_no);
            continue;
        }

        let definitions: Vec<String> = definitions_text
            .split(DEFINITION_SEPARATORS)
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .collect();
        if definitions.is_empty() {
            warn!(line = line_no, word, "no usable definitions");
            import.skipped_lines.push(line_no);
            continue;
        }

        import.entries.push((word.to_string(), definitions));
    }

    import
}

/// Split on commas outside double quotes. Quote characters themselves are
/// dropped and each field is trimmed.
fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut inside_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => inside_quotes = !inside_quotes,
            ',' if !inside_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());
    fields
}
