//! Few-shot prompt builders and response parsers for the extraction and
//! search collaborators.
//!
//! The prompts keep the model on a rigid line format so the parsers stay
//! simple. A label of `none` means the model could not assign a sensible
//! category; those pairs are dropped during parsing.

use entigram_core::{ExtractedEntity, RowId, SourceRow};
use regex::Regex;

/// Few-shot block teaching the entity/label line format.
const EXTRACTION_EXAMPLES: &str = "\
row: 0 | text: slept badly, long shower, skipped breakfast
0 | sleep | activities
0 | shower | activities
0 | breakfast | meals

row: 1 | text: the 1990s revival and early 2000s nostalgia
1 | 1990s | decades
1 | early 2000s | decades
";

/// Build the prompt for one extraction pass over `rows`.
///
/// When `query` is set the model is told to keep only entities that are
/// instances of the queried category; relevance filtering happens in the
/// model, not in the caller.
pub fn extraction_prompt(rows: &[SourceRow], query: Option<&str>) -> String {
    let mut prompt = String::from(
        "Extract the notable entities from each row below. Answer with one \
         line per entity occurrence, in the exact format:\n\
         row_id | entity | label\n\
         Labels are short lower-case category names (e.g. activities, \
         decades, genders). Use the label none when no category fits.\n\n",
    );
    if let Some(query) = query {
        prompt.push_str(&format!(
            "Only report entities that are instances of the category \
             {query:?}, and label them {query:?}.\n\n"
        ));
    }
    prompt.push_str("Examples:\n");
    prompt.push_str(EXTRACTION_EXAMPLES);
    prompt.push_str("\nRows:\n");
    for row in rows {
        // Rows are single-line in the prompt; embedded newlines would break
        // the line-oriented answer format.
        let text = row.text.replace('\n', " ");
        prompt.push_str(&format!("row: {} | text: {}\n", row.id, text));
    }
    prompt.push_str("\nAnswer:\n");
    prompt
}

/// Parse the extraction answer lines into entity occurrences.
///
/// Malformed lines and `none` labels are skipped rather than failing the
/// whole response.
pub fn parse_extraction_response(response: &str) -> Vec<ExtractedEntity> {
    let line_re = Regex::new(r"^\s*(\d+)\s*\|\s*([^|]+?)\s*\|\s*([^|]+?)\s*$")
        .expect("static regex");
    let mut extracted = Vec::new();
    for line in response.lines() {
        let Some(caps) = line_re.captures(line) else {
            continue;
        };
        let Ok(row_id) = caps[1].parse::<RowId>() else {
            continue;
        };
        let entity = caps[2].trim();
        let label = caps[3].trim().to_lowercase();
        if entity.is_empty() || label.is_empty() || label == "none" {
            continue;
        }
        extracted.push(ExtractedEntity::new(entity, row_id, label));
    }
    extracted
}

/// Build the prompt asking which known categories match a search query.
pub fn search_prompt(query: &str, known: &[String]) -> String {
    format!(
        "Known categories: {}\n\
         Which of the known categories match the search {query:?}? Answer \
         with the matching category names, comma separated, best match \
         first. Answer none if nothing matches.\nAnswer: ",
        known.join(", ")
    )
}

/// Parse a comma-separated name list answer. Empty entries and `none` are
/// dropped.
pub fn parse_name_list(response: &str) -> Vec<String> {
    response
        .split(|c| c == ',' || c == '\n')
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("none"))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_prompt_lists_rows() {
        let rows = vec![
            SourceRow::new(0, "covid spread fast"),
            SourceRow::new(1, "line one\nline two"),
        ];
        let prompt = extraction_prompt(&rows, None);
        assert!(prompt.contains("row: 0 | text: covid spread fast"));
        // Embedded newlines are flattened.
        assert!(prompt.contains("row: 1 | text: line one line two"));
    }

    #[test]
    fn test_extraction_prompt_scopes_to_query() {
        let rows = vec![SourceRow::new(0, "dylan played")];
        let prompt = extraction_prompt(&rows, Some("musicians"));
        assert!(prompt.contains("instances of the category \"musicians\""));
    }

    #[test]
    fn test_parse_extraction_response() {
        let response = "\
0 | covid | diseases
garbage line
1 | Flu | diseases
2 | unclear | none
";
        let extracted = parse_extraction_response(response);
        assert_eq!(
            extracted,
            vec![
                ExtractedEntity::new("covid", 0, "diseases"),
                ExtractedEntity::new("Flu", 1, "diseases"),
            ]
        );
    }

    #[test]
    fn test_parse_extraction_response_empty() {
        assert!(parse_extraction_response("").is_empty());
        assert!(parse_extraction_response("no pipes here").is_empty());
    }

    #[test]
    fn test_search_prompt_lists_known() {
        let known = vec!["diseases".to_string(), "musicians".to_string()];
        let prompt = search_prompt("ill", &known);
        assert!(prompt.contains("diseases, musicians"));
        assert!(prompt.contains("\"ill\""));
    }

    #[test]
    fn test_parse_name_list() {
        assert_eq!(
            parse_name_list("diseases, musicians\nactivities"),
            vec!["diseases", "musicians", "activities"]
        );
        assert!(parse_name_list("none").is_empty());
        assert!(parse_name_list("  , ,").is_empty());
    }
}
