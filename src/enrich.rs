use crate::error::Result;
use crate::models::{EnrichedRow, InputRow, Provenance, SearchDoc};
use crate::scoring::best_candidate;
use crate::search::{ResponseOrigin, SearchClient};

/// An enriched row and where its search response came from.
#[derive(Debug, Clone)]
pub struct RowOutcome {
    pub row: EnrichedRow,
    pub origin: ResponseOrigin,
}

/// Search, pick the best candidate, shape the output row.
pub fn enrich_row(client: &SearchClient, input: &InputRow) -> Result<RowOutcome> {
    let outcome = client.search(&input.title, &input.author)?;
    let status = outcome.envelope.status;

    let row = match best_candidate(&input.title, &input.author, outcome.envelope.docs()) {
        Some(doc) => matched_row(input, doc, status),
        None => EnrichedRow::blank(input, Provenance::NoMatch, Some(status)),
    };

    Ok(RowOutcome {
        row,
        origin: outcome.origin,
    })
}

pub fn matched_row(input: &InputRow, doc: &SearchDoc, status: u16) -> EnrichedRow {
    EnrichedRow {
        title: doc.title.clone(),
        authors: join_list(doc.author_name.as_deref()),
        pages: doc.number_of_pages_median,
        first_publish_year: doc.first_publish_year,
        publishers: join_list(doc.publisher.as_deref()),
        subjects: join_list(doc.subject.as_deref()),
        work_key: doc.key.clone(),
        ..EnrichedRow::blank(input, Provenance::Matched, Some(status))
    }
}

fn join_list(values: Option<&[String]>) -> Option<String> {
    values.map(|values| values.join(", "))
}

#[cfg(test)]
mod tests {
    use super::matched_row;
    use crate::models::{InputRow, Provenance, SearchDoc};

    fn input() -> InputRow {
        InputRow {
            title: "Clean Code".to_string(),
            author: "Robert Martin".to_string(),
            isbn: "9780132350884".to_string(),
        }
    }

    #[test]
    fn extracts_and_joins_candidate_fields() {
        let doc: SearchDoc = serde_json::from_value(serde_json::json!({
            "key": "/works/OL5735363W",
            "title": "Clean Code",
            "author_name": ["Robert C. Martin", "Dean Wampler"],
            "number_of_pages_median": 431,
            "first_publish_year": 2007,
            "publisher": ["Prentice Hall", "Pearson Education"],
            "subject": ["Agile software development", "Computer software"],
            "edition_count": 14
        }))
        .expect("doc");

        let row = matched_row(&input(), &doc, 200);

        assert_eq!(row.isbn, "9780132350884");
        assert_eq!(row.sheet_title, "Clean Code");
        assert_eq!(row.sheet_author, "Robert Martin");
        assert_eq!(row.authors.as_deref(), Some("Robert C. Martin, Dean Wampler"));
        assert_eq!(row.pages, Some(431));
        assert_eq!(row.first_publish_year, Some(2007));
        assert_eq!(row.publishers.as_deref(), Some("Prentice Hall, Pearson Education"));
        assert_eq!(
            row.subjects.as_deref(),
            Some("Agile software development, Computer software")
        );
        assert_eq!(row.work_key.as_deref(), Some("/works/OL5735363W"));
        assert_eq!(row.provenance, Provenance::Matched);
        assert_eq!(row.http_status, Some(200));
    }

    #[test]
    fn absent_lists_stay_null_and_empty_lists_become_empty_text() {
        let doc = SearchDoc {
            title: Some("Clean Code".to_string()),
            publisher: Some(vec![]),
            ..SearchDoc::default()
        };

        let row = matched_row(&input(), &doc, 200);

        assert_eq!(row.authors, None);
        assert_eq!(row.subjects, None);
        assert_eq!(row.publishers.as_deref(), Some(""));
        assert_eq!(row.pages, None);
    }
}
