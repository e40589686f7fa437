use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One row of the cleaned library spreadsheet.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct InputRow {
    #[serde(alias = "titulo", default)]
    pub title: String,
    #[serde(alias = "autor", default)]
    pub author: String,
    pub isbn: String, // 13 digits, normalized upstream
}

/// Body of a `search.json` response, plus the injected `status`.
///
/// Unknown top-level fields (`numFound`, `q`, ...) are kept in `extra` so a
/// cached envelope is written back exactly as it was received.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SearchEnvelope {
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default, deserialize_with = "lenient_docs")]
    pub docs: Option<Vec<SearchDoc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_status() -> u16 {
    200
}

impl SearchEnvelope {
    /// Envelope synthesized for a non-success HTTP answer.
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            docs: Some(vec![]),
            extra: Map::new(),
        }
    }

    pub fn docs(&self) -> &[SearchDoc] {
        self.docs.as_deref().unwrap_or_default()
    }
}

/// One candidate record from the search response.
///
/// Field types are read loosely: a scalar where a list is expected becomes a
/// one-element list, numeric strings become numbers, and anything else
/// unusable reads as absent. One odd field never costs the whole envelope.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct SearchDoc {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_list", skip_serializing_if = "Option::is_none")]
    pub author_name: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub edition_count: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub number_of_pages_median: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    pub first_publish_year: Option<i64>,
    #[serde(default, deserialize_with = "lenient_list", skip_serializing_if = "Option::is_none")]
    pub publisher: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_list", skip_serializing_if = "Option::is_none")]
    pub subject: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(scalar_text))
}

fn lenient_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => Some(items.into_iter().filter_map(scalar_text).collect()),
        Some(other) => scalar_text(other).map(|text| vec![text]),
        None => None,
    })
}

fn lenient_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64)),
        Some(Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    })
}

/// Keeps the docs that read as [`SearchDoc`] and drops the rest.
fn lenient_docs<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<SearchDoc>>, D::Error> {
    let Some(Value::Array(items)) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let docs = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<SearchDoc>(item) {
            Ok(doc) => Some(doc),
            Err(err) => {
                log::debug!("Skipping unreadable search doc: {}", err);
                None
            }
        })
        .collect();
    Ok(Some(docs))
}

/// How the matched fields of an [`EnrichedRow`] were obtained.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Provenance {
    /// Best-ranked search candidate, `search_ta`.
    Matched,
    /// Search answered with no candidates, `none`.
    NoMatch,
    /// The row failed; carries the error kind, `error:<kind>`.
    Failed(String),
}

impl Provenance {
    pub fn is_failure(&self) -> bool {
        !matches!(self, Provenance::Matched)
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Matched => f.write_str("search_ta"),
            Provenance::NoMatch => f.write_str("none"),
            Provenance::Failed(kind) => write!(f, "error:{}", kind),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown provenance tag `{0}`")]
pub struct UnknownProvenance(pub String);

impl TryFrom<String> for Provenance {
    type Error = UnknownProvenance;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "search_ta" => Ok(Provenance::Matched),
            "none" => Ok(Provenance::NoMatch),
            other => match other.strip_prefix("error:") {
                Some(kind) => Ok(Provenance::Failed(kind.to_string())),
                None => Err(UnknownProvenance(value)),
            },
        }
    }
}

impl From<Provenance> for String {
    fn from(value: Provenance) -> Self {
        value.to_string()
    }
}

/// One output row. Column names match the spreadsheet the notebooks read.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EnrichedRow {
    pub isbn: String,
    #[serde(rename = "titulo_planilha")]
    pub sheet_title: String,
    #[serde(rename = "autor_planilha")]
    pub sheet_author: String,
    #[serde(rename = "titulo_ol")]
    pub title: Option<String>,
    #[serde(rename = "autores_ol")]
    pub authors: Option<String>,
    #[serde(rename = "paginas")]
    pub pages: Option<i64>,
    #[serde(rename = "ano_pub")]
    pub first_publish_year: Option<i64>,
    #[serde(rename = "editora")]
    pub publishers: Option<String>,
    #[serde(rename = "categorias")]
    pub subjects: Option<String>,
    #[serde(rename = "obra_key")]
    pub work_key: Option<String>,
    #[serde(rename = "fonte")]
    pub provenance: Provenance,
    pub http_status: Option<u16>,
}

impl EnrichedRow {
    pub const COLUMNS: [&'static str; 12] = [
        "isbn",
        "titulo_planilha",
        "autor_planilha",
        "titulo_ol",
        "autores_ol",
        "paginas",
        "ano_pub",
        "editora",
        "categorias",
        "obra_key",
        "fonte",
        "http_status",
    ];

    /// Row with every matched field null.
    pub fn blank(input: &InputRow, provenance: Provenance, http_status: Option<u16>) -> Self {
        Self {
            isbn: input.isbn.clone(),
            sheet_title: input.title.clone(),
            sheet_author: input.author.clone(),
            title: None,
            authors: None,
            pages: None,
            first_publish_year: None,
            publishers: None,
            subjects: None,
            work_key: None,
            provenance,
            http_status,
        }
    }

    pub fn failed(input: &InputRow, kind: &str) -> Self {
        Self::blank(input, Provenance::Failed(kind.to_string()), None)
    }

    pub fn has_matched_fields(&self) -> bool {
        self.title.is_some()
            || self.authors.is_some()
            || self.pages.is_some()
            || self.first_publish_year.is_some()
            || self.publishers.is_some()
            || self.subjects.is_some()
            || self.work_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::{EnrichedRow, InputRow, Provenance, SearchEnvelope};
    use serde_json::json;

    #[test]
    fn provenance_tags_round_trip_through_text() {
        for tag in ["search_ta", "none", "error:Timeout"] {
            let parsed = Provenance::try_from(tag.to_string()).expect("known tag");
            assert_eq!(parsed.to_string(), tag);
        }
        assert!(Provenance::try_from("isbn".to_string()).is_err());
    }

    #[test]
    fn only_matched_rows_are_not_failures() {
        assert!(!Provenance::Matched.is_failure());
        assert!(Provenance::NoMatch.is_failure());
        assert!(Provenance::Failed("Timeout".to_string()).is_failure());
    }

    #[test]
    fn envelope_defaults_status_and_tolerates_null_docs() {
        let envelope: SearchEnvelope =
            serde_json::from_str(r#"{"numFound": 0, "docs": null}"#).expect("parse");
        assert_eq!(envelope.status, 200);
        assert!(envelope.docs().is_empty());
        assert_eq!(envelope.extra.get("numFound"), Some(&serde_json::json!(0)));
    }

    #[test]
    fn failed_rows_have_no_status_and_no_fields() {
        let input = InputRow {
            title: "Dom Casmurro".to_string(),
            author: "Machado de Assis".to_string(),
            isbn: "9788535910667".to_string(),
        };
        let row = EnrichedRow::failed(&input, "ConnectionError");
        assert_eq!(row.provenance.to_string(), "error:ConnectionError");
        assert_eq!(row.http_status, None);
        assert!(!row.has_matched_fields());
        assert_eq!(row.sheet_title, "Dom Casmurro");
    }

    #[test]
    fn loosely_typed_doc_fields_are_coerced() {
        let envelope: SearchEnvelope = serde_json::from_value(json!({
            "docs": [{
                "key": "/works/OL1W",
                "title": 1984,
                "author_name": "George Orwell",
                "publisher": ["Penguin", null, 7],
                "number_of_pages_median": "328",
                "edition_count": 12.0,
                "first_publish_year": "unknown",
                "subject": {"not": "a list"}
            }]
        }))
        .expect("parse");

        let doc = &envelope.docs()[0];
        assert_eq!(doc.title.as_deref(), Some("1984"));
        assert_eq!(doc.author_name, Some(vec!["George Orwell".to_string()]));
        assert_eq!(doc.publisher, Some(vec!["Penguin".to_string(), "7".to_string()]));
        assert_eq!(doc.number_of_pages_median, Some(328));
        assert_eq!(doc.edition_count, Some(12));
        assert_eq!(doc.first_publish_year, None);
        assert_eq!(doc.subject, None);
    }

    #[test]
    fn unreadable_docs_are_skipped_not_fatal() {
        let envelope: SearchEnvelope = serde_json::from_value(json!({
            "docs": ["stray string", {"title": "Dune", "author_name": ["Frank Herbert"]}, 42]
        }))
        .expect("parse");

        assert_eq!(envelope.docs().len(), 1);
        assert_eq!(envelope.docs()[0].title.as_deref(), Some("Dune"));
    }

    #[test]
    fn docs_that_are_not_a_list_read_as_empty() {
        let envelope: SearchEnvelope =
            serde_json::from_value(json!({"docs": "oops"})).expect("parse");
        assert!(envelope.docs().is_empty());
    }
}
