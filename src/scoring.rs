use std::cmp::Reverse;

use crate::models::SearchDoc;
use crate::normalize::normalize;

/// Ranking key for a candidate: independent title/author hits first,
/// edition count as the tie-break. Ordered field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MatchScore {
    pub hits: u8,
    pub editions: i64,
}

pub fn score(title: &str, author: &str, doc: &SearchDoc) -> MatchScore {
    let query_title = normalize(title);
    let query_author = normalize(author);
    let doc_title = normalize(doc.title.as_deref().unwrap_or(""));

    let title_hit = doc_title.contains(&query_title) || query_title.contains(&doc_title);
    let author_hit = doc
        .author_name
        .as_deref()
        .unwrap_or_default()
        .iter()
        .any(|name| normalize(name).contains(&query_author));

    MatchScore {
        hits: u8::from(title_hit) + u8::from(author_hit),
        editions: doc.edition_count.unwrap_or(0),
    }
}

/// Highest-scoring candidate; the earliest one wins a tie. There is no
/// minimum score, so a lone unrelated candidate is still returned.
pub fn best_candidate<'a>(title: &str, author: &str, docs: &'a [SearchDoc]) -> Option<&'a SearchDoc> {
    docs.iter()
        .enumerate()
        .max_by_key(|(index, doc)| (score(title, author, doc), Reverse(*index)))
        .map(|(_, doc)| doc)
}

#[cfg(test)]
mod tests {
    use super::{best_candidate, score, MatchScore};
    use crate::models::SearchDoc;

    fn doc(title: &str, authors: &[&str], editions: i64) -> SearchDoc {
        SearchDoc {
            title: Some(title.to_string()),
            author_name: Some(authors.iter().map(|a| a.to_string()).collect()),
            edition_count: Some(editions),
            ..SearchDoc::default()
        }
    }

    #[test]
    fn counts_title_and_author_hits_independently() {
        let candidate = doc("Clean Code: A Handbook of Agile Software Craftsmanship", &["Robert C. Martin"], 9);
        assert_eq!(
            score("Clean Code", "Martin", &candidate),
            MatchScore { hits: 2, editions: 9 }
        );
        assert_eq!(score("Clean Code", "Fowler", &candidate).hits, 1);
        assert_eq!(score("Refactoring", "Fowler", &candidate).hits, 0);
    }

    #[test]
    fn title_matches_in_either_direction_and_ignore_accents() {
        let candidate = doc("O Cortiço", &["Aluísio Azevedo"], 3);
        assert_eq!(score("o cortico (edicao de bolso)", "aluisio azevedo", &candidate).hits, 2);
    }

    #[test]
    fn author_hits_survive_transliteration() {
        let candidate = doc("Frygt og Bæven", &["Søren Kierkegaard"], 4);
        assert_eq!(score("Frygt og Baeven", "Soren Kierkegaard", &candidate).hits, 2);
    }

    #[test]
    fn full_match_beats_more_editions() {
        let unrelated = doc("Harry Potter", &["J. K. Rowling"], 400);
        let exact = doc("Clean Code", &["Robert Martin"], 1);
        let docs = vec![unrelated, exact];

        let best = best_candidate("Clean Code", "Robert Martin", &docs).expect("candidate");
        assert_eq!(best.title.as_deref(), Some("Clean Code"));
    }

    #[test]
    fn edition_count_breaks_ties() {
        let docs = vec![
            doc("Dune", &["Frank Herbert"], 12),
            doc("Dune", &["Frank Herbert"], 240),
        ];
        let best = best_candidate("Dune", "Frank Herbert", &docs).expect("candidate");
        assert_eq!(best.edition_count, Some(240));
    }

    #[test]
    fn earliest_candidate_wins_a_full_tie() {
        let mut first = doc("Dune", &["Frank Herbert"], 5);
        first.key = Some("/works/first".to_string());
        let mut second = doc("Dune", &["Frank Herbert"], 5);
        second.key = Some("/works/second".to_string());
        let docs = vec![first, second];

        let best = best_candidate("Dune", "Frank Herbert", &docs).expect("candidate");
        assert_eq!(best.key.as_deref(), Some("/works/first"));
    }

    #[test]
    fn lone_unrelated_candidate_still_wins() {
        let docs = vec![doc("Cookbook", &["Someone Else"], 0)];
        let best = best_candidate("Clean Code", "Robert Martin", &docs).expect("candidate");
        assert_eq!(score("Clean Code", "Robert Martin", best).hits, 0);
        assert!(best_candidate("Clean Code", "Robert Martin", &[]).is_none());
    }

    #[test]
    fn missing_fields_follow_substring_rules() {
        let bare = SearchDoc::default();
        // An empty doc title is a substring of any query title.
        assert_eq!(score("Clean Code", "Robert Martin", &bare), MatchScore { hits: 1, editions: 0 });

        let candidate = doc("Something", &["Anyone"], 2);
        assert_eq!(score("Else", "", &candidate).hits, 1);
    }
}
