pub const ECO_TAG: &str = "ECO";
pub const OPENING_TAG: &str = "Opening";
pub const VARIATION_TAG: &str = "Variation";

/// One game as it appears on the wire: ordered tag pairs plus the raw movetext.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameRecord {
    // Insertion order is the serialization order.
    headers: Vec<(String, String)>,

    /// Raw movetext (comments, variations, NAGs and result included), trimmed
    /// of surrounding blank lines.
    pub movetext: String,

    /// Diagnostics for degradations recovered while parsing this record.
    pub parse_notes: Option<String>,
}

impl GameRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headers(&self) -> impl ExactSizeIterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn header_count(&self) -> usize {
        self.headers.len()
    }

    /// Exact-name lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn header_ignore_case(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Sets a header, overwriting an existing entry with the same exact name in
    /// place, or appending a new one.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.headers.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => *slot = value,
            None => self.headers.push((name, value)),
        }
    }

    /// Like `set_header`, but an existing entry whose name differs only in case
    /// is overwritten (keeping its original spelling).
    pub fn set_header_ignore_case(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            Some((_, slot)) => *slot = value,
            None => self.headers.push((name.to_string(), value)),
        }
    }

    pub fn has_content(&self) -> bool {
        !self.headers.is_empty() || !self.movetext.trim().is_empty()
    }

    /// The non-blank ECO/Opening/Variation headers of this record.
    pub fn classification(&self) -> OpeningClassification {
        let field = |tag: &str| {
            self.header_ignore_case(tag)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        OpeningClassification {
            eco: field(ECO_TAG),
            opening: field(OPENING_TAG),
            variation: field(VARIATION_TAG),
        }
    }

    /// Writes the present fields of `classification` into the headers. Absent
    /// fields leave any existing header untouched. Returns whether anything was
    /// applied.
    pub fn apply_classification(&mut self, classification: &OpeningClassification) -> bool {
        let mut applied = false;
        for (tag, value) in classification.fields() {
            if let Some(value) = value {
                self.set_header_ignore_case(tag, value);
                applied = true;
            }
        }
        applied
    }
}

/// Classification payload stored on trie nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpeningClassification {
    pub eco: Option<String>,
    pub opening: Option<String>,
    pub variation: Option<String>,
}

impl OpeningClassification {
    pub fn has_data(&self) -> bool {
        self.eco.is_some() || self.opening.is_some() || self.variation.is_some()
    }

    /// Overwrites only the fields `other` actually supplies.
    pub fn merge_from(&mut self, other: &OpeningClassification) {
        if let Some(eco) = &other.eco {
            self.eco = Some(eco.clone());
        }
        if let Some(opening) = &other.opening {
            self.opening = Some(opening.clone());
        }
        if let Some(variation) = &other.variation {
            self.variation = Some(variation.clone());
        }
    }

    fn fields(&self) -> [(&'static str, Option<&str>); 3] {
        [
            (ECO_TAG, self.eco.as_deref()),
            (OPENING_TAG, self.opening.as_deref()),
            (VARIATION_TAG, self.variation.as_deref()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_header_overwrites_in_place() {
        let mut game = GameRecord::new();
        game.set_header("Event", "First");
        game.set_header("White", "A");
        game.set_header("Event", "Second");

        let headers: Vec<_> = game.headers().collect();
        assert_eq!(headers, vec![("Event", "Second"), ("White", "A")]);
    }

    #[test]
    fn test_header_names_are_case_sensitive_for_storage() {
        let mut game = GameRecord::new();
        game.set_header("eco", "A00");
        game.set_header("ECO", "B00");

        assert_eq!(game.header_count(), 2);
        assert_eq!(game.header("eco"), Some("A00"));
        assert_eq!(game.header_ignore_case("Eco"), Some("A00"));
    }

    #[test]
    fn test_apply_classification_keeps_existing_when_field_absent() {
        let mut game = GameRecord::new();
        game.set_header("Opening", "Existing");
        game.set_header("eco", "A00");

        let applied = game.apply_classification(&OpeningClassification {
            eco: Some("C44".to_string()),
            opening: None,
            variation: Some("Main".to_string()),
        });

        assert!(applied);
        let headers: Vec<_> = game.headers().collect();
        assert_eq!(
            headers,
            vec![("Opening", "Existing"), ("eco", "C44"), ("Variation", "Main")]
        );
    }

    #[test]
    fn test_classification_ignores_blank_values() {
        let mut game = GameRecord::new();
        game.set_header("ECO", "  ");
        game.set_header("Opening", "King's Pawn");

        let classification = game.classification();
        assert_eq!(classification.eco, None);
        assert_eq!(classification.opening.as_deref(), Some("King's Pawn"));
        assert!(classification.has_data());
    }

    #[test]
    fn test_merge_never_blanks_a_field() {
        let mut target = OpeningClassification {
            eco: Some("C44".to_string()),
            opening: Some("King's Knight".to_string()),
            variation: None,
        };
        target.merge_from(&OpeningClassification {
            eco: None,
            opening: Some("Scotch".to_string()),
            variation: None,
        });

        assert_eq!(target.eco.as_deref(), Some("C44"));
        assert_eq!(target.opening.as_deref(), Some("Scotch"));
    }

    #[test]
    fn test_has_content() {
        let mut game = GameRecord::new();
        assert!(!game.has_content());
        game.movetext = "  ".to_string();
        assert!(!game.has_content());
        game.movetext = "1. e4".to_string();
        assert!(game.has_content());
    }
}
