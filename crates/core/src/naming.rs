//! File names for delivered documents.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const MAX_PART_CHARS: usize = 80;

/// Strips diacritics and characters that are illegal in file names, collapses
/// whitespace and caps the result at 80 characters.
pub fn clean_name_part(raw: &str) -> String {
    let stripped: String = raw
        .nfd()
        .filter(|ch| !is_combining_mark(*ch))
        .filter(|ch| !matches!(ch, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ").chars().take(MAX_PART_CHARS).collect()
}

/// `"<BRAND> - <client>[ - <description>].pdf"`.
pub fn document_file_name(brand: &str, client: &str, description: &str) -> String {
    let client = match clean_name_part(client) {
        cleaned if cleaned.is_empty() => "Cliente".to_string(),
        cleaned => cleaned,
    };
    let description = clean_name_part(description);

    if description.is_empty() {
        format!("{brand} - {client}.pdf")
    } else {
        format!("{brand} - {client} - {description}.pdf")
    }
}

#[cfg(test)]
mod tests {
    use super::{clean_name_part, document_file_name};

    #[test]
    fn strips_accents_and_reserved_characters() {
        assert_eq!(clean_name_part("  Diseño / Logo:  Ñandú?  "), "Diseno Logo Nandu");
    }

    #[test]
    fn caps_long_parts() {
        let long = "a".repeat(120);
        assert_eq!(clean_name_part(&long).chars().count(), 80);
    }

    #[test]
    fn builds_file_name_with_fallback_client() {
        assert_eq!(document_file_name("PUBLICOM", "", ""), "PUBLICOM - Cliente.pdf");
        assert_eq!(
            document_file_name("ECORURAL", "Agro Sí", "Feria anual"),
            "ECORURAL - Agro Si - Feria anual.pdf"
        );
    }
}
