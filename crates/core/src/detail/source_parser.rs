//! Heuristic Java/Kotlin source scanner for the base spec's `docs`/`source`
//! resolution path: pulls Javadoc-style comment paragraphs and public or
//! protected method signatures out of a source file without a real parser,
//! matching the contract's explicit tolerance for an imperfect heuristic.

use once_cell::sync::Lazy;
use regex::Regex;

static JAVADOC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*\*(.*?)\*/").unwrap());

static METHOD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?:public|protected)\s+(?:static\s+|final\s+|abstract\s+|synchronized\s+|native\s+|open\s+|override\s+|suspend\s+)*(?:<[^>]+>\s+)?([\w.\[\]<>,\s]+?)\s+(\w+)\s*\(([^)]*)\)\s*(?:throws\s+[\w.,\s]+)?\s*[{;]",
    )
    .unwrap()
});

/// Returns `(signatures, doc)`. Either half may be empty/`None` — the base
/// spec treats "no signatures found" as a valid outcome, not an error.
pub fn parse(text: &str) -> (Vec<String>, Option<String>) {
    (extract_signatures(text), extract_doc(text))
}

fn extract_doc(text: &str) -> Option<String> {
    let paragraphs: Vec<String> = JAVADOC_RE
        .captures_iter(text)
        .map(|c| clean_javadoc_block(&c[1]))
        .filter(|p| !p.is_empty())
        .collect();

    if paragraphs.is_empty() {
        None
    } else {
        Some(paragraphs.join("\n\n"))
    }
}

fn clean_javadoc_block(block: &str) -> String {
    block
        .lines()
        .map(|line| {
            line.trim()
                .trim_start_matches('*')
                .trim()
        })
        .filter(|line| !line.starts_with('@'))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

fn extract_signatures(text: &str) -> Vec<String> {
    METHOD_RE
        .captures_iter(text)
        .map(|c| {
            let return_type = c[1].split_whitespace().collect::<Vec<_>>().join(" ");
            let name = &c[2];
            let params = c[3].split_whitespace().collect::<Vec<_>>().join(" ");
            format!("{return_type} {name}({params})")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_a_single_javadoc_paragraph() {
        let source = "/**\n * Greets the world.\n * @return nothing\n */\npublic void greet() {}";
        let (_, doc) = parse(source);
        assert_eq!(doc.as_deref(), Some("Greets the world."));
    }

    #[test]
    fn extracts_public_and_protected_methods_only() {
        let source = "public void a() {}\nprivate void b() {}\nprotected int c(String s) {}";
        let (signatures, _) = parse(source);
        assert_eq!(signatures.len(), 2);
        assert!(signatures[0].contains("a()"));
        assert!(signatures[1].contains("c(String s)"));
    }

    #[test]
    fn no_javadoc_yields_none() {
        let (_, doc) = parse("public void plain() {}");
        assert!(doc.is_none());
    }

    #[test]
    fn handles_decompiler_style_output_without_throws() {
        let source = "public abstract class Foo {\n    public abstract void run();\n}";
        let (signatures, _) = parse(source);
        assert!(signatures.iter().any(|s| s.contains("run()")));
    }
}
