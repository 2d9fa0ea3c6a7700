use psc::lexical::{
    CommentState, clean_line_from_comments, find_matching_paren, is_simple_identifier,
    leading_indentation, mask_field_access, mask_strings, normalize_quotes, normalize_type,
    smart_split_args,
};

#[test]
fn smart_split_keeps_nested_and_quoted_commas() {
    assert_eq!(
        smart_split_args("a, (b, c), \"d,e\""),
        vec!["a", "(b, c)", "\"d,e\""]
    );
    assert_eq!(smart_split_args("t[i, j], {1, 2}"), vec!["t[i, j]", "{1, 2}"]);
    assert!(smart_split_args("   ").is_empty());
}

#[test]
fn matching_paren_is_total() {
    let text = "f(a, (b + c), g(d))";
    let mut seen = Vec::new();
    for (idx, ch) in text.char_indices() {
        if ch == '(' {
            let close = find_matching_paren(text, idx).expect("balanced input");
            assert!(close < text.len());
            assert_eq!(&text[close..=close], ")");
            seen.push(close);
        }
    }
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), 3);

    assert_eq!(find_matching_paren("f((a)", 1), None);
    assert_eq!(find_matching_paren("abc", 0), None);
    assert_eq!(find_matching_paren("(", 5), None);
}

#[test]
fn field_masking_is_idempotent() {
    let samples = [
        "p.x + q.nom",
        "a.b.c.d",
        "x ← 3.5 + t[0].val",
        "f(a).champ ← \"s.t\"",
        "élève.âge",
        "",
    ];
    for sample in samples {
        let once = mask_field_access(sample);
        assert_eq!(mask_field_access(&once), once, "sample {sample:?}");
        assert_eq!(once.len(), sample.len());
    }
    assert_eq!(mask_field_access("p.x + q.nom"), "p.  + q.   ");
    assert_eq!(mask_field_access("x ← 3.5"), "x ← 3.5");
}

#[test]
fn string_masking_keeps_quotes_and_length() {
    let text = "écrire(\"a(b\", 'c')";
    let masked = mask_strings(text);
    assert_eq!(masked.len(), text.len());
    assert!(masked.starts_with("écrire(\""));
    assert!(!masked.contains("a(b"));
    assert_eq!(find_matching_paren(&masked, "écrire".len()), Some(text.len() - 1));
}

#[test]
fn line_comments_are_split_off_outside_strings() {
    let cleaned = clean_line_from_comments("x ← 1 // un commentaire", CommentState::Normal);
    assert_eq!(cleaned.text, "x ← 1");
    assert_eq!(cleaned.line_comment.as_deref(), Some(" un commentaire"));

    let cleaned = clean_line_from_comments("écrire(\"http://psc\") // url", CommentState::Normal);
    assert_eq!(cleaned.text, "écrire(\"http://psc\")");
    assert_eq!(cleaned.line_comment.as_deref(), Some(" url"));

    let cleaned = clean_line_from_comments("c ← '/' // barre", CommentState::Normal);
    assert_eq!(cleaned.text, "c ← '/'");
}

#[test]
fn block_comments_span_lines() {
    let first = clean_line_from_comments("a ← 1 /* début", CommentState::Normal);
    assert_eq!(first.text, "a ← 1");
    assert_eq!(first.state, CommentState::InBlock);

    let middle = clean_line_from_comments("toujours dedans", first.state);
    assert_eq!(middle.text, "");
    assert_eq!(middle.state, CommentState::InBlock);

    let last = clean_line_from_comments("fin */ b ← 2", middle.state);
    assert_eq!(last.text.trim(), "b ← 2");
    assert_eq!(last.state, CommentState::Normal);

    let inline = clean_line_from_comments("a /* x */ b", CommentState::Normal);
    assert_eq!(inline.text, "a  b");
}

#[test]
fn identifiers_and_indentation() {
    assert!(is_simple_identifier("élève_2"));
    assert!(is_simple_identifier("  x  "));
    assert!(!is_simple_identifier("a.b"));
    assert!(!is_simple_identifier("2a"));
    assert!(!is_simple_identifier("t[0]"));
    assert_eq!(leading_indentation("\t  x ← 1"), "\t  ");
    assert_eq!(leading_indentation("x"), "");
}

#[test]
fn types_and_quotes_are_normalized() {
    let defs = psc::Definitions::standard();
    assert_eq!(normalize_type(&defs, "Chaine"), "chaîne");
    assert_eq!(normalize_type(&defs, " reel "), "réel");
    assert_eq!(normalize_type(&defs, "tableau[0..3]"), "tableau");
    assert_eq!(normalize_type(&defs, "Point"), "Point");
    assert_eq!(normalize_quotes("écrire(“bonjour”)"), "écrire(\"bonjour\")");
}
