mod common;
use common::*;

use psc::SourcePathError;

fn lines(expected: &[&str]) -> Vec<String> {
    expected.iter().map(|line| line.to_string()).collect()
}

#[test]
fn in_out_function_returns_its_parameters() {
    let source = r#"
Fonction incr(InOut x: entier)
Début
    x ← x + 1
Fin
n ← 5
incr(n)
"#;
    assert_eq!(
        body_lines(source),
        lines(&[
            "function incr(x)",
            "x = x + 1",
            "return x",
            "end",
            "n = 5",
            "n = incr(n)",
        ])
    );
}

#[test]
fn in_out_merges_with_returned_value() {
    let source = r#"
Fonction g(a: entier, InOut b: entier) : entier
Début
    b ← b * 2
    retourner a + b
Fin
r ← g(1, n)
g(2, n)
"#;
    assert_eq!(
        body_lines(source),
        lines(&[
            "function g(a, b)",
            "b = b * 2",
            "return a + b, b",
            "end",
            "r, n = g(1, n)",
            "_, n = g(2, n)",
        ])
    );
}

#[test]
fn bare_return_carries_in_out_values() {
    let source = r#"
Fonction h(InOut v)
Début
    si v > 10 alors
        retourner
    fsi
    v ← v + 1
Fin
"#;
    assert_eq!(
        body_lines(source),
        lines(&[
            "function h(v)",
            "if v > 10 then",
            "return v",
            "end",
            "v = v + 1",
            "return v",
            "end",
        ])
    );
}

#[test]
fn control_structures_keep_indentation() {
    let source = "Pour i de 0 à n - 1 Faire\n\tsi t[i] = 0 alors\n\t\técrire(\"zéro\")\n\tsinon si t[i] ≥ 10 alors\n\t\técrire(\"grand\")\n\tsinon\n\t\técrire(t[i])\n\tfsi\nfpour\n";
    assert_eq!(
        lua_body(source),
        "for i = 0, n - 1, 1 do\n\tif t[(i) + 1] == 0 then\n\t\t__psc_write(\"zéro\")\n\telseif t[(i) + 1] >= 10 then\n\t\t__psc_write(\"grand\")\n\telse\n\t\t__psc_write(t[(i) + 1])\n\tend\nend\n"
    );
}

#[test]
fn loops_translate_direction_and_glyphs() {
    let source = r#"
tant que i ≠ 3 faire
    i ← i + 1
ftq
Pour i de 3 à 1 décroissant Faire
    s ← concat(s, i)
fpour
"#;
    assert_eq!(
        body_lines(source),
        lines(&[
            "while i ~= 3 do",
            "i = i + 1",
            "end",
            "for i = 3, 1, -1 do",
            "s = (s .. i)",
            "end",
        ])
    );
}

#[test]
fn array_declaration_allocates_cells() {
    assert_eq!(
        body_lines("t ← tableau entier[0..2]"),
        lines(&[
            "t = {}",
            "for __i1 = ((0)) + 1, ((2)) + 1, 1 do",
            "t[__i1] = 0",
            "end",
        ])
    );
    assert_eq!(
        body_lines("m[1, j] ← 0"),
        lines(&["m[(1) + 1][(j) + 1] = 0"])
    );
}

#[test]
fn reads_follow_declared_types() {
    let source = r#"
Lexique
    n : entier
    nom : chaîne
    v : booléen
Début
    n ← lire()
    lire(nom)
    v ← lire()
Fin
"#;
    assert_eq!(
        body_lines(source),
        lines(&[
            "n = __psc_lire_nombre()",
            "nom = __psc_lire_chaine()",
            "v = __psc_lire()",
        ])
    );
}

#[test]
fn algorithm_header_and_program_markers_emit_nothing() {
    let source = r#"
Algorithme Somme
    Rôle : calcule une somme
    x ← 99
Fin
Début
    x ← 1
Fin
"#;
    assert_eq!(body_lines(source), lines(&["x = 1"]));
}

#[test]
fn function_lexicon_declares_locals() {
    let source = r#"
Fonction fact(n: entier) : entier
Lexique
    r, i : entier
Début
    r ← 1
    Pour i de 2 à n Faire
        r ← r * i
    fpour
    retourner r
Fin
"#;
    assert_eq!(
        body_lines(source),
        lines(&[
            "function fact(n)",
            "local r, i",
            "r = 1",
            "for i = 2, n, 1 do",
            "r = r * i",
            "end",
            "return r",
            "end",
        ])
    );
}

#[test]
fn collections_and_builtins() {
    let source = r#"
l ← (1, 2, 3)
x ← (1 + 2) * 3
p ← pile(1, 2)
t ← Table("a" → 1)
ajoutTeteListe(l, 0)
n ← longueur(s)
si estDans(3, l) alors
fsi
"#;
    assert_eq!(
        body_lines(source),
        lines(&[
            "l = __psc_liste_from_table({1, 2, 3})",
            "x = (1 + 2) * 3",
            "p = __psc_pile_from_values({1, 2})",
            "t = __psc_table_from_pairs(\"a\", 1)",
            "l = __psc_liste_ajout_tete(l, 0)",
            "n = #s",
            "if __psc_ensemble_estdans(3, l) then",
            "end",
        ])
    );
}

#[test]
fn keywords_and_constants_are_substituted() {
    let source = r#"
ok ← vrai et non faux
r ← a mod 2
q ← a ÷ 2
s ← concat("vrai", FIN_LIGNE)
"#;
    assert_eq!(
        body_lines(source),
        lines(&[
            "ok = true and not false",
            "r = a % 2",
            "q = a // 2",
            "s = (\"vrai\" .. '\\n')",
        ])
    );
}

#[test]
fn records_use_named_fields() {
    let source = r#"
Point = <x: entier, y: entier>
p ← Point(3, 4)
p.x ← p.x + 1
q ← <0, 0>
"#;
    assert_eq!(
        body_lines(source),
        lines(&["p = {x = 3, y = 4}", "p.x = p.x + 1", "q = {x = 0, y = 0}"])
    );
}

#[test]
fn comments_survive_with_lua_marker() {
    let source = "Début // programme\nx ← 1 // garder   ce texte ≠ rien\n    // seul\n//[[crochets]]\nFin";
    assert_eq!(
        lua_body(source),
        "-- programme\nx = 1 -- garder   ce texte ≠ rien\n    -- seul\n-- [[crochets]]\n"
    );

    let quiet = Transpiler::new(
        Definitions::standard(),
        TranspileConfig::default().without_runtime().without_comments(),
    );
    assert_eq!(quiet.transpile(source), "x = 1\n");
}

#[test]
fn smart_quotes_are_normalized() {
    assert_eq!(body_lines("écrire(“salut”)"), lines(&["__psc_write(\"salut\")"]));
}

#[test]
fn malformed_lines_pass_through() {
    assert_eq!(body_lines("x ← f((1, 2)"), lines(&["x = f((1, 2)"]));
    assert_eq!(body_lines("fsi\nFin"), Vec::<String>::new());
    assert_eq!(body_lines("retourner"), lines(&["return"]));
}

#[test]
fn every_builtin_maps_to_its_helper() {
    let defs = Definitions::standard();
    for def in defs.functions() {
        let args: Vec<String> = (1..=def.arity).map(|index| format!("a{index}")).collect();
        let source = format!("r ← {}({})", def.name, args.join(", "));
        let lua = lua_body(&source);
        assert!(
            lua.contains(def.helper),
            "{} should map to {}, got {lua}",
            def.name,
            def.helper
        );
        assert!(lua.starts_with("r = "), "{} produced {lua}", def.name);
    }
}

#[test]
fn runtime_is_prepended_by_default() {
    let lua = transpile("x ← 1");
    assert!(lua.starts_with(RUNTIME_LIBRARY));
    assert!(lua.ends_with("x = 1\n"));
}

#[test]
fn source_passes_wrap_the_main_rewrite() {
    let transpiler = Transpiler::new(
        Definitions::standard(),
        TranspileConfig::default().without_runtime(),
    )
    .with_pre_pass(|source: &str| source.replace("AFFICHER", "écrire"))
    .with_post_pass(|lua: &str| format!("-- généré\n{lua}"));
    assert_eq!(transpiler.transpile("AFFICHER(1)"), "-- généré\n__psc_write(1)\n");
}

#[test]
fn transpile_file_checks_extension() {
    let unique = format!(
        "psc_transpile_file_test_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("clock should be valid")
            .as_nanos()
    );
    let root = std::env::temp_dir().join(unique);
    std::fs::create_dir_all(&root).expect("temp root should be created");

    let good = root.join("prog.PSC");
    std::fs::write(&good, "x ← 2").expect("source should write");
    let lua = psc::transpile_file(&good).expect("transpile should succeed");
    assert!(lua.ends_with("x = 2\n"));

    let wrong = root.join("prog.txt");
    std::fs::write(&wrong, "x ← 2").expect("source should write");
    match psc::transpile_file(&wrong) {
        Err(SourcePathError::UnsupportedExtension(ext)) => assert_eq!(ext, "txt"),
        other => panic!("unexpected result {other:?}"),
    }

    let bare = root.join("prog");
    assert!(matches!(
        psc::transpile_file(&bare),
        Err(SourcePathError::MissingExtension)
    ));
    assert!(matches!(
        psc::transpile_file(root.join("absent.algo")),
        Err(SourcePathError::Io(_))
    ));
    assert_eq!(
        SourcePathError::UnsupportedExtension("txt".to_string()).to_string(),
        "unsupported source extension '.txt', expected .psc or .algo"
    );

    let _ = std::fs::remove_file(good);
    let _ = std::fs::remove_file(wrong);
    let _ = std::fs::remove_dir(root);
}

#[test]
fn crlf_tabs_and_keyword_case_are_tolerated() {
    let source = "Début\r\n\tSI x = 1 ALORS\r\n\t\tx ← 2   \r\n\tFSI\r\n    TANT QUE x < 3 FAIRE\r\n        x ← x + 1\r\n    FTQ\r\nFin\r\n";
    assert_eq!(
        lua_body(source),
        "\tif x == 1 then\n\t\tx = 2\n\tend\n    while x < 3 do\n        x = x + 1\n    end\n"
    );
}

#[test]
fn loop_bounds_may_use_a_variable_named_a() {
    assert_eq!(
        body_lines("Pour i de n - a à 10 Faire\nfpour"),
        lines(&["for i = n - a, 10, 1 do", "end"])
    );
}

#[test]
fn returned_tuple_is_a_list() {
    let source = r#"
Fonction f() : liste
Début
    retourner (1, 2, 3)
Fin
"#;
    assert_eq!(
        body_lines(source),
        lines(&[
            "function f()",
            "return __psc_liste_from_table({1, 2, 3})",
            "end",
        ])
    );
}
