use std::collections::BTreeSet;

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordKind {
    Control,
    Block,
    Boolean,
    Operator,
    Io,
    Modifier,
    Constant,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TypeDef {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct KeywordDef {
    pub name: &'static str,
    pub kind: KeywordKind,
    pub lua: Option<&'static str>,
}

/// Operator glyph with a direct Lua spelling (`≠` -> `~=`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SymbolDef {
    pub glyph: &'static str,
    pub lua: &'static str,
}

/// A built-in PSC function and the runtime helper it maps to.
///
/// `mutator` marks helpers that return the updated container instead of
/// mutating it in place; a bare call statement is rewritten into an
/// assignment back into the first argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BuiltinDef {
    pub name: &'static str,
    pub arity: usize,
    pub helper: &'static str,
    pub mutator: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
}

impl BuiltinDef {
    const fn helper(name: &'static str, arity: usize, helper: &'static str) -> Self {
        Self {
            name,
            arity,
            helper,
            mutator: false,
            description: None,
        }
    }

    const fn mutator(name: &'static str, arity: usize, helper: &'static str) -> Self {
        Self {
            name,
            arity,
            helper,
            mutator: true,
            description: None,
        }
    }

    const fn inline(
        name: &'static str,
        arity: usize,
        helper: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            arity,
            helper,
            mutator: false,
            description: Some(description),
        }
    }

    /// String built-ins that map to operator syntax or reordered calls
    /// instead of a `__psc_*` runtime helper.
    pub fn is_inline(&self) -> bool {
        !self.helper.starts_with("__psc_")
    }
}

const STANDARD_TYPES: &[TypeDef] = &[
    TypeDef {
        name: "entier",
        aliases: &["entier"],
    },
    TypeDef {
        name: "réel",
        aliases: &["réel", "reel"],
    },
    TypeDef {
        name: "booléen",
        aliases: &["booléen", "booleen"],
    },
    TypeDef {
        name: "chaîne",
        aliases: &["chaîne", "chaine"],
    },
    TypeDef {
        name: "caractère",
        aliases: &["caractère", "caractere"],
    },
    TypeDef {
        name: "tableau",
        aliases: &["tableau"],
    },
    TypeDef {
        name: "liste",
        aliases: &["liste"],
    },
    TypeDef {
        name: "pile",
        aliases: &["pile"],
    },
    TypeDef {
        name: "file",
        aliases: &["file"],
    },
    TypeDef {
        name: "listesym",
        aliases: &["listesym"],
    },
    TypeDef {
        name: "table",
        aliases: &["table"],
    },
];

const fn kw(name: &'static str, kind: KeywordKind, lua: Option<&'static str>) -> KeywordDef {
    KeywordDef { name, kind, lua }
}

const STANDARD_KEYWORDS: &[KeywordDef] = &[
    kw("si", KeywordKind::Control, Some("if")),
    kw("alors", KeywordKind::Control, Some("then")),
    kw("sinon", KeywordKind::Control, Some("else")),
    kw("fsi", KeywordKind::Control, Some("end")),
    kw("tant", KeywordKind::Control, Some("while")),
    kw("que", KeywordKind::Control, None),
    kw("ftq", KeywordKind::Control, Some("end")),
    kw("ftant", KeywordKind::Control, Some("end")),
    kw("pour", KeywordKind::Control, Some("for")),
    kw("de", KeywordKind::Control, None),
    kw("à", KeywordKind::Control, None),
    kw("faire", KeywordKind::Control, Some("do")),
    kw("fpour", KeywordKind::Control, Some("end")),
    kw("décroissant", KeywordKind::Control, None),
    kw("retourner", KeywordKind::Control, Some("return")),
    kw("retourne", KeywordKind::Control, Some("return")),
    kw("début", KeywordKind::Block, None),
    kw("fin", KeywordKind::Block, Some("end")),
    kw("algorithme", KeywordKind::Block, None),
    kw("fonction", KeywordKind::Block, Some("function")),
    kw("lexique", KeywordKind::Block, None),
    kw("vrai", KeywordKind::Boolean, Some("true")),
    kw("faux", KeywordKind::Boolean, Some("false")),
    kw("et", KeywordKind::Operator, Some("and")),
    kw("ou", KeywordKind::Operator, Some("or")),
    kw("non", KeywordKind::Operator, Some("not")),
    kw("mod", KeywordKind::Operator, Some("%")),
    kw("écrire", KeywordKind::Io, Some("__psc_write")),
    kw("lire", KeywordKind::Io, Some("__psc_lire")),
    kw("inout", KeywordKind::Modifier, None),
    kw("fin_ligne", KeywordKind::Constant, Some("'\\n'")),
];

const STANDARD_SYMBOLS: &[SymbolDef] = &[
    SymbolDef {
        glyph: "≠",
        lua: "~=",
    },
    SymbolDef {
        glyph: "≤",
        lua: "<=",
    },
    SymbolDef {
        glyph: "≥",
        lua: ">=",
    },
    SymbolDef {
        glyph: "÷",
        lua: "//",
    },
];

const STANDARD_FUNCTIONS: &[BuiltinDef] = &[
    // strings
    BuiltinDef::inline("longueur", 1, "#", "Longueur de la chaîne"),
    BuiltinDef::inline("concat", 2, "..", "Concaténation"),
    BuiltinDef::inline("souschaîne", 3, "string.sub", "Sous-chaîne"),
    BuiltinDef::inline("ième", 2, "string.sub", "Caractère à la position i"),
    // files
    BuiltinDef::helper("fichierouvrir", 2, "__psc_fichierOuvrir"),
    BuiltinDef::helper("fichierfermer", 1, "__psc_fichierFermer"),
    BuiltinDef::helper("fichierlire", 1, "__psc_fichierLire"),
    BuiltinDef::helper("fichierfin", 1, "__psc_fichierFin"),
    BuiltinDef::helper("chaineversentier", 1, "__psc_chaineVersEntier"),
    BuiltinDef::helper("fichiercreer", 1, "__psc_fichierCreer"),
    BuiltinDef::helper("fichierecrire", 2, "__psc_fichierEcrire"),
    // liste
    BuiltinDef::helper("tete", 1, "__psc_generic_tete"),
    BuiltinDef::helper("val", 2, "__psc_liste_val"),
    BuiltinDef::helper("suc", 2, "__psc_liste_suc"),
    BuiltinDef::helper("finliste", 2, "__psc_liste_fin"),
    BuiltinDef::helper("listevide", 0, "__psc_liste_vide"),
    BuiltinDef::mutator("ajoutteteliste", 2, "__psc_liste_ajout_tete"),
    BuiltinDef::mutator("suppressionteteliste", 1, "__psc_liste_suppression_tete"),
    BuiltinDef::mutator("ajoutqueueliste", 2, "__psc_liste_ajout_queue"),
    BuiltinDef::mutator("suppressionqueueliste", 1, "__psc_liste_suppression_queue"),
    BuiltinDef::mutator("ajoutliste", 3, "__psc_liste_ajout"),
    BuiltinDef::mutator("suppressionliste", 2, "__psc_liste_suppression"),
    BuiltinDef::mutator("changeliste", 3, "__psc_liste_change"),
    // listesym, mutated in place through the container table
    BuiltinDef::helper("tetels", 1, "__psc_listesym_tete"),
    BuiltinDef::helper("queuels", 1, "__psc_listesym_queue"),
    BuiltinDef::helper("valls", 2, "__psc_listesym_val"),
    BuiltinDef::helper("sucls", 2, "__psc_listesym_suc"),
    BuiltinDef::helper("precls", 2, "__psc_listesym_prec"),
    BuiltinDef::helper("finls", 2, "__psc_listesym_fin"),
    BuiltinDef::helper("videls", 0, "__psc_listesym_vide"),
    BuiltinDef::helper("ajouttetels", 2, "__psc_listesym_ajout_tete"),
    BuiltinDef::helper("suppressiontetels", 1, "__psc_listesym_suppression_tete"),
    BuiltinDef::helper("ajoutqueuels", 2, "__psc_listesym_ajout_queue"),
    BuiltinDef::helper("suppressionqueuels", 1, "__psc_listesym_suppression_queue"),
    BuiltinDef::helper("ajoutls", 3, "__psc_listesym_ajout"),
    BuiltinDef::helper("suppressionls", 2, "__psc_listesym_suppression"),
    BuiltinDef::helper("changels", 3, "__psc_listesym_change"),
    // pile
    BuiltinDef::helper("pilevide", 0, "__psc_pile_vide"),
    BuiltinDef::helper("sommet", 1, "__psc_pile_sommet"),
    BuiltinDef::helper("estvidepile", 1, "__psc_pile_est_vide"),
    BuiltinDef::helper("empiler", 2, "__psc_pile_empiler"),
    BuiltinDef::helper("depiler", 1, "__psc_pile_depiler"),
    // file
    BuiltinDef::helper("filevide", 0, "__psc_file_vide"),
    BuiltinDef::helper("estvidefile", 1, "__psc_file_est_vide"),
    BuiltinDef::helper("enfiler", 2, "__psc_file_enfiler"),
    BuiltinDef::helper("defiler", 1, "__psc_file_defiler"),
    BuiltinDef::helper("premier", 1, "__psc_file_premier"),
    BuiltinDef::helper("ajoutfile", 2, "__psc_file_enfiler"),
    BuiltinDef::helper("suppressionfile", 1, "__psc_file_defiler"),
    BuiltinDef::helper("estfilevide", 1, "__psc_file_est_vide"),
    // table
    BuiltinDef::helper("tablevide", 0, "__psc_table_vide"),
    BuiltinDef::helper("domaine", 1, "__psc_table_domaine"),
    BuiltinDef::helper("accestable", 2, "__psc_table_acces"),
    BuiltinDef::mutator("ajouttable", 3, "__psc_table_ajout"),
    BuiltinDef::mutator("suppressiontable", 2, "__psc_table_suppression"),
    BuiltinDef::mutator("changetable", 3, "__psc_table_change"),
    BuiltinDef::helper("estdans", 2, "__psc_ensemble_estdans"),
];

/// Keywords, types and built-in functions of the PSC language.
///
/// Every component receives this value at construction time; nothing reads
/// a global table. [`Definitions::standard`] is the shipped French keyword
/// set.
#[derive(Clone, Debug, Serialize)]
pub struct Definitions {
    types: Vec<TypeDef>,
    keywords: Vec<KeywordDef>,
    symbols: Vec<SymbolDef>,
    functions: Vec<BuiltinDef>,
}

impl Default for Definitions {
    fn default() -> Self {
        Self::standard()
    }
}

impl Definitions {
    pub fn standard() -> Self {
        Self {
            types: STANDARD_TYPES.to_vec(),
            keywords: STANDARD_KEYWORDS.to_vec(),
            symbols: STANDARD_SYMBOLS.to_vec(),
            functions: STANDARD_FUNCTIONS.to_vec(),
        }
    }

    /// Adds a built-in, replacing any existing entry with the same
    /// (case-insensitive) name.
    pub fn with_function(mut self, def: BuiltinDef) -> Self {
        let key = def.name.to_lowercase();
        self.functions
            .retain(|existing| existing.name.to_lowercase() != key);
        self.functions.push(def);
        self
    }

    pub fn types(&self) -> &[TypeDef] {
        &self.types
    }

    pub fn keywords(&self) -> &[KeywordDef] {
        &self.keywords
    }

    pub fn symbols(&self) -> &[SymbolDef] {
        &self.symbols
    }

    pub fn functions(&self) -> &[BuiltinDef] {
        &self.functions
    }

    pub fn function(&self, name: &str) -> Option<&BuiltinDef> {
        let key = name.to_lowercase();
        self.functions
            .iter()
            .find(|def| def.name.to_lowercase() == key)
    }

    pub fn keyword(&self, name: &str) -> Option<&KeywordDef> {
        let key = name.to_lowercase();
        self.keywords.iter().find(|def| def.name == key)
    }

    /// Built-ins sorted so that a longer name is always substituted before
    /// any shorter name it contains.
    pub fn functions_longest_first(&self) -> Vec<&BuiltinDef> {
        let mut sorted: Vec<&BuiltinDef> = self.functions.iter().collect();
        sorted.sort_by(|a, b| {
            b.name
                .chars()
                .count()
                .cmp(&a.name.chars().count())
                .then_with(|| a.name.cmp(b.name))
        });
        sorted
    }

    /// Keywords replaced word-for-word in expressions (`vrai`, `et`, `mod`...).
    pub fn substitutions(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.keywords.iter().filter_map(|def| match def.kind {
            KeywordKind::Boolean | KeywordKind::Operator | KeywordKind::Constant => {
                def.lua.map(|lua| (def.name, lua))
            }
            _ => None,
        })
    }

    /// Canonical spelling of a built-in type, accepting accent-free aliases.
    pub fn canonical_type(&self, raw: &str) -> Option<&'static str> {
        let key = raw.trim().to_lowercase();
        self.types
            .iter()
            .find(|def| def.aliases.iter().any(|alias| *alias == key))
            .map(|def| def.name)
    }

    /// Every identifier the language reserves or predefines, lowercased.
    pub fn known_identifiers(&self) -> BTreeSet<String> {
        let mut known = BTreeSet::new();
        for def in &self.keywords {
            known.insert(def.name.to_string());
        }
        for def in &self.types {
            for alias in def.aliases {
                known.insert(alias.to_string());
            }
        }
        for def in &self.functions {
            known.insert(def.name.to_lowercase());
        }
        known.insert("lexique".to_string());
        known.insert("fin_ligne".to_string());
        known
    }
}
