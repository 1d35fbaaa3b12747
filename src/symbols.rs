//! Class glyph lookup.
//!
//! The scoreboard marks each player's class with a one-character glyph. The
//! recognizer misreads these often, so every glyph carries a list of the
//! shapes it is commonly confused with.

use std::collections::BTreeMap;

use lazy_static::lazy_static;

use crate::model::{Confidence, CorrectedField, FieldValue, Role};

lazy_static! {
    /// Canonical glyph for each role.
    static ref ROLE_SYMBOLS: Vec<(&'static str, Role)> = vec![
        ("A", Role::Assault),
        (".", Role::Engineer),
        ("-", Role::Support),
        ("o", Role::Recon),
        ("+", Role::Medic),
    ];

    /// Shapes the recognizer emits in place of each canonical glyph. A variant
    /// listed under two glyphs is ambiguous and never resolved by correction.
    static ref SYMBOL_VARIANTS: Vec<(&'static str, Vec<&'static str>)> = vec![
        ("A", vec!["a", "4", "Λ", "^", "/\\"]),
        (".", vec![",", "·", "•", "∙", "'", "`"]),
        ("-", vec!["_", "~", "=", "—", "–", "−"]),
        ("o", vec!["O", "0", "°", "©", "Q", "()"]),
        ("+", vec!["t", "4", "†", "±", "*", "++"]),
    ];
}

/// Glyph tables owned by one engine instance.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    roles: Vec<(String, Role)>,
    variants: Vec<(String, Vec<String>)>,
    missing_role: Role,
}

impl SymbolTable {
    /// Built-in tables extended with `extra` variants keyed by glyph.
    pub fn new(extra: &BTreeMap<String, Vec<String>>, missing_role: Role) -> Self {
        let roles = ROLE_SYMBOLS
            .iter()
            .map(|(symbol, role)| (symbol.to_string(), *role))
            .collect();

        let mut variants: Vec<(String, Vec<String>)> = SYMBOL_VARIANTS
            .iter()
            .map(|(symbol, shapes)| {
                (
                    symbol.to_string(),
                    shapes.iter().map(|s| s.to_string()).collect(),
                )
            })
            .collect();

        for (symbol, shapes) in extra {
            match variants.iter_mut().find(|(s, _)| s == symbol) {
                Some((_, existing)) => existing.extend(shapes.iter().cloned()),
                None => variants.push((symbol.clone(), shapes.clone())),
            }
        }

        Self {
            roles,
            variants,
            missing_role,
        }
    }

    /// Direct glyph to role lookup.
    pub fn role_for(&self, symbol: &str) -> Option<Role> {
        self.roles
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, role)| *role)
    }

    /// Canonical glyph for a role; `?` for `Unknown`.
    pub fn symbol_for(&self, role: Role) -> &str {
        self.roles
            .iter()
            .find(|(_, r)| *r == role)
            .map(|(s, _)| s.as_str())
            .unwrap_or("?")
    }

    /// Is `symbol` a glyph or a known variant of one.
    pub fn is_known(&self, symbol: &str) -> bool {
        self.role_for(symbol).is_some()
            || self
                .variants
                .iter()
                .any(|(s, shapes)| s == symbol || shapes.iter().any(|v| v == symbol))
    }

    /// Non-alphanumeric characters that can open a glyph; used to split a
    /// glyph glued to a neighbouring token.
    pub fn glyph_chars(&self) -> impl Iterator<Item = char> + '_ {
        self.roles
            .iter()
            .map(|(s, _)| s.as_str())
            .chain(
                self.variants
                    .iter()
                    .flat_map(|(s, shapes)| std::iter::once(s.as_str()).chain(shapes.iter().map(String::as_str))),
            )
            .filter(|s| s.chars().count() == 1)
            .filter_map(|s| s.chars().next())
            .filter(|c| !c.is_alphanumeric())
    }

    /// Canonical glyphs whose variant list contains `observed`.
    pub fn candidates(&self, observed: &str) -> Vec<&str> {
        let mut found: Vec<&str> = self
            .variants
            .iter()
            .filter(|(_, shapes)| shapes.iter().any(|v| v == observed))
            .map(|(s, _)| s.as_str())
            .collect();
        found.dedup();
        found
    }

    /// Resolve a corrected class field to a role. Never fails.
    ///
    /// The corrected glyph is tried first, then the raw glyph, then the
    /// result is `Unknown`. A row with no glyph at all gets the configured
    /// missing-glyph role.
    pub fn map_role(&self, field: &CorrectedField) -> Role {
        let raw = match &field.raw {
            Some(raw) => raw.as_str(),
            None => return self.missing_role,
        };

        if let FieldValue::Symbol(corrected) = &field.value {
            if field.confidence != Confidence::Unresolved {
                if let Some(role) = self.role_for(corrected) {
                    return role;
                }
            }
        }

        self.role_for(raw).unwrap_or(Role::Unknown)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new(&BTreeMap::new(), Role::Engineer)
    }
}
