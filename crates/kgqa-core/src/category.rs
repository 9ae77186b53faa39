//! Placeholder categories and fully-qualified slot keys.

use std::fmt;

/// The fixed placeholder alphabet.
///
/// Declaration order is the order categories are combined during slot
/// expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Entity,
    Relation,
    Label,
    Attribute,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Entity,
        Category::Relation,
        Category::Label,
        Category::Attribute,
    ];

    /// Bare token name used inside `%...%`.
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Category::Entity => "ENT",
            Category::Relation => "REL",
            Category::Label => "LAB",
            Category::Attribute => "ATT",
        }
    }

    /// The category placeholder as written in slot specs, e.g. `%ENT%`.
    #[must_use]
    pub fn placeholder(self) -> String {
        format!("%{}%", self.token())
    }

    /// Parse `%ENT%`-style keys from a slot spec.
    #[must_use]
    pub fn from_placeholder(key: &str) -> Option<Self> {
        let token = key.strip_prefix('%')?.strip_suffix('%')?;
        Self::ALL.into_iter().find(|c| c.token() == token)
    }

    /// Position in [`Category::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Category::Entity => "entity",
            Category::Relation => "relation",
            Category::Label => "label",
            Category::Attribute => "attribute",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fully-qualified placeholder: `%ENT%` or a numbered `%ENT0%`, `%ENT1%`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey {
    pub category: Category,
    pub index: Option<usize>,
}

impl SlotKey {
    #[must_use]
    pub fn single(category: Category) -> Self {
        Self {
            category,
            index: None,
        }
    }

    #[must_use]
    pub fn numbered(category: Category, index: usize) -> Self {
        Self {
            category,
            index: Some(index),
        }
    }

    /// Token name without `%`, e.g. `ENT1`.
    #[must_use]
    pub fn name(&self) -> String {
        match self.index {
            Some(i) => format!("{}{i}", self.category.token()),
            None => self.category.token().to_string(),
        }
    }

    /// Parse a token name (`ENT`, `REL0`, ...). Leading zeros are not slot keys.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Category::ALL.into_iter().find_map(|category| {
            let rest = name.strip_prefix(category.token())?;
            if rest.is_empty() {
                return Some(Self::single(category));
            }
            let index: usize = rest.parse().ok()?;
            (index.to_string() == rest).then(|| Self::numbered(category, index))
        })
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}%", self.name())
    }
}
