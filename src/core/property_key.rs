use std::rc::Rc;

#[derive(Debug)]
pub struct SymbolData {
    description: Option<String>,
}

impl SymbolData {
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

#[derive(Clone, Debug)]
pub enum PropertyKey {
    String(String),
    Symbol(Rc<SymbolData>),
}

impl PropertyKey {
    /// Create a fresh symbol key. Two symbols are equal only if they are the same symbol.
    pub fn new_symbol(description: Option<&str>) -> Self {
        PropertyKey::Symbol(Rc::new(SymbolData {
            description: description.map(str::to_string),
        }))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyKey::String(s) => Some(s),
            PropertyKey::Symbol(_) => None,
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        PropertyKey::String(s.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        PropertyKey::String(s)
    }
}

impl From<&String> for PropertyKey {
    fn from(s: &String) -> Self {
        PropertyKey::String(s.clone())
    }
}

impl From<&PropertyKey> for PropertyKey {
    fn from(k: &PropertyKey) -> Self {
        k.clone()
    }
}

impl PartialEq for PropertyKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropertyKey::String(s1), PropertyKey::String(s2)) => s1 == s2,
            (PropertyKey::Symbol(sym1), PropertyKey::Symbol(sym2)) => Rc::ptr_eq(sym1, sym2),
            _ => false,
        }
    }
}

impl Eq for PropertyKey {}

impl std::hash::Hash for PropertyKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            PropertyKey::String(s) => {
                0u8.hash(state);
                s.hash(state);
            }
            PropertyKey::Symbol(sym) => {
                1u8.hash(state);
                Rc::as_ptr(sym).hash(state);
            }
        }
    }
}

impl std::fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyKey::String(s) => write!(f, "{}", s),
            PropertyKey::Symbol(sym) => match sym.description() {
                Some(desc) => write!(f, "Symbol({})", desc),
                None => write!(f, "Symbol()"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_compare_by_identity() {
        let a = PropertyKey::new_symbol(Some("tag"));
        let b = PropertyKey::new_symbol(Some("tag"));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "Symbol(tag)");
    }

    #[test]
    fn string_and_symbol_never_equal() {
        let s = PropertyKey::from("tag");
        let sym = PropertyKey::new_symbol(Some("tag"));
        assert_ne!(s, sym);
        assert_eq!(s.as_str(), Some("tag"));
        assert_eq!(sym.as_str(), None);
    }
}
