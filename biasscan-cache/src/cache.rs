use lazy_static::lazy_static;
use std::sync::{PoisonError, RwLock};
pub use string_cache::DefaultAtom as Atom;

lazy_static! {
    static ref ACTION_INTERNER: RwLock<Vec<Atom>> = RwLock::new(Vec::new());
}

/// Intern a response label and return its dense ID
pub fn intern_action(label: &str) -> usize {
    let atom = Atom::from(label);
    if let Some(idx) = position_of(&atom) {
        return idx;
    }
    let mut v = ACTION_INTERNER
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    // Another loader thread may have won the race between the read and the write lock.
    match v.iter().position(|a| *a == atom) {
        Some(idx) => idx,
        None => {
            v.push(atom);
            v.len() - 1
        }
    }
}

/// ID of an already interned label, without registering it
pub fn lookup_action(label: &str) -> Option<usize> {
    position_of(&Atom::from(label))
}

/// Current count of unique labels
pub fn action_count() -> usize {
    ACTION_INTERNER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .len()
}

pub fn action_label(id: usize) -> Option<Atom> {
    ACTION_INTERNER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(id)
        .cloned()
}

fn position_of(atom: &Atom) -> Option<usize> {
    ACTION_INTERNER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .position(|a| a == atom)
}
