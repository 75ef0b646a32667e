mod cache;

pub use cache::{Atom, action_count, action_label, intern_action, lookup_action};
