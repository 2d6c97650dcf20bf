mod fact;

pub use fact::{Fact, FactDraft, FactView};
