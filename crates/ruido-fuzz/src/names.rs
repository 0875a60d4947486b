//! Fresh label allocation

use std::collections::HashSet;

use ruido_ir::{for_each_expr, Expr, Name};

const PREFIX: &str = "fuzz$";

/// Labels in use in the current function
#[derive(Debug, Default)]
pub struct NameRegistry {
    used: HashSet<Name>,
    next: u64,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets everything and records the labels of `body`
    pub fn scan(&mut self, body: &Expr) {
        self.used.clear();
        self.next = 0;
        for_each_expr(body, &mut |expr| {
            if let Some(label) = expr.label() {
                self.used.insert(label.clone());
            }
        });
    }

    /// Returns a label not used anywhere in the function
    pub fn allocate(&mut self) -> Name {
        loop {
            let candidate = Name::new(format!("{}{}", PREFIX, self.next));
            self.next += 1;
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    pub fn contains(&self, name: &Name) -> bool {
        self.used.contains(name)
    }
}
