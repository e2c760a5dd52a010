use std::collections::BTreeSet;

use crate::model::{ContactInfo, Field};
use crate::validate::{FieldErrors, validate};

/// Entered contact details plus which fields the customer has already left.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub contact: ContactInfo,
    pub touched: BTreeSet<Field>,
}

impl FormState {
    pub fn edit(&mut self, field: Field, value: impl Into<String>) {
        self.contact.set(field, value);
    }

    pub fn touch(&mut self, field: Field) {
        self.touched.insert(field);
    }

    pub fn touch_all(&mut self) {
        self.touched.extend(Field::ALL);
    }

    pub fn is_touched(&self, field: Field) -> bool {
        self.touched.contains(&field)
    }

    /// Every error, touched or not. Recomputed on each call.
    pub fn errors(&self) -> FieldErrors {
        validate(&self.contact)
    }

    /// Errors for fields the customer has left.
    pub fn visible_errors(&self) -> FieldErrors {
        self.errors().visible(&self.touched)
    }

    pub fn clear(&mut self) {
        *self = FormState::default();
    }
}
