//! Shorthand constructors for declaring schemas in code.
//!
//! ```ignore
//! use sitecontent::schema::fields;
//!
//! let title = fields::slug("Title");
//! let summary = fields::multiline("Summary").optional();
//! ```

use super::field::{
    DateDefault, DocumentFeatures, Field, FieldDescriptor, FieldKind, ItemLabel, SelectOption,
};

pub fn text(label: &str) -> FieldDescriptor {
    FieldDescriptor::new(label, FieldKind::Text)
}

pub fn multiline(label: &str) -> FieldDescriptor {
    FieldDescriptor::new(label, FieldKind::MultilineText)
}

pub fn slug(label: &str) -> FieldDescriptor {
    FieldDescriptor::new(label, FieldKind::Slug)
}

pub fn checkbox(label: &str, default: bool) -> FieldDescriptor {
    FieldDescriptor::new(
        label,
        FieldKind::Boolean {
            default: Some(default),
        },
    )
}

pub fn date(label: &str) -> FieldDescriptor {
    FieldDescriptor::new(label, FieldKind::Date { default: None })
}

/// Date field defaulting to the day the record is validated
pub fn date_today(label: &str) -> FieldDescriptor {
    FieldDescriptor::new(
        label,
        FieldKind::Date {
            default: Some(DateDefault::Today),
        },
    )
}

pub fn url(label: &str) -> FieldDescriptor {
    FieldDescriptor::new(label, FieldKind::Url)
}

/// Select field; `options` are `(label, value)` pairs
pub fn select(label: &str, options: &[(&str, &str)], default: &str) -> FieldDescriptor {
    FieldDescriptor::new(
        label,
        FieldKind::Select {
            options: options
                .iter()
                .map(|(label, value)| SelectOption::new(*label, *value))
                .collect(),
            default: Some(default.to_string()),
        },
    )
}

pub fn image(label: &str, directory: &str, public_path: &str) -> FieldDescriptor {
    FieldDescriptor::new(
        label,
        FieldKind::Image {
            directory: directory.to_string(),
            public_path: public_path.to_string(),
        },
    )
}

pub fn file(label: &str, directory: &str, public_path: &str) -> FieldDescriptor {
    FieldDescriptor::new(
        label,
        FieldKind::File {
            directory: directory.to_string(),
            public_path: public_path.to_string(),
        },
    )
}

pub fn object(label: &str, fields: Vec<Field>) -> FieldDescriptor {
    FieldDescriptor::new(label, FieldKind::Object { fields })
}

pub fn array(label: &str, item: FieldDescriptor, item_label: ItemLabel) -> FieldDescriptor {
    FieldDescriptor::new(
        label,
        FieldKind::Array {
            item: Box::new(item),
            item_label,
            min_items: 0,
        },
    )
}

pub fn relationship(label: &str, collection: &str) -> FieldDescriptor {
    FieldDescriptor::new(
        label,
        FieldKind::Relationship {
            collection: collection.to_string(),
        },
    )
}

pub fn conditional(
    label: &str,
    discriminant: FieldDescriptor,
    when_true: FieldDescriptor,
    when_false: FieldDescriptor,
) -> FieldDescriptor {
    FieldDescriptor::new(
        label,
        FieldKind::Conditional {
            discriminant: Box::new(discriminant),
            when_true: Box::new(when_true),
            when_false: Box::new(when_false),
        },
    )
}

pub fn document(label: &str, features: DocumentFeatures) -> FieldDescriptor {
    FieldDescriptor::new(label, FieldKind::Document { features })
}

pub fn empty() -> FieldDescriptor {
    FieldDescriptor::new("", FieldKind::Empty)
}

/// Pairs a name with a descriptor
pub fn field(name: &str, descriptor: FieldDescriptor) -> Field {
    Field::new(name, descriptor)
}

/// Requires at least `min` elements in an array descriptor; no-op on other kinds
pub fn non_empty(mut descriptor: FieldDescriptor, min: usize) -> FieldDescriptor {
    if let FieldKind::Array { min_items, .. } = &mut descriptor.kind {
        *min_items = min;
    }
    descriptor
}
