//! Built-in schema of the personal site: posts, tags, work entries and
//! projects, plus the `site` and `profile` singletons.

use super::declaration::SchemaDeclaration;
use super::definition::{CollectionDefinition, SingletonDefinition};
use super::field::{DocumentFeatures, ItemLabel};
use super::fields::{self, field};

const EMPLOYMENT_TYPES: &[(&str, &str)] = &[
    ("Full time", "full-time"),
    ("Part time", "part-time"),
    ("Self-employed", "self-employed"),
    ("Freelance", "freelance"),
    ("Internship", "internship"),
    ("Trainee", "trainee"),
];

const PROJECT_TYPES: &[(&str, &str)] = &[
    ("Command-Line App", "command-line"),
    ("Desktop App", "desktop-app"),
    ("Mobile App", "mobile-app"),
    ("Library", "library"),
    ("Web App", "web-app"),
    ("Design", "design"),
    ("Software", "software"),
];

fn tag_list() -> super::field::FieldDescriptor {
    fields::array(
        "Tags",
        fields::relationship("Tag", "tags"),
        ItemLabel::Value {
            fallback: "Please select".into(),
        },
    )
}

pub fn posts() -> CollectionDefinition {
    CollectionDefinition {
        name: "posts".into(),
        label: "Posts".into(),
        path: "src/content/posts/*".into(),
        slug_field: "title".into(),
        content_field: Some("content".into()),
        fields: vec![
            field("title", fields::slug("Title")),
            field("description", fields::multiline("Summary")),
            field("pubDate", fields::date_today("Published date")),
            field(
                "image",
                fields::image("Image", "public/images/posts", "/images/posts/").optional(),
            ),
            field("tags", tag_list()),
            field("content", fields::document("Content", DocumentFeatures::all())),
        ],
    }
}

pub fn tags() -> CollectionDefinition {
    CollectionDefinition {
        name: "tags".into(),
        label: "Tags".into(),
        path: "src/content/tags/*".into(),
        slug_field: "name".into(),
        content_field: None,
        fields: vec![field("name", fields::slug("Name"))],
    }
}

pub fn work() -> CollectionDefinition {
    CollectionDefinition {
        name: "work".into(),
        label: "Experience".into(),
        path: "src/content/work/*".into(),
        slug_field: "role".into(),
        content_field: Some("summary".into()),
        fields: vec![
            field("role", fields::slug("Role")),
            field(
                "employment_type",
                fields::select("Employment Type", EMPLOYMENT_TYPES, "self-employed"),
            ),
            field(
                "company",
                fields::object(
                    "Company",
                    vec![
                        field("name", fields::text("Company Name")),
                        field("site", fields::url("Company Website")),
                        field("location", fields::text("Company Location")),
                    ],
                ),
            ),
            field("startDate", fields::date("Start Date")),
            field(
                "endDate",
                fields::conditional(
                    "End Date",
                    fields::checkbox("currently working in this company", false),
                    fields::empty(),
                    fields::date("End Date"),
                ),
            ),
            field(
                "documents",
                fields::array(
                    "Documents",
                    fields::object(
                        "Document",
                        vec![
                            field(
                                "document",
                                fields::file("Documents", "public/documents/", "/documents/"),
                            ),
                            field("label", fields::text("Label")),
                        ],
                    ),
                    ItemLabel::Template {
                        template: "{label}".into(),
                    },
                ),
            ),
            field(
                "summary",
                fields::document(
                    "Your Summary of the Work",
                    DocumentFeatures {
                        tables: false,
                        ..DocumentFeatures::all()
                    },
                ),
            ),
        ],
    }
}

pub fn projects() -> CollectionDefinition {
    CollectionDefinition {
        name: "projects".into(),
        label: "Projects".into(),
        path: "src/content/projects/*".into(),
        slug_field: "title".into(),
        content_field: Some("content".into()),
        fields: vec![
            field("title", fields::slug("Title")),
            field("description", fields::multiline("Description")),
            field("draft", fields::checkbox("Draft", false)),
            field("type", fields::select("Type", PROJECT_TYPES, "web-app")),
            field("tags", tag_list()),
            field("link", fields::url("URL Link")),
            field("content", fields::document("Content", DocumentFeatures::all())),
        ],
    }
}

pub fn site() -> SingletonDefinition {
    SingletonDefinition {
        name: "site".into(),
        label: "Site".into(),
        path: "src/content/site/data".into(),
        content_field: None,
        fields: vec![
            field("name", fields::slug("Name")),
            field("title", fields::text("Title")),
            field("description", fields::multiline("Description")),
            field(
                "image",
                fields::object(
                    "Image",
                    vec![
                        field("src", fields::image("Open Graph Image", "public/og", "/og/")),
                        field("alt", fields::text("Alt Text")),
                    ],
                ),
            ),
        ],
    }
}

pub fn profile() -> SingletonDefinition {
    SingletonDefinition {
        name: "profile".into(),
        label: "Profile".into(),
        path: "src/content/profile/data".into(),
        content_field: None,
        fields: vec![
            field("name", fields::text("Full Name")),
            field("about", fields::multiline("About")),
            field(
                "image",
                fields::object(
                    "Image",
                    vec![
                        field(
                            "src",
                            fields::image(
                                "Profile Image",
                                "public/profile-image",
                                "/profile-image/",
                            ),
                        ),
                        field("alt", fields::text("Alt Text")),
                    ],
                ),
            ),
            field(
                "links",
                fields::array(
                    "Social Platform",
                    fields::object(
                        "Link",
                        vec![
                            field("platform", fields::text("Platform")),
                            field("label", fields::text("Label")),
                            field("link", fields::url("Link")),
                            field("me", fields::url("Me").optional()),
                        ],
                    ),
                    ItemLabel::Template {
                        template: "{platform} | {label}".into(),
                    },
                ),
            ),
        ],
    }
}

/// The complete site declaration
pub fn site_schema() -> SchemaDeclaration {
    SchemaDeclaration {
        collections: vec![posts(), tags(), work(), projects()],
        singletons: vec![site(), profile()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::registry::SchemaRegistry;

    #[test]
    fn test_site_schema_registers() {
        let registry = SchemaRegistry::from_declaration(site_schema()).unwrap();
        assert_eq!(registry.list_collections().count(), 4);
        assert_eq!(registry.list_singletons().count(), 2);
    }

    #[test]
    fn test_posts_and_projects_reference_tags() {
        let registry = SchemaRegistry::from_declaration(site_schema()).unwrap();
        for name in ["posts", "projects"] {
            let targets = registry.relationship_targets(name).unwrap();
            assert!(targets.contains("tags"));
        }
        assert!(registry.relationship_targets("work").unwrap().is_empty());
    }
}
